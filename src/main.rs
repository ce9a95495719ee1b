use clap::{Parser, Subcommand};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use spa_edge::config::{RuleArgs, ServeArgs};
use spa_edge::logging::{self, LogFormat};
use spa_edge::{Server, cloudfront};

#[derive(Parser)]
#[command(name = "spa-edge", version)]
#[command(about = "Edge routing for single-page applications", long_about = None)]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, env = "SPA_EDGE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the edge HTTP server
    Serve(ServeArgs),
    /// Print the class and outgoing path of each PATH
    Classify {
        #[command(flatten)]
        rules: RuleArgs,

        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Route a Lambda@Edge viewer-request event read from stdin
    Lambda {
        #[command(flatten)]
        rules: RuleArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.log_format)?;

    match cli.command {
        Commands::Serve(args) => {
            let edge = args.edge()?;
            Server::bind(args.listen).serve(edge).await?;
        }
        Commands::Classify { rules, paths } => {
            let rules = rules.rules()?;
            for path in &paths {
                println!("{:<9} {path} -> {}", rules.classify(path), rules.rewrite(path));
            }
        }
        Commands::Lambda { rules } => {
            let rules = rules.rules()?;
            let mut event = String::new();
            tokio::io::stdin().read_to_string(&mut event).await?;

            let mut request = cloudfront::handle_event_json(&rules, &event)?;
            request.push('\n');

            let mut stdout = tokio::io::stdout();
            stdout.write_all(request.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}

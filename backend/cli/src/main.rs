mod chat_cmd;
mod document_cmd;
mod render_cmd;
mod status_cmd;
mod terminal_output;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use codedoc_config::{config_dir, config_file_path, load_and_prepare, redact, validate, AppConfig};
use codedoc_gateway::{start_server, GatewayState};
use codedoc_logging::init_logger;

use terminal_output::{note_info, note_warn};

#[derive(Parser)]
#[command(name = "codedoc")]
#[command(about = "CodeDoc: natural-language SQL, streamed chat and code documentation")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $CODEDOC_CONFIG or ~/.codedoc/codedoc.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Ask a running server for its health report
    Status {
        /// Server base URL (defaults to the configured port on localhost)
        #[arg(long)]
        url: Option<String>,
    },
    /// Print the effective configuration with secrets redacted
    Config,
    /// Render a Markdown file as HTML or plain text
    Render {
        file: PathBuf,
        #[arg(long)]
        plain: bool,
    },
    /// Chat with a running server, streaming replies
    Chat {
        #[arg(long)]
        url: Option<String>,
    },
    /// Document one source file with the configured provider
    Document {
        file: PathBuf,
        /// Extra instructions for the model
        #[arg(long)]
        prompt: Option<String>,
        /// Print HTML instead of plain text
        #[arg(long)]
        html: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_and_prepare(&resolve_config_path(cli.config)).await?;

    // Only the server logs at the configured level; client commands keep the
    // terminal for their own output.
    let level = match cli.command {
        Commands::Serve { .. } => config.logging.level.clone(),
        _ => "warn".to_string(),
    };
    let log_dir = config.logging.dir.as_ref().map(PathBuf::from);
    let _guard = init_logger(log_dir.as_deref(), &level, config.logging.json)?;

    match cli.command {
        Commands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await?;
        }
        Commands::Status { url } => status_cmd::run(&url.unwrap_or_else(|| local_url(&config))).await?,
        Commands::Config => show_config(&config)?,
        Commands::Render { file, plain } => render_cmd::run(&file, plain).await?,
        Commands::Chat { url } => chat_cmd::run(&url.unwrap_or_else(|| local_url(&config))).await?,
        Commands::Document { file, prompt, html } => {
            document_cmd::run(&config, &file, prompt.as_deref(), html).await?
        }
    }

    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    info!(
        addr = %addr,
        provider = %config.provider.active,
        model = %config.provider.model,
        database = config.database.path.as_deref().unwrap_or("<none>"),
        "Starting CodeDoc server"
    );

    let state = GatewayState::from_config(config)?;
    start_server(addr, state).await
}

fn show_config(config: &AppConfig) -> Result<()> {
    let value = serde_json::to_value(config)?;
    println!("{}", serde_json::to_string_pretty(&redact(&value))?);

    let report = validate(config);
    if report.warnings.is_empty() {
        note_info("No configuration warnings");
    }
    for warning in &report.warnings {
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }
    Ok(())
}

fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var("CODEDOC_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| config_file_path(&config_dir()))
}

fn local_url(config: &AppConfig) -> String {
    format!("http://localhost:{}", config.server.port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render() {
        let cli = Cli::parse_from(["codedoc", "render", "README.md", "--plain"]);
        match cli.command {
            Commands::Render { file, plain } => {
                assert_eq!(file, PathBuf::from("README.md"));
                assert!(plain);
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let path = resolve_config_path(Some(PathBuf::from("/tmp/x.yaml")));
        assert_eq!(path, PathBuf::from("/tmp/x.yaml"));
    }

    #[test]
    fn test_local_url_uses_port() {
        assert_eq!(local_url(&AppConfig::default()), "http://localhost:5000");
    }
}

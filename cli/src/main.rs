//! `trueshift` -- interactive tester for the TrueShift REST API.
//!
//! Without a subcommand the tester opens an interactive prompt: pick an
//! endpoint, fill in its form, send it and inspect the raw response. The
//! bearer token returned by login is kept in `<token-dir>/jwt_token` and sent
//! with every later request until `logout`.

mod app;
mod console;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trueshift_core::{ApiClient, EndpointId, FileTokenStorage, Session, UreqTransport};

use crate::app::App;

const DEFAULT_BASE_URL: &str = "https://trueshift-backend-1.onrender.com";

#[derive(Parser, Debug)]
#[command(name = "trueshift", version)]
#[command(about = "Interactive tester for the TrueShift REST API")]
struct Args {
    /// Base address every endpoint path is resolved against
    #[arg(long, env = "TRUESHIFT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Directory holding the persisted bearer token
    #[arg(long, env = "TRUESHIFT_TOKEN_DIR")]
    token_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the interactive prompt (default)
    Interactive,
    /// List all endpoints
    List,
    /// Show whether a token is stored
    Status,
    /// Forget the stored token
    Logout,
    /// Send one request: `trueshift call auth.login email=a@b.com password=x`
    Call {
        /// Endpoint name as shown by `list`
        endpoint: String,
        /// Field values as name=value pairs
        fields: Vec<String>,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn token_dir(args: &Args) -> anyhow::Result<PathBuf> {
    match &args.token_dir {
        Some(dir) => Ok(dir.clone()),
        None => dirs::config_dir()
            .map(|dir| dir.join("trueshift"))
            .context("no config directory on this platform; pass --token-dir"),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let storage = FileTokenStorage::in_dir(token_dir(&args)?);
    tracing::debug!(path = %storage.path().display(), "token storage");
    let session = Arc::new(Session::load(storage).context("failed to load stored token")?);
    let client = ApiClient::new(&args.base_url, session, UreqTransport::new());
    let app = App::new(client);

    let mut stdout = std::io::stdout();
    match args.command.unwrap_or(Command::Interactive) {
        Command::Interactive => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            app.run_interactive(stdin, &mut stdout).await?;
        }
        Command::List => app.print_endpoints(&mut stdout)?,
        Command::Status => app.print_status(&mut stdout)?,
        Command::Logout => app.logout(&mut stdout)?,
        Command::Call { endpoint, fields } => {
            let endpoint: EndpointId = endpoint.parse().map_err(anyhow::Error::msg)?;
            let outcome = app.call(endpoint, &fields).await?;
            console::print_outcome(&mut stdout, &outcome)?;
            if !outcome.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

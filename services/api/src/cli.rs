use crate::infra::parse_model;
use crate::score::{run_score, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use list_predict::error::AppError;
use list_predict::scoring::ModelVariant;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "list-predict",
    about = "Score property extracts for listing probability and serve the results",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score an extract once, print a summary and optionally export it
    Score(ScoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Extract scored at startup and served from the dashboard endpoints
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
    /// Scoring model for the startup batch
    #[arg(long, value_parser = parse_model)]
    pub(crate) model: Option<ModelVariant>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
    }
}

use crate::demo::{run_demo, run_import, run_quote, ImportArgs, QuoteArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use commission_engine::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Commission Engine",
    about = "Serve, quote, and import sales commission rules from the command line",
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
    /// Quote a commission against a saved matrix document
    Quote(QuoteArgs),
    /// Parse a tier or energy band spreadsheet export and print the rows as JSON
    Import(ImportArgs),
    /// Print sample quotes for every calculation method
    Demo,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Quote(args) => run_quote(args),
        Command::Import(args) => run_import(args),
        Command::Demo => run_demo(),
    }
}

use clap::Parser;
use marketrun::adapter::inbound::cli::command::Cli;
use marketrun::adapter::inbound::cli::dispatch;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    dispatch::execute(cli).await
}

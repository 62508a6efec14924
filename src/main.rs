mod app;
mod cli;
mod draw;
mod state;

use crate::app::App;
use crate::cli::{Cli, Command};
use crate::state::app_settings::AppSettings;
use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() {
    better_panic::install();
    setup_logging();

    let cli = Cli::parse();
    if let Err(e) = execute_command(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn setup_logging() {
    sensible_env_logger::init!();
}

async fn execute_command(cli: Cli) -> Result<()> {
    let app = App::new(AppSettings::load(), cli.offline);

    match cli.command {
        Command::Fixtures {
            days,
            leagues,
            upcoming,
            odds,
        } => app.fixtures(days, leagues, upcoming, odds).await,
        Command::Competitions => app.competitions().await,
        Command::Leaderboard {
            competition,
            detail,
            watch,
        } => app.leaderboard(&competition, detail, watch).await,
        Command::Stats { user } => app.stats(&user).await,
        Command::Rounds { leagues } => app.rounds(leagues).await,
    }
}

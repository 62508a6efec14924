use clap::{Parser, Subcommand};
use tipster_core::LeagueId;

#[derive(Parser, Debug)]
#[command(author, version, about = "tipster - football prediction game in the terminal")]
pub struct Cli {
    /// Read fixtures from the data directory instead of API-Football
    #[arg(long, global = true, env = "TIPSTER_OFFLINE")]
    pub offline: bool,

    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Upcoming fixtures and recent results, grouped by day
    Fixtures {
        /// Days ahead to fetch
        #[arg(short, long, default_value_t = 7)]
        days: i64,
        /// Restrict to these league ids (repeatable)
        #[arg(short, long = "league")]
        leagues: Vec<LeagueId>,
        /// Only show fixtures from today onwards
        #[arg(long)]
        upcoming: bool,
        /// Attach bookmaker odds to fixtures that have not started
        #[arg(long)]
        odds: bool,
    },
    /// Every competition with its status
    Competitions,
    /// Ranked table of one competition
    Leaderboard {
        /// Competition id
        competition: String,
        /// Per-fixture points of one user instead of the table
        #[arg(long, value_name = "USER")]
        detail: Option<String>,
        /// Keep refreshing every SECS seconds until interrupted
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },
    /// Season totals of one user's tips
    Stats {
        /// User id
        user: String,
    },
    /// Rounds of a league and the next one to be played
    Rounds {
        /// League ids (repeatable); defaults to the enabled leagues
        #[arg(short, long = "league")]
        leagues: Vec<LeagueId>,
    },
}

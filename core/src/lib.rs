pub mod apifootball;
pub mod client;
pub mod competition;
pub mod dates;
pub mod diagnostics;
pub mod leaderboard;
pub mod league;
pub mod merge;
pub mod rounds;
pub mod scoring;
pub mod source;

pub use competition::{Competition, CompetitionMatcher, CompetitionStatus, RoundKey, Selection};
pub use diagnostics::{Diagnostic, DiagnosticSink};
pub use leaderboard::{LeaderboardEntry, Participant, ScoreSummary};
pub use league::{League, LeagueRegistry, RoundKind};
pub use scoring::{outcome, points};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type FixtureId = u64;
pub type LeagueId = u32;
pub type UserId = String;

// ---------------------------------------------------------------------------
// Domain model, independent of the API-Football wire format
// ---------------------------------------------------------------------------

/// A single scheduled or played match.
///
/// `id` is the merge key. API-Football never hands out `0`, so a zero id
/// marks a record that arrived without an identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    #[serde(default)]
    pub id: FixtureId,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub home_logo: Option<String>,
    #[serde(default)]
    pub away_logo: Option<String>,
    pub league: LeagueId,
    #[serde(default)]
    pub league_name: Option<String>,
    /// Raw round label as delivered, e.g. "Regular Season - 10".
    #[serde(default)]
    pub round_label: Option<String>,
    /// Round resolved against the league registry at ingestion.
    #[serde(default)]
    pub round: Option<Round>,
    #[serde(alias = "commence_time")]
    pub kickoff: DateTime<Utc>,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default)]
    pub elapsed: Option<u16>,
    #[serde(default)]
    pub result: Option<Score>,
    #[serde(default)]
    pub odds: Option<Odds>,
}

impl Fixture {
    pub fn has_id(&self) -> bool {
        self.id != 0
    }

    /// Result present and status finished. A result on a fixture whose status
    /// still says it has not started is treated as decided: the score wins.
    pub fn is_decided(&self) -> bool {
        match self.result {
            Some(_) => self.status.is_finished() || self.has_inconsistent_status(),
            None => false,
        }
    }

    /// "Not started" (or an unknown code) while carrying a score.
    pub fn has_inconsistent_status(&self) -> bool {
        self.result.is_some() && self.status.is_not_started()
    }

    /// Kickoff has passed, or a score exists regardless of the clock.
    pub fn is_under_way(&self, now: DateTime<Utc>) -> bool {
        self.kickoff <= now || self.result.is_some()
    }

    /// Round resolved at ingestion, else resolved now from the raw label.
    pub fn resolved_round(&self, registry: &LeagueRegistry) -> Option<Round> {
        self.round.clone().or_else(|| {
            self.round_label
                .as_deref()
                .and_then(|label| registry.resolve_round(self.league, label))
        })
    }

    pub fn title(&self) -> String {
        format!("{} - {}", self.home_team, self.away_team)
    }
}

/// A user's forecast for one fixture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub user_id: UserId,
    #[serde(alias = "matchId")]
    pub fixture_id: FixtureId,
    pub home_score: u32,
    pub away_score: u32,
    /// Odds captured at submission. Legacy tips carry none and never score.
    #[serde(default)]
    pub odds: Option<Odds>,
    #[serde(default, alias = "timestamp")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Prediction {
    pub fn outcome(&self) -> Outcome {
        outcome(self.home_score, self.away_score)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    pub fn outcome(&self) -> Outcome {
        outcome(self.home, self.away)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

/// Three-way result of a score pair. Serialized as the odds keys H / U / B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "H")]
    Home,
    #[serde(rename = "U")]
    Draw,
    #[serde(rename = "B")]
    Away,
}

impl Outcome {
    pub fn symbol(&self) -> &'static str {
        match self {
            Outcome::Home => "H",
            Outcome::Draw => "U",
            Outcome::Away => "B",
        }
    }
}

/// Decimal odds for the three outcomes. Older records used home/draw/away keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Odds {
    #[serde(rename = "H", alias = "home")]
    pub home: f64,
    #[serde(rename = "U", alias = "draw")]
    pub draw: f64,
    #[serde(rename = "B", alias = "away")]
    pub away: f64,
}

impl Odds {
    pub fn new(home: f64, draw: f64, away: f64) -> Self {
        Self { home, draw, away }
    }

    pub fn get(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Home => self.home,
            Outcome::Draw => self.draw,
            Outcome::Away => self.away,
        }
    }
}

/// Round of a fixture, resolved with the league's `RoundKind`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Round {
    /// Matchday number, e.g. 10 out of "Regular Season - 10".
    Numeric(u32),
    /// Free-text stage label, e.g. "League Stage - Matchday 3".
    Labeled(String),
}

impl Round {
    /// Resolve a raw label under the given scheme. `None` when a numeric
    /// league's label carries no number.
    pub fn resolve(label: &str, kind: RoundKind) -> Option<Round> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        match kind {
            RoundKind::Numeric => first_number(label).map(Round::Numeric),
            RoundKind::Labeled => Some(Round::Labeled(label.to_owned())),
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Round::Numeric(n) => write!(f, "Round {n}"),
            Round::Labeled(label) => f.write_str(label),
        }
    }
}

/// First whole run of ASCII digits in `s`. "Regular Season - 10" → 10, never 1.
pub fn first_number(s: &str) -> Option<u32> {
    s.split(|c: char| !c.is_ascii_digit())
        .find(|token| !token.is_empty())
        .and_then(|token| token.parse::<u32>().ok())
}

// ---------------------------------------------------------------------------
// Match status: API-Football short codes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MatchStatus {
    ToBeDefined,
    #[default]
    NotStarted,
    FirstHalf,
    HalfTime,
    SecondHalf,
    ExtraTime,
    BreakTime,
    Penalties,
    Suspended,
    Interrupted,
    Live,
    Finished,
    FinishedAfterExtraTime,
    FinishedAfterPenalties,
    Postponed,
    Cancelled,
    Abandoned,
    Awarded,
    Walkover,
    Other(String),
}

impl MatchStatus {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "TBD" => MatchStatus::ToBeDefined,
            "NS" => MatchStatus::NotStarted,
            "1H" => MatchStatus::FirstHalf,
            "HT" => MatchStatus::HalfTime,
            "2H" => MatchStatus::SecondHalf,
            "ET" => MatchStatus::ExtraTime,
            "BT" => MatchStatus::BreakTime,
            "P" => MatchStatus::Penalties,
            "SUSP" => MatchStatus::Suspended,
            "INT" => MatchStatus::Interrupted,
            "LIVE" | "IN PLAY" => MatchStatus::Live,
            "FT" => MatchStatus::Finished,
            "AET" => MatchStatus::FinishedAfterExtraTime,
            "PEN" | "FT_PEN" => MatchStatus::FinishedAfterPenalties,
            "PST" => MatchStatus::Postponed,
            "CANC" => MatchStatus::Cancelled,
            "ABD" => MatchStatus::Abandoned,
            "AWD" => MatchStatus::Awarded,
            "WO" => MatchStatus::Walkover,
            _ => MatchStatus::Other(code.trim().to_owned()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            MatchStatus::ToBeDefined => "TBD",
            MatchStatus::NotStarted => "NS",
            MatchStatus::FirstHalf => "1H",
            MatchStatus::HalfTime => "HT",
            MatchStatus::SecondHalf => "2H",
            MatchStatus::ExtraTime => "ET",
            MatchStatus::BreakTime => "BT",
            MatchStatus::Penalties => "P",
            MatchStatus::Suspended => "SUSP",
            MatchStatus::Interrupted => "INT",
            MatchStatus::Live => "LIVE",
            MatchStatus::Finished => "FT",
            MatchStatus::FinishedAfterExtraTime => "AET",
            MatchStatus::FinishedAfterPenalties => "PEN",
            MatchStatus::Postponed => "PST",
            MatchStatus::Cancelled => "CANC",
            MatchStatus::Abandoned => "ABD",
            MatchStatus::Awarded => "AWD",
            MatchStatus::Walkover => "WO",
            MatchStatus::Other(code) => code.as_str(),
        }
    }

    pub fn is_not_started(&self) -> bool {
        matches!(
            self,
            MatchStatus::ToBeDefined | MatchStatus::NotStarted | MatchStatus::Other(_)
        )
    }

    pub fn is_live(&self) -> bool {
        matches!(
            self,
            MatchStatus::FirstHalf
                | MatchStatus::HalfTime
                | MatchStatus::SecondHalf
                | MatchStatus::ExtraTime
                | MatchStatus::BreakTime
                | MatchStatus::Penalties
                | MatchStatus::Suspended
                | MatchStatus::Interrupted
                | MatchStatus::Live
        )
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            MatchStatus::Finished
                | MatchStatus::FinishedAfterExtraTime
                | MatchStatus::FinishedAfterPenalties
        )
    }

    /// How far along the match lifecycle a status is. Merging never moves a
    /// fixture to a lower value.
    pub fn progress(&self) -> u8 {
        match self {
            MatchStatus::ToBeDefined | MatchStatus::NotStarted | MatchStatus::Other(_) => 0,
            MatchStatus::Postponed => 1,
            s if s.is_live() => 2,
            _ => 3,
        }
    }

    pub fn display_text(&self) -> &str {
        match self {
            MatchStatus::ToBeDefined => "Time to be defined",
            MatchStatus::NotStarted => "Not started",
            MatchStatus::FirstHalf => "First half",
            MatchStatus::HalfTime => "Half time",
            MatchStatus::SecondHalf => "Second half",
            MatchStatus::ExtraTime => "Extra time",
            MatchStatus::BreakTime => "Break in extra time",
            MatchStatus::Penalties => "Penalties",
            MatchStatus::Suspended => "Suspended",
            MatchStatus::Interrupted => "Interrupted",
            MatchStatus::Live => "In play",
            MatchStatus::Finished => "Full time",
            MatchStatus::FinishedAfterExtraTime => "Full time (extra time)",
            MatchStatus::FinishedAfterPenalties => "Full time (penalties)",
            MatchStatus::Postponed => "Postponed",
            MatchStatus::Cancelled => "Cancelled",
            MatchStatus::Abandoned => "Abandoned",
            MatchStatus::Awarded => "Technical loss",
            MatchStatus::Walkover => "Walkover",
            MatchStatus::Other(code) => code.as_str(),
        }
    }
}

impl From<String> for MatchStatus {
    fn from(code: String) -> Self {
        MatchStatus::from_code(&code)
    }
}

impl From<MatchStatus> for String {
    fn from(status: MatchStatus) -> Self {
        status.code().to_owned()
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

//! API-Football v3 response shapes. Everything is optional; `client`
//! maps them onto the domain types and drops what it cannot use.

use serde::Deserialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Every endpoint wraps its payload the same way. `errors` is `[]` when
/// fine and an object keyed by error kind otherwise.
#[derive(Debug, Deserialize, Clone)]
pub struct Envelope<T> {
    pub errors: Option<Value>,
    pub results: Option<u32>,
    pub paging: Option<Paging>,
    pub response: Option<Vec<T>>,
}

impl<T> Default for Envelope<T> {
    fn default() -> Self {
        Self {
            errors: None,
            results: None,
            paging: None,
            response: None,
        }
    }
}

impl<T> Envelope<T> {
    /// Error messages reported in the body, if any.
    pub fn error_messages(&self) -> Vec<String> {
        match &self.errors {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(kind, msg)| match msg {
                    Value::String(s) => format!("{kind}: {s}"),
                    other => format!("{kind}: {other}"),
                })
                .collect(),
            Some(Value::Array(items)) => items.iter().map(|v| v.to_string()).collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Paging {
    pub current: Option<u32>,
    pub total: Option<u32>,
}

// ---------------------------------------------------------------------------
// Fixtures  (GET /fixtures)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct FixtureEntry {
    pub fixture: Option<FixtureInfo>,
    pub league: Option<LeagueInfo>,
    pub teams: Option<Teams>,
    pub goals: Option<Goals>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct FixtureInfo {
    pub id: Option<u64>,
    pub date: Option<String>, // ISO 8601 with offset
    pub timestamp: Option<i64>,
    pub status: Option<StatusInfo>,
    pub venue: Option<Venue>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct StatusInfo {
    pub long: Option<String>,
    pub short: Option<String>,
    pub elapsed: Option<u16>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Venue {
    pub name: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct LeagueInfo {
    pub id: Option<u32>,
    pub name: Option<String>,
    pub country: Option<String>,
    pub logo: Option<String>,
    pub season: Option<i32>,
    pub round: Option<String>, // "Regular Season - 10"
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Teams {
    pub home: Option<TeamInfo>,
    pub away: Option<TeamInfo>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TeamInfo {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub logo: Option<String>,
    pub winner: Option<bool>,
}

/// Both sides are null until the match has a score.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Goals {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

// ---------------------------------------------------------------------------
// Odds  (GET /odds)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct OddsEntry {
    pub fixture: Option<OddsFixture>,
    pub bookmakers: Option<Vec<Bookmaker>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct OddsFixture {
    pub id: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Bookmaker {
    pub id: Option<u32>,
    pub name: Option<String>,
    pub bets: Option<Vec<Bet>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Bet {
    pub id: Option<u32>,
    pub name: Option<String>,
    pub values: Option<Vec<BetValue>>,
}

/// `odd` is a decimal sent as a string, e.g. "2.45".
#[derive(Debug, Deserialize, Default, Clone)]
pub struct BetValue {
    pub value: Option<String>,
    pub odd: Option<String>,
}

use crate::apifootball::{Envelope, FixtureEntry, OddsEntry};
use crate::diagnostics::{self, Diagnostic};
use crate::source::{FixtureQuery, FixtureSource};
use crate::{Fixture, FixtureId, LeagueId, LeagueRegistry, MatchStatus, Odds, Score};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use log::{debug, warn};
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const API_FOOTBALL_URL: &str = "https://v3.football.api-sports.io";
const API_KEY_HEADER: &str = "x-apisports-key";
const MATCH_WINNER_BET: &str = "Match Winner";
/// Filler odds some bookmakers publish before pricing a match.
const PLACEHOLDER_ODDS: Odds = Odds {
    home: 2.0,
    draw: 3.0,
    away: 3.5,
};

/// How requests reach API-Football.
#[derive(Debug, Clone, PartialEq)]
enum Access {
    /// `{base}/{endpoint}?…` with the key in a header.
    Direct { api_key: Option<String> },
    /// `{base}?endpoint={endpoint}&…`; the proxy adds the key.
    Proxy,
}

/// API-Football v3 client, used directly or through the key-hiding proxy.
#[derive(Debug, Clone)]
pub struct FootballApi {
    client: Client,
    timeout: Duration,
    base_url: String,
    access: Access,
    registry: LeagueRegistry,
}

impl Default for FootballApi {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("tipster/0.1 (football prediction game)")
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_secs(10),
            base_url: API_FOOTBALL_URL.to_owned(),
            access: Access::Direct { api_key: None },
            registry: LeagueRegistry::builtin(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    NotFound(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl FootballApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Talk to API-Football (or a compatible mirror) directly.
    pub fn direct(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            access: Access::Direct { api_key },
            ..Self::default()
        }
    }

    /// Go through the serverless proxy that holds the key.
    pub fn proxy(proxy_url: &str) -> Self {
        Self {
            base_url: proxy_url.to_owned(),
            access: Access::Proxy,
            ..Self::default()
        }
    }

    /// Registry used to resolve round labels at ingestion.
    pub fn with_registry(mut self, registry: LeagueRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Every fixture of `league` between `from` and `to`, both inclusive.
    pub async fn fetch_league_fixtures(
        &self,
        league: LeagueId,
        season: i32,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ApiResult<Vec<Fixture>> {
        let url = self.url(
            "fixtures",
            &[
                ("league", league.to_string()),
                ("season", season.to_string()),
                ("from", from.format("%Y-%m-%d").to_string()),
                ("to", to.format("%Y-%m-%d").to_string()),
            ],
        );
        let fixtures = self.fetch_fixture_list(&url).await?;
        debug!("{} fixtures for league {league} ({from} to {to})", fixtures.len());
        Ok(fixtures)
    }

    /// The whole season of `league`, every round included.
    pub async fn fetch_season(&self, league: LeagueId, season: i32) -> ApiResult<Vec<Fixture>> {
        let url = self.url(
            "fixtures",
            &[("league", league.to_string()), ("season", season.to_string())],
        );
        let fixtures = self.fetch_fixture_list(&url).await?;
        debug!("{} fixtures for league {league} season {season}", fixtures.len());
        Ok(fixtures)
    }

    async fn fetch_fixture_list(&self, url: &str) -> ApiResult<Vec<Fixture>> {
        let raw: Envelope<FixtureEntry> = self.get(url).await?;
        log_body_errors(&raw, url);

        Ok(raw
            .response
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| {
                let fixture = map_fixture(entry, &self.registry);
                if fixture.is_none() {
                    diagnostics::emit(
                        &mut (),
                        Diagnostic::MalformedRecord {
                            source: url.to_owned(),
                            reason: "fixture without id or kickoff".into(),
                        },
                    );
                }
                fixture
            })
            .collect())
    }

    /// Odds for a single fixture; `None` when no bookmaker has priced it.
    pub async fn fetch_odds(&self, fixture_id: FixtureId) -> ApiResult<Option<Odds>> {
        let url = self.url("odds", &[("fixture", fixture_id.to_string())]);
        let raw: Envelope<OddsEntry> = self.get(&url).await?;
        log_body_errors(&raw, &url);

        Ok(raw
            .response
            .unwrap_or_default()
            .first()
            .and_then(extract_odds)
            .filter(|odds| *odds != PLACEHOLDER_ODDS))
    }

    /// Odds for every priced fixture of a league on one day.
    pub async fn fetch_league_odds(
        &self,
        league: LeagueId,
        season: i32,
        date: NaiveDate,
    ) -> ApiResult<HashMap<FixtureId, Odds>> {
        let url = self.url(
            "odds",
            &[
                ("league", league.to_string()),
                ("season", season.to_string()),
                ("date", date.format("%Y-%m-%d").to_string()),
            ],
        );
        let raw: Envelope<OddsEntry> = self.get(&url).await?;
        log_body_errors(&raw, &url);

        Ok(raw
            .response
            .unwrap_or_default()
            .iter()
            .filter_map(|entry| {
                let id = entry.fixture.as_ref()?.id?;
                let odds = extract_odds(entry).filter(|odds| *odds != PLACEHOLDER_ODDS)?;
                Some((id, odds))
            })
            .collect())
    }

    /// Fixtures of every league in the query, first record per id.
    async fn fetch_all(&self, query: &FixtureQuery) -> ApiResult<Vec<Fixture>> {
        let mut seen: HashSet<FixtureId> = HashSet::new();
        let mut all = Vec::new();
        for &league in &query.leagues {
            let fixtures = self
                .fetch_league_fixtures(league, query.season, query.from, query.to)
                .await?;
            all.extend(fixtures.into_iter().filter(|f| seen.insert(f.id)));
        }
        Ok(all)
    }

    fn url(&self, endpoint: &str, params: &[(&str, String)]) -> String {
        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        match self.access {
            Access::Direct { .. } => format!("{}/{endpoint}?{query}", self.base_url),
            Access::Proxy => {
                let sep = if self.base_url.contains('?') { '&' } else { '?' };
                format!("{}{sep}endpoint={endpoint}&{query}", self.base_url)
            }
        }
    }

    async fn get<T: Default + serde::de::DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let mut request = self.client.get(url).timeout(self.timeout);
        if let Access::Direct {
            api_key: Some(key),
        } = &self.access
        {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        match response.error_for_status() {
            Ok(res) => res
                .json::<T>()
                .await
                .map_err(|e| ApiError::Parsing(e, url.to_owned())),
            Err(e) => {
                if e.status().map(|s| s.is_client_error()).unwrap_or(false) {
                    warn!("{url} answered {:?}; treating as empty", e.status());
                    Ok(T::default())
                } else {
                    Err(ApiError::Api(e, url.to_owned()))
                }
            }
        }
    }
}

impl FixtureSource for FootballApi {
    async fn fetch_fixtures(&self, query: &FixtureQuery) -> ApiResult<Vec<Fixture>> {
        self.fetch_all(query).await
    }

    async fn fetch_results(&self, query: &FixtureQuery) -> ApiResult<Vec<Fixture>> {
        let fixtures = self.fetch_all(query).await?;
        Ok(fixtures.into_iter().filter(|f| f.result.is_some()).collect())
    }
}

fn log_body_errors<T>(raw: &Envelope<T>, url: &str) {
    for message in raw.error_messages() {
        warn!("API-Football reported an error for {url}: {message}");
    }
}

/// Season year a date belongs to. European seasons roll over in July.
pub fn current_season(now: DateTime<Utc>) -> i32 {
    if now.month() >= 7 {
        now.year()
    } else {
        now.year() - 1
    }
}

// ---------------------------------------------------------------------------
// Mapping: API-Football wire types → clean domain types
// ---------------------------------------------------------------------------

/// `None` when the record has no id or no usable kickoff time.
fn map_fixture(entry: FixtureEntry, registry: &LeagueRegistry) -> Option<Fixture> {
    let info = entry.fixture.unwrap_or_default();
    let id = info.id.filter(|id| *id != 0)?;

    let kickoff = info
        .date
        .as_deref()
        .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
        .map(|d| d.with_timezone(&Utc))
        .or_else(|| info.timestamp.and_then(|ts| DateTime::from_timestamp(ts, 0)))?;

    let status_info = info.status.unwrap_or_default();
    let status = status_info
        .short
        .as_deref()
        .map(MatchStatus::from_code)
        .unwrap_or_default();

    let league_info = entry.league.unwrap_or_default();
    let league = league_info.id.unwrap_or_default();
    let round = league_info
        .round
        .as_deref()
        .and_then(|label| registry.resolve_round(league, label));

    let teams = entry.teams.unwrap_or_default();
    let home = teams.home.unwrap_or_default();
    let away = teams.away.unwrap_or_default();

    let result = entry.goals.and_then(|g| match (g.home, g.away) {
        (Some(h), Some(a)) => Some(Score::new(h, a)),
        _ => None,
    });

    Some(Fixture {
        id,
        home_team: home.name.unwrap_or_else(|| "TBD".into()),
        away_team: away.name.unwrap_or_else(|| "TBD".into()),
        home_logo: home.logo,
        away_logo: away.logo,
        league,
        league_name: league_info.name,
        round_label: league_info.round,
        round,
        kickoff,
        status,
        elapsed: status_info.elapsed,
        result,
        odds: None,
    })
}

/// Home/Draw/Away prices of the first bookmaker's match-winner market.
/// All three must be present and valid decimal odds.
pub fn extract_odds(entry: &OddsEntry) -> Option<Odds> {
    let bookmaker = entry.bookmakers.as_ref()?.first()?;
    let bet = bookmaker
        .bets
        .as_ref()?
        .iter()
        .find(|b| b.name.as_deref() == Some(MATCH_WINNER_BET))?;
    let values = bet.values.as_ref()?;

    let price = |label: &str| -> Option<f64> {
        let odd = values
            .iter()
            .find(|v| v.value.as_deref() == Some(label))?
            .odd
            .as_deref()?
            .trim()
            .parse::<f64>()
            .ok()?;
        (odd.is_finite() && odd >= 1.0).then_some(odd)
    };

    Some(Odds::new(price("Home")?, price("Draw")?, price("Away")?))
}

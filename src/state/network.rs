use crate::state::messages::{NetworkRequest, NetworkResponse};
use chrono::{NaiveDate, TimeDelta};
use futures_util::future::join_all;
use log::{debug, error, warn};
use std::collections::BTreeSet;
use tipster_core::client::{ApiError, ApiResult};
use tipster_core::source::{FixtureQuery, FixtureSource};
use tipster_core::{Competition, Fixture, LeagueId, Selection};
use tokio::sync::mpsc;

/// Day ranges fetched around `today`, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub today: NaiveDate,
    pub days_ahead: i64,
    pub days_back: i64,
}

impl FetchWindow {
    pub fn new(today: NaiveDate, days_ahead: i64, days_back: i64) -> Self {
        Self {
            today,
            days_ahead,
            days_back,
        }
    }

    pub fn upcoming(&self) -> (NaiveDate, NaiveDate) {
        (self.today, self.today + TimeDelta::days(self.days_ahead.max(0)))
    }

    pub fn results(&self) -> (NaiveDate, NaiveDate) {
        (self.today - TimeDelta::days(self.days_back.max(0)), self.today)
    }
}

/// Which source call a planned query goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Every fixture in range, played or not.
    Fixtures,
    /// Only fixtures that already have a score.
    Results,
}

pub type FetchPlan = Vec<(FetchKind, FixtureQuery)>;

impl FetchWindow {
    /// Upcoming fixtures for every league, then recent results for every
    /// league.
    pub fn plan(&self, leagues: &[LeagueId], season: i32) -> FetchPlan {
        let (from, to) = self.upcoming();
        let upcoming = leagues
            .iter()
            .map(|&league| (FetchKind::Fixtures, FixtureQuery::new(vec![league], season, from, to)));
        let (from, to) = self.results();
        let results = leagues
            .iter()
            .map(|&league| (FetchKind::Results, FixtureQuery::new(vec![league], season, from, to)));
        upcoming.chain(results).collect()
    }
}

/// Days covering a whole season. Wide enough for both July to June seasons
/// and calendar-year tournaments; the season parameter does the filtering.
pub fn season_span(season: i32) -> (NaiveDate, NaiveDate) {
    let first = NaiveDate::from_ymd_opt(season, 1, 1).unwrap_or(NaiveDate::MIN);
    let last = NaiveDate::from_ymd_opt(season + 1, 12, 31).unwrap_or(NaiveDate::MAX);
    (first, last)
}

/// Every fixture of the leagues' season.
pub fn season_plan(leagues: &[LeagueId], season: i32) -> FetchPlan {
    let (from, to) = season_span(season);
    leagues
        .iter()
        .map(|&league| (FetchKind::Fixtures, FixtureQuery::new(vec![league], season, from, to)))
        .collect()
}

/// Queries that cover every fixture the competitions can select, however far
/// from today they lie.
///
/// Date ranges fetch their own days, padded by one on each side for time
/// zones. Round and league selections fetch the whole season. Match-id
/// selections name no league, so the whole season of `enabled` is fetched.
/// A league fetched for the whole season needs no narrower query.
pub fn competition_plan(competitions: &[Competition], enabled: &[LeagueId], season: i32) -> FetchPlan {
    let mut whole_season: BTreeSet<LeagueId> = BTreeSet::new();
    let mut ranges: BTreeSet<(LeagueId, NaiveDate, NaiveDate)> = BTreeSet::new();

    for competition in competitions {
        match &competition.selection {
            Selection::DateRange { leagues, start, end } => {
                let from = *start - TimeDelta::days(1);
                let to = *end + TimeDelta::days(1);
                ranges.extend(leagues.iter().map(|&league| (league, from, to)));
            }
            Selection::MatchIds { .. } => whole_season.extend(enabled),
            selection => whole_season.extend(selection.leagues()),
        }
    }

    let (from, to) = season_span(season);
    let seasons = whole_season
        .iter()
        .map(|&league| (FetchKind::Fixtures, FixtureQuery::new(vec![league], season, from, to)));
    let narrower = ranges
        .into_iter()
        .filter(|(league, ..)| !whole_season.contains(league))
        .map(|(league, from, to)| (FetchKind::Fixtures, FixtureQuery::new(vec![league], season, from, to)));
    seasons.chain(narrower).collect()
}

/// Run every planned query at once, keeping batches in plan order.
///
/// A query that fails is logged and left out; the call only fails when
/// every query did.
pub async fn load_plan<S: FixtureSource>(
    source: &S,
    plan: &[(FetchKind, FixtureQuery)],
) -> ApiResult<Vec<Vec<Fixture>>> {
    let requests = plan.iter().map(|(kind, query)| async move {
        match kind {
            FetchKind::Fixtures => source.fetch_fixtures(query).await,
            FetchKind::Results => source.fetch_results(query).await,
        }
    });
    let outcomes = join_all(requests).await;

    let mut batches = Vec::new();
    let mut last_error: Option<ApiError> = None;
    for ((kind, query), outcome) in plan.iter().zip(outcomes) {
        let label = format!("{kind:?} for {:?} {}..{}", query.leagues, query.from, query.to);
        match outcome {
            Ok(fixtures) => {
                debug!("{label}: {} fixtures", fixtures.len());
                batches.push(fixtures);
            }
            Err(e) => {
                warn!("{label} failed: {e}");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if batches.is_empty() => Err(e),
        _ => Ok(batches),
    }
}

pub struct NetworkWorker<S> {
    source: S,
    plan: FetchPlan,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
}

impl<S: FixtureSource> NetworkWorker<S> {
    pub fn new(
        source: S,
        plan: FetchPlan,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            source,
            plan,
            requests,
            responses,
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let result = match request {
                NetworkRequest::RefreshFixtures => self.handle_refresh_fixtures().await,
            };

            debug!("network request complete");

            let response = result.unwrap_or_else(|err| NetworkResponse::Error {
                message: err.to_string(),
            });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle_refresh_fixtures(&self) -> ApiResult<NetworkResponse> {
        debug!("refreshing fixtures ({} queries)", self.plan.len());
        let batches = load_plan(&self.source, &self.plan).await?;
        Ok(NetworkResponse::FixturesLoaded { batches })
    }
}

use crate::client::ApiResult;
use crate::{Fixture, LeagueId, Prediction};
use chrono::NaiveDate;
use std::future::Future;

/// Which fixtures to fetch: a set of leagues in one season over a day range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureQuery {
    pub leagues: Vec<LeagueId>,
    pub season: i32,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl FixtureQuery {
    pub fn new(leagues: Vec<LeagueId>, season: i32, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            leagues,
            season,
            from,
            to,
        }
    }
}

/// Supplies fixture batches. Implementations decide transport and caching.
pub trait FixtureSource {
    /// Scheduled fixtures in the query window.
    fn fetch_fixtures(
        &self,
        query: &FixtureQuery,
    ) -> impl Future<Output = ApiResult<Vec<Fixture>>> + Send;

    /// Fixtures in the query window that already carry a score.
    fn fetch_results(
        &self,
        query: &FixtureQuery,
    ) -> impl Future<Output = ApiResult<Vec<Fixture>>> + Send;
}

/// Supplies a user's tips, in arrival order.
pub trait PredictionSource {
    fn fetch_predictions(
        &self,
        user_id: &str,
    ) -> impl Future<Output = ApiResult<Vec<Prediction>>> + Send;
}

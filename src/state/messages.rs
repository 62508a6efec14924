use tipster_core::Fixture;

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    RefreshFixtures,
}

#[derive(Debug)]
pub enum NetworkResponse {
    /// Upcoming batches first, then results batches, each in league order.
    FixturesLoaded { batches: Vec<Vec<Fixture>> },
    Error { message: String },
}

use crate::draw::{self, CompetitionRow};
use crate::state::app_settings::AppSettings;
use crate::state::messages::{NetworkRequest, NetworkResponse};
use crate::state::network::{FetchPlan, FetchWindow, NetworkWorker, competition_plan, load_plan, season_plan};
use crate::state::refresher::PeriodicRefresher;
use crate::state::store::DataStore;
use anyhow::{Context, Result};
use chrono::{Local, Utc};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tipster_core::client::FootballApi;
use tipster_core::competition::competition_status_with;
use tipster_core::dates::{filter_upcoming, group_by_date};
use tipster_core::leaderboard::{breakdown, leaderboard};
use tipster_core::merge::merge_with;
use tipster_core::rounds::{available_rounds, next_round};
use tipster_core::source::PredictionSource;
use tipster_core::{
    Competition, CompetitionMatcher, CompetitionStatus, Diagnostic, Fixture, LeagueId, Participant,
    Prediction, ScoreSummary,
};
use tokio::sync::mpsc;

pub struct App {
    pub settings: AppSettings,
    store: DataStore,
    api: FootballApi,
    offline: bool,
    /// Competitions whose snapshot this process already wrote.
    frozen: Mutex<HashSet<String>>,
}

impl App {
    pub fn new(settings: AppSettings, offline: bool) -> Self {
        let store = DataStore::new(&settings.data_dir).with_sources(settings.tip_sources.clone());
        let api = settings.api();
        debug!("data directory {}", store.root().display());
        Self {
            settings,
            store,
            api,
            offline,
            frozen: Mutex::new(HashSet::new()),
        }
    }

    // -----------------------------------------------------------------------
    // Fixture loading
    // -----------------------------------------------------------------------

    /// Fixture batches in merge order: stored snapshots, then whatever the
    /// network (or the offline data) delivers.
    async fn load_fixture_batches(&self, plan: &FetchPlan) -> Result<Vec<Vec<Fixture>>> {
        let mut batches = self.store.all_snapshots();
        if self.offline {
            batches.extend(self.store.offline_fixtures());
            return Ok(batches);
        }

        let fetched = load_plan(&self.api, plan)
            .await
            .context("could not load fixtures from API-Football")?;
        batches.extend(fetched);
        Ok(batches)
    }

    fn merge(&self, batches: &[Vec<Fixture>]) -> Vec<Fixture> {
        let mut missing = 0;
        let fixtures = merge_with(batches, &mut |d: Diagnostic| {
            if matches!(d, Diagnostic::MissingFixtureId { .. }) {
                missing += 1;
            }
        });
        if missing > 0 {
            info!("{missing} fixture records without id were ignored");
        }
        fixtures
    }

    async fn load_fixtures(&self, plan: &FetchPlan) -> Result<Vec<Fixture>> {
        let batches = self.load_fixture_batches(plan).await?;
        Ok(self.merge(&batches))
    }

    fn leagues_or_enabled(&self, leagues: Vec<LeagueId>) -> Vec<LeagueId> {
        if leagues.is_empty() {
            self.settings.leagues()
        } else {
            leagues
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    pub async fn fixtures(&self, days: i64, leagues: Vec<LeagueId>, upcoming: bool, odds: bool) -> Result<()> {
        let leagues = self.leagues_or_enabled(leagues);
        let window = FetchWindow::new(Local::now().date_naive(), days, self.settings.results_days);
        let mut fixtures: Vec<Fixture> = self
            .load_fixtures(&window.plan(&leagues, self.settings.season))
            .await?
            .into_iter()
            .filter(|f| leagues.contains(&f.league))
            .collect();

        if odds && !self.offline {
            self.attach_odds(&mut fixtures).await;
        }

        let now = Local::now();
        if upcoming {
            fixtures = filter_upcoming(&fixtures, &now);
        }
        let groups = group_by_date(&fixtures, &now);
        print!("{}", draw::draw_fixture_groups(&groups, &self.settings.registry, &Local));
        Ok(())
    }

    /// Fill in odds for fixtures that have not kicked off, one request per
    /// league and day.
    async fn attach_odds(&self, fixtures: &mut [Fixture]) {
        let now = Utc::now();
        let mut days: Vec<(LeagueId, chrono::NaiveDate)> = fixtures
            .iter()
            .filter(|f| f.odds.is_none() && !f.is_under_way(now))
            .map(|f| (f.league, f.kickoff.date_naive()))
            .collect();
        days.sort();
        days.dedup();

        for (league, day) in days {
            match self.api.fetch_league_odds(league, self.settings.season, day).await {
                Ok(odds) => {
                    for fixture in fixtures.iter_mut().filter(|f| f.odds.is_none()) {
                        fixture.odds = odds.get(&fixture.id).copied();
                    }
                }
                Err(e) => warn!("odds for league {league} on {day}: {e}"),
            }
        }
    }

    pub async fn competitions(&self) -> Result<()> {
        let competitions = self.store.competitions()?;
        let plan = self.competition_plan(&competitions);
        let fixtures = self.load_fixtures(&plan).await?;

        let matcher = CompetitionMatcher::new(&self.settings.registry, Local);
        let now = Utc::now();
        let mut statuses = Vec::with_capacity(competitions.len());
        for competition in &competitions {
            let matched = matcher.match_fixtures(competition, &fixtures);
            let status = self.status_of(competition, &matched, now);
            self.freeze_if_completed(competition, status, &matched);
            statuses.push((status, matched.len()));
        }

        let rows: Vec<CompetitionRow> = competitions
            .iter()
            .zip(statuses)
            .map(|(competition, (status, fixtures))| CompetitionRow {
                competition,
                status,
                fixtures,
            })
            .collect();
        print!("{}", draw::draw_competitions(&rows, &self.settings.registry));
        Ok(())
    }

    pub async fn leaderboard(&self, id: &str, detail: Option<String>, watch: Option<u64>) -> Result<()> {
        let competition = self.store.competition(id)?;
        let plan = self.competition_plan(std::slice::from_ref(&competition));
        let fixtures = self.load_fixtures(&plan).await?;
        let tips = self.store.load_tips().await?;
        print!("{}", self.render_table(&competition, &fixtures, &tips, detail.as_deref()));

        let Some(secs) = watch else {
            return Ok(());
        };
        if self.offline {
            warn!("--watch has nothing to refresh in offline mode");
            return Ok(());
        }
        self.watch(&competition, plan, detail.as_deref(), Duration::from_secs(secs.max(1)))
            .await
    }

    /// Re-render the table whenever the worker delivers fresh fixtures, until
    /// interrupted.
    async fn watch(
        &self,
        competition: &Competition,
        plan: FetchPlan,
        detail: Option<&str>,
        period: Duration,
    ) -> Result<()> {
        let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(8);
        let (network_resp_tx, mut network_resp_rx) = mpsc::channel::<NetworkResponse>(8);

        let network_worker = NetworkWorker::new(self.api.clone(), plan, network_req_rx, network_resp_tx);
        let network_task = tokio::spawn(network_worker.run());
        let periodic_task = tokio::spawn(PeriodicRefresher::new(network_req_tx, period).run());

        loop {
            tokio::select! {
                Some(response) = network_resp_rx.recv() => match response {
                    NetworkResponse::FixturesLoaded { batches } => {
                        let mut all = self.store.all_snapshots();
                        all.extend(batches);
                        let fixtures = self.merge(&all);
                        let tips = match self.store.load_tips().await {
                            Ok(tips) => tips,
                            Err(e) => {
                                error!("{e}");
                                continue;
                            }
                        };
                        println!("\n-- {} --", Local::now().format("%H:%M:%S"));
                        print!("{}", self.render_table(competition, &fixtures, &tips, detail));
                    }
                    NetworkResponse::Error { message } => error!("Network error: {message}"),
                },
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        network_task.abort();
        periodic_task.abort();
        Ok(())
    }

    fn render_table(
        &self,
        competition: &Competition,
        fixtures: &[Fixture],
        tips: &[Prediction],
        detail: Option<&str>,
    ) -> String {
        let matcher = CompetitionMatcher::new(&self.settings.registry, Local);
        let matched = matcher.match_fixtures(competition, fixtures);
        let status = self.status_of(competition, &matched, Utc::now());
        self.freeze_if_completed(competition, status, &matched);

        match detail {
            Some(user) => draw::draw_breakdown(user, &breakdown(user, tips, &matched)),
            None => {
                let participants = participants(competition, tips);
                let live = matched.iter().any(|f| f.status.is_live());
                draw::draw_leaderboard(competition, status, live, &leaderboard(&participants, tips, &matched))
            }
        }
    }

    pub async fn stats(&self, user: &str) -> Result<()> {
        let tips = self.store.fetch_predictions(user).await?;
        if tips.is_empty() {
            println!("{user} has no tips.");
            return Ok(());
        }
        let plan = season_plan(&self.settings.leagues(), self.settings.season);
        let fixtures = self.load_fixtures(&plan).await?;
        print!("{}", draw::draw_summary(user, &ScoreSummary::compute(&tips, &fixtures)));
        Ok(())
    }

    pub async fn rounds(&self, leagues: Vec<LeagueId>) -> Result<()> {
        let leagues = self.leagues_or_enabled(leagues);
        let now = Utc::now();
        let offline = self.offline.then(|| self.merge(&self.store.offline_fixtures()));

        for league in leagues {
            let fixtures = match &offline {
                Some(all) => all.clone(),
                None => match self.api.fetch_season(league, self.settings.season).await {
                    Ok(fixtures) => fixtures,
                    Err(e) => {
                        warn!("season of league {league}: {e}");
                        continue;
                    }
                },
            };
            let registry = &self.settings.registry;
            let rounds = available_rounds(&fixtures, league, registry, now);
            let next = next_round(&fixtures, league, registry, now);
            print!("{}", draw::draw_rounds(league, registry, &rounds, next.as_ref()));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn competition_plan(&self, competitions: &[Competition]) -> FetchPlan {
        competition_plan(competitions, &self.settings.leagues(), self.settings.season)
    }

    fn status_of(&self, competition: &Competition, matched: &[Fixture], now: chrono::DateTime<Utc>) -> CompetitionStatus {
        competition_status_with(matched, now, competition.has_cached_snapshot(), &mut |d: Diagnostic| {
            debug!("{}: {d}", competition.id)
        })
    }

    /// Store the matched fixtures once a competition is over, so its table
    /// survives the fixtures dropping out of the API. Written at most once per
    /// competition; returns whether this call wrote it.
    fn freeze_if_completed(&self, competition: &Competition, status: CompetitionStatus, matched: &[Fixture]) -> bool {
        if status != CompetitionStatus::Completed || competition.has_cached_snapshot() || matched.is_empty() {
            return false;
        }
        let Ok(mut frozen) = self.frozen.lock() else {
            return false;
        };
        if frozen.contains(&competition.id) {
            return false;
        }
        match self.store.save_snapshot(&competition.id, matched) {
            Ok(()) => {
                info!("{} completed; fixtures frozen", competition.id);
                frozen.insert(competition.id.clone());
                true
            }
            Err(e) => {
                warn!("could not freeze {}: {e:#}", competition.id);
                false
            }
        }
    }
}

fn participants(competition: &Competition, tips: &[Prediction]) -> Vec<Participant> {
    if competition.participants.is_empty() {
        DataStore::tipsters(tips)
    } else {
        competition.participants.clone()
    }
}

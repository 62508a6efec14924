use chrono::Utc;
use std::path::PathBuf;
use tipster_core::client::{API_FOOTBALL_URL, FootballApi, current_season};
use tipster_core::{LeagueId, LeagueRegistry};

const DEFAULT_RESULTS_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub api_url: String,
    pub api_proxy: Option<String>,
    pub api_key: Option<String>,
    pub season: i32,
    pub registry: LeagueRegistry,
    pub data_dir: PathBuf,
    /// How far back the results fetch reaches.
    pub results_days: i64,
    /// Extra tip files or http(s) URLs, read after the data directory.
    pub tip_sources: Vec<String>,
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Settings from an arbitrary variable lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let registry = match get("TIPSTER_LEAGUES").map(|v| parse_leagues(&v)) {
            Some(ids) if !ids.is_empty() => LeagueRegistry::builtin().with_enabled(&ids),
            _ => LeagueRegistry::builtin(),
        };

        Self {
            api_url: get("TIPSTER_API_URL").unwrap_or_else(|| API_FOOTBALL_URL.to_owned()),
            api_proxy: get("TIPSTER_API_PROXY"),
            api_key: get("TIPSTER_API_KEY"),
            season: get("TIPSTER_SEASON")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or_else(|| current_season(Utc::now())),
            registry,
            data_dir: get("TIPSTER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| default_data_dir(&get)),
            results_days: get("TIPSTER_RESULTS_DAYS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_RESULTS_DAYS),
            tip_sources: get("TIPSTER_TIP_SOURCES")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(ToString::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    pub fn api(&self) -> FootballApi {
        let api = match &self.api_proxy {
            Some(proxy) => FootballApi::proxy(proxy),
            None => FootballApi::direct(&self.api_url, self.api_key.clone()),
        };
        api.with_registry(self.registry.clone())
    }

    pub fn leagues(&self) -> Vec<LeagueId> {
        self.registry.enabled_ids()
    }
}

fn parse_leagues(value: &str) -> Vec<LeagueId> {
    value
        .split(',')
        .filter_map(|id| id.trim().parse().ok())
        .collect()
}

fn default_data_dir(get: &impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(data_home) = get("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join("tipster");
    }
    if let Some(home) = get("HOME") {
        return PathBuf::from(home).join(".local").join("share").join("tipster");
    }
    PathBuf::from("tipster-data")
}

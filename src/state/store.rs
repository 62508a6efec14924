use anyhow::{Context, Result};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tipster_core::client::{ApiError, ApiResult};
use tipster_core::source::PredictionSource;
use tipster_core::{Competition, Diagnostic, Fixture, Participant, Prediction};

/// JSON files under the data directory:
///
/// ```text
/// tips/*.json            arrays of tips, read in file-name order
/// competitions.json      competition definitions
/// snapshots/<id>.json    fixtures of a finished competition
/// fixtures/*.json        fixture batches used by --offline
/// ```
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
    extra_sources: Vec<String>,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extra_sources: Vec::new(),
        }
    }

    /// Tip files or http(s) URLs read after `tips/`.
    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.extra_sources = sources;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every tip in arrival order: `tips/` files by name, then extra sources.
    /// Unreadable sources are skipped with a warning.
    pub fn tips(&self) -> Vec<Prediction> {
        let mut sources: Vec<String> = json_files(&self.root.join("tips"))
            .into_iter()
            .map(|p| p.display().to_string())
            .collect();
        sources.extend(self.extra_sources.iter().cloned());

        let mut tips = Vec::new();
        for source in sources {
            match load_tips_source(&source) {
                Ok(loaded) => {
                    debug!("{} tips from {source}", loaded.len());
                    tips.extend(loaded);
                }
                Err(e) => warn!("{e}"),
            }
        }
        tips
    }

    /// [`Self::tips`] off the async runtime; URL sources use a blocking client.
    pub async fn load_tips(&self) -> ApiResult<Vec<Prediction>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.tips())
            .await
            .map_err(|e| ApiError::Other(format!("tip loader stopped: {e}")))
    }

    /// Distinct tipsters in arrival order, named by their user id.
    pub fn tipsters(tips: &[Prediction]) -> Vec<Participant> {
        let mut seen = HashSet::new();
        tips.iter()
            .filter(|t| seen.insert(t.user_id.as_str()))
            .map(|t| Participant::new(&t.user_id, &t.user_id))
            .collect()
    }

    /// Competition definitions with any cached snapshot attached. A missing
    /// file means no competitions.
    pub fn competitions(&self) -> Result<Vec<Competition>> {
        let path = self.root.join("competitions.json");
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let mut competitions: Vec<Competition> = serde_json::from_str(&content)
            .with_context(|| format!("invalid competitions file {}", path.display()))?;

        for competition in &mut competitions {
            competition.cached_fixtures = self.snapshot(&competition.id).unwrap_or_default();
        }
        Ok(competitions)
    }

    pub fn competition(&self, id: &str) -> Result<Competition> {
        self.competitions()?
            .into_iter()
            .find(|c| c.id == id)
            .with_context(|| format!("no competition with id {id:?}"))
    }

    fn snapshot_path(&self, competition_id: &str) -> PathBuf {
        let safe: String = competition_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join("snapshots").join(format!("{safe}.json"))
    }

    pub fn snapshot(&self, competition_id: &str) -> Option<Vec<Fixture>> {
        let path = self.snapshot_path(competition_id);
        let content = fs::read_to_string(&path).ok()?;
        let fixtures: Vec<Fixture> = read_records(&content, &path.display().to_string());
        (!fixtures.is_empty()).then_some(fixtures)
    }

    /// Freeze the fixtures of a finished competition.
    pub fn save_snapshot(&self, competition_id: &str, fixtures: &[Fixture]) -> Result<()> {
        let path = self.snapshot_path(competition_id);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(fixtures)?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        debug!("snapshot of {competition_id} written to {}", path.display());
        Ok(())
    }

    /// Every stored snapshot, one batch per competition.
    pub fn all_snapshots(&self) -> Vec<Vec<Fixture>> {
        json_files(&self.root.join("snapshots"))
            .iter()
            .filter_map(|path| {
                let content = fs::read_to_string(path).ok()?;
                Some(read_records(&content, &path.display().to_string()))
            })
            .collect()
    }

    /// Local fixture batches for offline runs, one per file.
    pub fn offline_fixtures(&self) -> Vec<Vec<Fixture>> {
        json_files(&self.root.join("fixtures"))
            .iter()
            .filter_map(|path| match fs::read_to_string(path) {
                Ok(content) => Some(read_records(&content, &path.display().to_string())),
                Err(e) => {
                    warn!("could not read {}: {e}", path.display());
                    None
                }
            })
            .collect()
    }
}

impl PredictionSource for DataStore {
    async fn fetch_predictions(&self, user_id: &str) -> ApiResult<Vec<Prediction>> {
        let mut tips = self.load_tips().await?;
        tips.retain(|t| t.user_id == user_id);
        Ok(tips)
    }
}

fn json_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    files.sort();
    files
}

/// A file or http(s) URL holding a JSON array of tips.
fn load_tips_source(source: &str) -> Result<Vec<Prediction>, String> {
    let content = if source.starts_with("http://") || source.starts_with("https://") {
        reqwest::blocking::get(source)
            .and_then(|r| r.error_for_status())
            .map_err(|e| format!("{source}: fetch failed: {e}"))?
            .text()
            .map_err(|e| format!("{source}: read body failed: {e}"))?
    } else {
        fs::read_to_string(source).map_err(|e| format!("{source}: read failed: {e}"))?
    };
    let records = parse_array(&content, source)?;
    Ok(parse_records(records, source))
}

/// The top-level JSON array of `content`.
fn parse_array(content: &str, source: &str) -> Result<Vec<Value>, String> {
    serde_json::from_str(content).map_err(|e| format!("{source}: expected a JSON array: {e}"))
}

/// [`parse_array`] then [`parse_records`]; an unreadable file yields nothing.
fn read_records<T: DeserializeOwned>(content: &str, source: &str) -> Vec<T> {
    match parse_array(content, source) {
        Ok(records) => parse_records(records, source),
        Err(e) => {
            warn!("{e}");
            Vec::new()
        }
    }
}

/// Decode records one by one, skipping the ones that do not fit.
fn parse_records<T: DeserializeOwned>(records: Vec<Value>, source: &str) -> Vec<T> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| match serde_json::from_value(record) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(
                    "{}",
                    Diagnostic::MalformedRecord {
                        source: format!("{source} #{i}"),
                        reason: e.to_string(),
                    }
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tipster_core::{MatchStatus, Score, Selection};

    /// Fresh directory under the system temp dir, removed on drop.
    struct TempDir(PathBuf);

    impl TempDir {
        fn new(name: &str) -> Self {
            let path = std::env::temp_dir().join(format!("tipster-{name}-{}", std::process::id()));
            let _ = fs::remove_dir_all(&path);
            fs::create_dir_all(&path).unwrap();
            Self(path)
        }

        fn write(&self, rel: &str, content: &str) {
            let path = self.0.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn tips_are_read_in_file_order_and_bad_records_skipped() {
        let dir = TempDir::new("tips");
        dir.write(
            "tips/2024-11-02.json",
            r#"[{"userId": "ann", "matchId": 7, "homeScore": 2, "awayScore": 2, "odds": {"H": 2.0, "U": 3.1, "B": 3.9}}]"#,
        );
        dir.write(
            "tips/2024-11-01.json",
            r#"[
                {"userId": "ann", "fixtureId": 7, "homeScore": 1, "awayScore": 0},
                {"userId": "bob", "fixtureId": 7, "homeScore": "two", "awayScore": 0},
                {"userId": "bob", "fixtureId": 8, "homeScore": 0, "awayScore": 0, "odds": {"home": 2.5, "draw": 3.0, "away": 2.9}}
            ]"#,
        );
        dir.write("tips/notes.txt", "ignored");

        let store = DataStore::new(&dir.0);
        let tips = store.tips();

        assert_eq!(tips.len(), 3);
        assert_eq!((tips[0].user_id.as_str(), tips[0].home_score), ("ann", 1));
        assert_eq!(tips[1].fixture_id, 8);
        assert_eq!(tips[2].home_score, 2);
        assert_eq!(tips[1].odds.map(|o| o.away), Some(2.9));

        let names: Vec<_> = DataStore::tipsters(&tips).into_iter().map(|p| p.user_id).collect();
        assert_eq!(names, vec!["ann", "bob"]);
    }

    #[test]
    fn competitions_pick_up_snapshots() {
        let dir = TempDir::new("competitions");
        dir.write(
            "competitions.json",
            r#"[
                {"id": "cup", "name": "Cup night", "selection": {"mode": "matchIds", "ids": [1, 2]}},
                {"id": "pl", "name": "PL", "selection": {"mode": "leagues", "leagues": [39]}}
            ]"#,
        );
        let store = DataStore::new(&dir.0);
        let finished = Fixture {
            id: 1,
            home_team: "A".into(),
            away_team: "B".into(),
            league: 39,
            kickoff: Utc.with_ymd_and_hms(2024, 11, 2, 15, 0, 0).unwrap(),
            status: MatchStatus::Finished,
            result: Some(Score::new(1, 1)),
            ..Default::default()
        };

        store.save_snapshot("cup", &[finished.clone()]).unwrap();
        let competitions = store.competitions().unwrap();

        assert_eq!(competitions.len(), 2);
        assert_eq!(competitions[0].cached_fixtures, vec![finished]);
        assert!(competitions[1].cached_fixtures.is_empty());
        assert!(matches!(competitions[1].selection, Selection::Leagues { .. }));
        assert!(store.competition("nope").is_err());
        assert_eq!(store.all_snapshots().len(), 1);
    }

    #[test]
    fn tip_source_must_hold_an_array() {
        let dir = TempDir::new("tip-source");
        dir.write("object.json", r#"{"userId": "ann", "fixtureId": 1, "homeScore": 1, "awayScore": 0}"#);
        dir.write(
            "array.json",
            r#"[{"userId": "ann", "fixtureId": 1, "homeScore": 1, "awayScore": 0}, {"userId": 5}]"#,
        );
        let path = |name: &str| dir.0.join(name).display().to_string();

        let err = load_tips_source(&path("object.json")).unwrap_err();
        assert!(err.contains("expected a JSON array"));
        assert_eq!(load_tips_source(&path("array.json")).unwrap().len(), 1);

        let store = DataStore::new(dir.0.join("none")).with_sources(vec![path("object.json"), path("array.json")]);
        assert_eq!(store.tips().len(), 1);
    }

    #[test]
    fn missing_files_mean_empty_data() {
        let dir = TempDir::new("empty");
        let store = DataStore::new(&dir.0);

        assert!(store.tips().is_empty());
        assert!(store.competitions().unwrap().is_empty());
        assert!(store.offline_fixtures().is_empty());
        assert!(store.snapshot("x").is_none());
    }

    #[test]
    fn offline_batches_keep_records_without_id_for_merge() {
        let dir = TempDir::new("offline");
        dir.write(
            "fixtures/upcoming.json",
            r#"[
                {"id": 5, "homeTeam": "A", "awayTeam": "B", "league": 39, "commence_time": "2024-11-09T15:00:00Z", "status": "NS"},
                {"homeTeam": "C", "awayTeam": "D", "league": 39, "kickoff": "2024-11-09T17:30:00Z"},
                {"id": 6, "homeTeam": "E"}
            ]"#,
        );

        let batches = DataStore::new(&dir.0).offline_fixtures();

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[0][1].id, 0);
    }

    #[tokio::test]
    async fn prediction_source_filters_by_user() {
        let dir = TempDir::new("source");
        dir.write(
            "tips/a.json",
            r#"[{"userId": "ann", "fixtureId": 1, "homeScore": 1, "awayScore": 0},
                {"userId": "bob", "fixtureId": 1, "homeScore": 0, "awayScore": 0}]"#,
        );

        let tips = DataStore::new(&dir.0).fetch_predictions("bob").await.unwrap();

        assert_eq!(tips.len(), 1);
        assert_eq!(tips[0].away_score, 0);
    }
}

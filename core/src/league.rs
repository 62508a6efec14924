use crate::{LeagueId, Round};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a league names its rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundKind {
    /// "Regular Season - 10": rounds are compared by their number.
    #[default]
    Numeric,
    /// "League Stage - Matchday 3": rounds are compared by the exact label.
    Labeled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub id: LeagueId,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub round_kind: RoundKind,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl League {
    pub fn new(id: LeagueId, name: &str, display_name: &str, round_kind: RoundKind) -> Self {
        Self {
            id,
            name: name.to_owned(),
            display_name: display_name.to_owned(),
            round_kind,
            enabled: true,
        }
    }
}

/// Immutable id → league table. Built once and passed to whoever needs
/// league names or round schemes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeagueRegistry {
    leagues: BTreeMap<LeagueId, League>,
}

impl LeagueRegistry {
    pub fn new(leagues: impl IntoIterator<Item = League>) -> Self {
        Self {
            leagues: leagues.into_iter().map(|l| (l.id, l)).collect(),
        }
    }

    pub fn get(&self, id: LeagueId) -> Option<&League> {
        self.leagues.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &League> {
        self.leagues.values()
    }

    /// Unknown leagues fall back to numbered rounds.
    pub fn round_kind(&self, id: LeagueId) -> RoundKind {
        self.get(id).map(|l| l.round_kind).unwrap_or_default()
    }

    pub fn display_name(&self, id: LeagueId) -> String {
        self.get(id)
            .map(|l| l.display_name.clone())
            .unwrap_or_else(|| format!("League {id}"))
    }

    pub fn enabled_ids(&self) -> Vec<LeagueId> {
        self.leagues
            .values()
            .filter(|l| l.enabled)
            .map(|l| l.id)
            .collect()
    }

    pub fn resolve_round(&self, league: LeagueId, label: &str) -> Option<Round> {
        Round::resolve(label, self.round_kind(league))
    }

    /// Keep only the given leagues enabled; ids not yet known are added as
    /// numbered-round leagues.
    pub fn with_enabled(mut self, ids: &[LeagueId]) -> Self {
        for league in self.leagues.values_mut() {
            league.enabled = ids.contains(&league.id);
        }
        for &id in ids {
            self.leagues.entry(id).or_insert_with(|| {
                let name = format!("League {id}");
                League::new(id, &name, &name, RoundKind::Numeric)
            });
        }
        self
    }
}

impl LeagueRegistry {
    pub fn builtin() -> Self {
        use RoundKind::{Labeled, Numeric};
        let mut leagues = vec![
            League::new(39, "Premier League", "Premier League", Numeric),
            League::new(2, "Champions League", "UEFA Champions League", Labeled),
            League::new(3, "Europa League", "UEFA Europa League", Labeled),
            League::new(32, "WC Qualification Europe", "World Cup - Qualification Europe", Numeric),
            League::new(48, "EFL Cup", "EFL Cup", Labeled),
            League::new(135, "Serie A", "Serie A", Numeric),
            League::new(78, "Bundesliga", "Bundesliga", Numeric),
            League::new(140, "La Liga", "La Liga", Numeric),
            League::new(61, "Ligue 1", "Ligue 1", Numeric),
        ];
        // Listed for names only; not fetched unless enabled explicitly.
        for league in leagues.iter_mut().filter(|l| matches!(l.id, 78 | 140 | 61)) {
            league.enabled = false;
        }
        Self::new(leagues)
    }
}

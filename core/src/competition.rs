use crate::dates::within_days;
use crate::diagnostics::{self, Diagnostic, DiagnosticSink};
use crate::merge::fixture_order;
use crate::{Fixture, FixtureId, LeagueId, LeagueRegistry, Participant, Round};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// A friend-group competition: a named subset of fixtures with its own table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competition {
    pub id: String,
    pub name: String,
    pub selection: Selection,
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Fixtures frozen once the competition finished. Filled from the
    /// snapshot store, never serialized back into the competition list.
    #[serde(skip)]
    pub cached_fixtures: Vec<Fixture>,
}

impl Competition {
    pub fn has_cached_snapshot(&self) -> bool {
        !self.cached_fixtures.is_empty()
    }

    pub fn status(&self, matched: &[Fixture], now: DateTime<Utc>) -> CompetitionStatus {
        competition_status(matched, now, self.has_cached_snapshot())
    }
}

/// Which fixtures belong to a competition. Exactly one mode applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum Selection {
    /// Explicit allowlist of fixture ids.
    MatchIds { ids: Vec<FixtureId> },
    /// Per-league round picks. A league missing from `rounds` contributes nothing.
    Rounds {
        leagues: Vec<LeagueId>,
        rounds: BTreeMap<LeagueId, Vec<RoundKey>>,
    },
    /// Every fixture of the leagues kicking off between `start` and `end`,
    /// both days inclusive.
    DateRange {
        leagues: Vec<LeagueId>,
        start: NaiveDate,
        end: NaiveDate,
    },
    /// Every fixture of the leagues.
    Leagues { leagues: Vec<LeagueId> },
}

impl Selection {
    pub fn leagues(&self) -> Vec<LeagueId> {
        match self {
            Selection::MatchIds { .. } => Vec::new(),
            Selection::Rounds { leagues, rounds } if leagues.is_empty() => {
                rounds.keys().copied().collect()
            }
            Selection::Rounds { leagues, .. }
            | Selection::DateRange { leagues, .. }
            | Selection::Leagues { leagues } => leagues.clone(),
        }
    }
}

/// A selected round as stored: a matchday number for numbered leagues, the
/// exact stage label for the others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoundKey {
    Number(u32),
    Label(String),
}

impl RoundKey {
    pub fn matches(&self, round: &Round) -> bool {
        match (self, round) {
            (RoundKey::Number(n), Round::Numeric(m)) => n == m,
            (RoundKey::Label(s), Round::Numeric(m)) => s.trim().parse::<u32>() == Ok(*m),
            (RoundKey::Label(s), Round::Labeled(label)) => s == label,
            (RoundKey::Number(_), Round::Labeled(_)) => false,
        }
    }
}

impl fmt::Display for RoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundKey::Number(n) => write!(f, "{n}"),
            RoundKey::Label(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionStatus {
    Upcoming,
    Active,
    Completed,
}

impl fmt::Display for CompetitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompetitionStatus::Upcoming => "upcoming",
            CompetitionStatus::Active => "active",
            CompetitionStatus::Completed => "completed",
        })
    }
}

/// Selects the fixtures of a competition. Round schemes come from the
/// registry, day boundaries from `tz`; nothing else influences the result.
#[derive(Debug, Clone)]
pub struct CompetitionMatcher<'a, Tz: TimeZone> {
    registry: &'a LeagueRegistry,
    tz: Tz,
}

impl<'a, Tz: TimeZone> CompetitionMatcher<'a, Tz> {
    pub fn new(registry: &'a LeagueRegistry, tz: Tz) -> Self {
        Self { registry, tz }
    }

    /// Matched fixtures in kickoff order, one per id.
    pub fn match_fixtures(&self, competition: &Competition, fixtures: &[Fixture]) -> Vec<Fixture> {
        self.select(&competition.selection, fixtures)
    }

    pub fn select(&self, selection: &Selection, fixtures: &[Fixture]) -> Vec<Fixture> {
        let mut seen: HashSet<FixtureId> = HashSet::new();
        let mut matched: Vec<Fixture> = match selection {
            Selection::MatchIds { ids } => {
                let mut by_id: HashMap<FixtureId, &Fixture> = HashMap::new();
                for fixture in fixtures {
                    by_id.entry(fixture.id).or_insert(fixture);
                }
                ids.iter()
                    .filter_map(|id| by_id.get(id))
                    .filter(|f| seen.insert(f.id))
                    .map(|f| (*f).clone())
                    .collect()
            }
            _ => {
                let leagues = selection.leagues();
                fixtures
                    .iter()
                    .filter(|f| leagues.contains(&f.league))
                    .filter(|f| self.passes_constraint(selection, f))
                    .filter(|f| seen.insert(f.id))
                    .cloned()
                    .collect()
            }
        };
        matched.sort_by(fixture_order);
        matched
    }

    fn passes_constraint(&self, selection: &Selection, fixture: &Fixture) -> bool {
        match selection {
            Selection::Rounds { rounds, .. } => {
                let Some(wanted) = rounds.get(&fixture.league) else {
                    return false;
                };
                match fixture.resolved_round(self.registry) {
                    Some(round) => wanted.iter().any(|key| key.matches(&round)),
                    None => false,
                }
            }
            Selection::DateRange { start, end, .. } => {
                within_days(&fixture.kickoff, *start, *end, &self.tz)
            }
            Selection::Leagues { .. } | Selection::MatchIds { .. } => true,
        }
    }
}

/// Lifecycle of a competition from its matched fixtures.
///
/// An empty match set is `Completed` when a finished snapshot was cached
/// earlier and `Upcoming` otherwise.
pub fn competition_status(
    matched: &[Fixture],
    now: DateTime<Utc>,
    has_cached_snapshot: bool,
) -> CompetitionStatus {
    competition_status_with(matched, now, has_cached_snapshot, &mut ())
}

pub fn competition_status_with(
    matched: &[Fixture],
    now: DateTime<Utc>,
    has_cached_snapshot: bool,
    sink: &mut dyn DiagnosticSink,
) -> CompetitionStatus {
    if matched.is_empty() {
        return if has_cached_snapshot {
            CompetitionStatus::Completed
        } else {
            CompetitionStatus::Upcoming
        };
    }

    for fixture in matched.iter().filter(|f| f.has_inconsistent_status()) {
        diagnostics::emit(
            sink,
            Diagnostic::InconsistentStatus {
                fixture: fixture.id,
                status: fixture.status.clone(),
            },
        );
    }

    if matched.iter().all(Fixture::is_decided) {
        CompetitionStatus::Completed
    } else if !matched.iter().any(|f| f.is_under_way(now)) {
        CompetitionStatus::Upcoming
    } else {
        CompetitionStatus::Active
    }
}

use crate::merge::fixture_order;
use crate::{Fixture, LeagueId, LeagueRegistry, Round, RoundKey};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Summary of one round of a league, as offered when building a
/// round-based competition.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundInfo {
    pub league: LeagueId,
    pub round: Round,
    pub fixtures: usize,
    pub first_kickoff: DateTime<Utc>,
    pub last_kickoff: DateTime<Utc>,
    pub has_started: bool,
}

impl RoundInfo {
    pub fn key(&self) -> RoundKey {
        match &self.round {
            Round::Numeric(n) => RoundKey::Number(*n),
            Round::Labeled(label) => RoundKey::Label(label.clone()),
        }
    }
}

fn by_round<'a>(
    fixtures: &'a [Fixture],
    league: LeagueId,
    registry: &LeagueRegistry,
) -> BTreeMap<Round, Vec<&'a Fixture>> {
    let mut rounds: BTreeMap<Round, Vec<&Fixture>> = BTreeMap::new();
    for fixture in fixtures.iter().filter(|f| f.league == league) {
        if let Some(round) = fixture.resolved_round(registry) {
            rounds.entry(round).or_default().push(fixture);
        }
    }
    rounds
}

/// Rounds of `league` present in `fixtures`, earliest first. Fixtures whose
/// round cannot be resolved are left out.
pub fn available_rounds(
    fixtures: &[Fixture],
    league: LeagueId,
    registry: &LeagueRegistry,
    now: DateTime<Utc>,
) -> Vec<RoundInfo> {
    let mut rounds: Vec<RoundInfo> = by_round(fixtures, league, registry)
        .into_iter()
        .filter_map(|(round, members)| {
            let first_kickoff = members.iter().map(|f| f.kickoff).min()?;
            let last_kickoff = members.iter().map(|f| f.kickoff).max()?;
            Some(RoundInfo {
                league,
                has_started: members.iter().any(|f| f.is_under_way(now)),
                fixtures: members.len(),
                round,
                first_kickoff,
                last_kickoff,
            })
        })
        .collect();
    rounds.sort_by(|a, b| a.first_kickoff.cmp(&b.first_kickoff).then_with(|| a.round.cmp(&b.round)));
    rounds
}

/// The round of `league` whose earliest not-yet-started fixture kicks off
/// soonest, with all of that round's fixtures in kickoff order.
pub fn next_round(
    fixtures: &[Fixture],
    league: LeagueId,
    registry: &LeagueRegistry,
    now: DateTime<Utc>,
) -> Option<(Round, Vec<Fixture>)> {
    let (round, _) = by_round(fixtures, league, registry)
        .into_iter()
        .filter_map(|(round, members)| {
            members
                .iter()
                .filter(|f| !f.is_under_way(now))
                .map(|f| f.kickoff)
                .min()
                .map(|soonest| (round, soonest))
        })
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)))?;

    let mut members: Vec<Fixture> = fixtures
        .iter()
        .filter(|f| f.league == league && f.resolved_round(registry).as_ref() == Some(&round))
        .cloned()
        .collect();
    members.sort_by(fixture_order);
    members.dedup_by_key(|f| f.id);
    Some((round, members))
}

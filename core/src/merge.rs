use crate::diagnostics::{self, Diagnostic, DiagnosticSink};
use crate::{Fixture, FixtureId};
use log::debug;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Reconcile overlapping fixture batches into one record per fixture id.
///
/// Batches are processed in the order given. Inside a batch the first
/// occurrence of an id wins. A later batch only enriches what an earlier
/// one produced: missing result, odds and metadata are filled in, status
/// only moves forward, and a result is never dropped.
///
/// Output keeps first-seen order; use [`sort_fixtures`] for display order.
pub fn merge(batches: &[Vec<Fixture>]) -> Vec<Fixture> {
    merge_with(batches, &mut ())
}

/// [`merge`], reporting skipped records to `sink`.
pub fn merge_with(batches: &[Vec<Fixture>], sink: &mut dyn DiagnosticSink) -> Vec<Fixture> {
    let mut merged: Vec<Fixture> = Vec::new();
    let mut index: HashMap<FixtureId, usize> = HashMap::new();

    for (batch_no, batch) in batches.iter().enumerate() {
        let mut seen_in_batch: HashSet<FixtureId> = HashSet::new();

        for (position, fixture) in batch.iter().enumerate() {
            if !fixture.has_id() {
                diagnostics::emit(
                    sink,
                    Diagnostic::MissingFixtureId {
                        batch: batch_no,
                        position,
                    },
                );
                continue;
            }

            if !seen_in_batch.insert(fixture.id) {
                debug!("duplicate fixture {} in batch {batch_no} ignored", fixture.id);
                continue;
            }

            match index.get(&fixture.id) {
                Some(&i) => enrich(&mut merged[i], fixture),
                None => {
                    index.insert(fixture.id, merged.len());
                    merged.push(fixture.clone());
                }
            }
        }
    }

    merged
}

/// Fold a newer observation of the same fixture into `existing`.
fn enrich(existing: &mut Fixture, incoming: &Fixture) {
    let existing_progress = existing.status.progress();
    let incoming_progress = incoming.status.progress();

    if incoming.result.is_some() && incoming_progress >= existing_progress {
        existing.result = incoming.result;
    }

    if incoming_progress > existing_progress || (incoming.status.is_live() && existing.status.is_live())
    {
        existing.status = incoming.status.clone();
        if incoming.elapsed.is_some() {
            existing.elapsed = incoming.elapsed;
        }
    }

    if existing.odds.is_none() {
        existing.odds = incoming.odds;
    }

    // Kickoff moves for rescheduled matches; trust the fresher record while
    // the fixture has not started.
    if existing_progress <= 1 && incoming_progress <= 1 {
        existing.kickoff = incoming.kickoff;
    }

    fill(&mut existing.home_logo, &incoming.home_logo);
    fill(&mut existing.away_logo, &incoming.away_logo);
    fill(&mut existing.league_name, &incoming.league_name);
    fill(&mut existing.round_label, &incoming.round_label);
    fill(&mut existing.round, &incoming.round);

    if existing.home_team.is_empty() {
        existing.home_team = incoming.home_team.clone();
    }
    if existing.away_team.is_empty() {
        existing.away_team = incoming.away_team.clone();
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, incoming: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(incoming);
    }
}

/// Kickoff ascending, id ascending on ties.
pub fn fixture_order(a: &Fixture, b: &Fixture) -> Ordering {
    a.kickoff.cmp(&b.kickoff).then(a.id.cmp(&b.id))
}

pub fn sort_fixtures(fixtures: &mut [Fixture]) {
    fixtures.sort_by(fixture_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MatchStatus, Odds, Score};
    use chrono::{TimeZone, Utc};

    fn fixture(id: FixtureId) -> Fixture {
        Fixture {
            id,
            home_team: "Arsenal".into(),
            away_team: "Chelsea".into(),
            league: 39,
            kickoff: Utc.with_ymd_and_hms(2024, 11, 2, 15, 0, 0).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn later_batch_fills_missing_odds() {
        let f1 = Fixture {
            home_logo: Some("ars.png".into()),
            ..fixture(1)
        };
        let f1_with_odds = Fixture {
            home_team: "Arsenal FC".into(),
            odds: Some(Odds::new(1.8, 3.6, 4.2)),
            ..fixture(1)
        };

        let merged = merge(&[vec![f1.clone()], vec![f1_with_odds]]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].odds, Some(Odds::new(1.8, 3.6, 4.2)));
        assert_eq!(merged[0].home_team, "Arsenal");
        assert_eq!(merged[0].home_logo.as_deref(), Some("ars.png"));
    }

    #[test]
    fn duplicate_within_batch_keeps_first() {
        let first = Fixture {
            odds: Some(Odds::new(2.0, 3.0, 4.0)),
            ..fixture(7)
        };
        let second = Fixture {
            odds: Some(Odds::new(9.0, 9.0, 9.0)),
            ..fixture(7)
        };

        let merged = merge(&[vec![first, second]]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].odds, Some(Odds::new(2.0, 3.0, 4.0)));
    }

    #[test]
    fn result_is_never_dropped() {
        let finished = Fixture {
            status: MatchStatus::Finished,
            result: Some(Score::new(2, 1)),
            ..fixture(3)
        };
        let stale = fixture(3);

        let merged = merge(&[vec![finished], vec![stale]]);

        assert_eq!(merged[0].result, Some(Score::new(2, 1)));
        assert_eq!(merged[0].status, MatchStatus::Finished);
    }

    #[test]
    fn results_batch_completes_upcoming_record() {
        let upcoming = fixture(4);
        let played = Fixture {
            status: MatchStatus::Finished,
            result: Some(Score::new(0, 0)),
            ..fixture(4)
        };

        let merged = merge(&[vec![upcoming], vec![played]]);

        assert_eq!(merged[0].status, MatchStatus::Finished);
        assert_eq!(merged[0].result, Some(Score::new(0, 0)));
    }

    #[test]
    fn live_result_does_not_overwrite_final() {
        let final_score = Fixture {
            status: MatchStatus::Finished,
            result: Some(Score::new(3, 1)),
            ..fixture(5)
        };
        let live = Fixture {
            status: MatchStatus::SecondHalf,
            result: Some(Score::new(2, 1)),
            elapsed: Some(70),
            ..fixture(5)
        };

        let merged = merge(&[vec![final_score], vec![live]]);

        assert_eq!(merged[0].result, Some(Score::new(3, 1)));
        assert_eq!(merged[0].status, MatchStatus::Finished);
        assert_eq!(merged[0].elapsed, None);
    }

    #[test]
    fn fixtures_without_id_are_reported() {
        let mut reported = Vec::new();
        let anonymous = fixture(0);

        let merged = merge_with(&[vec![fixture(1), anonymous]], &mut |d: Diagnostic| reported.push(d));

        assert_eq!(merged.len(), 1);
        assert_eq!(
            reported,
            vec![Diagnostic::MissingFixtureId {
                batch: 0,
                position: 1
            }]
        );
    }

    #[test]
    fn inputs_are_left_untouched() {
        let batches = vec![
            vec![fixture(1)],
            vec![Fixture {
                odds: Some(Odds::new(1.5, 4.0, 6.0)),
                ..fixture(1)
            }],
        ];
        let before = batches.clone();

        let _ = merge(&batches);

        assert_eq!(batches, before);
    }

    #[test]
    fn sort_breaks_kickoff_ties_by_id() {
        let later = Fixture {
            kickoff: Utc.with_ymd_and_hms(2024, 11, 3, 14, 0, 0).unwrap(),
            ..fixture(1)
        };
        let mut fixtures = vec![later, fixture(9), fixture(2)];

        sort_fixtures(&mut fixtures);

        let ids: Vec<_> = fixtures.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2, 9, 1]);
    }
}

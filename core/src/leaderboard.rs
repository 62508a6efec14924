use crate::merge::fixture_order;
use crate::scoring::{is_exact, points};
use crate::{Fixture, FixtureId, Prediction, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user_id: UserId,
    #[serde(default)]
    pub display_name: String,
}

impl Participant {
    pub fn new(user_id: &str, display_name: &str) -> Self {
        Self {
            user_id: user_id.to_owned(),
            display_name: display_name.to_owned(),
        }
    }

    /// Display name, or the user id when none was set.
    pub fn name(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.user_id
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub display_name: String,
    /// Settled points, rounded to two decimals; accumulated at full precision.
    pub total_points: f64,
    /// Provisional points from matches still in play, kept out of the total.
    pub live_points: f64,
    pub exact_hits: usize,
    pub correct_outcomes: usize,
    pub tips_counted: usize,
}

/// One row of a participant's per-fixture breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownRow {
    pub fixture: Fixture,
    pub prediction: Option<Prediction>,
    pub points: f64,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Latest tip per (user, fixture). Later entries in `predictions` replace
/// earlier ones.
fn latest_tips(predictions: &[Prediction]) -> HashMap<(&str, FixtureId), &Prediction> {
    let mut latest = HashMap::new();
    for tip in predictions {
        latest.insert((tip.user_id.as_str(), tip.fixture_id), tip);
    }
    latest
}

/// Matched fixtures keyed and ordered by id, first record per id.
fn fixtures_by_id(fixtures: &[Fixture]) -> BTreeMap<FixtureId, &Fixture> {
    let mut by_id = BTreeMap::new();
    for fixture in fixtures {
        by_id.entry(fixture.id).or_insert(fixture);
    }
    by_id
}

/// Ranked table for one competition.
///
/// Only tips on `matched` fixtures count. Every participant appears, with
/// zero points if they tipped nothing in scope. Points on fixtures still in
/// play go to `live_points` and do not affect the ranking. Sorted by rounded
/// total descending, then display name, then user id.
pub fn leaderboard(
    participants: &[Participant],
    predictions: &[Prediction],
    matched: &[Fixture],
) -> Vec<LeaderboardEntry> {
    let tips = latest_tips(predictions);
    let fixtures = fixtures_by_id(matched);

    let mut entries: Vec<LeaderboardEntry> = participants
        .iter()
        .map(|participant| {
            let mut total = 0.0;
            let mut live = 0.0;
            let mut exact_hits = 0;
            let mut correct_outcomes = 0;
            let mut tips_counted = 0;

            for (id, fixture) in &fixtures {
                let Some(tip) = tips.get(&(participant.user_id.as_str(), *id)) else {
                    continue;
                };
                tips_counted += 1;
                let earned = points(tip, fixture);
                if fixture.status.is_live() {
                    live += earned;
                    continue;
                }
                total += earned;
                if let Some(result) = fixture.result {
                    if tip.outcome() == result.outcome() {
                        correct_outcomes += 1;
                    }
                    if is_exact(tip, fixture) {
                        exact_hits += 1;
                    }
                }
            }

            LeaderboardEntry {
                user_id: participant.user_id.clone(),
                display_name: participant.name().to_owned(),
                total_points: round2(total),
                live_points: round2(live),
                exact_hits,
                correct_outcomes,
                tips_counted,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.total_points
            .total_cmp(&a.total_points)
            .then_with(|| a.display_name.cmp(&b.display_name))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    entries
}

/// Every matched fixture with the user's tip (if any) and what it earned,
/// in kickoff order.
pub fn breakdown(user_id: &str, predictions: &[Prediction], matched: &[Fixture]) -> Vec<BreakdownRow> {
    let tips = latest_tips(predictions);
    let mut rows: Vec<BreakdownRow> = fixtures_by_id(matched)
        .into_values()
        .map(|fixture| {
            let prediction = tips.get(&(user_id, fixture.id)).map(|tip| (*tip).clone());
            let points = prediction.as_ref().map_or(0.0, |tip| points(tip, fixture));
            BreakdownRow {
                fixture: fixture.clone(),
                prediction,
                points,
            }
        })
        .collect();
    rows.sort_by(|a, b| fixture_order(&a.fixture, &b.fixture));
    rows
}

/// Season totals for one user's tips against every known fixture.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub total_points: f64,
    pub exact_hits: usize,
    /// Tips on decided fixtures that earned something.
    pub tips_with_points: usize,
    /// Tips on decided fixtures that earned nothing.
    pub tips_without_points: usize,
    /// Tips whose fixture has no result yet.
    pub pending: usize,
    /// Tips whose fixture is unknown, e.g. from an earlier season.
    pub orphaned: usize,
}

impl ScoreSummary {
    pub fn compute(tips: &[Prediction], fixtures: &[Fixture]) -> Self {
        let by_id = fixtures_by_id(fixtures);
        let latest = latest_tips(tips);
        let mut ordered: Vec<&Prediction> = latest.into_values().collect();
        ordered.sort_by(|a, b| (a.fixture_id, &a.user_id).cmp(&(b.fixture_id, &b.user_id)));

        let mut summary = ScoreSummary::default();
        let mut total = 0.0;

        for tip in ordered {
            let Some(fixture) = by_id.get(&tip.fixture_id) else {
                summary.orphaned += 1;
                continue;
            };
            if fixture.result.is_none() {
                summary.pending += 1;
                continue;
            }
            let earned = points(tip, fixture);
            total += earned;
            if earned > 0.0 {
                summary.tips_with_points += 1;
            } else {
                summary.tips_without_points += 1;
            }
            if is_exact(tip, fixture) {
                summary.exact_hits += 1;
            }
        }

        summary.total_points = round2(total);
        summary
    }

    pub fn tips_total(&self) -> usize {
        self.tips_with_points + self.tips_without_points + self.pending + self.orphaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MatchStatus, Odds, Score};
    use chrono::{TimeZone, Utc};

    fn played(id: FixtureId, home: u32, away: u32) -> Fixture {
        Fixture {
            id,
            league: 39,
            kickoff: Utc.with_ymd_and_hms(2024, 11, 2, 15, 0, 0).unwrap() + chrono::Duration::hours(id as i64),
            status: MatchStatus::Finished,
            result: Some(Score::new(home, away)),
            ..Default::default()
        }
    }

    fn tip(user: &str, fixture: FixtureId, home: u32, away: u32, odds: Odds) -> Prediction {
        Prediction {
            user_id: user.into(),
            fixture_id: fixture,
            home_score: home,
            away_score: away,
            odds: Some(odds),
            submitted_at: None,
        }
    }

    fn odds() -> Odds {
        Odds::new(2.1, 3.3, 3.7)
    }

    #[test]
    fn participants_without_tips_are_listed_with_zero() {
        let participants = vec![Participant::new("a", "Ann"), Participant::new("b", "Bob")];
        let tips = vec![tip("a", 1, 1, 0, odds())];

        let table = leaderboard(&participants, &tips, &[played(1, 2, 0)]);

        assert_eq!(table.len(), 2);
        assert_eq!(table[0].user_id, "a");
        assert_eq!(table[0].total_points, 2.1);
        assert_eq!(table[1].user_id, "b");
        assert_eq!(table[1].total_points, 0.0);
        assert_eq!(table[1].tips_counted, 0);
    }

    #[test]
    fn tips_outside_matched_set_are_ignored() {
        let participants = vec![Participant::new("a", "Ann")];
        let tips = vec![tip("a", 1, 2, 0, odds()), tip("a", 99, 2, 0, odds())];

        let table = leaderboard(&participants, &tips, &[played(1, 2, 0)]);

        assert_eq!(table[0].total_points, 5.1);
        assert_eq!(table[0].tips_counted, 1);
        assert_eq!(table[0].exact_hits, 1);
    }

    #[test]
    fn totals_do_not_depend_on_tip_order() {
        let participants = vec![Participant::new("a", "Ann"), Participant::new("b", "Bob")];
        let fixtures = vec![played(1, 1, 0), played(2, 2, 2), played(3, 0, 3)];
        let mut tips = vec![
            tip("a", 1, 1, 0, Odds::new(1.13, 7.0, 15.0)),
            tip("a", 2, 0, 0, Odds::new(2.07, 3.11, 3.3)),
            tip("a", 3, 1, 2, Odds::new(4.4, 3.9, 1.71)),
            tip("b", 1, 3, 1, Odds::new(1.13, 7.0, 15.0)),
            tip("b", 3, 0, 3, Odds::new(4.4, 3.9, 1.71)),
        ];

        let forward = leaderboard(&participants, &tips, &fixtures);
        tips.reverse();
        let backward = leaderboard(&participants, &tips, &fixtures);

        assert_eq!(forward, backward);
        assert_eq!(forward[0].user_id, "a");
        assert_eq!(forward[0].total_points, 8.95);
        assert_eq!(forward[1].total_points, 5.84);
    }

    #[test]
    fn duplicate_tip_last_one_wins() {
        let participants = vec![Participant::new("a", "Ann")];
        let tips = vec![tip("a", 1, 0, 1, odds()), tip("a", 1, 2, 0, odds())];

        let table = leaderboard(&participants, &tips, &[played(1, 2, 0)]);

        assert_eq!(table[0].total_points, 5.1);
        assert_eq!(table[0].tips_counted, 1);
    }

    #[test]
    fn ties_break_by_name_then_id() {
        let participants = vec![
            Participant::new("z", "Cleo"),
            Participant::new("y", "Ann"),
            Participant::new("x", "Ann"),
        ];

        let table = leaderboard(&participants, &[], &[played(1, 0, 0)]);

        let order: Vec<_> = table.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(order, vec!["x", "y", "z"]);
    }

    #[test]
    fn total_is_rounded_for_display_only() {
        let participants = vec![Participant::new("a", "")];
        let fixtures: Vec<_> = (1..=3).map(|id| played(id, 1, 0)).collect();
        let tips: Vec<_> = (1..=3).map(|id| tip("a", id, 2, 0, Odds::new(1.004, 4.0, 6.0))).collect();

        let table = leaderboard(&participants, &tips, &fixtures);

        // 3 x 1.004 = 3.012; rounding each fixture first would give 3.00.
        assert_eq!(table[0].total_points, 3.01);
        assert_eq!(table[0].display_name, "a");
    }

    #[test]
    fn live_points_stay_out_of_the_settled_total() {
        let participants = vec![Participant::new("a", "Ann"), Participant::new("b", "Bob")];
        let in_play = Fixture {
            status: MatchStatus::SecondHalf,
            elapsed: Some(70),
            ..played(2, 1, 1)
        };
        let fixtures = vec![played(1, 2, 0), in_play];
        let tips = vec![
            tip("a", 1, 1, 0, odds()),
            tip("b", 1, 0, 1, odds()),
            tip("b", 2, 1, 1, odds()),
        ];

        let table = leaderboard(&participants, &tips, &fixtures);

        // Bob's exact draw is provisional and does not lift him above Ann.
        assert_eq!(table[0].user_id, "a");
        assert_eq!(table[0].total_points, 2.1);
        assert_eq!(table[0].live_points, 0.0);
        assert_eq!(table[1].total_points, 0.0);
        assert_eq!(table[1].live_points, 6.3);
        assert_eq!(table[1].exact_hits, 0);
        assert_eq!(table[1].tips_counted, 2);
    }

    #[test]
    fn breakdown_lists_every_matched_fixture() {
        let fixtures = vec![played(2, 1, 1), played(1, 2, 0)];
        let tips = vec![tip("a", 1, 2, 0, odds()), tip("b", 2, 1, 1, odds())];

        let rows = breakdown("a", &tips, &fixtures);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fixture.id, 1);
        assert!((rows[0].points - 5.1).abs() < 1e-9);
        assert!(rows[1].prediction.is_none());
        assert_eq!(rows[1].points, 0.0);
    }

    #[test]
    fn summary_counts_each_tip_once() {
        let fixtures = vec![
            played(1, 2, 0),
            played(2, 0, 1),
            Fixture {
                id: 3,
                ..Default::default()
            },
        ];
        let tips = vec![
            tip("a", 1, 2, 0, odds()),
            tip("a", 2, 1, 0, odds()),
            tip("a", 3, 1, 0, odds()),
            tip("a", 7, 1, 0, odds()),
            Prediction {
                odds: None,
                ..tip("a", 1, 2, 0, odds())
            },
        ];

        let summary = ScoreSummary::compute(&tips, &fixtures);

        // The odds-less resubmission of fixture 1 replaces the scoring tip.
        assert_eq!(summary.total_points, 0.0);
        assert_eq!(summary.tips_with_points, 0);
        assert_eq!(summary.tips_without_points, 2);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.orphaned, 1);
        assert_eq!(summary.exact_hits, 1);
        assert_eq!(summary.tips_total(), 4);
    }
}

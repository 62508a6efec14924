use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;
use tipster_core::dates::{DateGroup, format_date_range};
use tipster_core::leaderboard::BreakdownRow;
use tipster_core::rounds::RoundInfo;
use tipster_core::{
    Competition, CompetitionStatus, Fixture, LeaderboardEntry, LeagueId, LeagueRegistry, Round,
    ScoreSummary, Selection,
};

const TEAM_WIDTH: usize = 22;

/// Competition row as shown by `competitions`.
pub struct CompetitionRow<'a> {
    pub competition: &'a Competition,
    pub status: CompetitionStatus,
    pub fixtures: usize,
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn draw_fixture_groups<Tz>(groups: &[DateGroup], registry: &LeagueRegistry, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if groups.is_empty() {
        return "No fixtures in range.\n".to_string();
    }

    let mut lines = Vec::new();
    for group in groups {
        lines.push(format!("{} ({})", group.label, group.day.format("%Y-%m-%d")));
        for fixture in &group.fixtures {
            lines.push(format!("  {}", fixture_line(fixture, registry, tz)));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

fn fixture_line<Tz>(fixture: &Fixture, registry: &LeagueRegistry, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let time = fixture.kickoff.with_timezone(tz).format("%H:%M");
    let home = pad(&fixture.home_team, TEAM_WIDTH);
    let away = pad(&fixture.away_team, TEAM_WIDTH);
    let state = match (&fixture.result, fixture.status.is_live()) {
        (Some(score), true) => match fixture.elapsed {
            Some(minute) => format!("{score} {minute}'"),
            None => format!("{score} {}", fixture.status),
        },
        (Some(score), false) => format!("{score} {}", fixture.status),
        (None, _) => fixture.status.to_string(),
    };
    let odds = fixture
        .odds
        .map(|o| format!("  H {:.2} U {:.2} B {:.2}", o.home, o.draw, o.away))
        .unwrap_or_default();
    let round = fixture
        .resolved_round(registry)
        .map(|r| format!(", {r}"))
        .unwrap_or_default();

    format!(
        "{time}  {home} {away} {state:<10} [{}{round}]{odds}",
        registry.display_name(fixture.league)
    )
}

// ---------------------------------------------------------------------------
// Competitions
// ---------------------------------------------------------------------------

pub fn draw_competitions(rows: &[CompetitionRow], registry: &LeagueRegistry) -> String {
    if rows.is_empty() {
        return "No competitions defined.\n".to_string();
    }

    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        lines.push(format!(
            "{:<12} {:<24} {:<10} {:>3} fixtures  {}",
            row.competition.id,
            row.competition.name,
            row.status,
            row.fixtures,
            describe_selection(&row.competition.selection, registry)
        ));
    }
    lines.join("\n") + "\n"
}

fn describe_selection(selection: &Selection, registry: &LeagueRegistry) -> String {
    let names = |leagues: &[LeagueId]| {
        leagues
            .iter()
            .map(|id| registry.display_name(*id))
            .collect::<Vec<_>>()
            .join(", ")
    };

    match selection {
        Selection::MatchIds { ids } => format!("{} selected matches", ids.len()),
        Selection::Rounds { rounds, .. } => rounds
            .iter()
            .map(|(league, keys)| {
                let keys: Vec<String> = keys.iter().map(ToString::to_string).collect();
                format!("{} round {}", registry.display_name(*league), keys.join("/"))
            })
            .collect::<Vec<_>>()
            .join("; "),
        Selection::DateRange { leagues, start, end } => {
            format!("{} {}", names(leagues), format_date_range(*start, *end))
        }
        Selection::Leagues { leagues } => names(leagues),
    }
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

/// `live` marks the header while matched fixtures are still in play.
pub fn draw_leaderboard(
    competition: &Competition,
    status: CompetitionStatus,
    live: bool,
    entries: &[LeaderboardEntry],
) -> String {
    let header = if live {
        format!("{} [{status}] LIVE", competition.name)
    } else {
        format!("{} [{status}]", competition.name)
    };
    let mut lines = vec![
        header,
        format!(
            "{:>3}  {:<20} {:>8} {:>6} {:>8} {:>5}",
            "#", "Name", "Points", "Exact", "Outcome", "Tips"
        ),
    ];

    // Equal totals share a rank.
    let mut rank = 0;
    let mut previous: Option<f64> = None;
    for (idx, entry) in entries.iter().enumerate() {
        if previous != Some(entry.total_points) {
            rank = idx + 1;
            previous = Some(entry.total_points);
        }
        let provisional = if entry.live_points > 0.0 {
            format!("  (+{:.2})", entry.live_points)
        } else {
            String::new()
        };
        lines.push(format!(
            "{rank:>3}  {:<20} {:>8.2} {:>6} {:>8} {:>5}{provisional}",
            pad(&entry.display_name, 20),
            entry.total_points,
            entry.exact_hits,
            entry.correct_outcomes,
            entry.tips_counted
        ));
    }
    if entries.is_empty() {
        lines.push("  nobody has joined yet".to_string());
    }
    lines.join("\n") + "\n"
}

pub fn draw_breakdown(user: &str, rows: &[BreakdownRow]) -> String {
    let mut lines = vec![format!("Tips of {user}")];
    let mut total = 0.0;
    for row in rows {
        let tip = row
            .prediction
            .as_ref()
            .map(|p| format!("{}-{}", p.home_score, p.away_score))
            .unwrap_or_else(|| "-".to_string());
        let result = row
            .fixture
            .result
            .map(|s| s.to_string())
            .unwrap_or_else(|| "?".to_string());
        total += row.points;
        lines.push(format!(
            "  {} {:<36} tip {:<5} result {:<5} {:>6.2}",
            row.fixture.kickoff.format("%d.%m"),
            pad(&row.fixture.title(), 36),
            tip,
            result,
            row.points
        ));
    }
    lines.push(format!("  total {:.2}", tipster_core::leaderboard::round2(total)));
    lines.join("\n") + "\n"
}

pub fn draw_summary(user: &str, summary: &ScoreSummary) -> String {
    format!(
        "{user}: {:.2} points from {} tips\n  exact scores   {}\n  with points    {}\n  without points {}\n  pending        {}\n  unknown match  {}\n",
        summary.total_points,
        summary.tips_total(),
        summary.exact_hits,
        summary.tips_with_points,
        summary.tips_without_points,
        summary.pending,
        summary.orphaned
    )
}

// ---------------------------------------------------------------------------
// Rounds
// ---------------------------------------------------------------------------

pub fn draw_rounds(
    league: LeagueId,
    registry: &LeagueRegistry,
    rounds: &[RoundInfo],
    next: Option<&(Round, Vec<Fixture>)>,
) -> String {
    let mut lines = vec![registry.display_name(league)];
    if rounds.is_empty() {
        lines.push("  no rounds known".to_string());
    }
    for info in rounds {
        let marker = match next {
            Some((round, _)) if *round == info.round => ">",
            _ => " ",
        };
        lines.push(format!(
            "{marker} {:<32} {:>3} fixtures  {}{}",
            info.round.to_string(),
            info.fixtures,
            format_date_range(info.first_kickoff.date_naive(), info.last_kickoff.date_naive()),
            if info.has_started { "  started" } else { "" }
        ));
    }
    if let Some((round, fixtures)) = next {
        lines.push(format!("Next: {round}"));
        for fixture in fixtures {
            lines.push(format!("  {}  {}", short_time(&fixture.kickoff), fixture.title()));
        }
    }
    lines.join("\n") + "\n"
}

fn short_time(kickoff: &DateTime<Utc>) -> String {
    kickoff.format("%a %d.%m %H:%M").to_string()
}

fn pad(name: &str, width: usize) -> String {
    let mut s: String = name.chars().take(width).collect();
    while s.chars().count() < width {
        s.push(' ');
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use tipster_core::{MatchStatus, Odds, Prediction, RoundKey, Score};

    fn fixture() -> Fixture {
        Fixture {
            id: 1,
            home_team: "Arsenal".into(),
            away_team: "Chelsea".into(),
            league: 39,
            round_label: Some("Regular Season - 10".into()),
            kickoff: Utc.with_ymd_and_hms(2024, 11, 2, 15, 0, 0).unwrap(),
            status: MatchStatus::SecondHalf,
            elapsed: Some(67),
            result: Some(Score::new(2, 1)),
            odds: Some(Odds::new(1.9, 3.6, 4.1)),
            ..Default::default()
        }
    }

    #[test]
    fn fixture_line_shows_live_minute_round_and_odds() {
        let line = fixture_line(&fixture(), &LeagueRegistry::builtin(), &Utc);
        assert!(line.starts_with("15:00  Arsenal"));
        assert!(line.contains("2-1 67'"));
        assert!(line.contains("Round 10"));
        assert!(line.ends_with("H 1.90 U 3.60 B 4.10"));
    }

    #[test]
    fn tied_totals_share_a_rank() {
        let competition = Competition {
            id: "c".into(),
            name: "Office".into(),
            selection: Selection::MatchIds { ids: vec![1] },
            participants: Vec::new(),
            cached_fixtures: Vec::new(),
        };
        let entry = |id: &str, points| LeaderboardEntry {
            user_id: id.into(),
            display_name: id.into(),
            total_points: points,
            live_points: 0.0,
            exact_hits: 0,
            correct_outcomes: 0,
            tips_counted: 1,
        };
        let out = draw_leaderboard(
            &competition,
            CompetitionStatus::Active,
            false,
            &[entry("ann", 4.9), entry("bob", 4.9), entry("cy", 1.0)],
        );
        let ranks: Vec<&str> = out
            .lines()
            .skip(2)
            .map(|l| l.split_whitespace().next().unwrap_or_default())
            .collect();
        assert_eq!(ranks, vec!["1", "1", "3"]);
        assert!(out.starts_with("Office [active]"));
    }

    #[test]
    fn live_points_are_shown_beside_the_total() {
        let competition = Competition {
            id: "c".into(),
            name: "Office".into(),
            selection: Selection::MatchIds { ids: vec![1] },
            participants: Vec::new(),
            cached_fixtures: Vec::new(),
        };
        let entries = [
            LeaderboardEntry {
                user_id: "ann".into(),
                display_name: "ann".into(),
                total_points: 2.1,
                live_points: 0.0,
                exact_hits: 0,
                correct_outcomes: 1,
                tips_counted: 1,
            },
            LeaderboardEntry {
                user_id: "bob".into(),
                display_name: "bob".into(),
                total_points: 0.0,
                live_points: 6.3,
                exact_hits: 0,
                correct_outcomes: 0,
                tips_counted: 2,
            },
        ];

        let out = draw_leaderboard(&competition, CompetitionStatus::Active, true, &entries);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "Office [active] LIVE");
        assert!(!lines[2].contains("(+"));
        assert!(lines[3].ends_with("(+6.30)"));
    }

    #[test]
    fn selections_are_described_per_mode() {
        let registry = LeagueRegistry::builtin();
        let rounds = Selection::Rounds {
            leagues: vec![39],
            rounds: BTreeMap::from([(39, vec![RoundKey::Number(10), RoundKey::Number(11)])]),
        };
        assert!(describe_selection(&rounds, &registry).ends_with("round 10/11"));

        let dates = Selection::DateRange {
            leagues: vec![39],
            start: NaiveDate::from_ymd_opt(2024, 11, 5).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 11, 6).unwrap(),
        };
        assert!(describe_selection(&dates, &registry).ends_with("5-6 Nov"));
    }

    #[test]
    fn breakdown_marks_missing_tips() {
        let tip = Prediction {
            user_id: "ann".into(),
            fixture_id: 1,
            home_score: 2,
            away_score: 1,
            ..Default::default()
        };
        let rows = vec![
            BreakdownRow {
                fixture: fixture(),
                prediction: Some(tip),
                points: 4.9,
            },
            BreakdownRow {
                fixture: Fixture { id: 2, result: None, ..fixture() },
                prediction: None,
                points: 0.0,
            },
        ];
        let out = draw_breakdown("ann", &rows);
        assert!(out.contains("tip 2-1"));
        assert!(out.contains("tip -     result ?"));
        assert!(out.trim_end().ends_with("total 4.90"));
    }
}

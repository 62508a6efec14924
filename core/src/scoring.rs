use crate::{Fixture, Outcome, Prediction};

/// Flat bonus for hitting the exact final score, on top of the outcome odds.
pub const EXACT_SCORE_BONUS: f64 = 3.0;

pub fn outcome(home: u32, away: u32) -> Outcome {
    if home > away {
        Outcome::Home
    } else if home < away {
        Outcome::Away
    } else {
        Outcome::Draw
    }
}

/// Points for one tip against one fixture.
///
/// Nothing is awarded until the fixture has a score, and tips stored without
/// odds never score. A correct outcome earns the odds captured for that
/// outcome; an exact score adds [`EXACT_SCORE_BONUS`].
pub fn points(prediction: &Prediction, fixture: &Fixture) -> f64 {
    let Some(result) = fixture.result else {
        return 0.0;
    };
    let Some(odds) = prediction.odds else {
        return 0.0;
    };

    let actual = result.outcome();
    let mut total = 0.0;

    if prediction.outcome() == actual {
        total += odds.get(actual);
    }

    if prediction.home_score == result.home && prediction.away_score == result.away {
        total += EXACT_SCORE_BONUS;
    }

    total
}

/// The exact score was hit. Only meaningful once a result exists.
pub fn is_exact(prediction: &Prediction, fixture: &Fixture) -> bool {
    fixture
        .result
        .is_some_and(|r| r.home == prediction.home_score && r.away == prediction.away_score)
}

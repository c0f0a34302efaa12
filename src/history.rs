//! Recorded bouts and the threshold analysis over them.
//!
//! Every dispatched bout leaves one record pairing the pre-bout prediction
//! with the observed outcome. The log is append-only; an arena clears it
//! only on explicit request. Threshold analysis turns the log into a
//! confusion matrix: predictions at or above the upper threshold commit to
//! the left side, those at or below the lower threshold to the right side,
//! and everything in between abstains.

use crate::error::RatingError;
use overload::overload;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops;

/// Result of a single bout, seen from the left side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    LeftWin,
    RightWin,
    Draw,
    /// The oracle declined to decide; no ratings were touched.
    Undecided,
}

/// One dispatched pairing: who met whom, what the model predicted, and
/// what actually happened. Never mutated after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bout<K> {
    pub left: K,
    pub right: K,
    /// Predicted probability of the left side winning, in `[0, 1]`.
    pub predicted_outcome: f64,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
}

/// Counts of prediction outcomes at a threshold pair.
///
/// `do_nothing` counts abstentions: predictions inside the open threshold
/// band, plus bouts whose outcome the oracle never decided.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_pos: usize,
    pub false_pos: usize,
    pub true_neg: usize,
    pub false_neg: usize,
    pub do_nothing: usize,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.true_pos + self.false_pos + self.true_neg + self.false_neg + self.do_nothing
    }

    /// Fraction of all recorded bouts called correctly; abstentions count
    /// against accuracy.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_pos + self.true_neg) as f64 / total as f64
    }
}

overload!((a: ?ConfusionMatrix) + (b: ?ConfusionMatrix) -> ConfusionMatrix {
    ConfusionMatrix {
        true_pos: a.true_pos + b.true_pos,
        false_pos: a.false_pos + b.false_pos,
        true_neg: a.true_neg + b.true_neg,
        false_neg: a.false_neg + b.false_neg,
        do_nothing: a.do_nothing + b.do_nothing,
    }
});

overload!((a: &mut ConfusionMatrix) += (b: ?ConfusionMatrix) {
    a.true_pos += b.true_pos;
    a.false_pos += b.false_pos;
    a.true_neg += b.true_neg;
    a.false_neg += b.false_neg;
    a.do_nothing += b.do_nothing;
});

/// The best threshold pair found by [`History::random_search`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSearch {
    pub lower: f64,
    pub upper: f64,
    pub matrix: ConfusionMatrix,
}

/// Overall summary of a history at the default `(0.5, 0.5)` thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryReport {
    pub bouts: usize,
    pub matrix: ConfusionMatrix,
    pub accuracy: f64,
}

/// Append-only log of bout records.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct History<K> {
    bouts: Vec<Bout<K>>,
}

impl<K> History<K> {
    pub fn new() -> Self {
        Self { bouts: Vec::new() }
    }

    pub fn add_bout(&mut self, bout: Bout<K>) {
        self.bouts.push(bout);
    }

    pub fn bouts(&self) -> &[Bout<K>] {
        &self.bouts
    }

    pub fn len(&self) -> usize {
        self.bouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bouts.is_empty()
    }

    pub fn clear(&mut self) {
        self.bouts.clear();
    }

    /// Classifies every recorded bout against a threshold pair.
    ///
    /// Draws are errors whenever a definite side was predicted; undecided
    /// bouts always count as abstentions.
    pub fn confusion_matrix(&self, lower: f64, upper: f64) -> Result<ConfusionMatrix, RatingError> {
        check_thresholds(lower, upper)?;
        Ok(self.matrix_at(lower, upper))
    }

    // Thresholds assumed valid; the upper band is checked first so that a
    // degenerate pair like (0.5, 0.5) still commits on exactly 0.5.
    fn matrix_at(&self, lower: f64, upper: f64) -> ConfusionMatrix {
        let mut matrix = ConfusionMatrix::default();
        for bout in &self.bouts {
            if bout.outcome == Outcome::Undecided {
                matrix.do_nothing += 1;
            } else if bout.predicted_outcome >= upper {
                match bout.outcome {
                    Outcome::LeftWin => matrix.true_pos += 1,
                    _ => matrix.false_pos += 1,
                }
            } else if bout.predicted_outcome <= lower {
                match bout.outcome {
                    Outcome::RightWin => matrix.true_neg += 1,
                    _ => matrix.false_neg += 1,
                }
            } else {
                matrix.do_nothing += 1;
            }
        }
        matrix
    }

    /// Samples `trials` threshold pairs uniformly from the unit square
    /// (ordered so `lower <= upper`), scores each by accuracy, and returns
    /// the best. Deterministic for a given history, trial count and seed;
    /// ties go to the earliest trial.
    pub fn random_search(&self, trials: u32, seed: u64) -> Result<ThresholdSearch, RatingError>
    where
        K: Sync,
    {
        if trials == 0 {
            return Err(RatingError::invalid_parameter(
                "trials",
                "at least one trial is required",
            ));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let candidates: Vec<(f64, f64)> = (0..trials)
            .map(|_| {
                let x: f64 = rng.gen_range(0.0..=1.0);
                let y: f64 = rng.gen_range(0.0..=1.0);
                (x.min(y), x.max(y))
            })
            .collect();

        let (_, _, best) = candidates
            .par_iter()
            .enumerate()
            .map(|(index, &(lower, upper))| {
                let matrix = self.matrix_at(lower, upper);
                (
                    matrix.accuracy(),
                    index,
                    ThresholdSearch {
                        lower,
                        upper,
                        matrix,
                    },
                )
            })
            .max_by(|a, b| a.0.total_cmp(&b.0).then_with(|| b.1.cmp(&a.1)))
            .expect("at least one trial was scored");

        tracing::debug!(
            "random_search over {} trials: best ({:.4}, {:.4}) at accuracy {:.4}",
            trials,
            best.lower,
            best.upper,
            best.matrix.accuracy()
        );
        Ok(best)
    }

    /// Overall counts and accuracy at the default `(0.5, 0.5)` thresholds.
    pub fn report_results(&self) -> HistoryReport {
        let matrix = self.matrix_at(0.5, 0.5);
        HistoryReport {
            bouts: self.bouts.len(),
            accuracy: matrix.accuracy(),
            matrix,
        }
    }
}

fn check_thresholds(lower: f64, upper: f64) -> Result<(), RatingError> {
    let in_range = (0.0..=1.0).contains(&lower) && (0.0..=1.0).contains(&upper);
    if !in_range || lower > upper {
        return Err(RatingError::InvalidThresholds { lower, upper });
    }
    Ok(())
}

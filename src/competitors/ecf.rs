//! ECF grading: a rolling mean over the most recent results, after the
//! English Chess Federation's pre-2020 scheme.

use crate::error::RatingError;
use crate::numerical::ecf_linear_expectation;
use crate::state::StateDoc;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::{CompetitorKind, DEFAULT_MINIMUM_RATING};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EcfConfig {
    pub initial_rating: f64,
    pub minimum_rating: f64,
    /// Size of the rolling result window.
    pub n_period: usize,
    /// Score shift for a decisive result, and the bound within which an
    /// opponent's rating is pulled before scoring against it.
    pub delta: f64,
    /// Score shift for a draw.
    pub draw_delta: f64,
    /// Scale of the linear expectation.
    pub scale: f64,
}

impl Default for EcfConfig {
    fn default() -> Self {
        Self {
            initial_rating: DEFAULT_MINIMUM_RATING,
            minimum_rating: DEFAULT_MINIMUM_RATING,
            n_period: 30,
            delta: 50.0,
            draw_delta: 0.0,
            scale: 120.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EcfCompetitor {
    config: EcfConfig,
    /// Adjusted results of the last `n_period` bouts, oldest first. Empty
    /// until the first bout; the rating falls back to `initial_rating`.
    scores: VecDeque<f64>,
}

impl EcfCompetitor {
    pub fn new(initial_rating: f64) -> Result<Self, RatingError> {
        Self::with_config(EcfConfig {
            initial_rating,
            ..EcfConfig::default()
        })
    }

    pub fn with_config(config: EcfConfig) -> Result<Self, RatingError> {
        super::check_initial_rating(config.initial_rating, config.minimum_rating)?;
        super::check_positive("delta", config.delta)?;
        super::check_positive("scale", config.scale)?;
        if !config.draw_delta.is_finite() {
            return Err(RatingError::invalid_parameter(
                "draw_delta",
                "must be finite",
            ));
        }
        if config.n_period == 0 {
            return Err(RatingError::invalid_parameter(
                "n_period",
                "window must hold at least one result",
            ));
        }
        Ok(Self {
            scores: VecDeque::with_capacity(config.n_period),
            config,
        })
    }

    /// Mean of the result window, floor-clamped; `initial_rating` before
    /// any bout has been recorded.
    pub fn rating(&self) -> f64 {
        if self.scores.is_empty() {
            return self.config.initial_rating;
        }
        let mean = self.scores.iter().sum::<f64>() / self.scores.len() as f64;
        mean.max(self.config.minimum_rating)
    }

    pub fn config(&self) -> &EcfConfig {
        &self.config
    }

    pub fn scores(&self) -> impl Iterator<Item = f64> + '_ {
        self.scores.iter().copied()
    }

    pub fn expected_score(&self, other: &Self) -> f64 {
        ecf_linear_expectation(self.rating(), other.rating(), self.config.scale)
    }

    /// Pulls the opponent's rating within `delta` of our own before it is
    /// scored against, per the federation tables.
    fn limited_opponent_rating(&self, own: f64, opponent: f64) -> f64 {
        if (own - opponent).abs() > self.config.delta {
            if own > opponent {
                own - self.config.delta
            } else {
                own + self.config.delta
            }
        } else {
            opponent
        }
    }

    fn record(&mut self, score: f64) {
        self.scores.push_back(score);
        while self.scores.len() > self.config.n_period {
            self.scores.pop_front();
        }
    }

    /// Registers a win of `self` over `other`: the winner banks the
    /// (limited) opponent rating plus `delta`, the loser the winner's
    /// rating minus `delta`.
    pub fn beat(&mut self, other: &mut Self) {
        let own = self.rating();
        let theirs = other.rating();
        let own_entry = self.limited_opponent_rating(own, theirs) + self.config.delta;
        let other_entry = other.limited_opponent_rating(theirs, own) - other.config.delta;
        self.record(own_entry);
        other.record(other_entry);
    }

    pub fn lost_to(&mut self, other: &mut Self) {
        other.beat(self);
    }

    pub fn tied(&mut self, other: &mut Self) {
        let own = self.rating();
        let theirs = other.rating();
        let own_entry = self.limited_opponent_rating(own, theirs) + self.config.draw_delta;
        let other_entry = other.limited_opponent_rating(theirs, own) + other.config.draw_delta;
        self.record(own_entry);
        other.record(other_entry);
    }

    pub fn reset(&mut self) {
        self.scores.clear();
    }

    pub fn export_state(&self) -> StateDoc {
        let mut doc = StateDoc::new(CompetitorKind::Ecf.as_str());
        doc.set_parameter("initial_rating", self.config.initial_rating);
        doc.set_parameter("minimum_rating", self.config.minimum_rating);
        doc.set_state_field("rating", self.rating());
        doc.state.insert(
            "scores".to_owned(),
            self.scores.iter().copied().collect::<Vec<f64>>().into(),
        );
        doc.set_class_var("n_period", self.config.n_period as f64);
        doc.set_class_var("delta", self.config.delta);
        doc.set_class_var("draw_delta", self.config.draw_delta);
        doc.set_class_var("scale", self.config.scale);
        doc.set_flattened_ratings(self.config.initial_rating, self.rating());
        doc
    }

    pub fn from_state(doc: &StateDoc) -> Result<Self, RatingError> {
        doc.check_kind(CompetitorKind::Ecf.as_str())?;

        let mut config = EcfConfig::default();
        if let Some(n_period) = doc.class_var("n_period") {
            config.n_period = n_period as usize;
        }
        if let Some(delta) = doc.class_var("delta") {
            config.delta = delta;
        }
        if let Some(draw_delta) = doc.class_var("draw_delta") {
            config.draw_delta = draw_delta;
        }
        if let Some(scale) = doc.class_var("scale") {
            config.scale = scale;
        }
        if let Some(minimum_rating) = doc.parameter("minimum_rating") {
            config.minimum_rating = minimum_rating;
        }
        config.initial_rating = StateDoc::check_floor(
            "initial_rating",
            doc.require_parameter("initial_rating")?,
            config.minimum_rating,
        )?;

        let mut competitor =
            Self::with_config(config).map_err(|err| RatingError::invalid_state(err.to_string()))?;
        if let Some(scores) = doc.state.get("scores") {
            let entries = scores
                .as_array()
                .ok_or_else(|| RatingError::invalid_state("state field `scores` is not an array"))?;
            for entry in entries {
                let score = entry.as_f64().filter(|s| s.is_finite()).ok_or_else(|| {
                    RatingError::invalid_state("state field `scores` holds a non-finite entry")
                })?;
                competitor.record(score);
            }
        }
        // The derived rating is rejected, not clamped, when the document
        // places it below the floor.
        StateDoc::check_floor(
            "rating",
            doc.require_state_field("rating", "current_rating")?,
            competitor.config.minimum_rating,
        )?;
        Ok(competitor)
    }

    pub fn import_state(&mut self, doc: &StateDoc) -> Result<(), RatingError> {
        *self = Self::from_state(doc)?;
        Ok(())
    }

    pub(crate) fn set_var(&mut self, name: &str, value: f64) -> Result<(), RatingError> {
        match name {
            "n_period" => {
                if !(value.is_finite() && value >= 1.0) {
                    return Err(RatingError::invalid_parameter(
                        "n_period",
                        "window must hold at least one result",
                    ));
                }
                self.config.n_period = value as usize;
                while self.scores.len() > self.config.n_period {
                    self.scores.pop_front();
                }
            }
            "delta" => {
                super::check_positive("delta", value)?;
                self.config.delta = value;
            }
            "draw_delta" => {
                if !value.is_finite() {
                    return Err(RatingError::invalid_parameter("draw_delta", "must be finite"));
                }
                self.config.draw_delta = value;
            }
            "scale" => {
                super::check_positive("scale", value)?;
                self.config.scale = value;
            }
            _ => return Err(super::unknown_var(CompetitorKind::Ecf, name)),
        }
        Ok(())
    }
}

//! Elo rating: https://en.wikipedia.org/wiki/Elo_rating_system

use crate::error::RatingError;
use crate::state::StateDoc;
use serde::{Deserialize, Serialize};

use super::{CompetitorKind, DEFAULT_MINIMUM_RATING};

/// Tunables and construction defaults for [`EloCompetitor`].
///
/// Each competitor carries its own copy; an arena keeps the copies of its
/// population in sync through `set_competitor_class_var`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EloConfig {
    pub initial_rating: f64,
    pub minimum_rating: f64,
    /// Sensitivity of updates: larger k means faster response to new
    /// information.
    pub k_factor: f64,
    /// Scale of the logistic expectation, i.e. the rating difference at
    /// which the odds shift by a factor of 10.
    pub base_rating: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            initial_rating: 400.0,
            minimum_rating: DEFAULT_MINIMUM_RATING,
            k_factor: 32.0,
            base_rating: 400.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EloCompetitor {
    config: EloConfig,
    rating: f64,
}

impl EloCompetitor {
    pub fn new(initial_rating: f64) -> Result<Self, RatingError> {
        Self::with_config(EloConfig {
            initial_rating,
            ..EloConfig::default()
        })
    }

    pub fn with_config(config: EloConfig) -> Result<Self, RatingError> {
        super::check_initial_rating(config.initial_rating, config.minimum_rating)?;
        super::check_positive("k_factor", config.k_factor)?;
        super::check_positive("base_rating", config.base_rating)?;
        Ok(Self {
            rating: config.initial_rating,
            config,
        })
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    /// Assigns the rating directly. Caller-supplied values below the floor
    /// are rejected rather than clamped.
    pub fn set_rating(&mut self, value: f64) -> Result<(), RatingError> {
        self.rating = StateDoc::check_floor("rating", value, self.config.minimum_rating)?;
        Ok(())
    }

    pub fn config(&self) -> &EloConfig {
        &self.config
    }

    fn transformed_rating(&self) -> f64 {
        10f64.powf(self.rating / self.config.base_rating)
    }

    /// Probability of this competitor beating `other`, with draws counted
    /// as half a win.
    pub fn expected_score(&self, other: &Self) -> f64 {
        let own = self.transformed_rating();
        own / (own + other.transformed_rating())
    }

    fn apply(&mut self, actual: f64, expected: f64) {
        self.rating = (self.rating + self.config.k_factor * (actual - expected))
            .max(self.config.minimum_rating);
    }

    /// Registers a win of `self` over `other`, updating both ratings.
    pub fn beat(&mut self, other: &mut Self) {
        let win_expectation = self.expected_score(other);
        let lose_expectation = other.expected_score(self);
        self.apply(1.0, win_expectation);
        other.apply(0.0, lose_expectation);
    }

    pub fn lost_to(&mut self, other: &mut Self) {
        other.beat(self);
    }

    /// Registers a draw, moving both ratings toward each other.
    pub fn tied(&mut self, other: &mut Self) {
        let win_expectation = self.expected_score(other);
        let lose_expectation = other.expected_score(self);
        self.apply(0.5, win_expectation);
        other.apply(0.5, lose_expectation);
    }

    /// Restores the construction-time state.
    pub fn reset(&mut self) {
        self.rating = self.config.initial_rating;
    }

    pub fn export_state(&self) -> StateDoc {
        let mut doc = StateDoc::new(CompetitorKind::Elo.as_str());
        doc.set_parameter("initial_rating", self.config.initial_rating);
        doc.set_parameter("minimum_rating", self.config.minimum_rating);
        doc.set_state_field("rating", self.rating);
        doc.set_class_var("k_factor", self.config.k_factor);
        doc.set_class_var("base_rating", self.config.base_rating);
        doc.set_flattened_ratings(self.config.initial_rating, self.rating);
        doc
    }

    pub fn from_state(doc: &StateDoc) -> Result<Self, RatingError> {
        doc.check_kind(CompetitorKind::Elo.as_str())?;

        let mut config = EloConfig::default();
        if let Some(k_factor) = doc.class_var("k_factor") {
            config.k_factor = k_factor;
        }
        if let Some(base_rating) = doc.class_var("base_rating") {
            config.base_rating = base_rating;
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
        competitor.rating = StateDoc::check_floor(
            "rating",
            doc.require_state_field("rating", "current_rating")?,
            competitor.config.minimum_rating,
        )?;
        Ok(competitor)
    }

    /// Replaces this competitor's configuration and state with the
    /// document's contents.
    pub fn import_state(&mut self, doc: &StateDoc) -> Result<(), RatingError> {
        *self = Self::from_state(doc)?;
        Ok(())
    }

    pub(crate) fn set_var(&mut self, name: &str, value: f64) -> Result<(), RatingError> {
        match name {
            "k_factor" => {
                super::check_positive("k_factor", value)?;
                self.config.k_factor = value;
            }
            "base_rating" => {
                super::check_positive("base_rating", value)?;
                self.config.base_rating = value;
            }
            _ => return Err(super::unknown_var(CompetitorKind::Elo, name)),
        }
        Ok(())
    }
}

//! DWZ (Deutsche Wertungszahl) rating, after the German Chess Federation's
//! published evaluation rules.

use crate::error::RatingError;
use crate::numerical::{dwz_development_coefficient, logistic_expectation};
use crate::state::StateDoc;
use serde::{Deserialize, Serialize};

use super::{CompetitorKind, DEFAULT_MINIMUM_RATING};

/// Rating difference at which the odds shift by a factor of 10.
const DWZ_SCALE: f64 = 400.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DwzConfig {
    pub initial_rating: f64,
    pub minimum_rating: f64,
    /// Age coefficient of the development schedule: 5 for juniors, 10 for
    /// adults up to 25, 15 for seniors.
    pub j: f64,
}

impl Default for DwzConfig {
    fn default() -> Self {
        Self {
            initial_rating: 400.0,
            minimum_rating: DEFAULT_MINIMUM_RATING,
            j: 10.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DwzCompetitor {
    config: DwzConfig,
    rating: f64,
    /// Effective number of evaluated matches.
    match_count: u32,
}

impl DwzCompetitor {
    pub fn new(initial_rating: f64) -> Result<Self, RatingError> {
        Self::with_config(DwzConfig {
            initial_rating,
            ..DwzConfig::default()
        })
    }

    pub fn with_config(config: DwzConfig) -> Result<Self, RatingError> {
        super::check_initial_rating(config.initial_rating, config.minimum_rating)?;
        super::check_positive("j", config.j)?;
        Ok(Self {
            rating: config.initial_rating,
            match_count: 0,
            config,
        })
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn match_count(&self) -> u32 {
        self.match_count
    }

    pub fn config(&self) -> &DwzConfig {
        &self.config
    }

    pub fn set_rating(&mut self, value: f64) -> Result<(), RatingError> {
        self.rating = StateDoc::check_floor("rating", value, self.config.minimum_rating)?;
        Ok(())
    }

    pub fn expected_score(&self, other: &Self) -> f64 {
        logistic_expectation(self.rating, other.rating, DWZ_SCALE)
    }

    /// The development coefficient in effect for the next update.
    pub fn development_coefficient(&self) -> f64 {
        dwz_development_coefficient(self.rating, self.match_count, self.config.j)
    }

    fn next_rating(&self, other: &Self, score: f64) -> f64 {
        let coefficient = self.development_coefficient();
        let n = f64::from(self.match_count);
        self.rating + (800.0 / (coefficient + n)) * (score - self.expected_score(other))
    }

    fn apply_pair(&mut self, other: &mut Self, own_score: f64, other_score: f64) {
        let own_rating = self.next_rating(other, own_score);
        let other_rating = other.next_rating(self, other_score);

        self.rating = own_rating.max(self.config.minimum_rating);
        self.match_count += 1;
        other.rating = other_rating.max(other.config.minimum_rating);
        other.match_count += 1;
    }

    /// Registers a win of `self` over `other`, updating both ratings and
    /// match counts.
    pub fn beat(&mut self, other: &mut Self) {
        self.apply_pair(other, 1.0, 0.0);
    }

    pub fn lost_to(&mut self, other: &mut Self) {
        other.beat(self);
    }

    pub fn tied(&mut self, other: &mut Self) {
        self.apply_pair(other, 0.5, 0.5);
    }

    pub fn reset(&mut self) {
        self.rating = self.config.initial_rating;
        self.match_count = 0;
    }

    pub fn export_state(&self) -> StateDoc {
        let mut doc = StateDoc::new(CompetitorKind::Dwz.as_str());
        doc.set_parameter("initial_rating", self.config.initial_rating);
        doc.set_parameter("minimum_rating", self.config.minimum_rating);
        doc.set_state_field("rating", self.rating);
        doc.state
            .insert("match_count".to_owned(), self.match_count.into());
        doc.set_class_var("j", self.config.j);
        doc.set_flattened_ratings(self.config.initial_rating, self.rating);
        doc
    }

    pub fn from_state(doc: &StateDoc) -> Result<Self, RatingError> {
        doc.check_kind(CompetitorKind::Dwz.as_str())?;

        let mut config = DwzConfig::default();
        if let Some(j) = doc.class_var("j") {
            config.j = j;
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
        competitor.match_count = doc
            .state
            .get("match_count")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;
        Ok(competitor)
    }

    pub fn import_state(&mut self, doc: &StateDoc) -> Result<(), RatingError> {
        *self = Self::from_state(doc)?;
        Ok(())
    }

    pub(crate) fn set_var(&mut self, name: &str, value: f64) -> Result<(), RatingError> {
        match name {
            "j" => {
                super::check_positive("j", value)?;
                self.config.j = value;
            }
            _ => return Err(super::unknown_var(CompetitorKind::Dwz, name)),
        }
        Ok(())
    }
}

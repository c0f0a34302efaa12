//! Glicko-1 rating, updated per game: http://www.glicko.net/glicko/glicko.pdf

use crate::error::RatingError;
use crate::numerical::{glicko_g, GLICKO_Q};
use crate::state::StateDoc;
use serde::{Deserialize, Serialize};

use super::{CompetitorKind, DEFAULT_MINIMUM_RATING};

/// Upper bound on the rating deviation, also the conventional deviation of
/// a brand-new player.
pub const RD_MAX: f64 = 350.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlickoConfig {
    pub initial_rating: f64,
    /// Rating deviation of a new competitor, in `(0, 350]`.
    pub initial_rd: f64,
    pub minimum_rating: f64,
    /// Deviation growth constant used by [`GlickoCompetitor::decay`].
    pub c: f64,
}

impl Default for GlickoConfig {
    fn default() -> Self {
        Self {
            initial_rating: 1500.0,
            initial_rd: RD_MAX,
            minimum_rating: DEFAULT_MINIMUM_RATING,
            c: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GlickoCompetitor {
    config: GlickoConfig,
    rating: f64,
    rd: f64,
    /// Epoch seconds of the last rated activity, if the caller tracks it.
    last_activity: Option<u64>,
}

impl GlickoCompetitor {
    pub fn new(initial_rating: f64, initial_rd: f64) -> Result<Self, RatingError> {
        Self::with_config(GlickoConfig {
            initial_rating,
            initial_rd,
            ..GlickoConfig::default()
        })
    }

    pub fn with_config(config: GlickoConfig) -> Result<Self, RatingError> {
        super::check_initial_rating(config.initial_rating, config.minimum_rating)?;
        check_rd("initial_rd", config.initial_rd)?;
        super::check_positive("c", config.c)?;
        Ok(Self {
            rating: config.initial_rating,
            rd: config.initial_rd,
            last_activity: None,
            config,
        })
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn rd(&self) -> f64 {
        self.rd
    }

    pub fn config(&self) -> &GlickoConfig {
        &self.config
    }

    pub fn last_activity(&self) -> Option<u64> {
        self.last_activity
    }

    pub fn set_last_activity(&mut self, epoch_seconds: Option<u64>) {
        self.last_activity = epoch_seconds;
    }

    pub fn set_rating(&mut self, value: f64) -> Result<(), RatingError> {
        self.rating = StateDoc::check_floor("rating", value, self.config.minimum_rating)?;
        Ok(())
    }

    pub fn set_rd(&mut self, value: f64) -> Result<(), RatingError> {
        check_rd("rd", value).map_err(|err| RatingError::invalid_state(err.to_string()))?;
        self.rd = value;
        Ok(())
    }

    /// Probability of this competitor beating `other`, attenuated by the
    /// opponent's rating deviation: an uncertain opponent drags the
    /// expectation toward one half.
    pub fn expected_score(&self, other: &Self) -> f64 {
        let g = glicko_g(other.rd);
        1.0 / (1.0 + 10f64.powf(-g * (self.rating - other.rating) / 400.0))
    }

    /// One side of the per-game update, computed entirely from pre-bout
    /// values.
    fn updated(&self, other: &Self, score: f64) -> (f64, f64) {
        let g = glicko_g(other.rd);
        let expectation = self.expected_score(other);
        let d_squared = 1.0 / (GLICKO_Q * GLICKO_Q * g * g * expectation * (1.0 - expectation));
        let denom = 1.0 / (self.rd * self.rd) + 1.0 / d_squared;
        let rating = self.rating + (GLICKO_Q / denom) * g * (score - expectation);
        let rd = (1.0 / denom).sqrt();
        (rating, rd)
    }

    fn apply_pair(&mut self, other: &mut Self, own_score: f64, other_score: f64) {
        let (own_rating, own_rd) = self.updated(other, own_score);
        let (other_rating, other_rd) = other.updated(self, other_score);

        self.rating = own_rating.max(self.config.minimum_rating);
        self.rd = own_rd.clamp(f64::MIN_POSITIVE, RD_MAX);
        other.rating = other_rating.max(other.config.minimum_rating);
        other.rd = other_rd.clamp(f64::MIN_POSITIVE, RD_MAX);
    }

    /// Registers a win of `self` over `other`, updating both ratings and
    /// deviations.
    pub fn beat(&mut self, other: &mut Self) {
        self.apply_pair(other, 1.0, 0.0);
    }

    pub fn lost_to(&mut self, other: &mut Self) {
        other.beat(self);
    }

    pub fn tied(&mut self, other: &mut Self) {
        self.apply_pair(other, 0.5, 0.5);
    }

    /// Grows the rating deviation after `delta_time` units of inactivity:
    /// `rd <- min(sqrt(rd^2 + c^2 * delta_time), 350)`.
    ///
    /// Deliberately separate from `beat`/`tied`; callers decide when (and
    /// whether) inactivity decay applies.
    pub fn decay(&mut self, delta_time: f64) {
        let c = self.config.c;
        self.rd = (self.rd * self.rd + c * c * delta_time.max(0.0)).sqrt().min(RD_MAX);
    }

    pub fn reset(&mut self) {
        self.rating = self.config.initial_rating;
        self.rd = self.config.initial_rd;
        self.last_activity = None;
    }

    pub fn export_state(&self) -> StateDoc {
        let mut doc = StateDoc::new(CompetitorKind::Glicko.as_str());
        doc.set_parameter("initial_rating", self.config.initial_rating);
        doc.set_parameter("initial_rd", self.config.initial_rd);
        doc.set_parameter("minimum_rating", self.config.minimum_rating);
        doc.set_state_field("rating", self.rating);
        doc.set_state_field("rd", self.rd);
        if let Some(last_activity) = self.last_activity {
            doc.state
                .insert("last_activity".to_owned(), last_activity.into());
        }
        doc.set_class_var("c", self.config.c);
        doc.set_flattened_ratings(self.config.initial_rating, self.rating);
        doc
    }

    pub fn from_state(doc: &StateDoc) -> Result<Self, RatingError> {
        doc.check_kind(CompetitorKind::Glicko.as_str())?;

        let mut config = GlickoConfig::default();
        if let Some(c) = doc.class_var("c") {
            config.c = c;
        }
        if let Some(minimum_rating) = doc.parameter("minimum_rating") {
            config.minimum_rating = minimum_rating;
        }
        config.initial_rating = StateDoc::check_floor(
            "initial_rating",
            doc.require_parameter("initial_rating")?,
            config.minimum_rating,
        )?;
        if let Some(initial_rd) = doc.parameter("initial_rd") {
            config.initial_rd = initial_rd;
        }

        let mut competitor =
            Self::with_config(config).map_err(|err| RatingError::invalid_state(err.to_string()))?;
        competitor.rating = StateDoc::check_floor(
            "rating",
            doc.require_state_field("rating", "current_rating")?,
            competitor.config.minimum_rating,
        )?;
        let rd = doc.require_state_field("rd", "rd")?;
        competitor.set_rd(rd)?;
        competitor.last_activity = doc.state.get("last_activity").and_then(|v| v.as_u64());
        Ok(competitor)
    }

    pub fn import_state(&mut self, doc: &StateDoc) -> Result<(), RatingError> {
        *self = Self::from_state(doc)?;
        Ok(())
    }

    pub(crate) fn set_var(&mut self, name: &str, value: f64) -> Result<(), RatingError> {
        match name {
            "c" => {
                super::check_positive("c", value)?;
                self.config.c = value;
            }
            _ => return Err(super::unknown_var(CompetitorKind::Glicko, name)),
        }
        Ok(())
    }
}

fn check_rd(name: &str, value: f64) -> Result<(), RatingError> {
    if !(value.is_finite() && value > 0.0 && value <= RD_MAX) {
        return Err(RatingError::invalid_parameter(
            name,
            format!("{value} is outside (0, {RD_MAX}]"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_expected_score_weighs_opponent_deviation() {
        let a = GlickoCompetitor::new(1500.0, 200.0).unwrap();
        let b = GlickoCompetitor::new(1400.0, 30.0).unwrap();
        // Against the near-certain opponent the edge is close to the raw
        // logistic value; the reverse expectation is dragged toward 0.5 by
        // a's large deviation.
        assert!((a.expected_score(&b) - 0.6394677360).abs() < 1e-9);
        assert!((b.expected_score(&a) - 0.3808345496).abs() < 1e-9);
    }

    #[test]
    fn test_expected_score_complementary_for_equal_deviations() {
        let a = GlickoCompetitor::new(1700.0, 120.0).unwrap();
        let b = GlickoCompetitor::new(1450.0, 120.0).unwrap();
        assert!((a.expected_score(&b) + b.expected_score(&a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_beat_known_values() {
        let mut a = GlickoCompetitor::new(1500.0, 200.0).unwrap();
        let mut b = GlickoCompetitor::new(1400.0, 30.0).unwrap();
        a.beat(&mut b);
        assert!((a.rating() - 1563.4320).abs() < 1e-3);
        assert!((a.rd() - 175.2202).abs() < 1e-3);
        assert!((b.rating() - 1398.3425).abs() < 1e-3);
        assert!((b.rd() - 29.9251).abs() < 1e-3);
    }

    #[test]
    fn test_symmetric_win_known_values() {
        let mut a = GlickoCompetitor::new(1500.0, 350.0).unwrap();
        let mut b = GlickoCompetitor::new(1500.0, 350.0).unwrap();
        a.beat(&mut b);
        assert!((a.rating() - 1662.2120).abs() < 1e-3);
        assert!((b.rating() - 1337.7880).abs() < 1e-3);
        assert!((a.rd() - 290.2305).abs() < 1e-3);
        assert!((b.rd() - 290.2305).abs() < 1e-3);
    }

    #[test]
    fn test_tied_between_equals_keeps_ratings_and_shrinks_rd() {
        let mut a = GlickoCompetitor::new(1500.0, 200.0).unwrap();
        let mut b = GlickoCompetitor::new(1500.0, 200.0).unwrap();
        a.tied(&mut b);
        assert!((a.rating() - 1500.0).abs() < 1e-9);
        assert!((b.rating() - 1500.0).abs() < 1e-9);
        assert!(a.rd() < 200.0);
        assert!((a.rd() - b.rd()).abs() < 1e-9);
    }

    #[test]
    fn test_updates_shrink_deviation() {
        let mut a = GlickoCompetitor::new(1500.0, 350.0).unwrap();
        let mut b = GlickoCompetitor::new(1500.0, 350.0).unwrap();
        for _ in 0..20 {
            a.beat(&mut b);
        }
        assert!(a.rd() < 350.0);
        assert!(b.rd() < 350.0);
        assert!(a.rd() > 0.0);
    }

    #[test]
    fn test_decay_grows_deviation_up_to_the_cap() {
        let mut a = GlickoCompetitor::new(1500.0, 30.0).unwrap();
        a.decay(900.0);
        assert!((a.rd() - (30f64 * 30.0 + 900.0).sqrt()).abs() < 1e-9);
        a.decay(1e9);
        assert_eq!(a.rd(), RD_MAX);
    }

    #[test]
    fn test_floor_holds_under_repeated_losses() {
        let mut loser = GlickoCompetitor::new(110.0, 350.0).unwrap();
        let mut winner = GlickoCompetitor::new(2000.0, 350.0).unwrap();
        for _ in 0..10_000 {
            winner.beat(&mut loser);
        }
        assert!(loser.rating() >= 100.0);
        assert!(loser.rd() > 0.0);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut a = GlickoCompetitor::new(1500.0, 200.0).unwrap();
        let mut b = GlickoCompetitor::new(1400.0, 30.0).unwrap();
        a.beat(&mut b);
        a.set_last_activity(Some(1_700_000_000));
        a.reset();
        assert_eq!(a.rating(), 1500.0);
        assert_eq!(a.rd(), 200.0);
        assert_eq!(a.last_activity(), None);
    }

    #[test]
    fn test_state_round_trip() {
        let mut a = GlickoCompetitor::new(1500.0, 200.0).unwrap();
        let mut b = GlickoCompetitor::new(1400.0, 30.0).unwrap();
        a.beat(&mut b);
        a.set_last_activity(Some(1_700_000_000));

        let doc = a.export_state();
        let restored = GlickoCompetitor::from_state(&doc).unwrap();
        assert_eq!(restored.rating(), a.rating());
        assert_eq!(restored.rd(), a.rd());
        assert_eq!(restored.last_activity(), Some(1_700_000_000));

        let doc_again = restored.export_state();
        assert_eq!(doc_again.parameters, doc.parameters);
        assert_eq!(doc_again.state, doc.state);
        assert_eq!(doc_again.class_vars, doc.class_vars);
    }

    #[test]
    fn test_invalid_rd_is_rejected() {
        assert!(GlickoCompetitor::new(1500.0, 0.0).is_err());
        assert!(GlickoCompetitor::new(1500.0, 351.0).is_err());

        let mut a = GlickoCompetitor::new(1500.0, 200.0).unwrap();
        assert!(matches!(
            a.set_rd(400.0),
            Err(RatingError::InvalidState(_))
        ));
    }
}

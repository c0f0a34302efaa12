//! The competitor variants and the polymorphic surface over them.
//!
//! Each rating algorithm lives in its own module as a concrete struct with
//! infallible, statically-typed operations. The [`Competitor`] enum tags
//! the four variants behind one capability set (`rating`,
//! `expected_score`, `beat`, `lost_to`, `tied`, `reset`, `export_state`,
//! `from_state`), turning a cross-variant pairing into a
//! [`RatingError::TypeMismatch`] instead of a compile error, which is what
//! the arena needs to stay algorithm-agnostic.

mod dwz;
mod ecf;
mod elo;
mod ensemble;
mod glicko;

pub use dwz::{DwzCompetitor, DwzConfig};
pub use ecf::{EcfCompetitor, EcfConfig};
pub use elo::{EloCompetitor, EloConfig};
pub use ensemble::BlendedCompetitor;
pub use glicko::{GlickoCompetitor, GlickoConfig, RD_MAX};

use crate::error::RatingError;
use crate::state::StateDoc;
use serde::{Deserialize, Serialize};

/// Hard floor below which no rating may drop, shared by all variants
/// unless overridden per config.
pub const DEFAULT_MINIMUM_RATING: f64 = 100.0;

/// Tag identifying a competitor variant; doubles as the `type` field of
/// state documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompetitorKind {
    Elo,
    Glicko,
    Ecf,
    Dwz,
}

impl CompetitorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            CompetitorKind::Elo => "EloCompetitor",
            CompetitorKind::Glicko => "GlickoCompetitor",
            CompetitorKind::Ecf => "ECFCompetitor",
            CompetitorKind::Dwz => "DWZCompetitor",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, RatingError> {
        match name {
            "EloCompetitor" => Ok(CompetitorKind::Elo),
            "GlickoCompetitor" => Ok(CompetitorKind::Glicko),
            "ECFCompetitor" => Ok(CompetitorKind::Ecf),
            "DWZCompetitor" => Ok(CompetitorKind::Dwz),
            _ => Err(RatingError::invalid_state(format!(
                "{name} is not a valid competitor type. Must be one of: EloCompetitor, \
                 GlickoCompetitor, ECFCompetitor, DWZCompetitor"
            ))),
        }
    }
}

impl std::fmt::Display for CompetitorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Construction defaults for one variant, as handed to an arena.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CompetitorConfig {
    Elo(EloConfig),
    Glicko(GlickoConfig),
    Ecf(EcfConfig),
    Dwz(DwzConfig),
}

impl Default for CompetitorConfig {
    fn default() -> Self {
        CompetitorConfig::Elo(EloConfig::default())
    }
}

impl CompetitorConfig {
    pub fn kind(&self) -> CompetitorKind {
        match self {
            CompetitorConfig::Elo(_) => CompetitorKind::Elo,
            CompetitorConfig::Glicko(_) => CompetitorKind::Glicko,
            CompetitorConfig::Ecf(_) => CompetitorKind::Ecf,
            CompetitorConfig::Dwz(_) => CompetitorKind::Dwz,
        }
    }

    /// Materializes a fresh competitor from these defaults.
    pub fn create(&self) -> Result<Competitor, RatingError> {
        Ok(match self {
            CompetitorConfig::Elo(config) => {
                Competitor::Elo(EloCompetitor::with_config(config.clone())?)
            }
            CompetitorConfig::Glicko(config) => {
                Competitor::Glicko(GlickoCompetitor::with_config(config.clone())?)
            }
            CompetitorConfig::Ecf(config) => {
                Competitor::Ecf(EcfCompetitor::with_config(config.clone())?)
            }
            CompetitorConfig::Dwz(config) => {
                Competitor::Dwz(DwzCompetitor::with_config(config.clone())?)
            }
        })
    }

    /// Updates one named tunable, validating both the name and the value
    /// against the configured variant.
    pub fn set_var(&mut self, name: &str, value: f64) -> Result<(), RatingError> {
        // Probe on a scratch competitor so a bad name or value is rejected
        // without leaving the config half-updated.
        let mut probe = self.create()?;
        probe.set_var(name, value)?;
        *self = probe.config();
        Ok(())
    }
}

/// A stateful rating for one entity, of some variant.
#[derive(Clone, Debug)]
pub enum Competitor {
    Elo(EloCompetitor),
    Glicko(GlickoCompetitor),
    Ecf(EcfCompetitor),
    Dwz(DwzCompetitor),
}

impl Competitor {
    pub fn kind(&self) -> CompetitorKind {
        match self {
            Competitor::Elo(_) => CompetitorKind::Elo,
            Competitor::Glicko(_) => CompetitorKind::Glicko,
            Competitor::Ecf(_) => CompetitorKind::Ecf,
            Competitor::Dwz(_) => CompetitorKind::Dwz,
        }
    }

    pub fn rating(&self) -> f64 {
        match self {
            Competitor::Elo(c) => c.rating(),
            Competitor::Glicko(c) => c.rating(),
            Competitor::Ecf(c) => c.rating(),
            Competitor::Dwz(c) => c.rating(),
        }
    }

    /// Probability of this competitor beating `other`. All four variants
    /// require homogeneous pairings.
    pub fn expected_score(&self, other: &Competitor) -> Result<f64, RatingError> {
        match (self, other) {
            (Competitor::Elo(a), Competitor::Elo(b)) => Ok(a.expected_score(b)),
            (Competitor::Glicko(a), Competitor::Glicko(b)) => Ok(a.expected_score(b)),
            (Competitor::Ecf(a), Competitor::Ecf(b)) => Ok(a.expected_score(b)),
            (Competitor::Dwz(a), Competitor::Dwz(b)) => Ok(a.expected_score(b)),
            (a, b) => Err(RatingError::type_mismatch(
                a.kind().as_str(),
                b.kind().as_str(),
            )),
        }
    }

    /// Registers a win of `self` over `other`, mutating both.
    pub fn beat(&mut self, other: &mut Competitor) -> Result<(), RatingError> {
        match (&mut *self, &mut *other) {
            (Competitor::Elo(a), Competitor::Elo(b)) => a.beat(b),
            (Competitor::Glicko(a), Competitor::Glicko(b)) => a.beat(b),
            (Competitor::Ecf(a), Competitor::Ecf(b)) => a.beat(b),
            (Competitor::Dwz(a), Competitor::Dwz(b)) => a.beat(b),
            (a, b) => {
                return Err(RatingError::type_mismatch(
                    a.kind().as_str(),
                    b.kind().as_str(),
                ))
            }
        }
        Ok(())
    }

    pub fn lost_to(&mut self, other: &mut Competitor) -> Result<(), RatingError> {
        other.beat(self)
    }

    /// Registers a draw, mutating both symmetrically.
    pub fn tied(&mut self, other: &mut Competitor) -> Result<(), RatingError> {
        match (&mut *self, &mut *other) {
            (Competitor::Elo(a), Competitor::Elo(b)) => a.tied(b),
            (Competitor::Glicko(a), Competitor::Glicko(b)) => a.tied(b),
            (Competitor::Ecf(a), Competitor::Ecf(b)) => a.tied(b),
            (Competitor::Dwz(a), Competitor::Dwz(b)) => a.tied(b),
            (a, b) => {
                return Err(RatingError::type_mismatch(
                    a.kind().as_str(),
                    b.kind().as_str(),
                ))
            }
        }
        Ok(())
    }

    /// Restores the construction-time state.
    pub fn reset(&mut self) {
        match self {
            Competitor::Elo(c) => c.reset(),
            Competitor::Glicko(c) => c.reset(),
            Competitor::Ecf(c) => c.reset(),
            Competitor::Dwz(c) => c.reset(),
        }
    }

    pub fn export_state(&self) -> StateDoc {
        match self {
            Competitor::Elo(c) => c.export_state(),
            Competitor::Glicko(c) => c.export_state(),
            Competitor::Ecf(c) => c.export_state(),
            Competitor::Dwz(c) => c.export_state(),
        }
    }

    /// Reconstructs a competitor of whichever variant the document names.
    pub fn from_state(doc: &StateDoc) -> Result<Self, RatingError> {
        match CompetitorKind::from_name(&doc.kind)? {
            CompetitorKind::Elo => EloCompetitor::from_state(doc).map(Competitor::Elo),
            CompetitorKind::Glicko => GlickoCompetitor::from_state(doc).map(Competitor::Glicko),
            CompetitorKind::Ecf => EcfCompetitor::from_state(doc).map(Competitor::Ecf),
            CompetitorKind::Dwz => DwzCompetitor::from_state(doc).map(Competitor::Dwz),
        }
    }

    /// The variant's current rating deviation, for variants that track one.
    pub fn rating_deviation(&self) -> Option<f64> {
        match self {
            Competitor::Glicko(c) => Some(c.rd()),
            _ => None,
        }
    }

    /// The variant's effective match count, for variants that track one.
    pub fn match_count(&self) -> Option<u32> {
        match self {
            Competitor::Dwz(c) => Some(c.match_count()),
            _ => None,
        }
    }

    pub(crate) fn set_var(&mut self, name: &str, value: f64) -> Result<(), RatingError> {
        match self {
            Competitor::Elo(c) => c.set_var(name, value),
            Competitor::Glicko(c) => c.set_var(name, value),
            Competitor::Ecf(c) => c.set_var(name, value),
            Competitor::Dwz(c) => c.set_var(name, value),
        }
    }

    /// The current configuration, as arena construction defaults.
    pub fn config(&self) -> CompetitorConfig {
        match self {
            Competitor::Elo(c) => CompetitorConfig::Elo(c.config().clone()),
            Competitor::Glicko(c) => CompetitorConfig::Glicko(c.config().clone()),
            Competitor::Ecf(c) => CompetitorConfig::Ecf(c.config().clone()),
            Competitor::Dwz(c) => CompetitorConfig::Dwz(c.config().clone()),
        }
    }
}

fn check_initial_rating(initial_rating: f64, minimum_rating: f64) -> Result<(), RatingError> {
    if !minimum_rating.is_finite() {
        return Err(RatingError::invalid_parameter(
            "minimum_rating",
            "must be finite",
        ));
    }
    if !initial_rating.is_finite() || initial_rating < minimum_rating {
        return Err(RatingError::invalid_parameter(
            "initial_rating",
            format!("{initial_rating} is below the minimum rating {minimum_rating}"),
        ));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<(), RatingError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(RatingError::invalid_parameter(
            name,
            format!("{value} is not a positive finite number"),
        ));
    }
    Ok(())
}

fn unknown_var(kind: CompetitorKind, name: &str) -> RatingError {
    RatingError::invalid_parameter(name, format!("{kind} has no tunable by that name"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in [
            CompetitorKind::Elo,
            CompetitorKind::Glicko,
            CompetitorKind::Ecf,
            CompetitorKind::Dwz,
        ] {
            assert_eq!(CompetitorKind::from_name(kind.as_str()).unwrap(), kind);
        }
        assert!(CompetitorKind::from_name("ColleyMatrixCompetitor").is_err());
    }

    #[test]
    fn test_cross_variant_operations_are_rejected() {
        let mut elo = CompetitorConfig::Elo(EloConfig::default()).create().unwrap();
        let mut glicko = CompetitorConfig::Glicko(GlickoConfig::default())
            .create()
            .unwrap();

        assert!(matches!(
            elo.expected_score(&glicko),
            Err(RatingError::TypeMismatch { .. })
        ));
        assert!(matches!(
            elo.beat(&mut glicko),
            Err(RatingError::TypeMismatch { .. })
        ));
        assert!(matches!(
            glicko.tied(&mut elo),
            Err(RatingError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_cross_type_state_load_is_rejected() {
        let glicko = GlickoCompetitor::new(1500.0, 350.0).unwrap();
        let doc = glicko.export_state();
        assert!(matches!(
            EloCompetitor::from_state(&doc),
            Err(RatingError::InvalidState(_))
        ));
        // The tagged loader, by contrast, follows the document's own type.
        assert_eq!(
            Competitor::from_state(&doc).unwrap().kind(),
            CompetitorKind::Glicko
        );
    }

    #[test]
    fn test_config_set_var_validates_names() {
        let mut config = CompetitorConfig::Elo(EloConfig::default());
        config.set_var("k_factor", 20.0).unwrap();
        match &config {
            CompetitorConfig::Elo(elo) => assert_eq!(elo.k_factor, 20.0),
            _ => unreachable!(),
        }
        assert!(config.set_var("c", 30.0).is_err());
        assert!(config.set_var("k_factor", -1.0).is_err());
    }

    #[test]
    fn test_homogeneous_dispatch_updates_both_sides() {
        let config = CompetitorConfig::Dwz(DwzConfig {
            initial_rating: 1500.0,
            ..DwzConfig::default()
        });
        let mut a = config.create().unwrap();
        let mut b = config.create().unwrap();
        a.beat(&mut b).unwrap();
        assert!(a.rating() > 1500.0);
        assert!(b.rating() < 1500.0);
        assert_eq!(a.match_count(), Some(1));
        assert_eq!(a.rating_deviation(), None);
    }
}

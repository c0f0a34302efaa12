//! Weighted blending of several competitors into one.

use crate::error::RatingError;
use crate::state::StateDoc;

use super::Competitor;

/// Tolerance on the weight sum.
const WEIGHT_EPSILON: f64 = 1e-6;

/// A composition of component competitors, each with a blending weight.
///
/// Expectations are the weighted sum of the component expectations; bout
/// updates are dispatched pairwise to each component. Two blended
/// competitors can only face each other when their component variants
/// match, kind for kind, in the same order.
#[derive(Clone, Debug)]
pub struct BlendedCompetitor {
    components: Vec<(Competitor, f64)>,
}

impl BlendedCompetitor {
    pub fn new(components: Vec<(Competitor, f64)>) -> Result<Self, RatingError> {
        if components.is_empty() {
            return Err(RatingError::invalid_parameter(
                "components",
                "a blend needs at least one component",
            ));
        }
        let mut total = 0.0;
        for (_, weight) in &components {
            if !(weight.is_finite() && *weight >= 0.0) {
                return Err(RatingError::invalid_parameter(
                    "weight",
                    format!("{weight} is not a non-negative finite number"),
                ));
            }
            total += weight;
        }
        if (total - 1.0).abs() > WEIGHT_EPSILON {
            return Err(RatingError::invalid_parameter(
                "weight",
                format!("weights sum to {total}, expected 1"),
            ));
        }
        Ok(Self { components })
    }

    /// An equal-weight blend.
    pub fn uniform(competitors: Vec<Competitor>) -> Result<Self, RatingError> {
        let weight = 1.0 / competitors.len().max(1) as f64;
        Self::new(
            competitors
                .into_iter()
                .map(|competitor| (competitor, weight))
                .collect(),
        )
    }

    pub fn components(&self) -> &[(Competitor, f64)] {
        &self.components
    }

    /// Weighted mean of the component ratings.
    pub fn rating(&self) -> f64 {
        self.components
            .iter()
            .map(|(competitor, weight)| competitor.rating() * weight)
            .sum()
    }

    /// Fails fast, before any mutation, when the two blends do not line up
    /// component for component.
    fn check_alignment(&self, other: &Self) -> Result<(), RatingError> {
        if self.components.len() != other.components.len() {
            return Err(RatingError::invalid_parameter(
                "components",
                format!(
                    "blends have {} and {} components",
                    self.components.len(),
                    other.components.len()
                ),
            ));
        }
        for ((own, _), (theirs, _)) in self.components.iter().zip(&other.components) {
            if own.kind() != theirs.kind() {
                return Err(RatingError::type_mismatch(
                    own.kind().as_str(),
                    theirs.kind().as_str(),
                ));
            }
        }
        Ok(())
    }

    pub fn expected_score(&self, other: &Self) -> Result<f64, RatingError> {
        self.check_alignment(other)?;
        let mut blended = 0.0;
        for ((own, weight), (theirs, _)) in self.components.iter().zip(&other.components) {
            blended += weight * own.expected_score(theirs)?;
        }
        Ok(blended)
    }

    pub fn beat(&mut self, other: &mut Self) -> Result<(), RatingError> {
        self.check_alignment(other)?;
        for ((own, _), (theirs, _)) in self.components.iter_mut().zip(&mut other.components) {
            own.beat(theirs)?;
        }
        Ok(())
    }

    pub fn lost_to(&mut self, other: &mut Self) -> Result<(), RatingError> {
        other.beat(self)
    }

    pub fn tied(&mut self, other: &mut Self) -> Result<(), RatingError> {
        self.check_alignment(other)?;
        for ((own, _), (theirs, _)) in self.components.iter_mut().zip(&mut other.components) {
            own.tied(theirs)?;
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        for (competitor, _) in &mut self.components {
            competitor.reset();
        }
    }

    /// State documents of every component, with their weights. A blend is
    /// a composition layer, so it has no single-document form of its own.
    pub fn export_state(&self) -> Vec<(StateDoc, f64)> {
        self.components
            .iter()
            .map(|(competitor, weight)| (competitor.export_state(), *weight))
            .collect()
    }

    pub fn from_state(parts: &[(StateDoc, f64)]) -> Result<Self, RatingError> {
        let components = parts
            .iter()
            .map(|(doc, weight)| Ok((Competitor::from_state(doc)?, *weight)))
            .collect::<Result<Vec<_>, RatingError>>()?;
        Self::new(components)
    }
}

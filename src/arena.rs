//! The bout dispatcher: owns a population of competitors of one configured
//! variant, decides bouts through a caller-supplied oracle, and records
//! every prediction in a [`History`].

use crate::competitors::{Competitor, CompetitorConfig};
use crate::error::RatingError;
use crate::history::{Bout, History, Outcome};
use crate::state::StateDoc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;

/// Decides the winner of a bout. `Some(true)` means the left side won,
/// `Some(false)` the right side; `None` means a draw or that the oracle
/// declined to decide (e.g. equal inputs). Implementations may consult the
/// bout's attributes.
pub type Oracle<K> = dyn FnMut(&K, &K, Option<&Value>) -> Option<bool>;

/// What an arena does with a bout the oracle returns `None` for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawPolicy {
    /// Record the bout as undecided and leave both ratings untouched.
    #[default]
    Record,
    /// Treat it as a draw and update both sides.
    TreatAsTie,
}

/// One leaderboard row. Variant-specific columns are present only when the
/// configured variant tracks them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry<K> {
    pub competitor: K,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<u32>,
}

/// Maps opaque identifiers to lazily-created competitors and drives bouts
/// between them.
///
/// Competitors are materialized from the configured defaults on first
/// sight of an identifier and never replaced afterwards, except through an
/// explicit state reload. A single arena is not safe under concurrent
/// mutation; run independent arenas on separate threads instead.
pub struct LambdaArena<K> {
    oracle: Box<Oracle<K>>,
    config: CompetitorConfig,
    draw_policy: DrawPolicy,
    competitors: HashMap<K, RefCell<Competitor>>,
    history: History<K>,
}

impl<K> LambdaArena<K>
where
    K: Eq + Hash + Ord + Clone,
{
    /// An arena of Elo competitors with default parameters; see
    /// [`with_config`](Self::with_config) for other variants.
    pub fn new(oracle: impl FnMut(&K, &K, Option<&Value>) -> Option<bool> + 'static) -> Self {
        Self {
            oracle: Box::new(oracle),
            config: CompetitorConfig::default(),
            draw_policy: DrawPolicy::default(),
            competitors: HashMap::new(),
            history: History::new(),
        }
    }

    /// Sets the competitor variant and its construction defaults.
    pub fn with_config(mut self, config: CompetitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_draw_policy(mut self, draw_policy: DrawPolicy) -> Self {
        self.draw_policy = draw_policy;
        self
    }

    /// Seeds the population from exported state documents before any bouts
    /// run.
    pub fn with_initial_state(
        mut self,
        states: HashMap<K, StateDoc>,
    ) -> Result<Self, RatingError> {
        self.seed_state(states)?;
        Ok(self)
    }

    pub fn config(&self) -> &CompetitorConfig {
        &self.config
    }

    pub fn history(&self) -> &History<K> {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn num_competitors(&self) -> usize {
        self.competitors.len()
    }

    pub fn contains(&self, id: &K) -> bool {
        self.competitors.contains_key(id)
    }

    /// Updates one of the variant's tunables for all future and existing
    /// competitors. The new value is validated before anything is touched.
    pub fn set_competitor_class_var(&mut self, name: &str, value: f64) -> Result<(), RatingError> {
        self.config.set_var(name, value)?;
        for cell in self.competitors.values() {
            cell.borrow_mut().set_var(name, value)?;
        }
        Ok(())
    }

    /// Replaces or creates competitors from exported documents. Every
    /// document is checked against the configured variant before any of
    /// them is applied.
    pub fn seed_state(&mut self, states: HashMap<K, StateDoc>) -> Result<(), RatingError> {
        let expected = self.config.kind();
        let mut loaded = Vec::with_capacity(states.len());
        for (id, doc) in states {
            doc.check_kind(expected.as_str())?;
            loaded.push((id, Competitor::from_state(&doc)?));
        }
        tracing::info!("seeding arena with {} competitor states", loaded.len());
        for (id, competitor) in loaded {
            self.competitors.insert(id, RefCell::new(competitor));
        }
        Ok(())
    }

    fn ensure_competitor(&mut self, id: &K) -> Result<(), RatingError> {
        if !self.competitors.contains_key(id) {
            let competitor = self.config.create()?;
            self.competitors.insert(id.clone(), RefCell::new(competitor));
        }
        Ok(())
    }

    /// Predicted probability of `a` beating `b`, creating either
    /// competitor if it has not been seen yet. Does not mutate ratings or
    /// record a bout.
    pub fn expected_score(&mut self, a: &K, b: &K) -> Result<f64, RatingError> {
        self.ensure_competitor(a)?;
        self.ensure_competitor(b)?;
        if a == b {
            return Ok(0.5);
        }
        let left = self.cell(a).borrow();
        let right = self.cell(b).borrow();
        left.expected_score(&right)
    }

    /// Runs a single bout: materializes both sides, records the pre-bout
    /// prediction, consults the oracle, applies the outcome.
    pub fn matchup(&mut self, a: K, b: K) -> Result<(), RatingError> {
        self.matchup_with_attributes(a, b, None)
    }

    pub fn matchup_with_attributes(
        &mut self,
        a: K,
        b: K,
        attributes: Option<Value>,
    ) -> Result<(), RatingError> {
        if a == b {
            return Err(RatingError::invalid_parameter(
                "matchup",
                "a bout requires two distinct competitors",
            ));
        }
        self.ensure_competitor(&a)?;
        self.ensure_competitor(&b)?;

        let predicted_outcome = {
            let left = self.cell(&a).borrow();
            let right = self.cell(&b).borrow();
            left.expected_score(&right)?
        };

        let decision = (self.oracle)(&a, &b, attributes.as_ref());
        let outcome = {
            let mut left = self.cell(&a).borrow_mut();
            let mut right = self.cell(&b).borrow_mut();
            match decision {
                Some(true) => {
                    left.beat(&mut right)?;
                    Outcome::LeftWin
                }
                Some(false) => {
                    right.beat(&mut left)?;
                    Outcome::RightWin
                }
                None => match self.draw_policy {
                    DrawPolicy::TreatAsTie => {
                        left.tied(&mut right)?;
                        Outcome::Draw
                    }
                    DrawPolicy::Record => {
                        tracing::warn!("oracle declined to decide; recording bout as undecided");
                        Outcome::Undecided
                    }
                },
            }
        };

        self.history.add_bout(Bout {
            left: a,
            right: b,
            predicted_outcome,
            outcome,
            attributes,
        });
        Ok(())
    }

    /// Dispatches bouts strictly in the supplied order.
    pub fn tournament(
        &mut self,
        matchups: impl IntoIterator<Item = (K, K)>,
    ) -> Result<(), RatingError> {
        for (a, b) in matchups {
            self.matchup(a, b)?;
        }
        Ok(())
    }

    pub fn tournament_with_attributes(
        &mut self,
        matchups: impl IntoIterator<Item = (K, K, Option<Value>)>,
    ) -> Result<(), RatingError> {
        for (a, b, attributes) in matchups {
            self.matchup_with_attributes(a, b, attributes)?;
        }
        Ok(())
    }

    /// Every competitor, best first. Equal ratings are ordered by
    /// identifier so the board is stable across runs.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry<K>> {
        let mut entries: Vec<LeaderboardEntry<K>> = self
            .competitors
            .iter()
            .map(|(id, cell)| {
                let competitor = cell.borrow();
                LeaderboardEntry {
                    competitor: id.clone(),
                    rating: competitor.rating(),
                    rd: competitor.rating_deviation(),
                    matches: competitor.match_count(),
                }
            })
            .collect();
        entries.sort_by(|x, y| {
            y.rating
                .total_cmp(&x.rating)
                .then_with(|| x.competitor.cmp(&y.competitor))
        });
        entries
    }

    /// State documents for the whole population. Exporting does not clear
    /// the history.
    pub fn export_state(&self) -> HashMap<K, StateDoc> {
        self.competitors
            .iter()
            .map(|(id, cell)| (id.clone(), cell.borrow().export_state()))
            .collect()
    }

    fn cell(&self, id: &K) -> &RefCell<Competitor> {
        self.competitors
            .get(id)
            .expect("competitor was just materialized")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::competitors::{EloConfig, GlickoConfig};

    fn greater_than_arena() -> LambdaArena<i64> {
        LambdaArena::new(|a: &i64, b: &i64, _| if a == b { None } else { Some(a > b) })
    }

    #[test]
    fn test_competitors_are_created_lazily() {
        let mut arena = greater_than_arena();
        assert_eq!(arena.num_competitors(), 0);
        arena.matchup(10, 5).unwrap();
        assert_eq!(arena.num_competitors(), 2);
        assert!(arena.contains(&10) && arena.contains(&5));
        assert_eq!(arena.history().len(), 1);
    }

    #[test]
    fn test_winner_gains_and_loser_drops() {
        let mut arena = greater_than_arena();
        arena.matchup(10, 5).unwrap();
        let initial = EloConfig::default().initial_rating;
        let board = arena.leaderboard();
        assert_eq!(board[0].competitor, 10);
        assert!(board[0].rating > initial);
        assert!(board[1].rating < initial);
    }

    #[test]
    fn test_matchup_rejects_identical_ids() {
        let mut arena = greater_than_arena();
        assert!(matches!(
            arena.matchup(7, 7),
            Err(RatingError::InvalidParameter { .. })
        ));
        assert!(arena.history().is_empty());
    }

    #[test]
    fn test_undecided_bouts_leave_ratings_untouched_by_default() {
        // Distinct ids that compare equal through the oracle.
        let mut arena = LambdaArena::new(|a: &i64, b: &i64, _| {
            if a % 10 == b % 10 {
                None
            } else {
                Some(a % 10 > b % 10)
            }
        });
        arena.matchup(12, 2).unwrap();
        let board = arena.leaderboard();
        let initial = EloConfig::default().initial_rating;
        assert!(board.iter().all(|entry| entry.rating == initial));
        assert_eq!(arena.history().bouts()[0].outcome, Outcome::Undecided);
    }

    #[test]
    fn test_draw_policy_treat_as_tie_updates_ratings() {
        let mut arena = LambdaArena::new(|_: &i64, _: &i64, _| None)
            .with_draw_policy(DrawPolicy::TreatAsTie)
            .with_config(CompetitorConfig::Elo(EloConfig {
                initial_rating: 1000.0,
                ..EloConfig::default()
            }));
        arena.matchup(1, 2).unwrap();
        assert_eq!(arena.history().bouts()[0].outcome, Outcome::Draw);
        // Equal ratings draw to no change.
        let board = arena.leaderboard();
        assert!(board.iter().all(|entry| (entry.rating - 1000.0).abs() < 1e-9));
    }

    #[test]
    fn test_attributes_reach_the_oracle_and_the_record() {
        let mut arena = LambdaArena::new(|_: &&str, _: &&str, attrs: Option<&Value>| {
            attrs.and_then(|value| value.get("left_won")).and_then(Value::as_bool)
        });
        arena
            .matchup_with_attributes("x", "y", Some(serde_json::json!({ "left_won": false })))
            .unwrap();
        let bout = &arena.history().bouts()[0];
        assert_eq!(bout.outcome, Outcome::RightWin);
        assert_eq!(bout.attributes.as_ref().unwrap()["left_won"], false);
    }

    #[test]
    fn test_expected_score_does_not_mutate_or_record() {
        let mut arena = greater_than_arena();
        let p = arena.expected_score(&1, &2).unwrap();
        assert!((p - 0.5).abs() < 1e-9);
        assert_eq!(arena.num_competitors(), 2);
        assert!(arena.history().is_empty());
    }

    #[test]
    fn test_prediction_is_computed_before_mutation() {
        let mut arena = greater_than_arena();
        arena.matchup(10, 5).unwrap();
        // First sight of both sides: the pre-bout prediction must be even.
        assert!((arena.history().bouts()[0].predicted_outcome - 0.5).abs() < 1e-9);
        arena.matchup(10, 5).unwrap();
        assert!(arena.history().bouts()[1].predicted_outcome > 0.5);
    }

    #[test]
    fn test_set_class_var_reaches_existing_competitors() {
        let mut arena = greater_than_arena();
        arena.matchup(10, 5).unwrap();
        let spread_before = {
            let board = arena.leaderboard();
            board[0].rating - board[1].rating
        };
        arena.set_competitor_class_var("k_factor", 64.0).unwrap();
        arena.matchup(20, 15).unwrap();
        let board = arena.leaderboard();
        let twenty = board.iter().find(|e| e.competitor == 20).unwrap();
        let fifteen = board.iter().find(|e| e.competitor == 15).unwrap();
        // Double the k-factor doubles the first-bout spread.
        assert!((twenty.rating - fifteen.rating - 2.0 * spread_before).abs() < 1e-9);
    }

    #[test]
    fn test_set_class_var_rejects_unknown_names_untouched() {
        let mut arena = greater_than_arena();
        arena.matchup(10, 5).unwrap();
        assert!(arena.set_competitor_class_var("c", 35.0).is_err());
        match arena.config() {
            CompetitorConfig::Elo(config) => assert_eq!(config.k_factor, 32.0),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_leaderboard_breaks_ties_by_identifier() {
        let mut arena = greater_than_arena();
        arena.expected_score(&3, &1).unwrap();
        arena.expected_score(&2, &4).unwrap();
        let board = arena.leaderboard();
        let ids: Vec<i64> = board.into_iter().map(|entry| entry.competitor).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_leaderboard_carries_glicko_deviation() {
        let mut arena = LambdaArena::new(|a: &i64, b: &i64, _| Some(a > b))
            .with_config(CompetitorConfig::Glicko(GlickoConfig::default()));
        arena.matchup(2, 1).unwrap();
        let board = arena.leaderboard();
        assert!(board.iter().all(|entry| entry.rd.is_some()));
        assert!(board.iter().all(|entry| entry.matches.is_none()));
    }

    #[test]
    fn test_export_and_reload_state() {
        let mut arena = greater_than_arena();
        arena.tournament(vec![(10, 5), (10, 3), (5, 3)]).unwrap();
        let states = arena.export_state();
        assert_eq!(states.len(), 3);

        let mut restored = greater_than_arena().with_initial_state(states).unwrap();
        let original = arena.leaderboard();
        let reloaded = restored.leaderboard();
        assert_eq!(original, reloaded);
        assert!(restored.history().is_empty());
        restored.matchup(10, 5).unwrap();
    }

    #[test]
    fn test_seed_state_rejects_wrong_variant_before_applying() {
        let glicko_doc = crate::competitors::GlickoCompetitor::new(1500.0, 350.0)
            .unwrap()
            .export_state();
        let mut states = HashMap::new();
        states.insert(1i64, glicko_doc);
        let arena = greater_than_arena().with_initial_state(states);
        assert!(matches!(arena, Err(RatingError::InvalidState(_))));
    }

    #[test]
    fn test_clear_history_keeps_ratings() {
        let mut arena = greater_than_arena();
        arena.tournament(vec![(10, 5), (10, 3)]).unwrap();
        arena.clear_history();
        assert!(arena.history().is_empty());
        assert_eq!(arena.num_competitors(), 3);
    }
}

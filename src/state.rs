//! Portable state documents for competitors.
//!
//! A state document is a self-describing JSON record: a `type` tag naming
//! the competitor kind, a format `version`, provenance (`created_at`,
//! `id`), and three structured objects holding constructor `parameters`,
//! dynamic `state`, and the variant's tunables as `class_vars`. For backward
//! compatibility the encoder also mirrors `initial_rating` and
//! `current_rating` as flattened top-level fields; the decoder prefers the
//! structured objects and falls back to the flattened ones.

use crate::error::RatingError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Current state-document format version.
pub const STATE_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateDoc {
    /// Competitor kind tag, e.g. `"EloCompetitor"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    /// Seconds since the Unix epoch at export time.
    pub created_at: u64,
    pub id: Uuid,
    /// Constructor-time values.
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Dynamic values at export time.
    #[serde(default)]
    pub state: Map<String, Value>,
    /// The variant's tunables at export time.
    #[serde(default)]
    pub class_vars: Map<String, Value>,
    /// Flattened mirror fields, kept for older readers. Ignored when the
    /// structured objects carry the same information.
    #[serde(flatten)]
    pub flattened: Map<String, Value>,
}

impl StateDoc {
    /// Starts an empty document for the given kind tag, stamped with a
    /// fresh id and the current time.
    pub fn new(kind: &str) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        Self {
            kind: kind.to_owned(),
            version: STATE_VERSION,
            created_at,
            id: Uuid::new_v4(),
            parameters: Map::new(),
            state: Map::new(),
            class_vars: Map::new(),
            flattened: Map::new(),
        }
    }

    /// Rejects documents whose `type` tag or `version` do not match the
    /// receiving variant.
    pub fn check_kind(&self, expected: &'static str) -> Result<(), RatingError> {
        if self.kind != expected {
            return Err(RatingError::invalid_state(format!(
                "state document is for `{}`, not `{}`",
                self.kind, expected
            )));
        }
        if self.version != STATE_VERSION {
            return Err(RatingError::invalid_state(format!(
                "unsupported state document version {} (expected {})",
                self.version, STATE_VERSION
            )));
        }
        Ok(())
    }

    /// Looks up a constructor parameter, falling back to the flattened
    /// field of the same name.
    pub fn parameter(&self, name: &str) -> Option<f64> {
        number(&self.parameters, name).or_else(|| number(&self.flattened, name))
    }

    pub fn require_parameter(&self, name: &str) -> Result<f64, RatingError> {
        self.parameter(name)
            .ok_or_else(|| RatingError::invalid_state(format!("missing parameter `{name}`")))
    }

    /// Looks up a dynamic state field, falling back to the given flattened
    /// alias (e.g. `rating` is mirrored as top-level `current_rating`).
    pub fn state_field(&self, name: &str, flattened_alias: &str) -> Option<f64> {
        number(&self.state, name).or_else(|| number(&self.flattened, flattened_alias))
    }

    pub fn require_state_field(&self, name: &str, flattened_alias: &str) -> Result<f64, RatingError> {
        self.state_field(name, flattened_alias)
            .ok_or_else(|| RatingError::invalid_state(format!("missing state field `{name}`")))
    }

    pub fn class_var(&self, name: &str) -> Option<f64> {
        number(&self.class_vars, name)
    }

    pub fn set_parameter(&mut self, name: &str, value: f64) {
        self.parameters.insert(name.to_owned(), json_number(value));
    }

    pub fn set_state_field(&mut self, name: &str, value: f64) {
        self.state.insert(name.to_owned(), json_number(value));
    }

    pub fn set_class_var(&mut self, name: &str, value: f64) {
        self.class_vars.insert(name.to_owned(), json_number(value));
    }

    /// Emits the backward-compatible flattened mirrors of the initial and
    /// current rating.
    pub fn set_flattened_ratings(&mut self, initial: f64, current: f64) {
        self.flattened
            .insert("initial_rating".to_owned(), json_number(initial));
        self.flattened
            .insert("current_rating".to_owned(), json_number(current));
    }

    /// Floor check applied when a rating-like field is assigned from a
    /// document. Values below the floor were supplied by a caller, so they
    /// are an error rather than a clamp.
    pub fn check_floor(name: &str, value: f64, floor: f64) -> Result<f64, RatingError> {
        if !value.is_finite() {
            return Err(RatingError::invalid_state(format!(
                "state field `{name}` is not finite"
            )));
        }
        if value < floor {
            return Err(RatingError::invalid_state(format!(
                "state field `{name}` is {value}, below the minimum rating {floor}"
            )));
        }
        Ok(value)
    }
}

fn number(map: &Map<String, Value>, name: &str) -> Option<f64> {
    map.get(name).and_then(Value::as_f64)
}

fn json_number(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

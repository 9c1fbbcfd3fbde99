use serde::{Deserialize, Serialize};

use super::errors::ParseResult;
use super::services::Evaluable;

/// A user formula as kept in the formula list.
///
/// `valid` and `error_message` mirror the last compilation of `expression`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Formula {
    pub id: String,
    pub expression: String,
    pub color: String,
    pub enabled: bool,
    #[serde(default)]
    pub locked: bool,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Formula {
    /// Builds an enabled, unlocked formula from a compilation result.
    pub fn new(id: String, expression: String, color: String, compiled: &ParseResult<Evaluable>) -> Self {
        let mut formula = Self {
            id,
            expression,
            color,
            enabled: true,
            locked: false,
            valid: false,
            error_message: None,
        };
        formula.record_compilation(compiled);
        formula
    }

    /// Copies the outcome of a compilation into `valid`/`error_message`.
    pub fn record_compilation(&mut self, compiled: &ParseResult<Evaluable>) {
        match compiled {
            Ok(_) => {
                self.valid = true;
                self.error_message = None;
            }
            Err(err) => {
                self.valid = false;
                self.error_message = Some(err.to_string());
            }
        }
    }
}

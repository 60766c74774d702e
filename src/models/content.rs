// src/models/content.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::flex;

/// A block of questions sharing one format inside a part.
///
/// Only `type` and `question_list` matter to scoring; titles, pictures,
/// matching options and the like ride along in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeGroup {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub question_list: Vec<Question>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(deserialize_with = "flex::text")]
    pub no: String,

    /// Reference answer: a scalar, or a list for multi-select groups.
    #[serde(default)]
    pub answer: Value,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

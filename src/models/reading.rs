// src/models/reading.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    Content, PartRef, Record,
    content::TypeGroup,
    tables::{READING_PARTS, READING_SETS},
};
use crate::{store::Table, utils::flex};

/// Represents the 'reading_list' table.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReadingSet {
    #[serde(default)]
    pub id: i64,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters."))]
    pub name: String,

    #[serde(default, deserialize_with = "flex::int")]
    pub status: i32,

    #[serde(rename = "type", default, deserialize_with = "flex::int")]
    pub source_type: i32,

    #[serde(default)]
    pub part_list: Vec<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Record for ReadingSet {
    const TABLE: Table = READING_SETS;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Content for ReadingSet {
    const PART_REFS: &'static [PartRef] = &[PartRef {
        ids_column: "part_list",
        table: READING_PARTS,
        expand_as: "part_list",
    }];

    fn source_type(&self) -> i32 {
        self.source_type
    }

    fn set_owner(&mut self, user_id: String) {
        self.user_id = Some(user_id);
    }
}

/// Represents the 'reading_part_list' table: a passage and its questions.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReadingPart {
    #[serde(default)]
    pub id: i64,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters."))]
    pub name: String,

    #[serde(rename = "type", default, deserialize_with = "flex::int")]
    pub source_type: i32,

    /// Passage text, usually HTML.
    #[serde(default)]
    pub article: String,

    #[serde(default)]
    pub type_list: Vec<TypeGroup>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Record for ReadingPart {
    const TABLE: Table = READING_PARTS;
    const FILTERS: &'static [&'static str] = &["name", "type"];

    fn id(&self) -> i64 {
        self.id
    }
}

impl Content for ReadingPart {
    fn source_type(&self) -> i32 {
        self.source_type
    }

    fn set_owner(&mut self, user_id: String) {
        self.user_id = Some(user_id);
    }
}

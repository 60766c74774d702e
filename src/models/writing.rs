// src/models/writing.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    Content, PartRef, Record,
    tables::{WRITING_PARTS, WRITING_SETS},
};
use crate::{store::Table, utils::flex};

/// Represents the 'writing_list' table.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WritingSet {
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

impl Record for WritingSet {
    const TABLE: Table = WRITING_SETS;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Content for WritingSet {
    const PART_REFS: &'static [PartRef] = &[PartRef {
        ids_column: "part_list",
        table: WRITING_PARTS,
        expand_as: "part_list",
    }];

    fn source_type(&self) -> i32 {
        self.source_type
    }

    fn set_owner(&mut self, user_id: String) {
        self.user_id = Some(user_id);
    }
}

/// Represents the 'writing_part_list' table: a single writing task.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WritingPart {
    #[serde(default)]
    pub id: i64,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters."))]
    pub name: String,

    #[serde(rename = "type", default, deserialize_with = "flex::int")]
    pub source_type: i32,

    /// 1 = Task 1, 2 = Task 2.
    #[serde(default, deserialize_with = "flex::opt_int")]
    pub task_type: Option<i32>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub sub_title: String,

    /// Chart or diagram for Task 1.
    #[serde(default)]
    pub img: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Record for WritingPart {
    const TABLE: Table = WRITING_PARTS;
    const FILTERS: &'static [&'static str] = &["name", "type"];

    fn id(&self) -> i64 {
        self.id
    }
}

impl Content for WritingPart {
    fn source_type(&self) -> i32 {
        self.source_type
    }

    fn set_owner(&mut self, user_id: String) {
        self.user_id = Some(user_id);
    }
}

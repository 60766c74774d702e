// src/models/testing.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    Content, PartRef, Record,
    tables::{LISTENING_PARTS, READING_PARTS, TESTING_SETS, WRITING_PARTS},
};
use crate::{store::Table, utils::flex};

/// Represents the 'testing_list' table: a full mock test combining parts of
/// every section.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TestingSet {
    #[serde(default)]
    pub id: i64,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters."))]
    pub name: String,

    #[serde(default, deserialize_with = "flex::int")]
    pub status: i32,

    #[serde(rename = "type", default, deserialize_with = "flex::int")]
    pub source_type: i32,

    #[serde(default)]
    pub listening_ids: Vec<i64>,

    #[serde(default)]
    pub reading_ids: Vec<i64>,

    #[serde(default)]
    pub writing_ids: Vec<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Record for TestingSet {
    const TABLE: Table = TESTING_SETS;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Content for TestingSet {
    const PART_REFS: &'static [PartRef] = &[
        PartRef {
            ids_column: "listening_ids",
            table: LISTENING_PARTS,
            expand_as: "listening_parts",
        },
        PartRef {
            ids_column: "reading_ids",
            table: READING_PARTS,
            expand_as: "reading_parts",
        },
        PartRef {
            ids_column: "writing_ids",
            table: WRITING_PARTS,
            expand_as: "writing_parts",
        },
    ];

    fn source_type(&self) -> i32 {
        self.source_type
    }

    fn set_owner(&mut self, user_id: String) {
        self.user_id = Some(user_id);
    }
}

// src/models/listening.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    Content, PartRef, Record,
    content::TypeGroup,
    tables::{LISTENING_PARTS, LISTENING_SETS},
};
use crate::{store::Table, utils::flex};

/// Represents the 'listening_list' table: a listening test made of parts.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListeningSet {
    #[serde(default)]
    pub id: i64,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters."))]
    pub name: String,

    #[serde(default, deserialize_with = "flex::int")]
    pub status: i32,

    /// Content source: 1 = system, 2 = official, 3 = user.
    #[serde(rename = "type", default, deserialize_with = "flex::int")]
    pub source_type: i32,

    #[serde(default)]
    pub audio_files: Vec<String>,

    /// Ids into `listening_part_list`, in playing order.
    #[serde(default)]
    pub part_list: Vec<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Record for ListeningSet {
    const TABLE: Table = LISTENING_SETS;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Content for ListeningSet {
    const PART_REFS: &'static [PartRef] = &[PartRef {
        ids_column: "part_list",
        table: LISTENING_PARTS,
        expand_as: "part_list",
    }];

    fn source_type(&self) -> i32 {
        self.source_type
    }

    fn set_owner(&mut self, user_id: String) {
        self.user_id = Some(user_id);
    }
}

/// Represents the 'listening_part_list' table: one recording section with
/// its question groups.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListeningPart {
    #[serde(default)]
    pub id: i64,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters."))]
    pub name: String,

    #[serde(rename = "type", default, deserialize_with = "flex::int")]
    pub source_type: i32,

    #[serde(default)]
    pub type_list: Vec<TypeGroup>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Record for ListeningPart {
    const TABLE: Table = LISTENING_PARTS;
    const FILTERS: &'static [&'static str] = &["name", "type"];

    fn id(&self) -> i64 {
        self.id
    }
}

impl Content for ListeningPart {
    fn source_type(&self) -> i32 {
        self.source_type
    }

    fn set_owner(&mut self, user_id: String) {
        self.user_id = Some(user_id);
    }
}

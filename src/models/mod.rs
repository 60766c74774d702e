// src/models/mod.rs

pub mod content;
pub mod listening;
pub mod reading;
pub mod record;
pub mod tables;
pub mod testing;
pub mod user;
pub mod writing;

use serde::{Serialize, de::DeserializeOwned};
use validator::Validate;

use crate::{
    scoring::{AnswerItem, Score},
    store::Table,
};

/// `type` of content and records created by a user rather than shipped
/// with the platform.
pub const USER_OWNED: i32 = 3;

/// Record `status` values.
pub const IN_PROGRESS: i32 = 0;
pub const SUBMITTED: i32 = 1;

/// An entity persisted through the record store.
pub trait Record: Serialize + DeserializeOwned + Validate + Send + Sync + 'static {
    const TABLE: Table;

    /// Columns a list request may filter on.
    const FILTERS: &'static [&'static str] = &["name", "status", "type"];

    /// Zero until the row has been stored.
    fn id(&self) -> i64;
}

/// A column of part ids on a set, resolved into full part rows on read.
#[derive(Debug, Clone, Copy)]
pub struct PartRef {
    pub ids_column: &'static str,
    pub table: Table,
    /// Key the resolved parts are returned under.
    pub expand_as: &'static str,
}

/// Sets and parts managed through the config endpoints.
pub trait Content: Record {
    const PART_REFS: &'static [PartRef] = &[];

    fn source_type(&self) -> i32;

    fn set_owner(&mut self, user_id: String);
}

/// A user's attempt at a test.
///
/// Scores and `status` only change on submission. Everything else a client
/// sends is progress.
pub trait Attempt: Record {
    fn owner(&self) -> Option<&str>;

    /// Turns the request into a fresh attempt by `user_id`: in progress,
    /// nothing scored.
    fn start(&mut self, user_id: &str);

    /// Keeps ownership, status and results from the stored attempt so only
    /// progress is taken from the request.
    fn resume(&mut self, stored: &Self);
}

/// An attempt scored against a single listening or reading set.
pub trait SectionAttempt: Attempt {
    /// Sets the attempt's `test_id` points into.
    const SETS: Table;
    /// Parts referenced by the set's `part_list`.
    const PARTS: Table;

    fn test_id(&self) -> i64;

    fn answers(&self) -> &[AnswerItem];

    /// Stores the result and marks the attempt submitted.
    fn record_score(&mut self, score: Score);
}

// src/models/record.rs

//! Users' attempts at tests. Every row belongs to the user in `user_id`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::{
    Attempt, IN_PROGRESS, Record, SUBMITTED, SectionAttempt, USER_OWNED,
    tables::{
        LISTENING_PARTS, LISTENING_RECORDS, LISTENING_SETS, READING_PARTS, READING_RECORDS,
        READING_SETS, TESTING_RECORDS, WRITING_RECORDS,
    },
};
use crate::{
    scoring::{AnswerItem, Score},
    store::Table,
    utils::flex,
};

const RECORD_FILTERS: &[&str] = &["name", "status", "type", "test_id"];

/// Represents the 'listening_records' table.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListeningRecord {
    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    #[validate(length(max = 255))]
    pub name: String,

    #[serde(default, deserialize_with = "flex::int")]
    pub status: i32,

    #[serde(rename = "type", default, deserialize_with = "flex::int")]
    pub source_type: i32,

    /// Band score, filled in on submission.
    #[serde(default)]
    pub score: f64,

    /// Raw number of correct answers behind `score`.
    #[serde(default)]
    pub correct_count: i32,

    #[serde(default)]
    pub answers: Vec<AnswerItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Time left on the clock when the attempt was last saved.
    #[serde(default)]
    pub rest_seconds: i32,

    /// Id of the listening set being attempted.
    #[serde(default)]
    pub test_id: i64,
}

/// Represents the 'reading_records' table. Same shape as listening.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReadingRecord {
    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    #[validate(length(max = 255))]
    pub name: String,

    #[serde(default, deserialize_with = "flex::int")]
    pub status: i32,

    #[serde(rename = "type", default, deserialize_with = "flex::int")]
    pub source_type: i32,

    #[serde(default)]
    pub score: f64,

    #[serde(default)]
    pub correct_count: i32,

    #[serde(default)]
    pub answers: Vec<AnswerItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default)]
    pub rest_seconds: i32,

    #[serde(default)]
    pub test_id: i64,
}

/// Represents the 'writing_records' table. Essays are stored as submitted,
/// without automatic scoring.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WritingRecord {
    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    #[validate(length(max = 255))]
    pub name: String,

    #[serde(default, deserialize_with = "flex::int")]
    pub status: i32,

    #[serde(rename = "type", default, deserialize_with = "flex::int")]
    pub source_type: i32,

    #[serde(default)]
    pub answers: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default)]
    pub rest_seconds: i32,

    #[serde(default)]
    pub test_id: i64,
}

/// Represents the 'testing_records' table: an attempt at a full mock test.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TestingRecord {
    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    #[validate(length(max = 255))]
    pub name: String,

    #[serde(default, deserialize_with = "flex::int")]
    pub status: i32,

    #[serde(rename = "type", default, deserialize_with = "flex::int")]
    pub source_type: i32,

    /// `[listening band, reading band]` once submitted.
    #[serde(default)]
    pub score: Vec<f64>,

    /// Every answer of the test, each tagged with its section.
    #[serde(default)]
    pub answers: Vec<AnswerItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Time left per section.
    #[serde(default)]
    pub rest_seconds: Vec<i64>,

    #[serde(default)]
    pub test_id: i64,
}

macro_rules! attempt {
    ($ty:ty, $table:expr, [$($result:ident),*]) => {
        impl Record for $ty {
            const TABLE: Table = $table;
            const FILTERS: &'static [&'static str] = RECORD_FILTERS;

            fn id(&self) -> i64 {
                self.id
            }
        }

        impl Attempt for $ty {
            fn owner(&self) -> Option<&str> {
                self.user_id.as_deref()
            }

            fn start(&mut self, user_id: &str) {
                self.user_id = Some(user_id.to_owned());
                self.status = IN_PROGRESS;
                self.source_type = USER_OWNED;
                $(self.$result = Default::default();)*
            }

            fn resume(&mut self, stored: &Self) {
                self.user_id = stored.user_id.clone();
                self.status = stored.status;
                self.source_type = stored.source_type;
                $(self.$result = stored.$result.clone();)*
            }
        }
    };
}

attempt!(ListeningRecord, LISTENING_RECORDS, [score, correct_count]);
attempt!(ReadingRecord, READING_RECORDS, [score, correct_count]);
attempt!(WritingRecord, WRITING_RECORDS, []);
attempt!(TestingRecord, TESTING_RECORDS, [score]);

macro_rules! section_attempt {
    ($ty:ty, $sets:expr, $parts:expr) => {
        impl SectionAttempt for $ty {
            const SETS: Table = $sets;
            const PARTS: Table = $parts;

            fn test_id(&self) -> i64 {
                self.test_id
            }

            fn answers(&self) -> &[AnswerItem] {
                &self.answers
            }

            fn record_score(&mut self, score: Score) {
                self.score = score.band;
                self.correct_count = i32::try_from(score.raw).unwrap_or(i32::MAX);
                self.status = SUBMITTED;
            }
        }
    };
}

section_attempt!(ListeningRecord, LISTENING_SETS, LISTENING_PARTS);
section_attempt!(ReadingRecord, READING_SETS, READING_PARTS);

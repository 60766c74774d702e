// src/models/tables.rs

//! Every table the service reads and writes, with its JSON text columns.

use crate::store::Table;

pub const LISTENING_SETS: Table = Table::new("listening_list", &["audio_files", "part_list"]);
pub const LISTENING_PARTS: Table = Table::new("listening_part_list", &["type_list"]);

pub const READING_SETS: Table = Table::new("reading_list", &["part_list"]);
pub const READING_PARTS: Table = Table::new("reading_part_list", &["type_list"]);

pub const WRITING_SETS: Table = Table::new("writing_list", &["part_list"]);
pub const WRITING_PARTS: Table = Table::new("writing_part_list", &[]);

pub const TESTING_SETS: Table = Table::new(
    "testing_list",
    &["listening_ids", "reading_ids", "writing_ids"],
);

pub const LISTENING_RECORDS: Table = Table::new("listening_records", &["answers"]);
pub const READING_RECORDS: Table = Table::new("reading_records", &["answers"]);
pub const WRITING_RECORDS: Table = Table::new("writing_records", &["answers"]);
pub const TESTING_RECORDS: Table =
    Table::new("testing_records", &["score", "answers", "rest_seconds"]);

pub const USERS: Table = Table::new("user_list", &[]);

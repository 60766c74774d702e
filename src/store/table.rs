// src/store/table.rs

use std::fmt;

/// Column holding every table's primary key.
pub const ID_COLUMN: &str = "id";

/// Static description of a table the record store can address.
///
/// Table names only ever come from these constants, never from request data.
/// Text columns listed in `json_columns` carry serialized JSON and are decoded
/// into structured values on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub json_columns: &'static [&'static str],
}

impl Table {
    pub const fn new(name: &'static str, json_columns: &'static [&'static str]) -> Self {
        Self { name, json_columns }
    }

    pub fn is_json(&self, column: &str) -> bool {
        self.json_columns.contains(&column)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

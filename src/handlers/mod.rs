// src/handlers/mod.rs

pub mod auth;
pub mod config;
pub mod record;

use serde::Deserialize;

use crate::store::{ColumnValue, Conditions, Page};

fn default_page_no() -> i64 {
    1
}

fn default_page_limit() -> i64 {
    -1
}

/// Query string shared by every list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(rename = "pageNo", default = "default_page_no")]
    pub page_no: i64,

    /// Zero or less returns everything.
    #[serde(rename = "pageLimit", default = "default_page_limit")]
    pub page_limit: i64,

    pub name: Option<String>,
    pub status: Option<i32>,
    #[serde(rename = "type")]
    pub source_type: Option<i32>,
    pub test_id: Option<i64>,
}

impl ListParams {
    pub fn page(&self) -> Page {
        Page::new(self.page_no, self.page_limit)
    }

    /// Exact-match filters for the parameters present, restricted to the
    /// columns in `allowed`.
    pub fn conditions(&self, allowed: &[&str]) -> Conditions {
        let candidates = [
            ("name", self.name.clone().map(ColumnValue::from)),
            ("status", self.status.map(ColumnValue::from)),
            ("type", self.source_type.map(ColumnValue::from)),
            ("test_id", self.test_id.map(ColumnValue::from)),
        ];

        candidates
            .into_iter()
            .filter(|(column, _)| allowed.contains(column))
            .filter_map(|(column, value)| Some((column.to_string(), value?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::Uri};

    fn params(query: &str) -> ListParams {
        let uri: Uri = format!("/api/config/listening?{}", query).parse().unwrap();
        Query::<ListParams>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn defaults_return_everything() {
        let p = params("");
        assert_eq!(p.page(), Page::new(1, -1));
        assert!(p.conditions(&["name", "status", "type"]).is_empty());
    }

    #[test]
    fn only_allowed_columns_become_conditions() {
        let p = params("pageNo=2&pageLimit=10&name=Test%201&status=1&type=3");
        assert_eq!(p.page(), Page::new(2, 10));

        let conditions = p.conditions(&["name", "type"]);
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions["name"], ColumnValue::from("Test 1"));
        assert_eq!(conditions["type"], ColumnValue::Int(3));
        assert!(!conditions.contains_key("status"));
    }
}

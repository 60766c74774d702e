// src/store/value.rs

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::DeserializeOwned,
    ser::{SerializeMap, SerializeSeq},
};
use sqlx::{Column, Row as _, TypeInfo, ValueRef, postgres::PgRow};

use super::table::Table;
use crate::error::{StoreError, StoreResult};

/// A decoded row, keyed by column name.
pub type Row = BTreeMap<String, ColumnValue>;

/// A single column value as handed back by the record store.
///
/// Every integer width collapses into `Int`, JSON columns expand into `List`
/// and `Object` recursively.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ColumnValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<ColumnValue>),
    Object(BTreeMap<String, ColumnValue>),
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ColumnValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Int(i) => Some(*i),
            ColumnValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            ColumnValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ColumnValue]> {
        match self {
            ColumnValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, ColumnValue>> {
        match self {
            ColumnValue::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Reads a list of ids, accepting numbers and numeric strings alike.
    /// Entries that are not ids are dropped.
    pub fn id_list(&self) -> Vec<i64> {
        self.as_list()
            .map(|items| items.iter().filter_map(ColumnValue::as_i64).collect())
            .unwrap_or_default()
    }

    /// String form used when comparing answers. `None` for null, empty
    /// strings and composite values.
    pub fn canonical(&self) -> Option<String> {
        let text = match self {
            ColumnValue::Text(s) => s.trim().to_string(),
            ColumnValue::Int(i) => i.to_string(),
            ColumnValue::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                (*f as i64).to_string()
            }
            ColumnValue::Float(f) => f.to_string(),
            ColumnValue::Bool(b) => b.to_string(),
            ColumnValue::Null | ColumnValue::List(_) | ColumnValue::Object(_) => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ColumnValue::Null => serde_json::Value::Null,
            ColumnValue::Bool(b) => serde_json::Value::Bool(*b),
            ColumnValue::Int(i) => serde_json::Value::from(*i),
            ColumnValue::Float(f) => serde_json::Value::from(*f),
            ColumnValue::Text(s) => serde_json::Value::String(s.clone()),
            ColumnValue::List(items) => items.iter().map(ColumnValue::to_json).collect(),
            ColumnValue::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for ColumnValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ColumnValue::Null,
            serde_json::Value::Bool(b) => ColumnValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => ColumnValue::Int(i),
                None => ColumnValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => ColumnValue::Text(s),
            serde_json::Value::Array(items) => {
                ColumnValue::List(items.into_iter().map(ColumnValue::from).collect())
            }
            serde_json::Value::Object(fields) => ColumnValue::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, ColumnValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        ColumnValue::Int(value)
    }
}

impl From<i32> for ColumnValue {
    fn from(value: i32) -> Self {
        ColumnValue::Int(value.into())
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        ColumnValue::Text(value.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        ColumnValue::Text(value)
    }
}

impl Serialize for ColumnValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ColumnValue::Null => serializer.serialize_unit(),
            ColumnValue::Bool(b) => serializer.serialize_bool(*b),
            ColumnValue::Int(i) => serializer.serialize_i64(*i),
            ColumnValue::Float(f) => serializer.serialize_f64(*f),
            ColumnValue::Text(s) => serializer.serialize_str(s),
            ColumnValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ColumnValue::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ColumnValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(ColumnValue::from)
    }
}

/// Primary key of a record: integer for content tables, text for users.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    /// Zero and the empty string mean "no id".
    pub fn is_empty(&self) -> bool {
        match self {
            RecordId::Int(i) => *i == 0,
            RecordId::Text(s) => s.is_empty(),
        }
    }

    pub fn from_column(value: &ColumnValue) -> Option<Self> {
        match value {
            ColumnValue::Int(i) => Some(RecordId::Int(*i)),
            ColumnValue::Text(s) => Some(RecordId::Text(s.clone())),
            _ => None,
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId::Text(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(i) => write!(f, "{}", i),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// Decodes the raw text of a column.
///
/// JSON columns get a structured parse; a value that does not parse is handed
/// back as the raw string.
pub fn decode_text(raw: String, is_json: bool) -> ColumnValue {
    if !is_json {
        return ColumnValue::Text(raw);
    }
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => ColumnValue::from(value),
        Err(e) => {
            tracing::debug!("JSON column kept as text: {}", e);
            ColumnValue::Text(raw)
        }
    }
}

/// Turns a Postgres row into a [`Row`], using `table` to tell which text
/// columns hold JSON.
pub fn decode_row(table: &Table, row: &PgRow) -> Result<Row, sqlx::Error> {
    let mut decoded = Row::new();

    for column in row.columns() {
        let idx = column.ordinal();
        let name = column.name();

        if row.try_get_raw(idx)?.is_null() {
            decoded.insert(name.to_string(), ColumnValue::Null);
            continue;
        }

        let value = match column.type_info().name() {
            "BOOL" => ColumnValue::Bool(row.try_get(idx)?),
            "INT2" => ColumnValue::Int(row.try_get::<i16, _>(idx)?.into()),
            "INT4" => ColumnValue::Int(row.try_get::<i32, _>(idx)?.into()),
            "INT8" => ColumnValue::Int(row.try_get(idx)?),
            "FLOAT4" => ColumnValue::Float(row.try_get::<f32, _>(idx)?.into()),
            "FLOAT8" => ColumnValue::Float(row.try_get(idx)?),
            "JSON" | "JSONB" => ColumnValue::from(row.try_get::<serde_json::Value, _>(idx)?),
            "TIMESTAMPTZ" => {
                ColumnValue::Text(row.try_get::<DateTime<Utc>, _>(idx)?.to_rfc3339())
            }
            "TIMESTAMP" => ColumnValue::Text(row.try_get::<NaiveDateTime, _>(idx)?.to_string()),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
                decode_text(row.try_get(idx)?, table.is_json(name))
            }
            other => match row.try_get::<String, _>(idx) {
                Ok(raw) => decode_text(raw, table.is_json(name)),
                Err(e) => {
                    tracing::warn!(
                        table = table.name,
                        column = name,
                        "unsupported column type {}: {}",
                        other,
                        e
                    );
                    ColumnValue::Null
                }
            },
        };
        decoded.insert(name.to_string(), value);
    }

    Ok(decoded)
}

/// Converts a decoded row into a typed record through its serde mapping.
pub fn into_record<T: DeserializeOwned>(row: Row) -> StoreResult<T> {
    let value = serde_json::to_value(row)
        .map_err(|e| StoreError::Validation(format!("row cannot be encoded: {}", e)))?;
    serde_json::from_value(value).map_err(|e| {
        StoreError::Validation(format!(
            "row does not match {}: {}",
            std::any::type_name::<T>(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_array_column_decodes_to_ordered_list() {
        let value = decode_text("[1,2,3]".to_string(), true);
        assert_eq!(
            value,
            ColumnValue::List(vec![
                ColumnValue::Int(1),
                ColumnValue::Int(2),
                ColumnValue::Int(3)
            ])
        );
    }

    #[test]
    fn json_object_column_decodes_to_mapping() {
        let value = decode_text(r#"{"a":1}"#.to_string(), true);
        let mut expected = BTreeMap::new();
        expected.insert("a".to_string(), ColumnValue::Int(1));
        assert_eq!(value, ColumnValue::Object(expected));
    }

    #[test]
    fn plain_string_stays_a_string() {
        assert_eq!(
            decode_text("hello".to_string(), true),
            ColumnValue::Text("hello".to_string())
        );
        assert_eq!(
            decode_text("hello".to_string(), false),
            ColumnValue::Text("hello".to_string())
        );
    }

    #[test]
    fn undeclared_column_is_not_sniffed() {
        assert_eq!(
            decode_text("[1,2,3]".to_string(), false),
            ColumnValue::Text("[1,2,3]".to_string())
        );
    }

    #[test]
    fn malformed_json_falls_back_to_raw_text() {
        assert_eq!(
            decode_text("[1,2".to_string(), true),
            ColumnValue::Text("[1,2".to_string())
        );
    }

    #[test]
    fn nested_json_decodes_recursively() {
        let value = decode_text(
            r#"[{"type":"multi_choice","question_list":[{"no":"1","answer":["A","C"]}]}]"#
                .to_string(),
            true,
        );
        let group = &value.as_list().unwrap()[0];
        let questions = group.as_object().unwrap()["question_list"].as_list().unwrap();
        let answer = &questions[0].as_object().unwrap()["answer"];
        assert_eq!(
            answer,
            &ColumnValue::List(vec!["A".into(), "C".into()])
        );
    }

    #[test]
    fn canonical_form_ignores_numeric_type() {
        assert_eq!(ColumnValue::Int(3).canonical(), Some("3".to_string()));
        assert_eq!(ColumnValue::Float(3.0).canonical(), Some("3".to_string()));
        assert_eq!(ColumnValue::from(" 3 ").canonical(), Some("3".to_string()));
        assert_eq!(ColumnValue::from("  ").canonical(), None);
        assert_eq!(ColumnValue::Null.canonical(), None);
        assert_eq!(ColumnValue::List(vec![]).canonical(), None);
    }

    #[test]
    fn id_list_accepts_numbers_and_numeric_strings() {
        let ids = ColumnValue::List(vec![
            ColumnValue::Int(12),
            ColumnValue::from("34"),
            ColumnValue::from("x"),
            ColumnValue::Null,
        ]);
        assert_eq!(ids.id_list(), vec![12, 34]);
        assert!(ColumnValue::from("12").id_list().is_empty());
    }

    #[test]
    fn serializes_as_plain_json() {
        let value = ColumnValue::from(json!({"no": "1", "answer": ["A", 2, null, true, 1.5]}));
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({"no": "1", "answer": ["A", 2, null, true, 1.5]})
        );
        assert_eq!(value.to_json(), serde_json::to_value(&value).unwrap());
    }

    #[test]
    fn record_ids_know_when_they_are_empty() {
        assert!(RecordId::from(0).is_empty());
        assert!(RecordId::from("").is_empty());
        assert!(!RecordId::from(42).is_empty());
        assert_eq!(RecordId::from_column(&ColumnValue::Null), None);
        assert_eq!(
            RecordId::from_column(&ColumnValue::Int(5)),
            Some(RecordId::Int(5))
        );
    }

    #[test]
    fn rows_convert_into_typed_records() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Part {
            id: i64,
            name: String,
            part_list: Vec<i64>,
        }

        let mut row = Row::new();
        row.insert("id".to_string(), ColumnValue::Int(9));
        row.insert("name".to_string(), "Cambridge 18".into());
        row.insert(
            "part_list".to_string(),
            ColumnValue::List(vec![ColumnValue::Int(1), ColumnValue::Int(2)]),
        );

        let part: Part = into_record(row).unwrap();
        assert_eq!(
            part,
            Part {
                id: 9,
                name: "Cambridge 18".to_string(),
                part_list: vec![1, 2],
            }
        );

        let err = into_record::<Part>(Row::new()).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}

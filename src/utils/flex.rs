// src/utils/flex.rs

//! Fields that clients send either as JSON numbers or as strings.
//!
//! Use with `#[serde(deserialize_with = "flex::int")]`; values always
//! serialize back in their Rust type.

use serde::{Deserialize, Deserializer, de::Error};

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

fn parse<E: Error>(raw: IntOrString) -> Result<i32, E> {
    let value = match raw {
        IntOrString::Int(i) => i,
        IntOrString::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| E::custom(format!("cannot convert {:?} to an integer", s)))?,
    };
    i32::try_from(value).map_err(|_| E::custom(format!("{} is out of range", value)))
}

pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    parse(IntOrString::deserialize(deserializer)?)
}

/// Like [`int`], for fields that may be absent or null. An empty string also
/// reads as `None`.
pub fn opt_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    match Option::<IntOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IntOrString::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(raw) => parse(raw).map(Some),
    }
}

/// Question numbers: `"12"` and `12` both read as `"12"`.
pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(i) => i.to_string(),
        IntOrString::Str(s) => s,
    })
}

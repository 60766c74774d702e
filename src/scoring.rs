// src/scoring.rs

//! Answer checking and band conversion.
//!
//! Scoring never fails: a malformed part, group or question is logged and
//! skipped, so a submission always gets a score, possibly zero.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    store::{ColumnValue, Row},
    utils::flex,
};

/// Group type whose questions accept several options.
pub const MULTI_CHOICE: &str = "multi_choice";

const TYPE_LIST: &str = "type_list";
const QUESTION_LIST: &str = "question_list";

/// Inclusive lower bounds, highest first.
const BANDS: &[(u32, f64)] = &[
    (39, 9.0),
    (37, 8.5),
    (35, 8.0),
    (33, 7.5),
    (30, 7.0),
    (27, 6.5),
    (23, 6.0),
    (20, 5.5),
    (16, 5.0),
    (13, 4.5),
    (10, 4.0),
    (6, 3.5),
    (4, 3.0),
    (3, 2.5),
    (2, 2.0),
    (1, 1.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Listening,
    Reading,
    Writing,
}

/// One submitted answer, matched to a question through `no`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerItem {
    #[serde(deserialize_with = "flex::text")]
    pub no: String,
    #[serde(default)]
    pub answer: ColumnValue,
    /// Only meaningful for full mock tests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,
}

impl AnswerItem {
    pub fn new(no: impl Into<String>, answer: impl Into<ColumnValue>) -> Self {
        Self {
            no: no.into(),
            answer: answer.into(),
            section: None,
        }
    }

    pub fn in_section(mut self, section: Section) -> Self {
        self.section = Some(section);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub raw: u32,
    pub band: f64,
}

/// Counts correct answers across `parts`.
///
/// Each part carries a `type_list` of groups, each group a `question_list`.
/// A question scores only when it has a reference answer and a submission
/// with the same `no`; on duplicate submissions the last one wins.
pub fn raw_score(parts: &[Row], answers: &[AnswerItem]) -> u32 {
    let submitted: HashMap<&str, &ColumnValue> = answers
        .iter()
        .map(|item| (item.no.trim(), &item.answer))
        .collect();

    let mut raw = 0;
    for part in parts {
        let part_id = part.get("id").and_then(ColumnValue::as_i64);
        let Some(groups) = part.get(TYPE_LIST).and_then(ColumnValue::as_list) else {
            tracing::warn!(part = ?part_id, "part without a usable type_list skipped");
            continue;
        };

        for group in groups {
            let Some(group) = group.as_object() else {
                tracing::warn!(part = ?part_id, "type group is not an object, skipped");
                continue;
            };
            let Some(questions) = group.get(QUESTION_LIST).and_then(ColumnValue::as_list) else {
                tracing::warn!(part = ?part_id, "type group without question_list skipped");
                continue;
            };
            let multi = group.get("type").and_then(ColumnValue::as_str) == Some(MULTI_CHOICE);

            for question in questions {
                let Some(question) = question.as_object() else {
                    tracing::warn!(part = ?part_id, "question is not an object, skipped");
                    continue;
                };
                let Some(no) = question.get("no").and_then(ColumnValue::canonical) else {
                    tracing::warn!(part = ?part_id, "question without a number skipped");
                    continue;
                };
                let reference = match question.get("answer") {
                    Some(answer) if !answer.is_null() => answer,
                    _ => continue,
                };
                let Some(given) = submitted.get(no.as_str()) else {
                    continue;
                };

                raw += if multi {
                    multi_select_points(reference, given)
                } else {
                    single_point(reference, given)
                };
            }
        }
    }
    raw
}

fn single_point(reference: &ColumnValue, given: &ColumnValue) -> u32 {
    match (reference.canonical(), given.canonical()) {
        (Some(expected), Some(actual)) if expected == actual => 1,
        _ => 0,
    }
}

/// A scalar counts as a one-element selection.
fn selection(value: &ColumnValue) -> BTreeSet<String> {
    match value {
        ColumnValue::List(items) => items.iter().filter_map(ColumnValue::canonical).collect(),
        scalar => scalar.canonical().into_iter().collect(),
    }
}

fn multi_select_points(reference: &ColumnValue, given: &ColumnValue) -> u32 {
    let expected = selection(reference);
    let points = selection(given)
        .iter()
        .filter(|option| expected.contains(*option))
        .count();
    u32::try_from(points).unwrap_or(u32::MAX)
}

pub fn band_score(raw: u32) -> f64 {
    BANDS
        .iter()
        .find(|(threshold, _)| raw >= *threshold)
        .map(|(_, band)| *band)
        .unwrap_or(0.0)
}

pub fn score(parts: &[Row], answers: &[AnswerItem]) -> Score {
    let raw = raw_score(parts, answers);
    Score {
        raw,
        band: band_score(raw),
    }
}

/// Answers of a full mock test, grouped by section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionAnswers {
    pub listening: Vec<AnswerItem>,
    pub reading: Vec<AnswerItem>,
    pub writing: Vec<AnswerItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("answer {no} is missing its section")]
pub struct UntaggedAnswer {
    pub no: String,
}

/// Groups mock-test answers by their `section` tag. Any untagged answer
/// rejects the whole submission.
pub fn split_sections(answers: Vec<AnswerItem>) -> Result<SectionAnswers, UntaggedAnswer> {
    let mut split = SectionAnswers::default();
    for item in answers {
        let bucket = match item.section {
            Some(Section::Listening) => &mut split.listening,
            Some(Section::Reading) => &mut split.reading,
            Some(Section::Writing) => &mut split.writing,
            None => return Err(UntaggedAnswer { no: item.no }),
        };
        bucket.push(item);
    }
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn part(type_list: serde_json::Value) -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), ColumnValue::Int(1));
        row.insert(TYPE_LIST.to_string(), ColumnValue::from(type_list));
        row
    }

    fn single_question(answer: serde_json::Value) -> Vec<Row> {
        vec![part(json!([{
            "type": "single_choice",
            "title": "Questions 1-10",
            "question_list": [{"no": "1", "question": "Pick one", "answer": answer}]
        }]))]
    }

    #[test]
    fn single_choice_scores_exact_match_only() {
        let parts = single_question(json!("B"));

        assert_eq!(raw_score(&parts, &[AnswerItem::new("1", "B")]), 1);
        assert_eq!(raw_score(&parts, &[AnswerItem::new("1", "A")]), 0);
        assert_eq!(raw_score(&parts, &[AnswerItem::new("2", "B")]), 0);
        assert_eq!(raw_score(&parts, &[]), 0);
    }

    #[test]
    fn multi_select_counts_the_intersection() {
        let parts = vec![part(json!([{
            "type": MULTI_CHOICE,
            "question_list": [{"no": "21", "answer": ["A", "C"]}]
        }]))];

        let answers = [AnswerItem::new(
            "21",
            ColumnValue::from(json!(["A", "B", "C"])),
        )];
        assert_eq!(raw_score(&parts, &answers), 2);

        let repeated = [AnswerItem::new(
            "21",
            ColumnValue::from(json!(["A", "A", "A"])),
        )];
        assert_eq!(raw_score(&parts, &repeated), 1);

        let scalar = [AnswerItem::new("21", "C")];
        assert_eq!(raw_score(&parts, &scalar), 1);
    }

    #[test]
    fn numbers_and_strings_compare_by_canonical_text() {
        let parts = single_question(json!(3));
        assert_eq!(raw_score(&parts, &[AnswerItem::new("1", "3")]), 1);
        assert_eq!(raw_score(&parts, &[AnswerItem::new("1", " 3 ")]), 1);
        assert_eq!(raw_score(&parts, &[AnswerItem::new("1", ColumnValue::Float(3.0))]), 1);

        let parts = single_question(json!("True"));
        assert_eq!(raw_score(&parts, &[AnswerItem::new("1", "true")]), 0);
    }

    #[test]
    fn null_answers_never_score() {
        let parts = single_question(json!(null));
        assert_eq!(raw_score(&parts, &[AnswerItem::new("1", ColumnValue::Null)]), 0);

        let parts = single_question(json!(""));
        assert_eq!(raw_score(&parts, &[AnswerItem::new("1", "")]), 0);
    }

    #[test]
    fn last_duplicate_submission_wins() {
        let parts = single_question(json!("B"));
        let answers = [AnswerItem::new("1", "B"), AnswerItem::new("1", "D")];
        assert_eq!(raw_score(&parts, &answers), 0);

        let answers = [AnswerItem::new("1", "D"), AnswerItem::new("1", "B")];
        assert_eq!(raw_score(&parts, &answers), 1);
    }

    #[test]
    fn malformed_nodes_are_skipped() {
        let mut broken = Row::new();
        broken.insert(TYPE_LIST.to_string(), ColumnValue::from("[not json"));

        let parts = vec![
            broken,
            part(json!([
                "not a group",
                {"type": "gap_fill"},
                {"type": "gap_fill", "question_list": [
                    42,
                    {"answer": "orphan"},
                    {"no": 2, "answer": "river"},
                    {"no": "3", "answer": "bridge"}
                ]}
            ])),
        ];
        let answers = [
            AnswerItem::new("2", "river"),
            AnswerItem::new("3", "bridge"),
            AnswerItem::new("4", "extra"),
        ];

        assert_eq!(raw_score(&parts, &answers), 2);
    }

    #[test]
    fn scores_sum_across_parts_and_groups() {
        let parts = vec![
            part(json!([
                {"type": "gap_fill", "question_list": [
                    {"no": "1", "answer": "A"},
                    {"no": "2", "answer": "B"}
                ]},
                {"type": MULTI_CHOICE, "question_list": [
                    {"no": "3", "answer": ["C", "D"]}
                ]}
            ])),
            part(json!([
                {"type": "matching", "question_list": [{"no": "4", "answer": "E"}]}
            ])),
        ];
        let answers = [
            AnswerItem::new("1", "A"),
            AnswerItem::new("2", "x"),
            AnswerItem::new("3", ColumnValue::from(json!(["C", "D"]))),
            AnswerItem::new("4", "E"),
        ];

        let result = score(&parts, &answers);
        assert_eq!(result.raw, 4);
        assert_eq!(result.band, 3.0);
    }

    #[test]
    fn band_table() {
        // (lowest raw score for the band, band, band one point below)
        let boundaries = [
            (39, 9.0, 8.5),
            (37, 8.5, 8.0),
            (35, 8.0, 7.5),
            (33, 7.5, 7.0),
            (30, 7.0, 6.5),
            (27, 6.5, 6.0),
            (23, 6.0, 5.5),
            (20, 5.5, 5.0),
            (16, 5.0, 4.5),
            (13, 4.5, 4.0),
            (10, 4.0, 3.5),
            (6, 3.5, 3.0),
            (4, 3.0, 2.5),
            (3, 2.5, 2.0),
            (2, 2.0, 1.0),
            (1, 1.0, 0.0),
        ];
        for (raw, band, below) in boundaries {
            assert_eq!(band_score(raw), band, "raw {}", raw);
            assert_eq!(band_score(raw - 1), below, "raw {}", raw - 1);
        }
        assert_eq!(band_score(40), 9.0);
        assert_eq!(band_score(0), 0.0);
    }

    #[test]
    fn band_is_monotonic() {
        let bands: Vec<f64> = (0..=45).map(band_score).collect();
        assert!(bands.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn answers_split_by_section_tag() {
        let answers = vec![
            AnswerItem::new("1", "A").in_section(Section::Listening),
            AnswerItem::new("1", "B").in_section(Section::Reading),
            AnswerItem::new("2", "C").in_section(Section::Listening),
            AnswerItem::new("task1", "essay").in_section(Section::Writing),
        ];

        let split = split_sections(answers).unwrap();
        assert_eq!(split.listening.len(), 2);
        assert_eq!(split.reading.len(), 1);
        assert_eq!(split.writing.len(), 1);
        assert_eq!(split.reading[0].answer, ColumnValue::from("B"));
    }

    #[test]
    fn untagged_answer_rejects_the_split() {
        let answers = vec![
            AnswerItem::new("1", "A").in_section(Section::Listening),
            AnswerItem::new("41", "B"),
        ];
        assert_eq!(
            split_sections(answers),
            Err(UntaggedAnswer {
                no: "41".to_string()
            })
        );
    }

    #[test]
    fn answer_items_read_the_wire_format() {
        let items: Vec<AnswerItem> = serde_json::from_value(json!([
            {"no": "1", "answer": "A"},
            {"no": "2", "answer": ["B", "C"], "section": "reading"},
            {"no": "3"}
        ]))
        .unwrap();

        assert_eq!(items[0], AnswerItem::new("1", "A"));
        assert_eq!(items[1].section, Some(Section::Reading));
        assert!(items[2].answer.is_null());
        assert_eq!(
            serde_json::to_value(&items[0]).unwrap(),
            json!({"no": "1", "answer": "A"})
        );
    }
}

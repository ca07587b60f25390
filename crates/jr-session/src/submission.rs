//! Canonical record sent to the backend for every annotation action.

use crate::file::FileIdentity;
use chrono::{SecondsFormat, Utc};
use jr_core::columns::resolve_columns;
use jr_core::{AnnotationAction, AnnotationMode, CellValue, EvaluationType, Field, Row};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Project id used when no file name is known.
pub const DEFAULT_PROJECT_ID: &str = "multi-dimension-single-project";

static RE_EXTENSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.[^/.]+$").unwrap());

/// `<filename without extension>-<millis>`.
pub fn project_id(filename: Option<&str>, millis: i64) -> String {
    match filename {
        Some(name) if !name.is_empty() => format!("{}-{}", RE_EXTENSION.replace(name, ""), millis),
        _ => DEFAULT_PROJECT_ID.to_string(),
    }
}

pub fn item_id(project_id: &str, index: usize) -> String {
    format!("{project_id}_item_{index}")
}

fn push_label(labels: &mut Vec<String>, label: &str) {
    let label = label.trim();
    if !label.is_empty() && !labels.iter().any(|l| l == label) {
        labels.push(label.to_string());
    }
}

/// Labels from every label-like column, deduplicated in first-seen order.
///
/// Arrays are spread and comma-separated strings split.
pub fn extract_labels(row: &Row) -> Vec<String> {
    let mut labels = Vec::new();
    for column in resolve_columns(row, Field::Labels) {
        match row.get(column) {
            None | Some(CellValue::Null) => {}
            Some(CellValue::Array(items)) => {
                for item in items.iter().filter_map(CellValue::as_text) {
                    push_label(&mut labels, &item);
                }
            }
            Some(CellValue::String(s)) if s.contains(',') => {
                for part in s.split(',') {
                    push_label(&mut labels, part);
                }
            }
            Some(other) => {
                if let Some(text) = other.as_text() {
                    push_label(&mut labels, &text);
                }
            }
        }
    }
    labels
}

/// Per-session facts stamped onto every submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub file: FileIdentity,
    pub filename: String,
    pub project_id: String,
    pub account_name: Option<String>,
}

impl SessionContext {
    /// Context with a project id derived from `filename` and the current time.
    pub fn new(filename: impl Into<String>, file: FileIdentity) -> Self {
        let filename = filename.into();
        let project_id = project_id(Some(&filename), Utc::now().timestamp_millis());
        Self { file, filename, project_id, account_name: None }
    }

    pub fn with_account_name(mut self, account_name: Option<String>) -> Self {
        self.account_name = account_name.filter(|a| !a.trim().is_empty());
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionMetadata {
    pub project_id: String,
    pub item_id: String,
    /// ISO-8601, captured when the submission is built.
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteDataRow {
    pub file_hash: String,
    pub filename: String,
    pub case_id: usize,
    pub original_data: Row,
    pub annotation_type: AnnotationMode,
    pub evaluation_type: EvaluationType,
    pub account_name: Option<String>,
    pub labels: Vec<String>,
    pub metadata: SubmissionMetadata,
}

/// Body of `POST /projects/{projectId}/annotations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub item_id: String,
    pub action: AnnotationAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_judgement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_reasoning: Option<String>,
    pub dimension: String,
    pub complete_data_row: CompleteDataRow,
}

impl Submission {
    /// Build the record for `action` on row `case_id`.
    ///
    /// Human judgement and reasoning are kept only for `Disagree`, trimmed,
    /// and dropped when empty.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        context: &SessionContext,
        mode: AnnotationMode,
        evaluation_type: EvaluationType,
        row: &Row,
        case_id: usize,
        dimension: &str,
        action: AnnotationAction,
        human_judgement: Option<&str>,
        human_reasoning: Option<&str>,
    ) -> Self {
        let item_id = item_id(&context.project_id, case_id);
        let human = |text: Option<&str>| {
            text.map(str::trim)
                .filter(|t| action == AnnotationAction::Disagree && !t.is_empty())
                .map(str::to_string)
        };
        Self {
            item_id: item_id.clone(),
            action,
            human_judgement: human(human_judgement),
            human_reasoning: human(human_reasoning),
            dimension: dimension.to_string(),
            complete_data_row: CompleteDataRow {
                file_hash: context.file.file_hash.clone(),
                filename: context.filename.clone(),
                case_id,
                original_data: row.clone(),
                annotation_type: mode,
                evaluation_type,
                account_name: context.account_name.clone(),
                labels: extract_labels(row),
                metadata: SubmissionMetadata {
                    project_id: context.project_id.clone(),
                    item_id,
                    timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                },
            },
        }
    }
}

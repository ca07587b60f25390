//! Row → dialog conversion.
//!
//! Never fails: a missing column or an unparseable JSON cell yields an
//! empty dialog and a `warn!` naming the column.

use crate::message::{Dialog, DialogMessage, DialogView};
use jr_core::columns::{field_value, resolve_column};
use jr_core::{CellValue, EvaluationType, Field, Row, TurnMode};

/// Parse a JSON array of `{role, content}` objects.
pub fn parse_messages(text: &str) -> serde_json::Result<Vec<DialogMessage>> {
    serde_json::from_str(text)
}

fn text_of(row: &Row, field: Field) -> Option<String> {
    field_value(row, field).and_then(CellValue::as_text)
}

/// Messages stored in the column for `field`; empty on any defect.
fn messages_in(row: &Row, field: Field) -> Vec<DialogMessage> {
    let Some(column) = resolve_column(row, field) else {
        tracing::warn!(column = field.canonical(), "dialog column missing, using empty dialog");
        return Vec::new();
    };
    match row.get(column) {
        None | Some(CellValue::Null) => Vec::new(),
        Some(CellValue::String(text)) if text.trim().is_empty() => Vec::new(),
        Some(CellValue::String(text)) => match parse_messages(text) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(column, error = %e, "unparseable dialog JSON, using empty dialog");
                Vec::new()
            }
        },
        Some(CellValue::Array(items)) if items.is_empty() => Vec::new(),
        Some(other) => {
            tracing::warn!(column, value = %other, "dialog cell is not a message array, using empty dialog");
            Vec::new()
        }
    }
}

fn single_turn(row: &Row, question: Option<&str>, answer: Field) -> Dialog {
    let mut dialog = Dialog::new();
    if let Some(q) = question {
        dialog.push(DialogMessage::user(q));
    }
    if let Some(a) = text_of(row, answer) {
        dialog.push(DialogMessage::assistant(a));
    }
    dialog
}

/// History followed by the current question and one answer.
fn continue_history(history: &[DialogMessage], question: Option<&str>, answer: Option<String>) -> Dialog {
    let mut dialog = Dialog::from(history.to_vec());
    if let Some(q) = question {
        dialog.push(DialogMessage::user(q));
    }
    if let Some(a) = answer {
        dialog.push(DialogMessage::assistant(a));
    }
    dialog
}

fn answer_fields(evaluation_type: EvaluationType) -> &'static [Field] {
    match evaluation_type {
        EvaluationType::RuleBased => &[Field::Answer],
        EvaluationType::Comparison => &[Field::Answer1, Field::Answer2],
    }
}

/// History format applies when history, question and the answer
/// column(s) of the evaluation type all resolve.
fn uses_history_format(row: &Row, evaluation_type: EvaluationType) -> bool {
    [Field::History, Field::Question]
        .iter()
        .chain(answer_fields(evaluation_type))
        .all(|f| resolve_column(row, *f).is_some())
}

/// Build the dialog(s) to display for `row`.
pub fn convert_to_dialog(row: &Row, turn: TurnMode, evaluation_type: EvaluationType) -> DialogView {
    let question = text_of(row, Field::Question);
    let question = question.as_deref();

    match (turn, evaluation_type) {
        (TurnMode::SingleTurn, EvaluationType::RuleBased) => {
            DialogView::Single(single_turn(row, question, Field::Answer))
        }
        (TurnMode::SingleTurn, EvaluationType::Comparison) => DialogView::Comparison {
            first: single_turn(row, question, Field::Answer1),
            second: single_turn(row, question, Field::Answer2),
        },
        (TurnMode::MultiTurn, _) if uses_history_format(row, evaluation_type) => {
            let history = messages_in(row, Field::History);
            tracing::debug!(turns = history.len(), "materializing history-format row");
            match evaluation_type {
                EvaluationType::RuleBased => DialogView::Single(continue_history(
                    &history,
                    question,
                    text_of(row, Field::Answer),
                )),
                EvaluationType::Comparison => DialogView::Comparison {
                    first: continue_history(&history, question, text_of(row, Field::Answer1)),
                    second: continue_history(&history, question, text_of(row, Field::Answer2)),
                },
            }
        }
        (TurnMode::MultiTurn, EvaluationType::RuleBased) => {
            DialogView::Single(Dialog::from(messages_in(row, Field::Dialog)))
        }
        (TurnMode::MultiTurn, EvaluationType::Comparison) => DialogView::Comparison {
            first: Dialog::from(messages_in(row, Field::Dialog1)),
            second: Dialog::from(messages_in(row, Field::Dialog2)),
        },
    }
}

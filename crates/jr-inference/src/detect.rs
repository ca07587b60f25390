//! Evaluation type detection and required-column validation.

use crate::error::{InferenceError, Result};
use jr_core::columns::has_column;
use jr_core::{EvaluationType, TurnMode};

/// Comparison when both candidate columns exist, rule-based otherwise.
///
/// Single-turn tables compare `answer1`/`answer2`, multi-turn tables
/// compare `dialog1`/`dialog2`.
pub fn detect_evaluation_type<S: AsRef<str>>(turn: TurnMode, columns: &[S]) -> EvaluationType {
    let (first, second) = match turn {
        TurnMode::SingleTurn => ("answer1", "answer2"),
        TurnMode::MultiTurn => ("dialog1", "dialog2"),
    };
    if has_column(columns, first) && has_column(columns, second) {
        EvaluationType::Comparison
    } else {
        EvaluationType::RuleBased
    }
}

/// Minimal column set a table must carry for the given shape.
pub fn required_columns<S: AsRef<str>>(
    turn: TurnMode,
    evaluation_type: EvaluationType,
    columns: &[S],
) -> Vec<&'static str> {
    use EvaluationType::*;
    match turn {
        TurnMode::SingleTurn => match evaluation_type {
            RuleBased => vec!["question", "answer"],
            Comparison => vec!["question", "answer1", "answer2"],
        },
        TurnMode::MultiTurn if has_column(columns, "history") && has_column(columns, "question") => {
            match evaluation_type {
                RuleBased => vec!["history", "question", "answer"],
                Comparison => vec!["history", "question", "answer1", "answer2"],
            }
        }
        TurnMode::MultiTurn => match evaluation_type {
            RuleBased => vec!["dialog"],
            Comparison => vec!["dialog1", "dialog2"],
        },
    }
}

/// Required columns absent from `columns`, compared case-insensitively.
pub fn missing_required_columns<S: AsRef<str>>(
    turn: TurnMode,
    evaluation_type: EvaluationType,
    columns: &[S],
) -> Vec<String> {
    required_columns(turn, evaluation_type, columns)
        .into_iter()
        .filter(|c| !has_column(columns, c))
        .map(str::to_string)
        .collect()
}

pub fn validate_required_columns<S: AsRef<str>>(
    turn: TurnMode,
    evaluation_type: EvaluationType,
    columns: &[S],
) -> Result<()> {
    let missing = missing_required_columns(turn, evaluation_type, columns);
    if missing.is_empty() {
        Ok(())
    } else {
        tracing::info!(missing = %missing.join(", "), "required columns missing");
        Err(InferenceError::MissingColumns { missing })
    }
}

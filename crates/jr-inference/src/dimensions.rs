//! Dimension discovery from column naming conventions.
//!
//! A column such as `accuracy_result` or `准确性 原因` is read as
//! `<dimension><separator><suffix>`. Judgement suffixes are tried before
//! reasoning suffixes; the first match claims the column.

use jr_core::Dimension;

/// Suffixes marking a machine-judgement column.
pub const JUDGEMENT_SUFFIXES: &[&str] = &[
    "结果", "result", "results", "score", "options", "option",
    "得分", "判断", "binary", "judgement", "judgment",
];

/// Suffixes marking a machine-reasoning column.
pub const REASONING_SUFFIXES: &[&str] = &["原因", "reason", "reasoning", "分析", "analysis"];

pub const SEPARATORS: &[&str] = &[" ", "_", "-"];

#[derive(Debug, Default)]
struct Candidates {
    judgement: Vec<String>,
    reasoning: Vec<String>,
}

fn group_for(groups: &mut Vec<(String, Candidates)>, name: String) -> &mut Candidates {
    let index = match groups.iter().position(|(n, _)| *n == name) {
        Some(i) => i,
        None => {
            groups.push((name, Candidates::default()));
            groups.len() - 1
        }
    };
    &mut groups[index].1
}

/// CJK headers are commonly written without a separator (`完整性结果`).
fn separators_for(suffix: &str) -> impl Iterator<Item = &'static str> {
    let bare: &'static [&'static str] = if suffix.is_ascii() { &[] } else { &[""] };
    SEPARATORS.iter().chain(bare.iter()).copied()
}

/// Prefix of `column` covering the first `byte_index` bytes of its
/// lower-cased form.
fn original_prefix<'a>(column: &'a str, lower: &'a str, byte_index: usize) -> &'a str {
    let char_count = lower[..byte_index].chars().count();
    if column.chars().count() != lower.chars().count() {
        return &lower[..byte_index];
    }
    match column.char_indices().nth(char_count) {
        Some((i, _)) => &column[..i],
        None => column,
    }
}

/// Dimension name extracted from `column` for the first matching suffix.
pub fn match_suffix(column: &str, suffixes: &[&str]) -> Option<String> {
    let lower = column.to_lowercase();
    for suffix in suffixes {
        for sep in separators_for(suffix) {
            let pattern = format!("{sep}{suffix}");
            let Some(index) = lower.rfind(&pattern) else {
                continue;
            };
            if index == 0 {
                continue;
            }
            let name = original_prefix(column, &lower, index).trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

/// Propose dimensions for columns not yet bound to one of `existing`.
///
/// A dimension is proposed only when exactly one judgement column maps to
/// its name; a reasoning column is attached only when exactly one maps.
/// Ambiguous names are left for manual configuration.
pub fn auto_detect_dimensions<S: AsRef<str>>(columns: &[S], existing: &[Dimension]) -> Vec<Dimension> {
    let bound = |column: &str| {
        existing.iter().any(|d| {
            d.judgement_column == column || d.reasoning_column.as_deref() == Some(column)
        })
    };

    let mut groups: Vec<(String, Candidates)> = Vec::new();
    for column in columns {
        let column: &str = column.as_ref();
        if bound(column) {
            continue;
        }
        if let Some(name) = match_suffix(column, JUDGEMENT_SUFFIXES) {
            group_for(&mut groups, name).judgement.push(column.to_string());
        } else if let Some(name) = match_suffix(column, REASONING_SUFFIXES) {
            group_for(&mut groups, name).reasoning.push(column.to_string());
        }
    }

    let mut detected = Vec::new();
    for (name, candidates) in groups {
        if candidates.judgement.len() != 1 {
            if candidates.judgement.len() > 1 {
                tracing::debug!(
                    dimension = %name,
                    columns = %candidates.judgement.join(", "),
                    "ambiguous judgement columns, skipping"
                );
            }
            continue;
        }
        let mut dimension = Dimension::new(name, candidates.judgement[0].clone());
        if let [reasoning] = candidates.reasoning.as_slice() {
            dimension.reasoning_column = Some(reasoning.clone());
        }
        detected.push(dimension);
    }
    detected
}

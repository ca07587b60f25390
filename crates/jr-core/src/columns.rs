//! Case-insensitive column resolution.
//!
//! Spreadsheet authors are inconsistent about header casing and naming, so
//! every lookup of a well-known field goes through the alias table below
//! instead of an exact-name match.

use crate::value::{CellValue, Row};

/// Well-known fields a row may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Question,
    Answer,
    Answer1,
    Answer2,
    History,
    Dialog,
    Dialog1,
    Dialog2,
    Labels,
    Context,
    Reference,
}

impl Field {
    /// Lower-cased header names accepted for this field.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Question => &["question"],
            Field::Answer => &["answer"],
            Field::Answer1 => &["answer1"],
            Field::Answer2 => &["answer2"],
            Field::History => &["history"],
            Field::Dialog => &["dialog"],
            Field::Dialog1 => &["dialog1"],
            Field::Dialog2 => &["dialog2"],
            Field::Labels => &["labels", "label", "category", "categorys", "分类"],
            Field::Context => &["context", "上下文", "搜索结果"],
            Field::Reference => &["refer", "reference", "refer_answer", "参考答案", "参考"],
        }
    }

    /// Name reported to the user when the field is required but missing.
    pub fn canonical(self) -> &'static str {
        self.aliases()[0]
    }
}

/// First column (in the given order) whose lower-cased name is one of `names`.
pub fn find_column<'a, I>(columns: I, names: &[&str]) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    columns.into_iter().find(|c| {
        let lower = c.to_lowercase();
        names.iter().any(|n| *n == lower)
    })
}

/// Case-insensitive membership test against a header list.
pub fn has_column<S: AsRef<str>>(columns: &[S], name: &str) -> bool {
    let name = name.to_lowercase();
    columns.iter().any(|c| c.as_ref().to_lowercase() == name)
}

/// The column of `row` that carries `field`, if any.
pub fn resolve_column(row: &Row, field: Field) -> Option<&str> {
    find_column(row.columns(), field.aliases())
}

/// Every column of `row` that carries `field`, in row order.
pub fn resolve_columns(row: &Row, field: Field) -> Vec<&str> {
    let aliases = field.aliases();
    row.columns()
        .filter(|c| {
            let lower = c.to_lowercase();
            aliases.iter().any(|a| *a == lower)
        })
        .collect()
}

/// Shorthand for the value behind [`resolve_column`].
pub fn field_value(row: &Row, field: Field) -> Option<&CellValue> {
    resolve_column(row, field).and_then(|c| row.get(c))
}

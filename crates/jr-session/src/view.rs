//! Read-only snapshot of what the annotator sees for the current item.

use crate::session::AnnotationSession;
use crate::submission::extract_labels;
use jr_core::columns::{field_value, find_column};
use jr_core::{display_judgement, CellValue, Dimension, Field, Row};
use jr_dialog::{convert_to_dialog, DialogView};
use serde::Serialize;

/// Reasoning columns tried when a dimension has none configured.
const REASONING_FALLBACKS: &[&str] = &["reasoning", "reason", "explanation", "llm_reasoning", "llm_reason"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionView {
    pub name: String,
    /// Machine judgement as displayed (`是`/`否`/`无` for booleans and blanks).
    pub judgement: String,
    pub reasoning: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    /// 1-based.
    pub position: usize,
    pub total: usize,
    pub progress: f64,
    pub dialog: DialogView,
    pub dimensions: Vec<DimensionView>,
    pub active_dimension: usize,
    pub labels: Vec<String>,
    pub context: Option<String>,
    pub reference: Option<String>,
    pub override_open: bool,
    pub completed: bool,
}

fn text_in(row: &Row, column: &str) -> Option<String> {
    row.get(column).and_then(CellValue::as_text)
}

fn machine_reasoning(row: &Row, dimension: &Dimension) -> Option<String> {
    if let Some(text) = dimension.reasoning_column.as_deref().and_then(|c| text_in(row, c)) {
        return Some(text);
    }
    let name = dimension.name.to_lowercase();
    let named = [format!("{name}_reasoning"), format!("{name}_reason")];
    REASONING_FALLBACKS
        .iter()
        .copied()
        .chain(named.iter().map(String::as_str))
        .find_map(|alias| find_column(row.columns(), &[alias]).and_then(|c| text_in(row, c)))
}

/// Cell text, pretty-printed when it holds a JSON object or array.
fn auxiliary_text(row: &Row, field: Field) -> Option<String> {
    let text = field_value(row, field).and_then(CellValue::as_text)?;
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => {
            Some(serde_json::to_string_pretty(&value).unwrap_or(text))
        }
        _ => Some(text),
    }
}

impl AnnotationSession {
    pub fn item_view(&self) -> ItemView {
        let row = self.current_row();
        let cursor = self.cursor();
        let config = self.config();
        let dimensions = self
            .dimensions()
            .iter()
            .enumerate()
            .map(|(i, dimension)| DimensionView {
                name: dimension.name.clone(),
                judgement: display_judgement(row.get(&dimension.judgement_column)),
                reasoning: machine_reasoning(row, dimension),
                active: i == cursor.dimension,
            })
            .collect();
        ItemView {
            position: cursor.item + 1,
            total: self.item_count(),
            progress: self.progress(),
            dialog: convert_to_dialog(row, config.mode.turn, config.evaluation_type),
            dimensions,
            active_dimension: cursor.dimension,
            labels: extract_labels(row),
            context: auxiliary_text(row, Field::Context),
            reference: auxiliary_text(row, Field::Reference),
            override_open: self.form().visible,
            completed: self.is_completed(),
        }
    }
}

//! Editable dimension configuration for one uploaded table.

use crate::detect::{detect_evaluation_type, missing_required_columns};
use crate::dimensions::auto_detect_dimensions;
use crate::error::{InferenceError, Result};
use jr_core::{AnnotationMode, Dataset, Dimension, EvaluationType, DEFAULT_DIMENSION_NAME};
use serde::{Deserialize, Serialize};

/// One editable dimension entry. `id` is stable for the entry's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionDraft {
    pub id: u64,
    pub name: String,
    pub judgement_column: String,
    pub reasoning_column: Option<String>,
}

impl DimensionDraft {
    fn empty(id: u64) -> Self {
        Self {
            id,
            name: String::new(),
            judgement_column: String::new(),
            reasoning_column: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty() && self.judgement_column.trim().is_empty()
    }

    fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.judgement_column.trim().is_empty()
    }

    fn to_dimension(&self) -> Dimension {
        Dimension {
            name: self.name.trim().to_string(),
            judgement_column: self.judgement_column.clone(),
            reasoning_column: self.reasoning_column.clone().filter(|c| !c.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Name,
    JudgementColumn,
    ReasoningColumn,
}

/// Output of a finished configuration step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub mode: AnnotationMode,
    pub evaluation_type: EvaluationType,
    pub dimensions: Vec<Dimension>,
}

impl ResolvedConfig {
    /// Single-dimension configuration from explicit judgement/reasoning columns.
    pub fn single_dimension(
        mode: AnnotationMode,
        evaluation_type: EvaluationType,
        judgement_column: impl Into<String>,
        reasoning_column: Option<String>,
    ) -> Self {
        Self {
            mode,
            evaluation_type,
            dimensions: vec![Dimension {
                name: DEFAULT_DIMENSION_NAME.to_string(),
                judgement_column: judgement_column.into(),
                reasoning_column,
            }],
        }
    }
}

#[derive(Debug, Clone)]
pub struct DimensionConfigurator {
    columns: Vec<String>,
    mode: AnnotationMode,
    evaluation_type: EvaluationType,
    missing: Vec<String>,
    drafts: Vec<DimensionDraft>,
    next_id: u64,
}

impl DimensionConfigurator {
    pub fn new(columns: Vec<String>, mode: AnnotationMode) -> Self {
        let evaluation_type = detect_evaluation_type(mode.turn, &columns);
        let missing = missing_required_columns(mode.turn, evaluation_type, &columns);
        tracing::info!(
            mode = %mode,
            evaluation_type = %evaluation_type,
            columns = columns.len(),
            missing = missing.len(),
            "column inference complete"
        );
        Self {
            columns,
            mode,
            evaluation_type,
            missing,
            drafts: vec![DimensionDraft::empty(1)],
            next_id: 2,
        }
    }

    pub fn for_dataset(dataset: &Dataset, mode: AnnotationMode) -> Self {
        Self::new(dataset.columns().to_vec(), mode)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn mode(&self) -> AnnotationMode {
        self.mode
    }

    pub fn evaluation_type(&self) -> EvaluationType {
        self.evaluation_type
    }

    pub fn missing_columns(&self) -> &[String] {
        &self.missing
    }

    pub fn has_required_columns(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn drafts(&self) -> &[DimensionDraft] {
        &self.drafts
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Append an empty entry and return its id.
    pub fn add(&mut self) -> u64 {
        let id = self.allocate_id();
        self.drafts.push(DimensionDraft::empty(id));
        id
    }

    /// Remove an entry. The last remaining entry cannot be removed.
    pub fn remove(&mut self, id: u64) -> bool {
        if self.drafts.len() <= 1 {
            return false;
        }
        let before = self.drafts.len();
        self.drafts.retain(|d| d.id != id);
        self.drafts.len() != before
    }

    pub fn update(&mut self, id: u64, field: DraftField, value: &str) -> Result<()> {
        let draft = self
            .drafts
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(InferenceError::UnknownDraft(id))?;
        match field {
            DraftField::Name => draft.name = value.to_string(),
            DraftField::JudgementColumn => draft.judgement_column = value.to_string(),
            DraftField::ReasoningColumn => {
                draft.reasoning_column = Some(value.to_string()).filter(|v| !v.is_empty())
            }
        }
        Ok(())
    }

    /// Run suffix-based detection and merge the results into the drafts.
    ///
    /// Returns how many dimensions were added; zero leaves the drafts as
    /// they were and the caller should ask for manual configuration.
    pub fn auto_detect(&mut self) -> usize {
        let existing: Vec<Dimension> = self
            .drafts
            .iter()
            .filter(|d| !d.judgement_column.is_empty())
            .map(DimensionDraft::to_dimension)
            .collect();
        let detected = auto_detect_dimensions(&self.columns, &existing);
        if detected.is_empty() {
            tracing::info!("no dimension columns detected, manual configuration required");
            return 0;
        }

        let only_initial_blank = self.drafts.len() == 1 && self.drafts[0].is_blank();
        if only_initial_blank {
            self.drafts.clear();
        } else {
            self.drafts.retain(|d| !d.is_blank());
        }
        let count = detected.len();
        for dimension in detected {
            let id = self.allocate_id();
            self.drafts.push(DimensionDraft {
                id,
                name: dimension.name,
                judgement_column: dimension.judgement_column,
                reasoning_column: dimension.reasoning_column,
            });
        }
        tracing::info!(count, "dimensions detected");
        count
    }

    pub fn is_valid(&self) -> bool {
        self.has_required_columns() && self.drafts.iter().any(DimensionDraft::is_complete)
    }

    /// Validate and produce the fixed, ordered dimension list.
    ///
    /// Entries without a name or judgement column are dropped.
    pub fn finalize(&self) -> Result<ResolvedConfig> {
        if !self.missing.is_empty() {
            return Err(InferenceError::MissingColumns { missing: self.missing.clone() });
        }

        let mut dimensions: Vec<Dimension> = Vec::new();
        for draft in self.drafts.iter().filter(|d| d.is_complete()) {
            let dimension = draft.to_dimension();
            let columns = std::iter::once(&dimension.judgement_column).chain(dimension.reasoning_column.as_ref());
            for column in columns {
                if !self.columns.iter().any(|c| c == column) {
                    return Err(InferenceError::UnknownColumn { column: column.clone() });
                }
            }
            if dimensions.iter().any(|d| d.name == dimension.name) {
                return Err(InferenceError::DuplicateDimension(dimension.name));
            }
            dimensions.push(dimension);
        }

        if dimensions.is_empty() {
            return Err(InferenceError::NoDimensions);
        }
        if !self.mode.is_multi_dimension() && dimensions.len() > 1 {
            tracing::warn!(
                dropped = dimensions.len() - 1,
                "single-dimension mode keeps only the first dimension"
            );
            dimensions.truncate(1);
        }

        tracing::info!(
            mode = %self.mode,
            evaluation_type = %self.evaluation_type,
            dimensions = dimensions.len(),
            "configuration finalized"
        );
        Ok(ResolvedConfig {
            mode: self.mode,
            evaluation_type: self.evaluation_type,
            dimensions,
        })
    }
}

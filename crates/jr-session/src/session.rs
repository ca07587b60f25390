//! The per-item, per-dimension annotation state machine.
//!
//! Submitting is two-phase: [`AnnotationSession::dispatch`] hands back a
//! [`PendingSubmission`] and leaves the cursor alone, the caller sends it,
//! and [`AnnotationSession::resolve`] commits the advance once the backend
//! answers. Any cursor move in between discards the pending ticket, so a
//! late answer for an item the user already left is ignored.

use crate::backend::{BackendError, ReviewBackend};
use crate::error::{Result, SessionError};
use crate::keymap::AnnotationIntent;
use crate::submission::{SessionContext, Submission};
use jr_core::api::SubmitReceipt;
use jr_core::{AnnotationAction, Dataset, Dimension, Row};
use jr_inference::ResolvedConfig;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Cursor {
    pub item: usize,
    pub dimension: usize,
}

/// The disagree form. Text is only read when it is confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideForm {
    pub visible: bool,
    pub judgement: String,
    pub reasoning: String,
}

/// A built submission waiting for the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    pub id: Uuid,
    pub cursor: Cursor,
    pub project_id: String,
    pub submission: Submission,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Request was out of range or a no-op.
    Unchanged,
    Moved(Cursor),
    FormOpened,
    FormClosed,
    /// A submission was built; send it and pass the result to `resolve`.
    Pending(PendingSubmission),
    /// A submission succeeded and the cursor moved on.
    Advanced(Cursor),
    /// A submission succeeded on the last dimension of the last item.
    Completed,
    /// The result belongs to a ticket the session no longer waits for.
    Stale,
}

pub struct AnnotationSession {
    dataset: Dataset,
    config: ResolvedConfig,
    context: SessionContext,
    cursor: Cursor,
    form: OverrideForm,
    completed: bool,
    pending: Option<Uuid>,
}

impl AnnotationSession {
    /// Every dimension column must exist in the dataset schema.
    pub fn new(dataset: Dataset, config: ResolvedConfig, context: SessionContext) -> Result<Self> {
        if config.dimensions.is_empty() {
            return Err(SessionError::NoDimensions);
        }
        for dimension in &config.dimensions {
            let columns = std::iter::once(&dimension.judgement_column).chain(dimension.reasoning_column.as_ref());
            for column in columns {
                if !dataset.columns().iter().any(|c| c == column) {
                    return Err(SessionError::UnknownColumn {
                        dimension: dimension.name.clone(),
                        column: column.clone(),
                    });
                }
            }
        }
        tracing::info!(
            filename = %context.filename,
            project_id = %context.project_id,
            items = dataset.len(),
            dimensions = config.dimensions.len(),
            mode = %config.mode,
            "annotation session started"
        );
        Ok(Self {
            dataset,
            config,
            context,
            cursor: Cursor::default(),
            form: OverrideForm::default(),
            completed: false,
            pending: None,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn form(&self) -> &OverrideForm {
        &self.form
    }

    /// Set once the last pair is annotated. Navigation stays available.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Callers should disable action inputs while this is true.
    pub fn is_submitting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn item_count(&self) -> usize {
        self.dataset.len()
    }

    /// Dimensions annotated per item; only the first in single-dimension mode.
    pub fn dimensions(&self) -> &[Dimension] {
        if self.config.mode.is_multi_dimension() {
            &self.config.dimensions
        } else {
            &self.config.dimensions[..1]
        }
    }

    pub fn current_row(&self) -> &Row {
        &self.dataset.rows()[self.cursor.item]
    }

    pub fn current_dimension(&self) -> &Dimension {
        &self.dimensions()[self.cursor.dimension]
    }

    /// `(item + 1) / items * 100`.
    pub fn progress(&self) -> f64 {
        (self.cursor.item + 1) as f64 / self.item_count() as f64 * 100.0
    }

    pub fn dispatch(&mut self, intent: AnnotationIntent) -> Result<Transition> {
        tracing::debug!(?intent, item = self.cursor.item, dimension = self.cursor.dimension, "dispatch");
        match intent {
            AnnotationIntent::Agree => Ok(self.emit(AnnotationAction::Agree, None, None)),
            AnnotationIntent::Skip => Ok(self.emit(AnnotationAction::Skip, None, None)),
            AnnotationIntent::Disagree => Ok(self.open_override()),
            AnnotationIntent::ConfirmDisagree => self.confirm_override(),
            AnnotationIntent::CancelDisagree => Ok(self.cancel_override()),
            AnnotationIntent::PreviousItem => Ok(self.previous_item()),
            AnnotationIntent::NextItem => Ok(self.next_item()),
            AnnotationIntent::GoToItem(index) => Ok(self.go_to_item(index)),
            AnnotationIntent::PreviousDimension => Ok(self.previous_dimension()),
            AnnotationIntent::NextDimension => Ok(self.next_dimension()),
            AnnotationIntent::SelectDimension(index) => Ok(self.select_dimension(index)),
        }
    }

    /// Dispatch `intent` and, if it produces a submission, send it and
    /// commit the result.
    pub async fn apply(&mut self, intent: AnnotationIntent, backend: &dyn ReviewBackend) -> Result<Transition> {
        match self.dispatch(intent)? {
            Transition::Pending(ticket) => {
                let outcome = backend.submit(&ticket.project_id, &ticket.submission).await;
                self.resolve(&ticket, outcome)
            }
            other => Ok(other),
        }
    }

    fn emit(&mut self, action: AnnotationAction, judgement: Option<&str>, reasoning: Option<&str>) -> Transition {
        let submission = Submission::assemble(
            &self.context,
            self.config.mode,
            self.config.evaluation_type,
            self.current_row(),
            self.cursor.item,
            &self.current_dimension().name,
            action,
            judgement,
            reasoning,
        );
        let ticket = PendingSubmission {
            id: Uuid::new_v4(),
            cursor: self.cursor,
            project_id: self.context.project_id.clone(),
            submission,
        };
        if self.pending.replace(ticket.id).is_some() {
            tracing::debug!("previous pending submission superseded");
        }
        Transition::Pending(ticket)
    }

    /// Commit the backend's answer for `ticket`.
    ///
    /// On failure the cursor and form stay as they were and the error is
    /// returned so the user can retry.
    pub fn resolve(
        &mut self,
        ticket: &PendingSubmission,
        outcome: std::result::Result<SubmitReceipt, BackendError>,
    ) -> Result<Transition> {
        if self.pending != Some(ticket.id) || self.cursor != ticket.cursor {
            tracing::debug!(ticket = %ticket.id, ok = outcome.is_ok(), "ignoring stale submission result");
            return Ok(Transition::Stale);
        }
        self.pending = None;

        let receipt = match outcome {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::error!(
                    item_id = %ticket.submission.item_id,
                    dimension = %ticket.submission.dimension,
                    error = %e,
                    "submission failed"
                );
                return Err(SessionError::Submission(e));
            }
        };
        tracing::info!(
            item_id = %ticket.submission.item_id,
            dimension = %ticket.submission.dimension,
            action = %ticket.submission.action,
            id = receipt.id.as_deref().unwrap_or(""),
            "submission saved"
        );
        self.form = OverrideForm::default();
        Ok(self.advance())
    }

    fn advance(&mut self) -> Transition {
        let last_dimension = self.dimensions().len() - 1;
        let last_item = self.item_count() - 1;
        if self.cursor.dimension < last_dimension {
            self.cursor.dimension += 1;
        } else if self.cursor.item < last_item {
            self.cursor = Cursor { item: self.cursor.item + 1, dimension: 0 };
        } else {
            tracing::info!(items = self.item_count(), "annotation complete");
            self.completed = true;
            return Transition::Completed;
        }
        Transition::Advanced(self.cursor)
    }

    // ---- override form ----

    pub fn open_override(&mut self) -> Transition {
        if self.form.visible {
            return Transition::Unchanged;
        }
        self.form.visible = true;
        Transition::FormOpened
    }

    pub fn set_override_judgement(&mut self, text: impl Into<String>) {
        self.form.judgement = text.into();
    }

    pub fn set_override_reasoning(&mut self, text: impl Into<String>) {
        self.form.reasoning = text.into();
    }

    /// Submit the override form. Requires an open form and a non-blank
    /// judgement; the form stays filled until the submission succeeds.
    pub fn confirm_override(&mut self) -> Result<Transition> {
        if !self.form.visible {
            return Err(SessionError::OverrideFormClosed);
        }
        if self.form.judgement.trim().is_empty() {
            return Err(SessionError::EmptyOverrideJudgement);
        }
        let judgement = self.form.judgement.clone();
        let reasoning = self.form.reasoning.clone();
        Ok(self.emit(AnnotationAction::Disagree, Some(&judgement), Some(&reasoning)))
    }

    pub fn cancel_override(&mut self) -> Transition {
        if self.form == OverrideForm::default() {
            return Transition::Unchanged;
        }
        self.form = OverrideForm::default();
        Transition::FormClosed
    }

    // ---- navigation ----

    fn move_to(&mut self, cursor: Cursor) -> Transition {
        self.cursor = cursor;
        self.form = OverrideForm::default();
        if self.pending.take().is_some() {
            tracing::debug!("navigation discarded pending submission");
        }
        Transition::Moved(cursor)
    }

    /// Move to item `index` (zero-based), resetting to the first dimension.
    pub fn go_to_item(&mut self, index: usize) -> Transition {
        if index >= self.item_count() {
            tracing::debug!(index, items = self.item_count(), "item index out of range");
            return Transition::Unchanged;
        }
        self.move_to(Cursor { item: index, dimension: 0 })
    }

    pub fn next_item(&mut self) -> Transition {
        self.go_to_item(self.cursor.item + 1)
    }

    pub fn previous_item(&mut self) -> Transition {
        match self.cursor.item.checked_sub(1) {
            Some(index) => self.go_to_item(index),
            None => Transition::Unchanged,
        }
    }

    /// Jump to a 1-based item number typed by the user.
    pub fn jump(&mut self, input: &str) -> Result<Transition> {
        let total = self.item_count();
        match input.trim().parse::<usize>() {
            Ok(n) if (1..=total).contains(&n) => Ok(self.go_to_item(n - 1)),
            _ => Err(SessionError::InvalidJumpTarget { input: input.to_string(), total }),
        }
    }

    /// Select a dimension of the current item, clamped to the last one.
    /// Always closes the override form. Ignored in single-dimension mode.
    pub fn select_dimension(&mut self, index: usize) -> Transition {
        if !self.config.mode.is_multi_dimension() {
            return Transition::Unchanged;
        }
        let index = index.min(self.dimensions().len() - 1);
        if index == self.cursor.dimension {
            return self.cancel_override();
        }
        self.move_to(Cursor { item: self.cursor.item, dimension: index })
    }

    pub fn next_dimension(&mut self) -> Transition {
        self.select_dimension(self.cursor.dimension + 1)
    }

    pub fn previous_dimension(&mut self) -> Transition {
        match self.cursor.dimension.checked_sub(1) {
            Some(index) => self.select_dimension(index),
            None => Transition::Unchanged,
        }
    }
}

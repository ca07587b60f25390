use crate::*;
use async_trait::async_trait;
use jr_core::api::{AnnotationStats, ExportFormat, FileDimensions, SubmitReceipt, UploadResponse};
use jr_core::config::UploadConfig;
use jr_core::{AnnotationAction, AnnotationMode, Dataset, Dimension, DimensionMode, EvaluationType, Row, TurnMode};
use jr_inference::{DimensionConfigurator, DraftField, ResolvedConfig};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// ========== Fake Backend ==========

#[derive(Default)]
struct FakeBackend {
    submitted: Mutex<Vec<(String, Submission)>>,
    fail_submit: AtomicBool,
    file_id: Option<String>,
    fail_upload: bool,
}

impl FakeBackend {
    fn failing() -> Self {
        let b = Self::default();
        b.fail_submit.store(true, Ordering::SeqCst);
        b
    }

    fn count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    fn last(&self) -> Submission {
        self.submitted.lock().unwrap().last().unwrap().1.clone()
    }
}

#[async_trait]
impl ReviewBackend for FakeBackend {
    async fn upload(&self, filename: &str, _bytes: Vec<u8>) -> std::result::Result<UploadResponse, BackendError> {
        if self.fail_upload {
            return Err(BackendError::Transport("connection refused".into()));
        }
        Ok(UploadResponse {
            file_id: self.file_id.clone(),
            filename: filename.to_string(),
            total_rows: 2,
            is_valid: true,
            ..Default::default()
        })
    }

    async fn submit(&self, project_id: &str, submission: &Submission) -> std::result::Result<SubmitReceipt, BackendError> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(BackendError::Http { status: 500, detail: "db down".into() });
        }
        self.submitted
            .lock()
            .unwrap()
            .push((project_id.to_string(), submission.clone()));
        Ok(SubmitReceipt { id: Some("r1".into()), ..Default::default() })
    }

    async fn dimensions(&self, file_hash: &str) -> std::result::Result<FileDimensions, BackendError> {
        Ok(FileDimensions { file_hash: file_hash.to_string(), dimensions: vec![], total_dimensions: 0 })
    }

    async fn stats(&self, _file_hash: &str, _dimension: Option<&str>) -> std::result::Result<AnnotationStats, BackendError> {
        Ok(AnnotationStats::default())
    }

    async fn export(&self, _: &str, _: Option<&str>, _: ExportFormat) -> std::result::Result<Vec<u8>, BackendError> {
        Ok(Vec::new())
    }
}

// ========== Fixtures ==========

fn multi() -> AnnotationMode {
    AnnotationMode::new(TurnMode::SingleTurn, DimensionMode::MultiDimension)
}

fn single() -> AnnotationMode {
    AnnotationMode::new(TurnMode::SingleTurn, DimensionMode::SingleDimension)
}

fn rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            Row::new()
                .with("question", format!("q{i}"))
                .with("answer", format!("a{i}"))
                .with("acc_result", true)
                .with("acc_reason", "looks right")
                .with("flu_result", false)
                .with("tone_result", "")
                .with("reason", "generic reasoning")
                .with("category", "x, y")
        })
        .collect()
}

fn dims() -> Vec<Dimension> {
    vec![
        Dimension::new("acc", "acc_result").with_reasoning("acc_reason"),
        Dimension::new("flu", "flu_result"),
        Dimension::new("tone", "tone_result"),
    ]
}

fn context() -> SessionContext {
    SessionContext::new("demo.xlsx", FileIdentity::issued("hash123"))
        .with_project_id("demo-1")
        .with_account_name(Some("alice".into()))
}

fn session(mode: AnnotationMode, items: usize) -> AnnotationSession {
    let dataset = Dataset::new("demo.xlsx", rows(items)).unwrap();
    let config = ResolvedConfig { mode, evaluation_type: EvaluationType::RuleBased, dimensions: dims() };
    AnnotationSession::new(dataset, config, context()).unwrap()
}

// ========== Key Bindings ==========

#[test]
fn test_key_bindings() {
    assert_eq!(intent_for_key('a', false), Some(AnnotationIntent::Agree));
    assert_eq!(intent_for_key('D', false), Some(AnnotationIntent::Disagree));
    assert_eq!(intent_for_key('r', false), Some(AnnotationIntent::Skip));
    assert_eq!(intent_for_key('w', false), Some(AnnotationIntent::PreviousItem));
    assert_eq!(intent_for_key('s', false), Some(AnnotationIntent::NextItem));
    assert_eq!(intent_for_key('q', false), Some(AnnotationIntent::PreviousDimension));
    assert_eq!(intent_for_key('e', false), Some(AnnotationIntent::NextDimension));
    assert_eq!(intent_for_key('x', false), None);
    assert_eq!(intent_for_key('a', true), None);
}

// ========== Labels & Identifiers ==========

#[test]
fn test_extract_labels_merges_columns() {
    let row: Row = serde_json::from_value(json!({"category": "a, b", "Label": ["b", "c"]})).unwrap();
    let mut labels = extract_labels(&row);
    labels.sort();
    assert_eq!(labels, vec!["a", "b", "c"]);
}

#[test]
fn test_extract_labels_skips_blank_values() {
    let row: Row =
        serde_json::from_str(r#"{"labels": null, "分类": "single", "categorys": 7, "other": "z", "label": ",, ,"}"#)
            .unwrap();
    assert_eq!(extract_labels(&row), vec!["single", "7"]);
}

#[test]
fn test_project_and_item_ids() {
    assert_eq!(project_id(Some("data.v2.xlsx"), 1700), "data.v2-1700");
    assert_eq!(project_id(Some("noext"), 5), "noext-5");
    assert_eq!(project_id(None, 5), submission::DEFAULT_PROJECT_ID);
    assert_eq!(item_id("p-1", 3), "p-1_item_3");
}

#[test]
fn test_fallback_file_hash() {
    assert_eq!(fallback_file_hash("data.csv"), "ZGF0YS5jc3Y");
    let long = fallback_file_hash(&"很长的文件名".repeat(20));
    assert_eq!(long.len(), 64);
    assert!(long.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn test_file_identity_from_upload() {
    assert_eq!(FileIdentity::from_upload(Some("abc"), "f.csv"), FileIdentity::issued("abc"));
    let fallback = FileIdentity::from_upload(Some("  "), "f.csv");
    assert!(!fallback.authoritative);
    assert_eq!(fallback.file_hash, fallback_file_hash("f.csv"));
}

#[tokio::test]
async fn test_register_upload() {
    let cfg = UploadConfig::default();
    let ok = FakeBackend { file_id: Some("srv-id".into()), ..Default::default() };
    let id = register_upload(&ok, &cfg, "data.csv", b"q,a\n".to_vec()).await.unwrap();
    assert_eq!(id, FileIdentity::issued("srv-id"));

    let down = FakeBackend { fail_upload: true, ..Default::default() };
    let id = register_upload(&down, &cfg, "data.csv", b"q,a\n".to_vec()).await.unwrap();
    assert!(!id.authoritative);

    let err = register_upload(&ok, &cfg, "notes.txt", vec![]).await.unwrap_err();
    assert!(matches!(err, SessionError::Core(_)));
}

// ========== Session Setup ==========

#[test]
fn test_initial_state() {
    let s = session(multi(), 3);
    assert_eq!(s.cursor(), Cursor { item: 0, dimension: 0 });
    assert!(!s.form().visible);
    assert!(!s.is_completed());
    assert!(!s.is_submitting());
    assert_eq!(s.current_dimension().name, "acc");
}

#[test]
fn test_session_rejects_unknown_column() {
    let dataset = Dataset::new("d.csv", rows(1)).unwrap();
    let config = ResolvedConfig {
        mode: multi(),
        evaluation_type: EvaluationType::RuleBased,
        dimensions: vec![Dimension::new("x", "missing_result")],
    };
    let err = AnnotationSession::new(dataset, config, context()).err().unwrap();
    assert!(matches!(err, SessionError::UnknownColumn { ref column, .. } if column == "missing_result"));
}

#[test]
fn test_session_rejects_empty_dimensions() {
    let dataset = Dataset::new("d.csv", rows(1)).unwrap();
    let config = ResolvedConfig { mode: multi(), evaluation_type: EvaluationType::RuleBased, dimensions: vec![] };
    assert!(matches!(AnnotationSession::new(dataset, config, context()), Err(SessionError::NoDimensions)));
}

// ========== Agree / Skip ==========

#[tokio::test]
async fn test_three_agrees_move_to_next_item() {
    let backend = FakeBackend::default();
    let mut s = session(multi(), 2);
    for expected in [1, 2] {
        let t = s.apply(AnnotationIntent::Agree, &backend).await.unwrap();
        assert_eq!(t, Transition::Advanced(Cursor { item: 0, dimension: expected }));
    }
    let t = s.apply(AnnotationIntent::Agree, &backend).await.unwrap();
    assert_eq!(t, Transition::Advanced(Cursor { item: 1, dimension: 0 }));
    assert_eq!(backend.count(), 3);
    let dims: Vec<String> = backend.submitted.lock().unwrap().iter().map(|(_, s)| s.dimension.clone()).collect();
    assert_eq!(dims, vec!["acc", "flu", "tone"]);
}

#[tokio::test]
async fn test_skip_advances_like_agree() {
    let backend = FakeBackend::default();
    let mut s = session(multi(), 2);
    s.apply(AnnotationIntent::Skip, &backend).await.unwrap();
    assert_eq!(s.cursor().dimension, 1);
    let sub = backend.last();
    assert_eq!(sub.action, AnnotationAction::Skip);
    assert_eq!(sub.human_judgement, None);
}

#[tokio::test]
async fn test_failed_submission_keeps_cursor() {
    let backend = FakeBackend::failing();
    let mut s = session(multi(), 2);
    s.select_dimension(1);
    let err = s.apply(AnnotationIntent::Agree, &backend).await.unwrap_err();
    assert!(matches!(err, SessionError::Submission(BackendError::Http { status: 500, .. })));
    assert_eq!(s.cursor(), Cursor { item: 0, dimension: 1 });
    assert!(!s.is_submitting());

    backend.fail_submit.store(false, Ordering::SeqCst);
    s.apply(AnnotationIntent::Agree, &backend).await.unwrap();
    assert_eq!(s.cursor(), Cursor { item: 0, dimension: 2 });
}

#[tokio::test]
async fn test_completion_on_last_pair() {
    let backend = FakeBackend::default();
    let mut s = session(multi(), 1);
    s.select_dimension(2);
    let t = s.apply(AnnotationIntent::Agree, &backend).await.unwrap();
    assert_eq!(t, Transition::Completed);
    assert!(s.is_completed());
    assert_eq!(s.cursor(), Cursor { item: 0, dimension: 2 });

    assert_eq!(s.previous_dimension(), Transition::Moved(Cursor { item: 0, dimension: 1 }));
    assert!(s.is_completed());
}

#[tokio::test]
async fn test_single_dimension_advances_items() {
    let backend = FakeBackend::default();
    let mut s = session(single(), 2);
    assert_eq!(s.dimensions().len(), 1);
    assert_eq!(s.dispatch(AnnotationIntent::NextDimension).unwrap(), Transition::Unchanged);
    let t = s.apply(AnnotationIntent::Agree, &backend).await.unwrap();
    assert_eq!(t, Transition::Advanced(Cursor { item: 1, dimension: 0 }));
    assert_eq!(backend.last().complete_data_row.annotation_type.as_str(), "single-turn");
}

// ========== Disagree ==========

#[tokio::test]
async fn test_disagree_opens_form_without_submitting() {
    let backend = FakeBackend::default();
    let mut s = session(multi(), 2);
    assert_eq!(s.apply(AnnotationIntent::Disagree, &backend).await.unwrap(), Transition::FormOpened);
    assert!(s.form().visible);
    assert_eq!(s.apply(AnnotationIntent::Disagree, &backend).await.unwrap(), Transition::Unchanged);
    assert_eq!(backend.count(), 0);
    assert_eq!(s.cursor(), Cursor::default());
}

#[tokio::test]
async fn test_disagree_confirm_requires_judgement() {
    let backend = FakeBackend::default();
    let mut s = session(multi(), 2);
    assert!(matches!(s.confirm_override(), Err(SessionError::OverrideFormClosed)));

    s.open_override();
    s.set_override_judgement("   ");
    let err = s.apply(AnnotationIntent::ConfirmDisagree, &backend).await.unwrap_err();
    assert!(matches!(err, SessionError::EmptyOverrideJudgement));
    assert_eq!(backend.count(), 0);
}

#[tokio::test]
async fn test_disagree_confirm_submits_and_clears_form() {
    let backend = FakeBackend::default();
    let mut s = session(multi(), 2);
    s.open_override();
    s.set_override_judgement(" 否 ");
    s.set_override_reasoning("missing a step");
    let t = s.apply(AnnotationIntent::ConfirmDisagree, &backend).await.unwrap();
    assert_eq!(t, Transition::Advanced(Cursor { item: 0, dimension: 1 }));

    let sub = backend.last();
    assert_eq!(sub.action, AnnotationAction::Disagree);
    assert_eq!(sub.human_judgement.as_deref(), Some("否"));
    assert_eq!(sub.human_reasoning.as_deref(), Some("missing a step"));
    assert_eq!(s.form(), &OverrideForm::default());
}

#[tokio::test]
async fn test_disagree_failure_keeps_form() {
    let backend = FakeBackend::failing();
    let mut s = session(multi(), 2);
    s.open_override();
    s.set_override_judgement("wrong");
    assert!(s.apply(AnnotationIntent::ConfirmDisagree, &backend).await.is_err());
    assert!(s.form().visible);
    assert_eq!(s.form().judgement, "wrong");
    assert_eq!(s.cursor(), Cursor::default());
}

#[test]
fn test_cancel_override_clears_form() {
    let mut s = session(multi(), 2);
    assert_eq!(s.cancel_override(), Transition::Unchanged);
    s.open_override();
    s.set_override_judgement("draft");
    assert_eq!(s.dispatch(AnnotationIntent::CancelDisagree).unwrap(), Transition::FormClosed);
    assert_eq!(s.form(), &OverrideForm::default());
}

// ========== Navigation ==========

#[test]
fn test_item_navigation_resets_dimension_and_form() {
    let mut s = session(multi(), 3);
    s.select_dimension(2);
    s.open_override();
    assert_eq!(s.next_item(), Transition::Moved(Cursor { item: 1, dimension: 0 }));
    assert!(!s.form().visible);
    assert_eq!(s.previous_item(), Transition::Moved(Cursor { item: 0, dimension: 0 }));
    assert_eq!(s.previous_item(), Transition::Unchanged);
    assert_eq!(s.go_to_item(3), Transition::Unchanged);
    assert_eq!(s.dispatch(AnnotationIntent::GoToItem(2)).unwrap(), Transition::Moved(Cursor { item: 2, dimension: 0 }));
    assert_eq!(s.next_item(), Transition::Unchanged);
}

#[test]
fn test_dimension_navigation_clamps() {
    let mut s = session(multi(), 2);
    assert_eq!(s.previous_dimension(), Transition::Unchanged);
    assert_eq!(s.select_dimension(10), Transition::Moved(Cursor { item: 0, dimension: 2 }));
    assert_eq!(s.next_dimension(), Transition::Unchanged);
    s.open_override();
    assert_eq!(s.dispatch(AnnotationIntent::SelectDimension(0)).unwrap(), Transition::Moved(Cursor::default()));
    assert!(!s.form().visible);
}

#[test]
fn test_selecting_current_dimension_closes_form() {
    let mut s = session(multi(), 2);
    s.open_override();
    s.set_override_judgement("否");
    assert_eq!(s.dispatch(AnnotationIntent::SelectDimension(0)).unwrap(), Transition::FormClosed);
    assert!(!s.form().visible);
    assert!(s.form().judgement.is_empty());
    assert_eq!(s.cursor(), Cursor::default());

    s.select_dimension(10);
    s.open_override();
    assert_eq!(s.next_dimension(), Transition::FormClosed);
    assert!(!s.form().visible);
    assert_eq!(s.select_dimension(2), Transition::Unchanged);
}

#[test]
fn test_jump_rejects_out_of_range() {
    let mut s = session(multi(), 3);
    s.next_item();
    for bad in ["0", "4", "abc", "", "-1", "1.5"] {
        let err = s.jump(bad).unwrap_err();
        assert!(matches!(err, SessionError::InvalidJumpTarget { total: 3, .. }));
        assert_eq!(s.cursor(), Cursor { item: 1, dimension: 0 });
    }
    assert_eq!(s.jump("0").unwrap_err().to_string(), "请输入 1 到 3 之间的数字");
}

#[test]
fn test_jump_is_one_based() {
    let mut s = session(multi(), 3);
    s.select_dimension(1);
    assert_eq!(s.jump(" 3 ").unwrap(), Transition::Moved(Cursor { item: 2, dimension: 0 }));
    assert_eq!(s.jump("1").unwrap(), Transition::Moved(Cursor::default()));
}

// ========== Two-Phase Submission ==========

#[test]
fn test_dispatch_does_not_move_until_resolved() {
    let mut s = session(multi(), 2);
    let Transition::Pending(ticket) = s.dispatch(AnnotationIntent::Agree).unwrap() else {
        panic!("expected pending submission");
    };
    assert!(s.is_submitting());
    assert_eq!(s.cursor(), Cursor::default());
    assert_eq!(ticket.project_id, "demo-1");

    let t = s.resolve(&ticket, Ok(SubmitReceipt::default())).unwrap();
    assert_eq!(t, Transition::Advanced(Cursor { item: 0, dimension: 1 }));
    assert!(!s.is_submitting());
}

#[test]
fn test_result_after_navigation_is_stale() {
    let mut s = session(multi(), 3);
    let Transition::Pending(ticket) = s.dispatch(AnnotationIntent::Agree).unwrap() else {
        panic!("expected pending submission");
    };
    s.next_item();
    assert_eq!(s.resolve(&ticket, Ok(SubmitReceipt::default())).unwrap(), Transition::Stale);
    assert_eq!(s.cursor(), Cursor { item: 1, dimension: 0 });

    let failed = s.resolve(&ticket, Err(BackendError::Transport("late".into())));
    assert_eq!(failed.unwrap(), Transition::Stale);
}

#[test]
fn test_superseded_ticket_is_stale() {
    let mut s = session(multi(), 2);
    let Transition::Pending(first) = s.dispatch(AnnotationIntent::Agree).unwrap() else {
        panic!("expected pending submission");
    };
    let Transition::Pending(second) = s.dispatch(AnnotationIntent::Skip).unwrap() else {
        panic!("expected pending submission");
    };
    assert_eq!(s.resolve(&first, Ok(SubmitReceipt::default())).unwrap(), Transition::Stale);
    assert!(matches!(s.resolve(&second, Ok(SubmitReceipt::default())).unwrap(), Transition::Advanced(_)));
}

// ========== Submission Shape ==========

#[test]
fn test_submission_wire_shape() {
    let mut s = session(multi(), 2);
    s.next_item();
    let Transition::Pending(ticket) = s.dispatch(AnnotationIntent::Agree).unwrap() else {
        panic!("expected pending submission");
    };
    let v = serde_json::to_value(&ticket.submission).unwrap();
    assert_eq!(v["itemId"], "demo-1_item_1");
    assert_eq!(v["action"], "agree");
    assert_eq!(v["dimension"], "acc");
    assert!(v.get("humanJudgement").is_none());

    let row = &v["completeDataRow"];
    assert_eq!(row["file_hash"], "hash123");
    assert_eq!(row["filename"], "demo.xlsx");
    assert_eq!(row["case_id"], 1);
    assert_eq!(row["annotation_type"], "multi-dimension-single");
    assert_eq!(row["evaluation_type"], "rule-based");
    assert_eq!(row["account_name"], "alice");
    assert_eq!(row["labels"], json!(["x", "y"]));
    assert_eq!(row["original_data"]["question"], "q1");
    assert_eq!(row["metadata"]["project_id"], "demo-1");
    assert_eq!(row["metadata"]["item_id"], "demo-1_item_1");
    let ts = row["metadata"]["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
}

#[test]
fn test_human_text_dropped_for_agree() {
    let row = Row::new().with("q", "1");
    let sub = Submission::assemble(
        &context(),
        multi(),
        EvaluationType::RuleBased,
        &row,
        0,
        "acc",
        AnnotationAction::Agree,
        Some("ignored"),
        Some("ignored"),
    );
    assert_eq!(sub.human_judgement, None);
    assert_eq!(sub.human_reasoning, None);
}

// ========== Item View ==========

#[test]
fn test_item_view() {
    let mut s = session(multi(), 4);
    s.next_item();
    s.select_dimension(1);
    let view = s.item_view();
    assert_eq!(view.position, 2);
    assert_eq!(view.total, 4);
    assert!((view.progress - 50.0).abs() < 1e-9);
    assert_eq!(view.active_dimension, 1);
    assert_eq!(view.labels, vec!["x", "y"]);

    let acc = &view.dimensions[0];
    assert_eq!((acc.judgement.as_str(), acc.reasoning.as_deref()), ("是", Some("looks right")));
    let flu = &view.dimensions[1];
    assert!(flu.active);
    assert_eq!((flu.judgement.as_str(), flu.reasoning.as_deref()), ("否", Some("generic reasoning")));
    assert_eq!(view.dimensions[2].judgement, "");
    assert_eq!(view.dialog.primary().len(), 2);
}

#[test]
fn test_item_view_auxiliary_text() {
    let row = Row::new()
        .with("question", "q")
        .with("answer", "a")
        .with("j", "ok")
        .with("上下文", r#"{"doc":"text"}"#)
        .with("Reference", "plain reference")
        .with("j_reason", "named fallback");
    let dataset = Dataset::new("d.csv", vec![row]).unwrap();
    let config = ResolvedConfig::single_dimension(single(), EvaluationType::RuleBased, "j", None);
    let s = AnnotationSession::new(dataset, config, context()).unwrap();
    let view = s.item_view();
    assert_eq!(view.context.as_deref(), Some("{\n  \"doc\": \"text\"\n}"));
    assert_eq!(view.reference.as_deref(), Some("plain reference"));
    assert_eq!(view.dimensions[0].name, jr_core::DEFAULT_DIMENSION_NAME);
    assert_eq!(view.dimensions[0].reasoning, None);
}

// ========== End to End ==========

#[tokio::test]
async fn test_end_to_end_single_turn_rule_based() {
    let rows = vec![
        Row::new().with("question", "1+1?").with("answer", "2").with("correctness_result", true),
        Row::new().with("question", "2+2?").with("answer", "5").with("correctness_result", false),
    ];
    let dataset = Dataset::new("math.csv", rows).unwrap();

    let mut cfg = DimensionConfigurator::for_dataset(&dataset, single());
    assert_eq!(cfg.evaluation_type(), EvaluationType::RuleBased);
    assert!(cfg.has_required_columns());
    let id = cfg.drafts()[0].id;
    cfg.update(id, DraftField::Name, "correctness").unwrap();
    cfg.update(id, DraftField::JudgementColumn, "correctness_result").unwrap();
    let resolved = cfg.finalize().unwrap();

    let backend = FakeBackend { file_id: Some("f-1".into()), ..Default::default() };
    let file = register_upload(&backend, &UploadConfig::default(), "math.csv", b"question,answer".to_vec())
        .await
        .unwrap();
    let mut s = AnnotationSession::new(dataset, resolved, SessionContext::new("math.csv", file)).unwrap();

    s.apply(AnnotationIntent::Agree, &backend).await.unwrap();
    let (project, sub) = backend.submitted.lock().unwrap()[0].clone();
    assert!(project.starts_with("math-"));
    assert_eq!(sub.complete_data_row.case_id, 0);
    assert_eq!(sub.complete_data_row.file_hash, "f-1");
    assert_eq!(sub.dimension, "correctness");
    assert_eq!(sub.action, AnnotationAction::Agree);
    assert_eq!(s.cursor().item, 1);
}

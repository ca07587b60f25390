//! Keyboard shortcuts, kept apart from the transitions they trigger.

/// What the annotator asked for, independent of the input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationIntent {
    Agree,
    /// Opens the override form; submitting it is [`AnnotationIntent::ConfirmDisagree`].
    Disagree,
    Skip,
    ConfirmDisagree,
    CancelDisagree,
    PreviousItem,
    NextItem,
    /// Zero-based item index.
    GoToItem(usize),
    PreviousDimension,
    NextDimension,
    SelectDimension(usize),
}

pub const KEY_BINDINGS: &[(char, AnnotationIntent)] = &[
    ('a', AnnotationIntent::Agree),
    ('d', AnnotationIntent::Disagree),
    ('r', AnnotationIntent::Skip),
    ('w', AnnotationIntent::PreviousItem),
    ('s', AnnotationIntent::NextItem),
    ('q', AnnotationIntent::PreviousDimension),
    ('e', AnnotationIntent::NextDimension),
];

/// Intent bound to `key`, matched case-insensitively.
///
/// Keys typed into a text field never map, so override text can contain
/// any letter.
pub fn intent_for_key(key: char, in_text_field: bool) -> Option<AnnotationIntent> {
    if in_text_field {
        return None;
    }
    let key = key.to_ascii_lowercase();
    KEY_BINDINGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, intent)| *intent)
}

use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Speaker of a dialog turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogMessage {
    pub role: Role,
    pub content: String,
}

impl DialogMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Ordered conversation. Built by appending, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dialog {
    messages: Vec<DialogMessage>,
}

impl Dialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, message: DialogMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[DialogMessage] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &DialogMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl From<Vec<DialogMessage>> for Dialog {
    fn from(messages: Vec<DialogMessage>) -> Self {
        Self { messages }
    }
}

/// What a row renders as: one dialog, or two compared side by side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogView {
    Single(Dialog),
    Comparison { first: Dialog, second: Dialog },
}

impl DialogView {
    pub fn is_comparison(&self) -> bool {
        matches!(self, DialogView::Comparison { .. })
    }

    /// The single dialog, or the first of a comparison.
    pub fn primary(&self) -> &Dialog {
        match self {
            DialogView::Single(dialog) => dialog,
            DialogView::Comparison { first, .. } => first,
        }
    }

    pub fn dialogs(&self) -> Vec<&Dialog> {
        match self {
            DialogView::Single(dialog) => vec![dialog],
            DialogView::Comparison { first, second } => vec![first, second],
        }
    }
}

/// Serializes as `{dialog, isComparison}` or `{dialog1, dialog2, isComparison}`.
impl Serialize for DialogView {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            DialogView::Single(dialog) => {
                let mut s = serializer.serialize_struct("DialogView", 2)?;
                s.serialize_field("dialog", dialog)?;
                s.serialize_field("isComparison", &false)?;
                s.end()
            }
            DialogView::Comparison { first, second } => {
                let mut s = serializer.serialize_struct("DialogView", 3)?;
                s.serialize_field("dialog1", first)?;
                s.serialize_field("dialog2", second)?;
                s.serialize_field("isComparison", &true)?;
                s.end()
            }
        }
    }
}

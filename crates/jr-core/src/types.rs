use serde::{Deserialize, Serialize};
use std::fmt;

/// Name given to the lone dimension of a single-dimension dataset.
pub const DEFAULT_DIMENSION_NAME: &str = "默认维度";

/// Whether a row holds one candidate or two candidates compared side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationType {
    RuleBased,
    Comparison,
}

impl EvaluationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationType::RuleBased => "rule-based",
            EvaluationType::Comparison => "comparison",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(self, EvaluationType::Comparison)
    }
}

impl fmt::Display for EvaluationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dialogue shape of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnMode {
    SingleTurn,
    MultiTurn,
}

/// How many evaluation dimensions are annotated per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimensionMode {
    SingleDimension,
    MultiDimension,
}

/// Turn shape and dimension count chosen by the annotator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnnotationMode {
    pub turn: TurnMode,
    pub dimension: DimensionMode,
}

impl AnnotationMode {
    pub const fn new(turn: TurnMode, dimension: DimensionMode) -> Self {
        Self { turn, dimension }
    }

    pub fn is_single_turn(&self) -> bool {
        self.turn == TurnMode::SingleTurn
    }

    pub fn is_multi_dimension(&self) -> bool {
        self.dimension == DimensionMode::MultiDimension
    }

    /// Wire name used in submissions.
    pub fn as_str(&self) -> &'static str {
        match (self.turn, self.dimension) {
            (TurnMode::SingleTurn, DimensionMode::SingleDimension) => "single-turn",
            (TurnMode::MultiTurn, DimensionMode::SingleDimension) => "multi-turn",
            (TurnMode::SingleTurn, DimensionMode::MultiDimension) => "multi-dimension-single",
            (TurnMode::MultiTurn, DimensionMode::MultiDimension) => "multi-dimension-multi",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        use DimensionMode::*;
        use TurnMode::*;
        match s {
            "single-turn" => Some(Self::new(SingleTurn, SingleDimension)),
            "multi-turn" => Some(Self::new(MultiTurn, SingleDimension)),
            "multi-dimension-single" => Some(Self::new(SingleTurn, MultiDimension)),
            "multi-dimension-multi" => Some(Self::new(MultiTurn, MultiDimension)),
            _ => None,
        }
    }
}

impl fmt::Display for AnnotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AnnotationMode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AnnotationMode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        AnnotationMode::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown annotation mode: {s}")))
    }
}

/// A named evaluation axis bound to its machine-judgement columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub name: String,
    pub judgement_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_column: Option<String>,
}

impl Dimension {
    pub fn new(name: impl Into<String>, judgement_column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            judgement_column: judgement_column.into(),
            reasoning_column: None,
        }
    }

    pub fn with_reasoning(mut self, column: impl Into<String>) -> Self {
        self.reasoning_column = Some(column.into());
        self
    }
}

/// What the annotator did with the machine judgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationAction {
    Agree,
    Disagree,
    Skip,
}

impl AnnotationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationAction::Agree => "agree",
            AnnotationAction::Disagree => "disagree",
            AnnotationAction::Skip => "skip",
        }
    }
}

impl fmt::Display for AnnotationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

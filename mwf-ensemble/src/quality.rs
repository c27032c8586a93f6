use serde::Serialize;

/// What kind of degradation a note reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    SchemaError,
    UnknownModel,
    ModelNotInPayload,
    UnknownVariable,
    UnsupportedVariable,
    DuplicateMember,
    InvalidSnowInput,
    InsufficientMembers,
}

/// A data-quality note surfaced in the forecast document instead of failing the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityNote {
    pub kind: NoteKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    pub message: String,
}

impl DataQualityNote {
    pub fn new(kind: NoteKind, message: impl Into<String>) -> Self {
        DataQualityNote {
            kind,
            model: None,
            variable: None,
            message: message.into(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }
}

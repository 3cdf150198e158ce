//! Error types shared by the reward engine
//!
//! None of these are allowed to escape as a fault that halts the host:
//! controllers log them and keep their prior state.

/// Malformed input rejected at a component boundary
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Invalid requirement for '{id}': {reason}")]
    InvalidRequirement { id: String, reason: String },

    #[error("Unknown progress kind: {0}")]
    UnknownKind(String),

    #[error("Total must be greater than zero (got {0})")]
    InvalidTotal(f64),

    #[error("Progress value must be a finite number (got {0})")]
    InvalidValue(f64),

    #[error("Step count must be between 1 and {max} (got {count})")]
    InvalidStepCount { count: u32, max: u32 },

    #[error("Unknown progress indicator: {0}")]
    UnknownIndicator(u64),

    #[error("Container does not exist: {0}")]
    MissingContainer(String),

    #[error("Notification needs a message or a value")]
    EmptyPayload,

    #[error("Unknown XP preset: {0}")]
    UnknownPreset(String),

    #[error("Invalid level table: {0}")]
    InvalidLevelTable(String),
}

/// Failure reading or writing the persistence surface
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize save data: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Storage is unavailable: {0}")]
    Unavailable(String),
}

/// Failure loading a markup template
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Failed to load template '{name}': {message}")]
    Load { name: String, message: String },
}

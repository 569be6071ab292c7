// Error types for configuration loading, editing and file access

use thiserror::Error;

/// Coarse classification of a [`TimelineError`], used by the server to pick
/// a status code and by the TUI to phrase its status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidDate,
    InvalidColor,
    Parse,
    MissingField,
    Validation,
    Io,
}

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("invalid date `{value}` for {field}")]
    InvalidDate { field: String, value: String },

    #[error("invalid color `{value}` for {field}: expected #RRGGBB")]
    InvalidColor { field: String, value: String },

    #[error("failed to parse {format} document: {message}")]
    Parse { format: &'static str, message: String },

    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TimelineError {
    pub fn invalid_date(field: impl Into<String>, value: impl Into<String>) -> Self {
        TimelineError::InvalidDate {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn invalid_color(field: impl Into<String>, value: impl Into<String>) -> Self {
        TimelineError::InvalidColor {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        TimelineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TimelineError::InvalidDate { .. } => ErrorKind::InvalidDate,
            TimelineError::InvalidColor { .. } => ErrorKind::InvalidColor,
            TimelineError::Parse { .. } => ErrorKind::Parse,
            TimelineError::MissingField(_) => ErrorKind::MissingField,
            TimelineError::Validation { .. } => ErrorKind::Validation,
            TimelineError::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<serde_yaml::Error> for TimelineError {
    fn from(err: serde_yaml::Error) -> Self {
        TimelineError::Parse {
            format: "YAML",
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TimelineError {
    fn from(err: serde_json::Error) -> Self {
        TimelineError::Parse {
            format: "JSON",
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TimelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            TimelineError::invalid_date("date_of_birth", "1990-13").kind(),
            ErrorKind::InvalidDate
        );
        assert_eq!(
            TimelineError::MissingField("life_periods".to_string()).kind(),
            ErrorKind::MissingField
        );
        assert_eq!(
            TimelineError::validation("life_expectancy", "must not be negative").kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_yaml_error_becomes_parse_error() {
        let err: TimelineError = serde_yaml::from_str::<Vec<u32>>("[1, 2")
            .unwrap_err()
            .into();

        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().starts_with("failed to parse YAML document"));
    }

    #[test]
    fn test_messages_name_the_field() {
        let err = TimelineError::invalid_color("life_periods[1].color", "red");
        assert_eq!(
            err.to_string(),
            "invalid color `red` for life_periods[1].color: expected #RRGGBB"
        );
    }
}

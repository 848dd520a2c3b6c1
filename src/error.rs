// Copyright (c) 2026 rezky_nightky

use std::fmt;

use thiserror::Error;

use crate::form::FormKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldProblem {
    Missing,
    Malformed,
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldProblem::Missing => f.write_str("is required"),
            FieldProblem::Malformed => f.write_str("is not well formed"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{field} {problem}")]
pub struct ValidationError {
    pub field: &'static str,
    pub problem: FieldProblem,
}

impl ValidationError {
    pub fn user_message(&self) -> String {
        match self.problem {
            FieldProblem::Missing => format!("Please enter your {}.", self.field),
            FieldProblem::Malformed => {
                format!("Please enter a valid {} (name@domain.tld).", self.field)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode records: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("backend rejected the submission with status {status}")]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SubmitError {
    pub fn user_message(&self, kind: FormKind) -> String {
        match self {
            SubmitError::Rejected {
                message: Some(m), ..
            } if !m.trim().is_empty() => m.clone(),
            SubmitError::Rejected { .. } | SubmitError::Transport(_) | SubmitError::Store(_) => {
                kind.fallback_error().to_string()
            }
        }
    }
}

impl From<reqwest::Error> for SubmitError {
    fn from(e: reqwest::Error) -> Self {
        SubmitError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_message_is_shown_verbatim() {
        let e = SubmitError::Rejected {
            status: 500,
            message: Some("quota exceeded".into()),
        };
        assert_eq!(e.user_message(FormKind::Contact), "quota exceeded");
    }

    #[test]
    fn missing_or_blank_message_uses_fallback() {
        let e = SubmitError::Rejected {
            status: 502,
            message: Some("  ".into()),
        };
        assert_eq!(
            e.user_message(FormKind::Signup),
            "Error submitting application. Please try again."
        );
        let e = SubmitError::Transport("connection refused".into());
        assert_eq!(
            e.user_message(FormKind::Contact),
            "Error sending message. Please try again."
        );
    }

    #[test]
    fn validation_message_names_the_field() {
        let e = ValidationError {
            field: "name",
            problem: FieldProblem::Missing,
        };
        assert_eq!(e.user_message(), "Please enter your name.");
        assert_eq!(e.to_string(), "name is required");
    }
}

// Copyright (c) 2026 rezky_nightky

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{FieldProblem, ValidationError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(v) => v.iter().all(|s| s.trim().is_empty()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::List(v)
    }
}

pub type FieldMap = BTreeMap<String, FieldValue>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowStage {
    pub label: String,
    pub duration: Duration,
}

impl WorkflowStage {
    pub fn new(label: impl Into<String>, duration: Duration) -> Self {
        Self {
            label: label.into(),
            duration,
        }
    }
}

impl FromStr for WorkflowStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (label, ms) = s
            .rsplit_once('=')
            .ok_or_else(|| "expected: LABEL=MS".to_string())?;
        let label = label.trim();
        if label.is_empty() {
            return Err("stage label must not be empty".to_string());
        }
        let ms: u64 = ms
            .trim()
            .parse()
            .map_err(|_| format!("invalid stage duration: {}", ms.trim()))?;
        if ms > 60_000 {
            return Err("stage duration must be at most 60000 ms".to_string());
        }
        Ok(Self::new(label, Duration::from_millis(ms)))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuccessPanel {
    pub title: &'static str,
    pub lines: &'static [&'static str],
}

pub const SIGNUP_PANEL: SuccessPanel = SuccessPanel {
    title: "Welcome to GHOST Sec!",
    lines: &[
        "Your application has been successfully encrypted and submitted. You will receive further instructions via email.",
        "Remember: Security through obscurity is no security at all.",
    ],
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormKind {
    Contact,
    Signup,
}

impl FormKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            FormKind::Contact => "contact",
            FormKind::Signup => "signup",
        }
    }

    pub fn submit_label(self) -> &'static str {
        match self {
            FormKind::Contact => "Send Message",
            FormKind::Signup => "Join GHOST Sec",
        }
    }

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            FormKind::Contact => &["name", "email", "message"],
            FormKind::Signup => &["name", "email"],
        }
    }

    pub fn default_stages(self) -> Vec<WorkflowStage> {
        let ms = Duration::from_millis;
        match self {
            FormKind::Contact => vec![
                WorkflowStage::new("Encrypting...", ms(1500)),
                WorkflowStage::new("Sending...", ms(1000)),
            ],
            FormKind::Signup => vec![
                WorkflowStage::new("Encrypting Data...", ms(1000)),
                WorkflowStage::new("Establishing Secure Channel...", ms(1000)),
                WorkflowStage::new("Processing Application...", ms(1000)),
            ],
        }
    }

    pub fn success_text(self) -> &'static str {
        match self {
            FormKind::Contact => "Message sent successfully!",
            FormKind::Signup => "Application submitted successfully!",
        }
    }

    pub fn fallback_error(self) -> &'static str {
        match self {
            FormKind::Contact => "Error sending message. Please try again.",
            FormKind::Signup => "Error submitting application. Please try again.",
        }
    }

    pub fn success_panel(self) -> Option<&'static SuccessPanel> {
        match self {
            FormKind::Contact => None,
            FormKind::Signup => Some(&SIGNUP_PANEL),
        }
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid pattern"))
}

pub fn is_valid_email(s: &str) -> bool {
    email_pattern().is_match(s.trim())
}

pub fn validate(kind: FormKind, fields: &FieldMap) -> Result<(), ValidationError> {
    for &name in kind.required_fields() {
        let value = fields.get(name);
        if value.map_or(true, FieldValue::is_blank) {
            return Err(ValidationError {
                field: name,
                problem: FieldProblem::Missing,
            });
        }
        if name == "email" && !value.and_then(FieldValue::as_text).is_some_and(is_valid_email) {
            return Err(ValidationError {
                field: name,
                problem: FieldProblem::Malformed,
            });
        }
    }
    Ok(())
}

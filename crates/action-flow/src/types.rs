//! Core types for the study-log workflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::{ErrorKind, FlowError};

/// Login pair supplied per run. Never persisted, never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    identifier: String,
    secret: String,
}

impl Credential {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// The fixed set of subjects on the record form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "国語")]
    Japanese,
    #[serde(rename = "数学")]
    Mathematics,
    #[serde(rename = "英語")]
    English,
    #[serde(rename = "公民")]
    Civics,
    #[serde(rename = "地歴")]
    GeographyHistory,
    #[serde(rename = "化学")]
    Chemistry,
    #[serde(rename = "情報")]
    Informatics,
}

impl Subject {
    /// Form order of the subjects.
    pub const ALL: [Subject; 7] = [
        Subject::Japanese,
        Subject::Mathematics,
        Subject::English,
        Subject::Civics,
        Subject::GeographyHistory,
        Subject::Chemistry,
        Subject::Informatics,
    ];

    /// Label as printed on the record form.
    pub fn label(&self) -> &'static str {
        match self {
            Subject::Japanese => "国語",
            Subject::Mathematics => "数学",
            Subject::English => "英語",
            Subject::Civics => "公民",
            Subject::GeographyHistory => "地歴",
            Subject::Chemistry => "化学",
            Subject::Informatics => "情報",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Subject {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Subject::ALL
            .into_iter()
            .find(|subject| subject.label() == trimmed)
            .ok_or_else(|| FlowError::Validation(format!("unknown subject: {trimmed:?}")))
    }
}

/// Hours studied, on the form's 0-7 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Hours(u8);

impl Hours {
    pub const MAX: u8 = 7;

    pub fn new(value: i64) -> Result<Self, FlowError> {
        if (0..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(FlowError::Validation(format!(
                "hours must be between 0 and {}, got {value}",
                Self::MAX
            )))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Hours {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Hours::new(raw).map_err(serde::de::Error::custom)
    }
}

impl FromStr for Hours {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|_| FlowError::Validation(format!("hours must be an integer, got {trimmed:?}")))?;
        Hours::new(value)
    }
}

impl fmt::Display for Hours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyEntry {
    pub subject: Subject,
    pub hours: Hours,
}

impl StudyEntry {
    pub fn new(subject: Subject, hours: Hours) -> Self {
        Self { subject, hours }
    }

    /// Parse a `(label, hours)` pair as submitted by a client.
    pub fn parse(label: &str, hours: i64) -> Result<Self, FlowError> {
        Ok(Self {
            subject: label.parse()?,
            hours: Hours::new(hours)?,
        })
    }
}

/// Validated submission: unique subjects in interaction order plus a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRequest {
    entries: Vec<StudyEntry>,
    comment: String,
}

impl SubmissionRequest {
    pub fn new(entries: Vec<StudyEntry>, comment: impl Into<String>) -> Result<Self, FlowError> {
        if entries.is_empty() {
            return Err(FlowError::Validation(
                "at least one subject entry is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.subject) {
                return Err(FlowError::Validation(format!(
                    "duplicate subject: {}",
                    entry.subject
                )));
            }
        }

        Ok(Self {
            entries,
            comment: comment.into(),
        })
    }

    pub fn entries(&self) -> &[StudyEntry] {
        &self.entries
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }
}

/// Named workflow steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    AcquireSession,
    OpenLogin,
    EnterIdentifier,
    EnterSecret,
    OpenRecordForm,
    SelectHours(Subject),
    EnterComment,
    ConfirmRecord,
    CaptureConfirmation,
    Diagnostics,
    ReleaseSession,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::AcquireSession => write!(f, "acquire_session"),
            Step::OpenLogin => write!(f, "open_login"),
            Step::EnterIdentifier => write!(f, "enter_identifier"),
            Step::EnterSecret => write!(f, "enter_secret"),
            Step::OpenRecordForm => write!(f, "open_record_form"),
            Step::SelectHours(subject) => write!(f, "select_hours[{subject}]"),
            Step::EnterComment => write!(f, "enter_comment"),
            Step::ConfirmRecord => write!(f, "confirm_record"),
            Step::CaptureConfirmation => write!(f, "capture_confirmation"),
            Step::Diagnostics => write!(f, "diagnostics"),
            Step::ReleaseSession => write!(f, "release_session"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum StepPhase {
    Started,
    Succeeded,
    Failed { reason: String },
    Note { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepMarker {
    pub seq: u32,
    pub at: DateTime<Utc>,
    pub step: String,
    #[serde(flatten)]
    pub phase: StepPhase,
}

impl fmt::Display for StepMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = self.at.format("%H:%M:%S%.3f");
        match &self.phase {
            StepPhase::Started => write!(f, "#{:02} {at} {} started", self.seq, self.step),
            StepPhase::Succeeded => write!(f, "#{:02} {at} {} succeeded", self.seq, self.step),
            StepPhase::Failed { reason } => {
                write!(f, "#{:02} {at} {} failed: {reason}", self.seq, self.step)
            }
            StepPhase::Note { message } => write!(f, "#{:02} {at} {} note: {message}", self.seq, self.step),
        }
    }
}

/// Append-only progress record for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepLog {
    markers: Vec<StepMarker>,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&mut self, step: Step) {
        self.push(step, StepPhase::Started);
    }

    pub fn succeeded(&mut self, step: Step) {
        self.push(step, StepPhase::Succeeded);
    }

    pub fn failed(&mut self, step: Step, reason: impl Into<String>) {
        self.push(
            step,
            StepPhase::Failed {
                reason: reason.into(),
            },
        );
    }

    pub fn note(&mut self, step: Step, message: impl Into<String>) {
        self.push(
            step,
            StepPhase::Note {
                message: message.into(),
            },
        );
    }

    pub fn markers(&self) -> &[StepMarker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Markers recorded for `step`, in order.
    pub fn phases_of(&self, step: Step) -> Vec<&StepPhase> {
        let name = step.to_string();
        self.markers
            .iter()
            .filter(|marker| marker.step == name)
            .map(|marker| &marker.phase)
            .collect()
    }

    fn push(&mut self, step: Step, phase: StepPhase) {
        let seq = self.markers.len() as u32 + 1;
        self.markers.push(StepMarker {
            seq,
            at: Utc::now(),
            step: step.to_string(),
            phase,
        });
    }
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success {
        confirmation_image: Vec<u8>,
    },
    Failure {
        kind: ErrorKind,
        message: String,
        diagnostic_image: Option<Vec<u8>>,
    },
}

#[derive(Debug, Clone)]
pub struct WorkflowResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: Outcome,
    pub log: StepLog,
}

impl WorkflowResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    pub fn confirmation_image(&self) -> Option<&[u8]> {
        match &self.outcome {
            Outcome::Success { confirmation_image } => Some(confirmation_image),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn diagnostic_image(&self) -> Option<&[u8]> {
        match &self.outcome {
            Outcome::Failure {
                diagnostic_image, ..
            } => diagnostic_image.as_deref(),
            Outcome::Success { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<&ErrorKind> {
        match &self.outcome {
            Outcome::Failure { kind, .. } => Some(kind),
            Outcome::Success { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failure { message, .. } => Some(message),
            Outcome::Success { .. } => None,
        }
    }
}

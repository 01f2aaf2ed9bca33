//! Core data types for action primitives

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Logical description of a form control, resolved against the live page.
///
/// - `Role`: element exposing `role` (explicit or implicit) whose accessible
///   name contains `name`
/// - `Scoped`: element with `role` inside the first `container` whose text
///   contains every fragment of `contains`
/// - `Css`: first element matching a CSS selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldSpec {
    Role {
        role: String,
        name: String,
    },
    Scoped {
        container: String,
        contains: Vec<String>,
        role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Css {
        selector: String,
    },
}

impl FieldSpec {
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        FieldSpec::Role {
            role: role.into(),
            name: name.into(),
        }
    }

    pub fn scoped(
        container: impl Into<String>,
        contains: impl IntoIterator<Item = impl Into<String>>,
        role: impl Into<String>,
    ) -> Self {
        FieldSpec::Scoped {
            container: container.into(),
            contains: contains.into_iter().map(Into::into).collect(),
            role: role.into(),
            name: None,
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        FieldSpec::Css {
            selector: selector.into(),
        }
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSpec::Role { role, name } => write!(f, "role={role}[name=\"{name}\"]"),
            FieldSpec::Scoped {
                container,
                contains,
                role,
                name,
            } => {
                write!(f, "{container}:has-text(")?;
                for (idx, fragment) in contains.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "\"{fragment}\"")?;
                }
                write!(f, ") >> role={role}")?;
                if let Some(name) = name {
                    write!(f, "[name=\"{name}\"]")?;
                }
                Ok(())
            }
            FieldSpec::Css { selector } => write!(f, "css={selector}"),
        }
    }
}

/// A located element, addressable by a page-unique selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub selector: String,
    pub spec: FieldSpec,
}

/// Non-failing lookup result used by visibility polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub handle: ElementHandle,
    pub visible: bool,
}

/// Readiness conditions applied between steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitKind {
    /// No in-flight requests for the configured quiet window
    NetworkSettled,
    /// Element attached and rendered
    ElementVisible(FieldSpec),
    /// Unconditional sleep
    FixedDelay(Duration),
}

impl fmt::Display for WaitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitKind::NetworkSettled => write!(f, "networkSettled"),
            WaitKind::ElementVisible(spec) => write!(f, "elementVisible({spec})"),
            WaitKind::FixedDelay(delay) => write!(f, "fixedDelay({}ms)", delay.as_millis()),
        }
    }
}

/// Option of an hour dropdown, addressed by its `"{index}: {label}"` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourOption {
    pub index: u8,
    pub label: u8,
}

impl HourOption {
    /// Index offset of the first hour option (index 0 is the placeholder).
    pub const DEFAULT_OFFSET: u8 = 1;

    pub fn for_hours(hours: u8) -> Self {
        Self::with_offset(hours, Self::DEFAULT_OFFSET)
    }

    pub fn with_offset(hours: u8, offset: u8) -> Self {
        Self {
            index: hours.saturating_add(offset),
            label: hours,
        }
    }

    pub fn value(&self) -> String {
        format!("{}: {}", self.index, self.label)
    }
}

/// Timing record produced by every primitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionReport {
    pub primitive: String,
    /// Resolved selector, when the primitive targeted an element
    pub selector: Option<String>,
    pub started_at: DateTime<Utc>,
    pub latency_ms: u64,
}

impl ActionReport {
    pub fn new(primitive: impl Into<String>, started_at: DateTime<Utc>, latency_ms: u64) -> Self {
        Self {
            primitive: primitive.into(),
            selector: None,
            started_at,
            latency_ms,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }
}

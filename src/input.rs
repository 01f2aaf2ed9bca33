//! Request parsing: form fields, JSON bodies and CLI `--entry` pairs all end
//! up as a validated [`SubmissionRequest`].

use action_flow::{FlowError, StudyEntry, SubmissionRequest};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::fmt;

pub const COMMENT_FIELD: &str = "comment";

/// JSON body of `POST /api/submit`.
#[derive(Debug, Deserialize)]
pub struct SubmitPayload {
    /// Subject label to hours, in the order given by the client
    #[serde(deserialize_with = "ordered_map")]
    pub subjects: Vec<(String, JsonValue)>,
    #[serde(default)]
    pub comment: String,
}

impl SubmitPayload {
    pub fn into_request(self) -> Result<SubmissionRequest, FlowError> {
        let mut entries = Vec::with_capacity(self.subjects.len());
        for (label, value) in self.subjects {
            let hours = match value {
                JsonValue::Null => continue,
                JsonValue::Number(n) => n.as_i64().ok_or_else(|| not_an_integer(&label, &n))?,
                other => return Err(not_an_integer(&label, &other)),
            };
            entries.push(StudyEntry::parse(&label, hours)?);
        }
        SubmissionRequest::new(entries, self.comment)
    }
}

/// Form-encoded pairs. `comment` is the comment; every other key is a
/// subject label. Blank hour values mean the subject was not submitted.
pub fn from_form<I>(pairs: I) -> Result<SubmissionRequest, FlowError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut entries = Vec::new();
    let mut comment = String::new();

    for (key, value) in pairs {
        if key == COMMENT_FIELD {
            comment = value;
            continue;
        }
        let raw = value.trim();
        if raw.is_empty() {
            continue;
        }
        let hours: i64 = raw
            .parse()
            .map_err(|_| FlowError::Validation(format!("hours for {key} must be an integer, got {raw:?}")))?;
        entries.push(StudyEntry::parse(&key, hours)?);
    }

    SubmissionRequest::new(entries, comment)
}

/// CLI `--entry 国語=2` values.
pub fn from_entry_args(entries: &[String], comment: &str) -> Result<SubmissionRequest, FlowError> {
    let mut pairs = Vec::with_capacity(entries.len() + 1);
    for raw in entries {
        let (label, hours) = raw
            .split_once('=')
            .ok_or_else(|| FlowError::Validation(format!("expected SUBJECT=HOURS, got {raw:?}")))?;
        if hours.trim().is_empty() {
            return Err(FlowError::Validation(format!("missing hours in {raw:?}")));
        }
        pairs.push((label.trim().to_string(), hours.to_string()));
    }
    pairs.push((COMMENT_FIELD.to_string(), comment.to_string()));
    from_form(pairs)
}

fn not_an_integer(label: &str, value: &impl fmt::Display) -> FlowError {
    FlowError::Validation(format!("hours for {label} must be an integer, got {value}"))
}

fn ordered_map<'de, D>(deserializer: D) -> Result<Vec<(String, JsonValue)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedVisitor;

    impl<'de> Visitor<'de> for OrderedVisitor {
        type Value = Vec<(String, JsonValue)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of subject label to hours")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, JsonValue>()? {
                out.push((key, value));
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(OrderedVisitor)
}

//! Release note records and their JSON rendering

use std::fmt;
use std::str::FromStr;

use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::constants::{DEFAULT_PRODUCT, DEFAULT_RELEASE_NOTE_TYPE, NULL_SENTINEL};
use crate::{Error, Result};

/// One published change entry.
///
/// A `None` field is a null cell in the source table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseNote {
    pub product_name: Option<String>,
    pub product_version_name: Option<String>,
    pub release_note_type: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<String>,
}

/// Filter values for one lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNoteQuery {
    pub product: String,
    pub release_note_type: String,
}

impl ReleaseNoteQuery {
    #[must_use]
    pub fn new(product: impl Into<String>, release_note_type: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            release_note_type: release_note_type.into(),
        }
    }
}

impl Default for ReleaseNoteQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PRODUCT, DEFAULT_RELEASE_NOTE_TYPE)
    }
}

/// Accepted spellings of the note type parameter
const RELEASE_NOTE_TYPE_KEYS: [&str; 3] = ["release_note_type", "releaseNoteType", "type"];

/// Request parameters from the query string or a JSON body.
///
/// Absent fields fall back to the next source, then to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub product: Option<String>,
    pub release_note_type: Option<String>,
}

impl RequestParams {
    /// Fill gaps in `self` from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            product: self.product.or(fallback.product),
            release_note_type: self.release_note_type.or(fallback.release_note_type),
        }
    }

    /// Parameters from a URL query string; the first occurrence of a key wins.
    #[must_use]
    pub fn from_query_string(query: Option<&str>) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            let slot = if key == "product" {
                &mut params.product
            } else if RELEASE_NOTE_TYPE_KEYS.contains(&&*key) {
                &mut params.release_note_type
            } else {
                continue;
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    /// Parameters from a request body.
    ///
    /// A blank body, or JSON that is not an object, carries none. Only string
    /// members are read. Fails only when the body is not JSON at all.
    pub fn from_json_body(body: &[u8]) -> serde_json::Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let value: serde_json::Value = serde_json::from_slice(body)?;
        let text = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| value.get(*key)?.as_str())
                .map(str::to_string)
        };
        Ok(Self {
            product: text(&["product"]),
            release_note_type: text(&RELEASE_NOTE_TYPE_KEYS),
        })
    }

    #[must_use]
    pub fn into_query(self) -> ReleaseNoteQuery {
        let defaults = ReleaseNoteQuery::default();
        ReleaseNoteQuery {
            product: self.product.unwrap_or(defaults.product),
            release_note_type: self
                .release_note_type
                .unwrap_or(defaults.release_note_type),
        }
    }
}

/// How null fields appear in the JSON response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullStyle {
    /// The literal string `"NULL"`
    #[default]
    Sentinel,
    /// JSON `null`
    JsonNull,
}

impl NullStyle {
    fn render(self, value: Option<&str>) -> Option<&str> {
        match self {
            Self::Sentinel => Some(value.unwrap_or(NULL_SENTINEL)),
            Self::JsonNull => value,
        }
    }
}

impl FromStr for NullStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sentinel" | "string" => Ok(Self::Sentinel),
            "null" | "json" | "json-null" | "json_null" => Ok(Self::JsonNull),
            other => Err(Error::Config(format!(
                "Invalid null style '{other}' (expected 'sentinel' or 'null')"
            ))),
        }
    }
}

impl fmt::Display for NullStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sentinel => "sentinel",
            Self::JsonNull => "null",
        })
    }
}

struct RenderedNote<'a> {
    note: &'a ReleaseNote,
    style: NullStyle,
}

impl RenderedNote<'_> {
    fn field<'v>(&self, value: &'v Option<String>) -> Option<&'v str> {
        self.style.render(value.as_deref())
    }
}

impl Serialize for RenderedNote<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ReleaseNote", 5)?;
        s.serialize_field("product_name", &self.field(&self.note.product_name))?;
        s.serialize_field("product_version_name", &self.field(&self.note.product_version_name))?;
        s.serialize_field("release_note_type", &self.field(&self.note.release_note_type))?;
        s.serialize_field("description", &self.field(&self.note.description))?;
        s.serialize_field("published_at", &self.field(&self.note.published_at))?;
        s.end()
    }
}

/// Response body: the notes as a JSON array, every record with all five keys.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseNotesBody<'a> {
    notes: &'a [ReleaseNote],
    style: NullStyle,
}

impl<'a> ReleaseNotesBody<'a> {
    #[must_use]
    pub const fn new(notes: &'a [ReleaseNote], style: NullStyle) -> Self {
        Self { notes, style }
    }

    /// Serialize fully before anything is written to the client.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Error::Encoding)
    }
}

impl Serialize for ReleaseNotesBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.notes.len()))?;
        for note in self.notes {
            seq.serialize_element(&RenderedNote {
                note,
                style: self.style,
            })?;
        }
        seq.end()
    }
}

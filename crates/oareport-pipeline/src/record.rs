//! Artudis publication records (one JSON object per export line)

use oareport_oadoi::schema::nullable;
use serde::{Deserialize, Deserializer};

/// Identifier scheme that drives lookups
pub const DOI_SCHEME: &str = "doi";

/// Best-version label when no open-access attachment ranks above it
pub const MISSING_VERSION: &str = "missing";

/// Attachment types from least to most complete. Anything not listed ranks
/// with `missing`.
const VERSION_RANKS: &[&str] = &[
    MISSING_VERSION,
    "other",
    "submittedManuscript",
    "acceptedManuscript",
    "finalVersion",
];

/// One `(scheme, value)` identifier pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Identifier {
    #[serde(deserialize_with = "nullable")]
    pub scheme: String,
    #[serde(deserialize_with = "nullable")]
    pub value: String,
}

/// Attached file descriptor
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Attachment {
    /// `"true"` when the file is public; compared as a literal string
    #[serde(deserialize_with = "nullable")]
    pub open_access: String,
    #[serde(deserialize_with = "nullable")]
    pub blob_key: String,
    /// Carried through untouched; shape varies between exports
    pub external_url: serde_json::Value,
    /// Manuscript stage, e.g. `acceptedManuscript`
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub kind: String,
}

impl Attachment {
    pub fn is_open_access(&self) -> bool {
        self.open_access == "true"
    }
}

/// One parsed export line. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputRecord {
    #[serde(rename = "__id__", deserialize_with = "nullable")]
    pub id: String,
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub kind: String,
    #[serde(rename = "identifier", deserialize_with = "nullable_list")]
    pub identifiers: Vec<Identifier>,
    #[serde(rename = "attachment", deserialize_with = "nullable_list")]
    pub attachments: Vec<Attachment>,
}

/// A list that may be `null` itself or hold `null` entries; each `null`
/// entry becomes a default element.
fn nullable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let items: Option<Vec<Option<T>>> = Option::deserialize(deserializer)?;
    Ok(items
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

/// Decode one line. Fails (never panics) on malformed JSON.
pub fn parse_record(line: &[u8]) -> Result<InputRecord, serde_json::Error> {
    serde_json::from_slice(line)
}

impl InputRecord {
    /// DOI values in the order they appear in the record
    pub fn doi_values(&self) -> impl Iterator<Item = &str> {
        self.identifiers
            .iter()
            .filter(|id| id.scheme == DOI_SCHEME)
            .map(|id| id.value.as_str())
    }

    /// True if any attachment is flagged open access
    pub fn is_locally_open_access(&self) -> bool {
        self.attachments.iter().any(Attachment::is_open_access)
    }

    /// Highest-ranked attachment type among open-access attachments.
    ///
    /// Ties keep the first one found; `"missing"` if nothing ranks higher.
    pub fn best_local_version(&self) -> &str {
        let mut best = MISSING_VERSION;
        let mut best_rank = 0;
        for attachment in self.attachments.iter().filter(|a| a.is_open_access()) {
            let rank = version_rank(&attachment.kind);
            if rank > best_rank {
                best = attachment.kind.as_str();
                best_rank = rank;
            }
        }
        best
    }
}

fn version_rank(kind: &str) -> usize {
    VERSION_RANKS.iter().position(|v| *v == kind).unwrap_or(0)
}

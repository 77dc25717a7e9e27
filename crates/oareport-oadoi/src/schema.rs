//! oaDOI response body and per-lookup result types

use serde::{Deserialize, Deserializer};

/// Deserialize a field that the API may send as `null`, falling back to the
/// type's default (empty string, `false`, `0`).
pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Best open-access location reported by oaDOI
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BestOaLocation {
    #[serde(deserialize_with = "nullable")]
    pub evidence: String,
    #[serde(deserialize_with = "nullable")]
    pub host_type: String,
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub url: String,
    #[serde(deserialize_with = "nullable")]
    pub url_for_landing_page: String,
    #[serde(deserialize_with = "nullable")]
    pub url_for_pdf: String,
    #[serde(deserialize_with = "nullable")]
    pub version: String,
}

/// Decoded oaDOI v2 payload. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResponseBody {
    #[serde(deserialize_with = "nullable")]
    pub best_oa_location: BestOaLocation,
    #[serde(deserialize_with = "nullable")]
    pub data_standard: i64,
    #[serde(deserialize_with = "nullable")]
    pub doi: String,
    #[serde(deserialize_with = "nullable")]
    pub doi_url: String,
    #[serde(deserialize_with = "nullable")]
    pub is_oa: bool,
    #[serde(deserialize_with = "nullable")]
    pub journal_is_oa: bool,
    /// Comma-joined ISSN list
    #[serde(deserialize_with = "nullable")]
    pub journal_issns: String,
    #[serde(deserialize_with = "nullable")]
    pub journal_name: String,
    #[serde(deserialize_with = "nullable")]
    pub publisher: String,
    #[serde(deserialize_with = "nullable")]
    pub title: String,
    #[serde(deserialize_with = "nullable")]
    pub updated: String,
    #[serde(deserialize_with = "nullable")]
    pub year: i32,
}

/// Outcome of one lookup.
///
/// A transport failure never has a status; a decode failure always has one.
/// The flat accessors give the CSV view: empty strings where a field does
/// not apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentResult {
    /// Request completed and the body decoded
    Found { status: String, body: ResponseBody },
    /// Request completed but the body was unreadable or not a `ResponseBody`
    DecodeFailed { status: String, error: String },
    /// Request never completed
    TransportFailed { error: String },
}

impl EnrichmentResult {
    /// HTTP status line, empty if the call never completed
    pub fn status(&self) -> &str {
        match self {
            Self::Found { status, .. } | Self::DecodeFailed { status, .. } => status,
            Self::TransportFailed { .. } => "",
        }
    }

    /// Decoded body, `None` unless the lookup fully succeeded
    pub fn body(&self) -> Option<&ResponseBody> {
        match self {
            Self::Found { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn decode_error(&self) -> &str {
        match self {
            Self::DecodeFailed { error, .. } => error,
            _ => "",
        }
    }

    pub fn transport_error(&self) -> &str {
        match self {
            Self::TransportFailed { error } => error,
            _ => "",
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "best_oa_location": {
            "evidence": "oa repository (via OAI-PMH doi match)",
            "host_type": "repository",
            "id": "pmh:oai:example",
            "url": "https://repo.example.org/123.pdf",
            "url_for_landing_page": "https://repo.example.org/123",
            "url_for_pdf": "https://repo.example.org/123.pdf",
            "version": "acceptedVersion",
            "license": null
        },
        "data_standard": 2,
        "doi": "10.1038/nature12373",
        "doi_url": "https://doi.org/10.1038/nature12373",
        "is_oa": true,
        "journal_is_oa": false,
        "journal_issns": "0028-0836,1476-4687",
        "journal_name": "Nature",
        "publisher": "Springer Nature",
        "title": "Nanometre-scale thermometry in a living cell",
        "updated": "2018-06-18T21:50:50.151540",
        "year": 2013,
        "z_authors": [{"family": "Kucsko"}]
    }"#;

    #[test]
    fn decode_full_response() {
        let body: ResponseBody = serde_json::from_str(SAMPLE).unwrap();
        assert!(body.is_oa);
        assert!(!body.journal_is_oa);
        assert_eq!(body.best_oa_location.version, "acceptedVersion");
        assert_eq!(body.best_oa_location.host_type, "repository");
        assert_eq!(body.journal_issns, "0028-0836,1476-4687");
        assert_eq!(body.year, 2013);
        assert_eq!(body.data_standard, 2);
    }

    #[test]
    fn null_fields_decode_as_default() {
        let json = r#"{"best_oa_location": null, "title": null, "year": null, "is_oa": false}"#;
        let body: ResponseBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.best_oa_location, BestOaLocation::default());
        assert_eq!(body.title, "");
        assert_eq!(body.year, 0);
    }

    #[test]
    fn missing_fields_decode_as_default() {
        let body: ResponseBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body, ResponseBody::default());
    }

    #[test]
    fn wrong_type_is_an_error() {
        assert!(serde_json::from_str::<ResponseBody>(r#"{"year": "2013"}"#).is_err());
    }

    #[test]
    fn accessors_found() {
        let r = EnrichmentResult::Found {
            status: "200 OK".to_string(),
            body: ResponseBody::default(),
        };
        assert_eq!(r.status(), "200 OK");
        assert!(r.body().is_some());
        assert_eq!(r.decode_error(), "");
        assert_eq!(r.transport_error(), "");
        assert!(r.is_found());
    }

    #[test]
    fn accessors_decode_failed_keep_status() {
        let r = EnrichmentResult::DecodeFailed {
            status: "404 Not Found".to_string(),
            error: "expected value at line 1 column 1".to_string(),
        };
        assert_eq!(r.status(), "404 Not Found");
        assert!(r.body().is_none());
        assert!(!r.decode_error().is_empty());
        assert_eq!(r.transport_error(), "");
    }

    #[test]
    fn accessors_transport_failed_have_no_status() {
        let r = EnrichmentResult::TransportFailed {
            error: "connection refused".to_string(),
        };
        assert_eq!(r.status(), "");
        assert!(r.body().is_none());
        assert_eq!(r.decode_error(), "");
        assert_eq!(r.transport_error(), "connection refused");
    }
}

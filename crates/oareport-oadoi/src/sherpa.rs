//! SHERPA/RoMEO journal links from oaDOI ISSN lists

/// Journal policy page prefix; the hyphenated ISSN and a trailing `/` follow.
pub const SHERPA_ROMEO_BASE: &str = "http://www.sherpa.ac.uk/romeo/issn/";

/// Map a comma-joined ISSN list to comma-joined SHERPA/RoMEO links.
///
/// `"12345678,abcd-efgh"` becomes
/// `"<base>1234-5678/,<base>abcd-efgh/"`. Empty input gives empty output.
pub fn sherpa_links(issns: &str) -> String {
    sherpa_links_with_base(SHERPA_ROMEO_BASE, issns)
}

/// [`sherpa_links`] against a custom base URL.
pub fn sherpa_links_with_base(base: &str, issns: &str) -> String {
    issns
        .split(',')
        .map(str::trim)
        .filter(|issn| !issn.is_empty())
        .map(|issn| format!("{base}{}/", hyphenate(issn)))
        .collect::<Vec<_>>()
        .join(",")
}

/// `12345678` -> `1234-5678`; anything else passes through.
fn hyphenate(issn: &str) -> String {
    if issn.len() == 8 && issn.is_ascii() && !issn.contains('-') {
        format!("{}-{}", &issn[..4], &issn[4..])
    } else {
        issn.to_string()
    }
}

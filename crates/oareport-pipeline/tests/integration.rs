//! End-to-end runs over temp input files
//!
//! The oaDOI endpoint is a local wiremock server; no external network.

use std::path::{Path, PathBuf};

use oareport_core::ProgressContext;
use oareport_oadoi::{ClientConfig, Enricher, EnrichmentResult, OadoiClient, SHERPA_ROMEO_BASE};
use oareport_pipeline::{Config, HEADER, run};
use serde_json::json;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMAIL: &str = "oa-team@example.org";

fn publication(id: &str, dois: &[&str], open_access: bool) -> String {
    let identifiers: Vec<_> = dois
        .iter()
        .map(|d| json!({"scheme": "doi", "value": d}))
        .chain(std::iter::once(json!({"scheme": "scopus", "value": "2-s2.0-1"})))
        .collect();
    json!({
        "__id__": id,
        "type": "journal-article",
        "identifier": identifiers,
        "attachment": [
            {"open_access": if open_access { "true" } else { "false" },
             "blob_key": "blob", "external_url": null, "type": "acceptedManuscript"}
        ],
        "keywords": ["ignored"]
    })
    .to_string()
}

fn write_input(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

fn read_rows(output: &[u8]) -> (csv::StringRecord, Vec<csv::StringRecord>) {
    let mut reader = csv::Reader::from_reader(output);
    let header = reader.headers().unwrap().clone();
    let rows = reader.records().map(Result::unwrap).collect();
    (header, rows)
}

fn hidden_progress() -> ProgressContext {
    ProgressContext::with_tty(false)
}

/// Answers every lookup without touching the network
struct Echo;

impl Enricher for Echo {
    fn lookup(&self, identifier: &str) -> EnrichmentResult {
        EnrichmentResult::Found {
            status: "200 OK".to_string(),
            body: oareport_oadoi::ResponseBody {
                doi: identifier.to_string(),
                ..Default::default()
            },
        }
    }
}

#[test]
fn rows_per_doi_and_bad_lines_skipped() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        dir.path(),
        "a-Publication-export.json",
        &[
            publication("p1", &["10.1/one"], true),
            "{\"__id__\": \"broken\"".to_string(),
            publication("p2", &["10.1/two-a", "10.1/two-b"], false),
            publication("p3", &[], true),
            String::new(),
            publication("p4", &["10.1/four"], false),
        ],
    );

    let config = Config {
        inputs: vec![input],
        concurrency: 2,
        ..Default::default()
    };
    let mut output = Vec::new();
    let summary = run(&config, &Echo, &mut output, &hidden_progress()).unwrap();

    let (header, rows) = read_rows(&output);
    assert_eq!(header.iter().collect::<Vec<_>>(), HEADER.to_vec());
    assert_eq!(rows.len(), 4);

    let p2_rows: Vec<_> = rows.iter().filter(|r| &r[3] == "p2").collect();
    assert_eq!(p2_rows.len(), 2);
    assert!(rows.iter().all(|r| &r[3] != "p3"));

    assert_eq!(summary.parse_errors(), 1);
    assert_eq!(summary.records_without_doi(), 1);
    assert_eq!(summary.records(), 4);
    assert_eq!(summary.rows_written(), 4);
    assert_eq!(summary.lookups(), 4);
}

#[test]
fn missing_file_skipped_and_header_written_once() {
    let dir = TempDir::new().unwrap();
    let first = write_input(dir.path(), "first.json", &[publication("f1", &["10.1/f1"], true)]);
    let second = write_input(
        dir.path(),
        "second.json",
        &[
            publication("s1", &["10.1/s1"], false),
            publication("s2", &["10.1/s2"], false),
        ],
    );

    let config = Config {
        inputs: vec![first, dir.path().join("does-not-exist.json"), second],
        ..Default::default()
    };
    let mut output = Vec::new();
    let summary = run(&config, &Echo, &mut output, &hidden_progress()).unwrap();

    assert_eq!(summary.files.len(), 2);
    assert_eq!(summary.skipped.len(), 1);

    let text = String::from_utf8(output).unwrap();
    assert_eq!(text.matches("API - Available OA").count(), 1);
    let (_, rows) = read_rows(text.as_bytes());
    assert_eq!(rows.len(), 3);
}

#[test]
fn run_rejects_empty_input_list() {
    let err = run(&Config::default(), &Echo, Vec::new(), &hidden_progress()).unwrap_err();
    assert!(err.to_string().contains("Could not find any files"));
}

#[test]
fn local_and_remote_columns_against_mock_api() {
    let rt: Runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let server = rt.block_on(MockServer::start());
    rt.block_on(
        Mock::given(method("GET"))
            .and(path_regex(r"^/v2/10\.5555/ok$"))
            .and(query_param("email", EMAIL))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "is_oa": true,
                "doi": "10.5555/ok",
                "title": "Open, and found",
                "journal_issns": "12345678,2049-3630",
                "best_oa_location": {"url": "https://oa.example.org/ok.pdf", "version": "publishedVersion"}
            })))
            .expect(1)
            .mount(&server),
    );
    rt.block_on(
        Mock::given(method("GET"))
            .and(path_regex(r"^/v2/10\.5555/garbled$"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .expect(1)
            .mount(&server),
    );

    let dir = TempDir::new().unwrap();
    let input = write_input(
        dir.path(),
        "mock-Publication-export.json",
        &[
            publication("ok", &["http://dx.doi.org/10.5555/ok"], true),
            publication("garbled", &["10.5555/garbled"], false),
        ],
    );

    let client = OadoiClient::new(ClientConfig {
        base_url: format!("{}/v2/", server.uri()),
        email: EMAIL.to_string(),
    })
    .unwrap();
    let config = Config {
        inputs: vec![input],
        concurrency: 1,
        ..Default::default()
    };
    let mut output = Vec::new();
    let summary = run(&config, &client, &mut output, &hidden_progress()).unwrap();

    let (_, rows) = read_rows(&output);
    assert_eq!(rows.len(), 2);
    assert_eq!(summary.failed_lookups(), 1);

    let ok = rows.iter().find(|r| &r[3] == "ok").unwrap();
    assert_eq!(&ok[0], "true");
    assert_eq!(&ok[1], "true");
    assert_eq!(&ok[2], "acceptedManuscript");
    assert_eq!(&ok[4], "https://oa.example.org/ok.pdf");
    assert_eq!(&ok[7], "200 OK");
    assert_eq!(&ok[8], "");
    assert_eq!(&ok[11], "Open, and found");
    assert_eq!(
        &ok[12],
        format!("{SHERPA_ROMEO_BASE}1234-5678/,{SHERPA_ROMEO_BASE}2049-3630/").as_str()
    );

    let garbled = rows.iter().find(|r| &r[3] == "garbled").unwrap();
    assert_eq!(&garbled[0], "false");
    assert_eq!(&garbled[1], "false");
    assert_eq!(&garbled[2], "missing");
    assert_eq!(&garbled[7], "502 Bad Gateway");
    assert!(!garbled[8].is_empty());
    assert_eq!(&garbled[9], "");
}

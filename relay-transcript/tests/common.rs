#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::OnceLock;

use relay_common::observability::{LogConfig, LogFormat, init_logging};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TRANSCRIPT_PATH: &str = "/transcript/11/2024/05/01";

/// Route scraper logs to `<tmp>/relay-tests` once per test binary.
///
/// `RELAY_LOG_FORMAT=json` switches both sinks to JSON.
pub fn init_test_tracing() -> PathBuf {
    static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();
    LOG_FILE
        .get_or_init(|| {
            let json = std::env::var("RELAY_LOG_FORMAT").is_ok_and(|v| v.trim() == "json");
            init_logging(LogConfig {
                app_name: "relay-tests",
                log_dir: Some(std::env::temp_dir().join("relay-tests")),
                format: if json { LogFormat::Json } else { LogFormat::Text },
                default_filter: "relay_transcript=debug,relay_http=debug",
                ..LogConfig::default()
            })
            .unwrap_or_default()
        })
        .clone()
}

/// Serve `html` as the 2024-05-01 transcript of room 11.
pub async fn serve_transcript(server: &MockServer, html: &str) {
    Mock::given(method("GET"))
        .and(path(TRANSCRIPT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .expect(1)
        .mount(server)
        .await;
}

/// Serve the full text of a partial message.
pub async fn serve_message(server: &MockServer, id: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/messages/11/{id}")))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

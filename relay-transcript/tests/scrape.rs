mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use relay_common::RelayError;
use relay_http::HttpClient;
use relay_transcript::{TranscriptScraper, last_hour};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TWO_BLOCKS: &str = include_str!("fixtures/two_blocks.html");

fn may_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn scraper_for(server: &MockServer) -> TranscriptScraper {
    let http = HttpClient::new(&server.uri()).unwrap();
    TranscriptScraper::new(http, 11)
}

#[tokio::test]
async fn scrapes_blocks_and_fetches_partial_messages() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    common::serve_transcript(&server, TWO_BLOCKS).await;
    Mock::given(method("GET"))
        .and(path("/messages/11/5003"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("a very long paste that was truncated<br>by the page &lt;3"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    let messages = scraper.scrape(may_first()).await.unwrap();

    assert_eq!(messages.len(), 3);
    let expected_url = format!("{}{}", server.uri(), common::TRANSCRIPT_PATH);
    let two_oh_five = Utc.with_ymd_and_hms(2024, 5, 1, 14, 5, 0).unwrap();

    assert_eq!(messages[0].user, "alice");
    assert_eq!(
        messages[0].content,
        "did anyone try the new <code>match</code> syntax?\nit's neat"
    );
    assert_eq!(messages[1].user, "alice");
    assert_eq!(messages[1].content, "line one\nline two & three");

    // block 2 has no timestamp of its own: it inherits 2:05 PM from block 1
    assert_eq!(messages[2].user, "bob");
    assert_eq!(messages[2].timestamp, two_oh_five);
    assert_eq!(
        messages[2].content,
        "a very long paste that was truncated\nby the page <3"
    );

    for m in &messages {
        assert_eq!(m.timestamp, two_oh_five);
        assert_eq!(m.url, expected_url);
    }
}

#[tokio::test]
async fn scraped_messages_feed_the_recency_filter() {
    let server = MockServer::start().await;
    common::serve_transcript(&server, TWO_BLOCKS).await;
    common::serve_message(&server, "5003", 200, "full").await;

    let scraper = scraper_for(&server);
    let messages = scraper.scrape(may_first()).await.unwrap();

    let within = last_hour(messages.clone(), Utc.with_ymd_and_hms(2024, 5, 1, 15, 5, 0).unwrap());
    assert_eq!(within.len(), 3);
    let too_late = last_hour(messages, Utc.with_ymd_and_hms(2024, 5, 1, 15, 6, 0).unwrap());
    assert!(too_late.is_empty());
}

#[tokio::test]
async fn transcript_fetch_failure_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    let err = scraper.scrape(may_first()).await.unwrap_err();

    assert!(matches!(err, RelayError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn partial_fetch_failure_aborts_the_whole_scrape() {
    let server = MockServer::start().await;
    common::serve_transcript(&server, TWO_BLOCKS).await;
    common::serve_message(&server, "5003", 404, "").await;

    let scraper = scraper_for(&server);
    let err = scraper.scrape(may_first()).await.unwrap_err();

    assert!(matches!(err, RelayError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn messages_before_any_timestamp_are_skipped_without_fetching() {
    let server = MockServer::start().await;
    let page = r#"<div id="transcript">
      <div class="monologue">
        <div class="signature"><div class="username"><a>early</a></div></div>
        <div class="messages">
          <div class="message" id="message-1"><div class="content"><div class="partial">x</div></div></div>
        </div>
      </div>
      <div class="monologue">
        <div class="signature"><div class="username"><a>later</a></div></div>
        <div class="messages">
          <div class="timestamp">10:15 AM</div>
          <div class="message" id="message-2"><div class="content">stamped</div></div>
        </div>
      </div>
    </div>"#;
    common::serve_transcript(&server, page).await;
    Mock::given(method("GET"))
        .and(path("/messages/11/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("never"))
        .expect(0)
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    let messages = scraper.scrape(may_first()).await.unwrap();

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].user, "later");
    assert_eq!(messages[0].to_string(), "*later 10:15*:\nstamped\n");
}

#[tokio::test]
async fn malformed_timestamps_skip_only_their_messages() {
    let server = MockServer::start().await;
    let page = r#"<div id="transcript">
      <div class="monologue">
        <div class="signature"><div class="username"><a>odd</a></div></div>
        <div class="messages">
          <div class="timestamp">yst 11:00 PM</div>
          <div class="message"><div class="content">lost</div></div>
        </div>
      </div>
      <div class="monologue">
        <div class="signature"><div class="username"><a>fine</a></div></div>
        <div class="messages">
          <div class="timestamp">8:00 AM</div>
          <div class="message"><div class="content">kept</div></div>
        </div>
      </div>
    </div>"#;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    let messages = scraper.scrape(may_first()).await.unwrap();

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "kept");
}

#[tokio::test]
async fn changed_page_layout_is_a_structure_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>maintenance</body></html>"))
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    let err = scraper.scrape(may_first()).await.unwrap_err();

    assert!(matches!(err, RelayError::Structure(_)), "{err:?}");
}

#[tokio::test]
async fn partials_under_a_malformed_timestamp_are_never_fetched() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    let page = r#"<div id="transcript">
      <div class="monologue">
        <div class="signature"><div class="username"><a>odd</a></div></div>
        <div class="messages">
          <div class="timestamp">yst 11:00 PM</div>
          <div class="message" id="message-7"><div class="content"><div class="partial">cut</div></div></div>
        </div>
      </div>
      <div class="monologue">
        <div class="signature"><div class="username"><a>fine</a></div></div>
        <div class="messages">
          <div class="timestamp">8:00 AM</div>
          <div class="message" id="message-8"><div class="content">kept</div></div>
        </div>
      </div>
    </div>"#;
    common::serve_transcript(&server, page).await;
    Mock::given(method("GET"))
        .and(path("/messages/11/7"))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&server)
        .await;

    let messages = scraper_for(&server).scrape(may_first()).await.unwrap();

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].to_string(), "*fine 08:00*:\nkept\n");
}

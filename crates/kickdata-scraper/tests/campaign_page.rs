//! Integration tests for `CampaignClient` + `parse_campaign_page`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made. Covers the fetch-then-classify path end to end:
//! live page, rate-limit notice, and tombstone.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kickdata_scraper::{parse_campaign_page, CampaignClient, PageOutcome, ScraperError};

/// Builds a `CampaignClient` suitable for tests: 5-second timeout, descriptive UA.
fn test_client() -> CampaignClient {
    CampaignClient::new(5, "kickdata-test/0.1").expect("failed to build test CampaignClient")
}

/// A live campaign page with two reward tiers and one FAQ entry.
fn live_page_body() -> String {
    "<html><body>\
     <div>About <span>$1</span></div>\
     <div class=\"pledge__reward-description\"><p>A sticker</p></div>\
     <div>About <span>$2,500</span></div>\
     <div class=\"pledge__reward-description\"><p>The full set</p></div>\
     <script>{&quot;projectFAQsCount&quot;:1,}</script>\
     </body></html>"
        .to_owned()
}

#[tokio::test]
async fn fetches_and_extracts_a_live_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/acme/widget"))
        .respond_with(ResponseTemplate::new(200).set_body_string(live_page_body()))
        .mount(&server)
        .await;

    let url = format!("{}/projects/acme/widget", server.uri());
    let page = test_client().fetch_page(&url).await.unwrap();
    let PageOutcome::Info(info) = parse_campaign_page(&url, &page).unwrap() else {
        panic!("expected an info outcome");
    };

    assert_eq!(info.project_url, url);
    assert_eq!(info.rewards_levels, 2);
    assert_eq!(info.rewards_min, 1);
    assert_eq!(info.rewards_max, 2500);
    assert_eq!(info.has_one_dollar_reward, 1);
    assert_eq!(info.faq, 1);
}

#[tokio::test]
async fn rate_limit_notice_is_detected_regardless_of_status() {
    let server = MockServer::start().await;

    // Rate-limit notices have been observed with both 200 and 429 statuses;
    // only the body text matters.
    Mock::given(method("GET"))
        .and(path("/projects/acme/widget"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>You are sending too many requests.</html>"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/projects/acme/widget", server.uri());
    let page = test_client().fetch_page(&url).await.unwrap();
    assert_eq!(
        parse_campaign_page(&url, &page).unwrap(),
        PageOutcome::RateLimited
    );
}

#[tokio::test]
async fn tombstone_page_is_gone() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/acme/widget"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html>This project has been hidden for privacy. This project has been \
             removed from visibility at the request of the creator.</html>",
        ))
        .mount(&server)
        .await;

    let url = format!("{}/projects/acme/widget", server.uri());
    let page = test_client().fetch_page(&url).await.unwrap();
    assert_eq!(parse_campaign_page(&url, &page).unwrap(), PageOutcome::Gone);
}

#[tokio::test]
async fn live_page_without_tier_markup_is_a_typed_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/acme/widget"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html>nothing to see here</html>"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/projects/acme/widget", server.uri());
    let page = test_client().fetch_page(&url).await.unwrap();
    assert!(matches!(
        parse_campaign_page(&url, &page),
        Err(ScraperError::NoRewardTiers { .. })
    ));
}

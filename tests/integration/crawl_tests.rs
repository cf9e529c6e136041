//! Integration tests for the crawler
//!
//! These tests use wiremock to serve listing pages, postback responses and
//! detail pages to the HTTP engine and check the CSV that comes out.

use fti_directory::config::{Config, CrawlerConfig, OutputConfig, RetryConfig, UserAgentConfig};
use fti_directory::crawler::{run_crawl, Coordinator};
use fti_directory::extract::HEADER;
use fti_directory::SENTINEL;
use std::path::Path;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, letters: &str, csv_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            listing_url: format!("{}/resultEN.aspx", base_url),
            letters: letters.to_string(),
            readiness_timeout_ms: 200,
            request_timeout_ms: 5000,
            ..CrawlerConfig::default()
        },
        retry: RetryConfig {
            detail_attempts: 2,
            advance_attempts: 1,
            backoff_ms: 1,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            csv_path: csv_path.display().to_string(),
        },
    }
}

/// A listing page the way the directory renders it
fn listing_page(letter: char, ids: &[u32], current: u32, pages: u32) -> String {
    let rows: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<tr><td align="left"><a href="MemberDetailEN.aspx?id={}">Member {}</a></td><td>Bangkok</td></tr>"#,
                id, id
            )
        })
        .collect();

    let cells: String = (1..=pages)
        .map(|n| {
            if n == current {
                format!("<td><span>{}</span></td>", n)
            } else {
                format!(
                    "<td><a href=\"javascript:__doPostBack(&#39;ctl00$m$GridView1&#39;,&#39;Page${}&#39;)\">{}</a></td>",
                    n, n
                )
            }
        })
        .collect();
    let pager = if pages > 1 {
        format!(
            r#"<tr align="center" style="color:White;background-color:#284775;"><td colspan="2"><table><tr>{}</tr></table></td></tr>"#,
            cells
        )
    } else {
        String::new()
    };

    format!(
        r#"<html><head><title>Members</title></head><body>
        <form method="post" action="./resultEN.aspx?ts=4&amp;texts={letter}" id="aspnetForm">
          <input type="hidden" name="__VIEWSTATE" value="state-{letter}-{current}" />
          <input type="hidden" name="__EVENTTARGET" value="" />
          <input type="hidden" name="__EVENTARGUMENT" value="" />
          <table id="GridView1">{rows}{pager}</table>
        </form></body></html>"#
    )
}

/// A detail page with the given affiliation clubs
fn detail_page(name: &str, clubs: &[&str]) -> String {
    let sections: String = clubs
        .iter()
        .map(|club| {
            format!(
                r#"<td style="background-color:#F2F2F2"><b>{}</b>
                   <table><tr><th>Rep</th></tr><tr><td>Rep of {}</td></tr></table></td>"#,
                club, club
            )
        })
        .collect();

    format!(
        r#"<html><body><form id="aspnetForm">
        <span id="comp_person_name">{name}</span>
        <span id="comp_address">1 Test Road Bangkok</span>
        <span id="addr_telephone">02-123-<b>4567</b></span>
        <span id="addr_email"><a href="mailto:info@example.th">info@example.th</a></span>
        <table><tr><td class="auto-style9"><a href="http://www.example.th">web</a></td></tr></table>
        <table id="ContactFTI"><tr><th>1</th></tr><tr><td>Khun A</td><td>Khun B</td></tr></table>
        <table id="ContactNonFTI"><tr>{sections}</tr></table>
        </form></body></html>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_detail(server: &MockServer, id: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/MemberDetailEN.aspx"))
        .and(query_param("id", id))
        .respond_with(response)
        .mount(server)
        .await;
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let text = std::fs::read_to_string(path).expect("Failed to read CSV");
    text.split("\r\n")
        .filter(|line| !line.is_empty())
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn test_full_crawl_over_two_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Letter A: two pages reached by postback
    Mock::given(method("GET"))
        .and(path("/resultEN.aspx"))
        .and(query_param("texts", "A"))
        .respond_with(html(listing_page('A', &[1, 2, 3], 1, 2)))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/resultEN.aspx"))
        .and(body_string_contains("__EVENTARGUMENT=Page%242"))
        .and(body_string_contains("__VIEWSTATE=state-A-1"))
        .respond_with(html(listing_page('A', &[4], 2, 2)))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Letter B: the listing loads but lists nobody
    Mock::given(method("GET"))
        .and(path("/resultEN.aspx"))
        .and(query_param("texts", "B"))
        .respond_with(html(listing_page('B', &[], 1, 1)))
        .mount(&mock_server)
        .await;

    mount_detail(&mock_server, "1", html(detail_page("Alpha Co", &[]))).await;
    mount_detail(
        &mock_server,
        "2",
        html(detail_page("Beta Co", &["Steel Club", "Auto Club"])),
    )
    .await;
    mount_detail(&mock_server, "3", ResponseTemplate::new(500)).await;
    mount_detail(&mock_server, "4", html(detail_page("Delta Co", &["Food Club"]))).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("members.csv");
    let config = create_test_config(&base_url, "AB", &csv_path);

    let mut coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let stats = coordinator.run().await.expect("Crawl failed");

    assert_eq!(stats.letters_attempted, 2);
    assert!(stats.letters_failed.is_empty());
    assert_eq!(stats.letters_empty, vec!['B']);
    assert_eq!(stats.pages_visited, 2);
    assert_eq!(stats.links_found, 4);
    assert_eq!(stats.detail_failures, 1);
    assert_eq!(stats.organizations, 3);
    assert_eq!(stats.rows_written, 4);

    let rows = read_rows(&csv_path);
    assert_eq!(rows.len(), 5, "header plus four rows");
    assert_eq!(rows[0], HEADER.to_vec());

    let names: Vec<_> = rows[1..].iter().map(|row| row[0].as_str()).collect();
    assert_eq!(names, vec!["Alpha Co", "Beta Co", "Beta Co", "Delta Co"]);

    let clubs: Vec<_> = rows[1..].iter().map(|row| row[11].as_str()).collect();
    assert_eq!(clubs, vec![SENTINEL, "Steel Club", "Auto Club", "Food Club"]);

    // Base fields repeat on every row of an organization
    assert_eq!(rows[2][..11], rows[3][..11]);
    assert_eq!(rows[2][12], "Rep of Steel Club");
    assert_eq!(rows[2][13], SENTINEL);

    let alpha = &rows[1];
    assert_eq!(alpha[1], "1 Test Road Bangkok");
    assert_eq!(alpha[2], "02-123-4567");
    assert_eq!(alpha[3], SENTINEL, "fax is missing");
    assert_eq!(alpha[4], "info@example.th");
    assert_eq!(alpha[5], "http://www.example.th/");
    assert_eq!(alpha[8], "Khun A");
    assert_eq!(alpha[10], SENTINEL);
    assert!(rows.iter().flatten().all(|cell| !cell.is_empty()));
}

#[tokio::test]
async fn test_failed_detail_is_retried() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/resultEN.aspx"))
        .and(query_param("texts", "Q"))
        .respond_with(html(listing_page('Q', &[7], 1, 1)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/MemberDetailEN.aspx"))
        .and(query_param("id", "7"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("members.csv");
    let stats = run_crawl(create_test_config(&base_url, "Q", &csv_path))
        .await
        .expect("Crawl failed");

    assert_eq!(stats.detail_failures, 1);
    assert_eq!(stats.rows_written, 0);
    assert!(stats.letters_failed.is_empty());
}

#[tokio::test]
async fn test_empty_directory_leaves_header_only() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/resultEN.aspx"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("out").join("members.csv");
    let stats = run_crawl(create_test_config(&base_url, "XYZ", &csv_path))
        .await
        .expect("Crawl failed");

    assert_eq!(stats.letters_attempted, 3);
    assert_eq!(stats.letters_failed, vec!['X', 'Y', 'Z']);
    assert!(stats.letters_empty.is_empty());

    let rows = read_rows(&csv_path);
    assert_eq!(rows, vec![HEADER.to_vec()]);
}

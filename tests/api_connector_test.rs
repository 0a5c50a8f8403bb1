mod common;

use anyhow::Result;
use chrono::NaiveDate;
use common::{api_config, FlakyTokenEndpoint};
use httpmock::prelude::*;
use matchbox_api_utils::utils::json::read_json;
use matchbox_api_utils::{Connector, ConnectorOptions, Method as AcquireMethod};
use serde_json::json;
use tempfile::TempDir;

const PAGE_SIZE: usize = 3;

fn page_records(page: usize) -> serde_json::Value {
    let records: Vec<_> = (0..PAGE_SIZE)
        .map(|i| json!({"psn": format!("{}{:02}", page, i), "page": page}))
        .collect();
    json!(records)
}

fn mock_pages(server: &MockServer) -> Vec<httpmock::Mock<'_>> {
    (1..=13)
        .map(|page| {
            server.mock(move |when, then| {
                when.method(GET)
                    .path("/api/patients")
                    .query_param("page", page.to_string().as_str())
                    .header("authorization", "bearer tok-123");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(page_records(page));
            })
        })
        .collect()
}

#[tokio::test]
async fn test_reads_all_thirteen_pages_in_order() -> Result<()> {
    let server = MockServer::start();
    let auth_mock = server.mock(|when, then| {
        when.method(POST).path("/oauth/ro");
        then.status(200).json_body(json!({"id_token": "tok-123"}));
    });
    let page_mocks = mock_pages(&server);

    let config = api_config(&server.url("/api/patients"));
    let connector = Connector::new(ConnectorOptions::new("api").quiet(true))
        .with_auth_endpoint(server.url("/oauth/ro"));

    let matchbox = connector
        .acquire(&config)
        .await?
        .loaded()
        .expect("API run should load");

    auth_mock.assert_hits(1);
    for mock in &page_mocks {
        mock.assert_hits(1);
    }

    let data = matchbox.api_data();
    assert_eq!(data.len(), 13 * PAGE_SIZE);
    assert_eq!(data.get(0).unwrap()["page"], 1);
    assert_eq!(data.get(13 * PAGE_SIZE - 1).unwrap()["page"], 13);
    assert_eq!(matchbox.method(), AcquireMethod::Api);
    assert_eq!(matchbox.token().unwrap().as_str(), "tok-123");
    assert!(matchbox.raw_dump().is_none());
    Ok(())
}

#[tokio::test]
async fn test_repeated_runs_give_identical_datasets() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/oauth/ro");
        then.status(200).json_body(json!({"id_token": "tok-123"}));
    });
    let _pages = mock_pages(&server);

    let config = api_config(&server.url("/api/patients"));
    let connector = Connector::new(ConnectorOptions::new("api").quiet(true))
        .with_auth_endpoint(server.url("/oauth/ro"));

    let first = connector.acquire(&config).await?.loaded().unwrap().into_dataset();
    let second = connector.acquire(&config).await?.loaded().unwrap().into_dataset();

    assert_eq!(first.len(), 13 * PAGE_SIZE);
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn test_caller_params_sent_on_every_page() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/oauth/ro");
        then.status(200).json_body(json!({"id_token": "tok-123"}));
    });
    let page_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/patients")
            .query_param("is_oa", "true")
            .query_param_exists("page");
        then.status(200).json_body(json!([{"psn": "10012"}]));
    });

    let config = api_config(&server.url("/api/patients"));
    let connector = Connector::new(ConnectorOptions::new("api").param("is_oa", "true").quiet(true))
        .with_auth_endpoint(server.url("/oauth/ro"));

    let outcome = connector.acquire(&config).await?;

    page_mock.assert_hits(13);
    assert_eq!(outcome.loaded().unwrap().api_data().len(), 13);
    Ok(())
}

#[tokio::test]
async fn test_token_obtained_after_three_failures() -> Result<()> {
    let identity = FlakyTokenEndpoint::start(3, "tok-123").await;
    let server = MockServer::start();
    let _pages = mock_pages(&server);

    let config = api_config(&server.url("/api/patients"));
    let connector =
        Connector::new(ConnectorOptions::new("api").quiet(true)).with_auth_endpoint(&identity.url);

    let outcome = connector.acquire(&config).await?;

    assert_eq!(identity.hits(), 4);
    let matchbox = outcome.loaded().expect("fourth token attempt succeeds");
    assert_eq!(matchbox.api_data().len(), 13 * PAGE_SIZE);
    Ok(())
}

#[tokio::test]
async fn test_login_gives_up_after_four_attempts() -> Result<()> {
    let server = MockServer::start();
    let auth_mock = server.mock(|when, then| {
        when.method(POST).path("/oauth/ro");
        then.status(401).json_body(json!({"error": "invalid_user_password"}));
    });
    let page_mock = server.mock(|when, then| {
        when.method(GET).path("/api/patients");
        then.status(200).json_body(json!([]));
    });

    let config = api_config(&server.url("/api/patients"));
    let connector = Connector::new(ConnectorOptions::new("api"))
        .with_auth_endpoint(server.url("/oauth/ro"));

    let outcome = connector.acquire(&config).await?;

    auth_mock.assert_hits(4);
    page_mock.assert_hits(0);
    assert!(outcome.is_fatal());
    assert!(outcome.reason().unwrap().contains("4 attempts"));
    Ok(())
}

#[tokio::test]
async fn test_failed_page_stops_the_run() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/oauth/ro");
        then.status(200).json_body(json!({"id_token": "tok-123"}));
    });
    let page_one = server.mock(|when, then| {
        when.method(GET).path("/api/patients").query_param("page", "1");
        then.status(200).json_body(page_records(1));
    });
    let page_two = server.mock(|when, then| {
        when.method(GET).path("/api/patients").query_param("page", "2");
        then.status(503);
    });

    let dir = TempDir::new()?;
    let config = api_config(&server.url("/api/patients"));
    let connector = Connector::new(
        ConnectorOptions::new("api")
            .make_raw("mb")
            .output_dir(dir.path()),
    )
    .with_auth_endpoint(server.url("/oauth/ro"));

    let outcome = connector.acquire(&config).await?;

    page_one.assert_hits(1);
    page_two.assert_hits(1);
    assert!(outcome.is_fatal());
    assert!(outcome.reason().unwrap().contains("Page 2"));
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_raw_dump_written_with_dated_name() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/oauth/ro");
        then.status(200).json_body(json!({"id_token": "tok-123"}));
    });
    let _pages = mock_pages(&server);

    let dir = TempDir::new()?;
    let config = api_config(&server.url("/api/patients"));
    let connector = Connector::new(
        ConnectorOptions::new("api")
            .make_raw("mb")
            .quiet(true)
            .output_dir(dir.path()),
    )
    .with_auth_endpoint(server.url("/oauth/ro"))
    .with_date(NaiveDate::from_ymd_opt(2018, 3, 7).unwrap());

    let matchbox = connector.acquire(&config).await?.loaded().unwrap();

    let expected = dir.path().join("raw_mb_dump_030718.json");
    assert_eq!(matchbox.raw_dump(), Some(expected.as_path()));
    assert_eq!(matchbox.today(), "030718");

    let on_disk = read_json(&expected)?;
    assert_eq!(on_disk.as_array().unwrap().len(), 13 * PAGE_SIZE);
    assert_eq!(on_disk, serde_json::to_value(matchbox.api_data())?);

    let text = std::fs::read_to_string(&expected)?;
    assert!(text.starts_with("[\n    {\n        \"page\": 1,\n        \"psn\""));
    Ok(())
}

#[tokio::test]
async fn test_raw_dump_with_explicit_file_name() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/oauth/ro");
        then.status(200).json_body(json!({"id_token": "tok-123"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/patients");
        then.status(200).json_body(json!([{"psn": "10012"}]));
    });

    let dir = TempDir::new()?;
    let config = api_config(&server.url("/api/patients"));
    let connector = Connector::new(
        ConnectorOptions::new("api")
            .make_raw("mb_snapshot.json")
            .quiet(true)
            .output_dir(dir.path()),
    )
    .with_auth_endpoint(server.url("/oauth/ro"));

    let matchbox = connector.acquire(&config).await?.loaded().unwrap();

    let expected = dir.path().join("mb_snapshot.json");
    assert!(expected.exists());
    assert_eq!(matchbox.raw_dump(), Some(expected.as_path()));
    assert_eq!(matchbox.api_data().len(), 13);
    Ok(())
}

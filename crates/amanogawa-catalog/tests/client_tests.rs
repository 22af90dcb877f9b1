// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog client tests against a wiremock server.

use amanogawa_catalog::CatalogClient;
use amanogawa_config::model::CatalogConfig;
use amanogawa_core::AmanogawaError;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> CatalogClient {
    CatalogClient::new(&CatalogConfig {
        base_url: format!("{}/", server.uri()),
        ..CatalogConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn catalog_page_is_fetched_once_then_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/titles"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pages": 5,
            "data": [{"id": 11, "name": "Перший"}, {"id": 12, "name": "Другий", "is_movie": true}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let page = client.catalog_page(2).await.unwrap();
    assert_eq!(page.pages, 5);
    assert_eq!(page.data.len(), 2);
    assert!(page.data[1].is_movie);

    let again = client.catalog_page(2).await.unwrap();
    assert_eq!(again.data[0].id, 11);
}

#[tokio::test]
async fn all_titles_aggregates_every_page() {
    let server = MockServer::start().await;
    for (page, id) in [("1", 1), ("2", 2), ("3", 3)] {
        Mock::given(method("GET"))
            .and(path("/api/titles"))
            .and(query_param("page", page))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pages": 3,
                "data": [{"id": id}]
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client_for(&server);
    let titles = client.all_titles().await.unwrap();
    assert_eq!(titles.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3]);

    client.all_titles().await.unwrap();
}

#[tokio::test]
async fn title_uses_singular_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/title/133"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 133,
            "name": "Провідник",
            "torrent_url": "https://toloka.to/t1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let title = client.title(133).await.unwrap();
    assert_eq!(title.display_name(), "Провідник");
    assert_eq!(title.torrent_url.as_deref(), Some("https://toloka.to/t1"));
    client.title(133).await.unwrap();
}

#[tokio::test]
async fn episodes_are_aggregated_and_sorted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/episodes/7"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pages": 2,
            "data": [{"number": 3, "bot_id": 303}, {"number": 1, "bot_id": 101}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/episodes/7"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pages": 2,
            "data": [{"number": "2", "bot_id": "202"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let episodes = client.episodes(7).await.unwrap();
    assert_eq!(
        episodes.iter().map(|e| (e.number, e.bot_id)).collect::<Vec<_>>(),
        vec![(1, Some(101)), (2, Some(202)), (3, Some(303))]
    );
}

#[tokio::test]
async fn error_status_is_a_catalog_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/title/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.title(404).await.unwrap_err();
    assert!(matches!(err, AmanogawaError::Catalog { .. }), "got {err:?}");
}

#[tokio::test]
async fn malformed_body_is_a_catalog_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/titles"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.catalog_page(1).await.unwrap_err();
    assert!(err.to_string().contains("decoding"));
}

#[tokio::test]
async fn failed_requests_are_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/title/9"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/title/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.title(9).await.is_err());
    assert_eq!(client.title(9).await.unwrap().id, 9);
}

//! Migration from a SQLite local store into a mocked Supabase project.

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use woorden_common::NewWord;
use woorden_config::SupabaseConfig;
use woorden_db::{LocalStore, SqliteLocalStore};
use woorden_remote::SupabaseClient;
use woorden_sync::migrate_local_to_remote;

fn client_for(server: &MockServer) -> SupabaseClient {
    SupabaseClient::new(&SupabaseConfig {
        url: server.uri(),
        anon_key: "anon-key".to_string(),
        request_timeout_secs: 5,
    })
    .expect("client")
}

#[tokio::test]
async fn rejected_words_still_report_collection_and_clear_local() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/collections"))
        .and(body_json(json!([{"name": "Animals", "user_id": "user-1"}])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": 7, "name": "Animals", "user_id": "user-1", "created_at": "2024-05-01T10:00:00+00:00"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/words"))
        .and(body_json(json!([
            {"collection_id": 7, "dutch": "hond", "translation": "dog"},
            {"collection_id": 7, "dutch": "kat", "translation": "cat"}
        ])))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .expect(1)
        .mount(&server)
        .await;

    let local = SqliteLocalStore::in_memory().unwrap();
    let id = local.add_collection("Animals").await.unwrap().id;
    local
        .add_words(
            id,
            &[NewWord::new("hond", "dog"), NewWord::new("kat", "cat")],
        )
        .await
        .unwrap();

    let remote = client_for(&server);
    let report = migrate_local_to_remote(&local, &remote, "user-1")
        .await
        .unwrap();

    assert_eq!(report.collections.len(), 1);
    assert_eq!(report.collections[0].id, 7);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].error.contains("boom"));
    assert!(local.list_collections_with_words().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_backend_still_clears_local() {
    // Nothing is mounted, so every insert gets a 404.
    let server = MockServer::start().await;

    let local = SqliteLocalStore::in_memory().unwrap();
    local.add_collection("Animals").await.unwrap();
    local.add_collection("Fruit").await.unwrap();

    let remote = client_for(&server);
    let report = migrate_local_to_remote(&local, &remote, "user-1")
        .await
        .unwrap();

    assert!(report.collections.is_empty());
    assert_eq!(report.failures.len(), 2);
    assert!(local.is_empty().await.unwrap());
}

#[tokio::test]
async fn timestamp_without_offset_does_not_block_words() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/collections"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": 7, "name": "Animals", "created_at": "2024-05-01T10:00:00.123456"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/words"))
        .and(body_json(json!([
            {"collection_id": 7, "dutch": "hond", "translation": "dog"}
        ])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": 1, "collection_id": 7, "dutch": "hond", "translation": "dog"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let local = SqliteLocalStore::in_memory().unwrap();
    let id = local.add_collection("Animals").await.unwrap().id;
    local
        .add_words(id, &[NewWord::new("hond", "dog")])
        .await
        .unwrap();

    let remote = client_for(&server);
    let report = migrate_local_to_remote(&local, &remote, "user-1")
        .await
        .unwrap();

    assert!(report.is_complete(), "{:?}", report.failures);
    assert_eq!(report.collections[0].id, 7);
    assert!(report.collections[0].created_at.is_some());
    assert!(local.is_empty().await.unwrap());
}

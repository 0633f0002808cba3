//! End-to-end tests against a mock API server.

use std::process::Output;

use assert_cmd::Command;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Run the binary against `server` on a blocking thread.
#[allow(deprecated)]
async fn run(server: &MockServer, args: &[&str]) -> Output {
    let home = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("xrefcache").expect("Failed to find xrefcache binary");
    cmd.env("HOME", home.path())
        .env_remove("XREFCACHE_CONFIG")
        .env_remove("XREFCACHE_API_KEY")
        .env("XREFCACHE_API_URL", server.uri())
        .current_dir(home.path())
        .args(args);

    tokio::task::spawn_blocking(move || {
        let output = cmd.output().expect("Failed to run xrefcache");
        drop(home);
        output
    })
    .await
    .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn person(id: &str, name: &str) -> serde_json::Value {
    json!({"id": id, "schema": "Person", "properties": {"name": [name]}})
}

#[tokio::test]
async fn test_entity_text_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/entities/e1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(person("e1", "Jane Doe")))
        .expect(1)
        .mount(&server)
        .await;

    let output = run(&server, &["entity", "e1"]).await;

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Jane Doe (Person)"), "{out}");
    assert!(out.contains("id: e1"), "{out}");
}

#[tokio::test]
async fn test_entity_not_found_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/entities/gone"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"status": "error", "message": "No such entity"})),
        )
        .mount(&server)
        .await;

    let output = run(&server, &["entity", "gone"]).await;

    assert!(!output.status.success());
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("Failed to load entity 'gone'"), "{err}");
    assert!(err.contains("No such entity"), "{err}");
}

#[tokio::test]
async fn test_index_lists_counterparts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1/collections/12/xref"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "results": [{"collection": {"id": 31, "label": "Offshore leaks"}, "matches": 7}]
        })))
        .mount(&server)
        .await;

    let output = run(&server, &["index", "12"]).await;

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Offshore leaks (31)"), "{out}");
    assert!(out.contains('7'), "{out}");
}

#[tokio::test]
async fn test_xref_follows_pages() {
    let server = MockServer::start().await;
    let next = format!("{}/api/1/collections/12/xref/31?limit=50&offset=1", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/1/collections/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 12, "label": "Registry"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/1/collections/31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 31, "label": "Leaks"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/1/collections/12/xref"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "results": [{"collection": {"id": 31, "label": "Leaks"}, "matches": 2}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/1/collections/12/xref/31"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "results": [{"id": 2, "score": 0.5, "entity": person("a2", "Bob Roe"), "match": person("b2", "B. Roe")}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/1/collections/12/xref/31"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "next": next,
            "results": [{"id": 1, "score": 0.9, "entity": person("a1", "Jane Doe"), "match": person("b1", "J. Doe")}]
        })))
        .mount(&server)
        .await;

    let output = run(&server, &["xref", "12", "31", "--pages", "3"]).await;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let out = stdout(&output);
    assert!(out.contains("Registry vs Leaks: 2 of 2 matches"), "{out}");
    let first = out.find("Jane Doe").expect("first match");
    let second = out.find("Bob Roe").expect("second match");
    assert!(first < second);
    assert!(out.contains("J. Doe"), "{out}");
    assert!(!out.contains("More matches available"), "{out}");
}

mod common;

use common::{browser, spawn_app, TestApp};
use serde_json::{json, Value};

async fn logged_in(app: &TestApp, email: &str, username: &str) -> reqwest::Client {
    let client = browser();
    app.register(&client, email, username).await;
    assert_eq!(200, app.login(&client, email).await.status().as_u16());
    client
}

async fn create_task(app: &TestApp, client: &reqwest::Client, body: Value) -> Value {
    let response = client
        .post(&app.url("/tasks"))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(201, response.status().as_u16());
    response.json().await.expect("Failed to parse response")
}

#[tokio::test]
async fn tasks_require_authentication() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let list = client
        .get(&app.url("/tasks"))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, list.status().as_u16());

    let create = client
        .post(&app.url("/tasks"))
        .json(&json!({ "title": "Write report" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, create.status().as_u16());
}

#[tokio::test]
async fn create_and_fetch_a_task() {
    let app = spawn_app().await;
    let client = logged_in(&app, "john@example.com", "john").await;

    let task = create_task(
        &app,
        &client,
        json!({ "title": "  Write report  ", "description": "Quarterly", "priority": "HIGH" }),
    )
    .await;
    assert_eq!(task["title"], "Write report");
    assert_eq!(task["priority"], "HIGH");
    assert_eq!(task["completed"], false);

    let response = client
        .get(&app.url(&format!("/tasks/{}", task["id"].as_str().unwrap())))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
    let fetched: Value = response.json().await.unwrap();
    assert_eq!(fetched, task);
}

#[tokio::test]
async fn create_task_returns_400_for_invalid_input() {
    let app = spawn_app().await;
    let client = logged_in(&app, "john@example.com", "john").await;

    let test_cases = vec![
        (json!({ "title": "   " }), "blank title"),
        (json!({ "title": "x".repeat(256) }), "title too long"),
        (json!({ "title": "ok", "priority": "URGENT" }), "unknown priority"),
    ];

    for (body, description) in test_cases {
        let response = client
            .post(&app.url("/tasks"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request for {}.",
            description
        );
    }
}

#[tokio::test]
async fn update_and_delete_a_task() {
    let app = spawn_app().await;
    let client = logged_in(&app, "john@example.com", "john").await;
    let task = create_task(&app, &client, json!({ "title": "Write report" })).await;
    let url = app.url(&format!("/tasks/{}", task["id"].as_str().unwrap()));

    let response = client
        .patch(&url)
        .json(&json!({ "completed": true }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["completed"], true);
    assert_eq!(updated["title"], "Write report");

    let deleted = client.delete(&url).send().await.expect("Failed to execute request.");
    assert_eq!(204, deleted.status().as_u16());

    let gone = client.get(&url).send().await.expect("Failed to execute request.");
    assert_eq!(404, gone.status().as_u16());
    let body: Value = gone.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn list_filters_by_completion_and_search() {
    let app = spawn_app().await;
    let client = logged_in(&app, "john@example.com", "john").await;

    create_task(&app, &client, json!({ "title": "Write report" })).await;
    create_task(&app, &client, json!({ "title": "Review report", "priority": "LOW" })).await;
    let done = create_task(&app, &client, json!({ "title": "Buy milk" })).await;
    client
        .patch(&app.url(&format!("/tasks/{}", done["id"].as_str().unwrap())))
        .json(&json!({ "completed": true }))
        .send()
        .await
        .expect("Failed to execute request.");

    let list = |query: &'static str| {
        let client = client.clone();
        let url = app.url(&format!("/tasks{}", query));
        async move {
            let response = client.get(&url).send().await.expect("Failed to execute request.");
            assert_eq!(200, response.status().as_u16(), "{}", query);
            response.json::<Vec<Value>>().await.unwrap()
        }
    };

    assert_eq!(list("").await.len(), 3);
    assert_eq!(list("?completed=true").await.len(), 1);
    assert_eq!(list("?search=REPORT").await.len(), 2);
    assert_eq!(list("?priority=LOW").await.len(), 1);
    assert_eq!(list("?limit=2").await.len(), 2);

    let over_limit = client
        .get(&app.url("/tasks?limit=500"))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(400, over_limit.status().as_u16());
}

#[tokio::test]
async fn tasks_are_isolated_between_accounts() {
    let app = spawn_app().await;
    let alice = logged_in(&app, "alice@example.com", "alice").await;
    let bob = logged_in(&app, "bob@example.com", "bob").await;

    let task = create_task(&app, &alice, json!({ "title": "Alice's task" })).await;
    let url = app.url(&format!("/tasks/{}", task["id"].as_str().unwrap()));

    let bob_list: Vec<Value> = bob
        .get(&app.url("/tasks"))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();
    assert!(bob_list.is_empty());

    let read = bob.get(&url).send().await.expect("Failed to execute request.");
    assert_eq!(404, read.status().as_u16());

    let update = bob
        .patch(&url)
        .json(&json!({ "title": "hijacked" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(404, update.status().as_u16());

    let delete = bob.delete(&url).send().await.expect("Failed to execute request.");
    assert_eq!(404, delete.status().as_u16());

    let still_there = alice.get(&url).send().await.expect("Failed to execute request.");
    assert_eq!(200, still_there.status().as_u16());
    let still_there: Value = still_there.json().await.unwrap();
    assert_eq!(still_there["title"], "Alice's task");
}

#[tokio::test]
async fn malformed_path_and_query_return_json_400() {
    let app = spawn_app().await;
    let client = logged_in(&app, "john@example.com", "john").await;

    let test_cases = vec![
        ("/tasks/not-a-uuid", "path id"),
        ("/tasks?completed=maybe", "boolean filter"),
        ("/tasks?limit=lots", "numeric limit"),
    ];

    for (path, description) in test_cases {
        let response = client
            .get(&app.url(path))
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(400, response.status().as_u16(), "{}", description);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["code"], "VALIDATION_ERROR", "{}", description);
    }
}

#[tokio::test]
async fn account_lookup_by_id() {
    let app = spawn_app().await;
    let alice = logged_in(&app, "alice@example.com", "alice").await;
    let bob = app
        .register(&reqwest::Client::new(), "bob@example.com", "bob")
        .await;
    let bob_url = app.url(&format!("/users/{}", bob["id"].as_str().unwrap()));

    let anonymous = reqwest::Client::new()
        .get(&bob_url)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, anonymous.status().as_u16());

    let found = alice.get(&bob_url).send().await.expect("Failed to execute request.");
    assert_eq!(200, found.status().as_u16());
    let found: Value = found.json().await.unwrap();
    assert_eq!(found, bob);

    let missing = alice
        .get(&app.url(&format!("/users/{}", uuid::Uuid::new_v4())))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(404, missing.status().as_u16());

    let malformed = alice
        .get(&app.url("/users/not-a-uuid"))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(400, malformed.status().as_u16());
}

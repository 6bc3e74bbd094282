mod common;

use axum::{
    http::{Method, StatusCode},
    Router,
};
use serde_json::Value;

use calculator_backend::AppState;

use crate::common::{create_test_app, create_test_user, execute, login, operation_id, send};

fn ids(body: &Value) -> Vec<i64> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["id"].as_i64().unwrap())
        .collect()
}

fn types(body: &Value, key: &str) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry[key].as_str().unwrap().to_string())
        .collect()
}

async fn get(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Some(token), None).await
}

/// alice: three additions, a division and a random string; bob: one addition
async fn seed_records(app: &Router, state: &AppState) -> String {
    create_test_user(&state.db, "alice@example.com", 5.0).await;
    create_test_user(&state.db, "bob@example.com", 5.0).await;
    let alice = login(app, "alice@example.com").await;
    let bob = login(app, "bob@example.com").await;

    let addition = operation_id(&state.db, "addition").await;
    let division = operation_id(&state.db, "division").await;
    let random_string = operation_id(&state.db, "random_string").await;

    for a in 1..=3 {
        let variables = format!(r#"{{"A": {}, "B": 10}}"#, a);
        let (status, _) = execute(app, &alice, addition, &variables).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = execute(app, &alice, division, r#"{"A": 9, "B": 3}"#).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = execute(app, &alice, random_string, "{}").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = execute(app, &bob, addition, r#"{"A": 1, "B": 1}"#).await;
    assert_eq!(status, StatusCode::OK);

    alice
}

#[tokio::test]
async fn test_operations_catalog_is_seeded() {
    let (app, state) = create_test_app().await;
    create_test_user(&state.db, "alice@example.com", 5.0).await;
    let token = login(&app, "alice@example.com").await;

    let (status, body) = get(&app, "/operations?order=id", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        types(&body, "type"),
        vec!["addition", "subtraction", "division", "square_root", "random_string"]
    );
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["page"], 1);
    assert_eq!(body["size"], 10);
    assert_eq!(body["data"][0]["fields"]["A"]["type"], "number");
    assert_eq!(body["data"][4]["fields"], serde_json::json!({}));
}

#[tokio::test]
async fn test_operations_filter_and_order() {
    let (app, state) = create_test_app().await;
    create_test_user(&state.db, "alice@example.com", 5.0).await;
    let token = login(&app, "alice@example.com").await;

    let (status, body) = get(&app, "/operations?filter=cost__gt:0.15&order=-cost", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        types(&body, "type"),
        vec!["random_string", "square_root", "division"]
    );
    assert_eq!(body["filter"], "cost__gt:0.15");
    assert_eq!(body["order"], "-cost");

    let (_, body) = get(&app, "/operations?filter=type:division", &token).await;
    assert_eq!(types(&body, "type"), vec!["division"]);

    let (_, body) = get(&app, "/operations?filter=cost:0.1&order=-id", &token).await;
    assert_eq!(types(&body, "type"), vec!["subtraction", "addition"]);

    // Keys outside the allow-list are dropped silently
    let (status, body) = get(&app, "/operations?filter=fields:x,bogus:1&order=bogus", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_malformed_filters_are_bad_requests() {
    let (app, state) = create_test_app().await;
    create_test_user(&state.db, "alice@example.com", 5.0).await;
    let token = login(&app, "alice@example.com").await;

    for uri in [
        "/operations?filter=cost",
        "/operations?filter=cost:1:2",
        "/operations?filter=cost__gt:cheap",
        "/records?filter=amount:abc",
        "/records?filter=deleted:maybe",
    ] {
        let (status, body) = get(&app, uri, &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn test_operations_pagination() {
    let (app, state) = create_test_app().await;
    create_test_user(&state.db, "alice@example.com", 5.0).await;
    let token = login(&app, "alice@example.com").await;

    let (_, body) = get(&app, "/operations?order=id&size=2&page=3", &token).await;
    assert_eq!(types(&body, "type"), vec!["random_string"]);
    assert_eq!(body["total_pages"], 3);
    assert_eq!(body["page"], 3);
    assert_eq!(body["size"], 2);

    let (status, body) = get(&app, "/operations?page=9", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["total_pages"], 1);

    let (_, body) = get(&app, "/operations?page=abc&size=-1", &token).await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["size"], 10);

    let (status, body) = get(&app, "/operations?page=999999999999999999&size=100", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["page"], 999_999_999_999_999_999u64);
    assert_eq!(body["total_pages"], 1);

    let (status, body) = get(&app, "/records?page=18446744073709551615", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unparseable_query_strings_use_the_error_envelope() {
    let (app, state) = create_test_app().await;
    create_test_user(&state.db, "alice@example.com", 5.0).await;
    let token = login(&app, "alice@example.com").await;

    for uri in ["/operations?page=1&page=2", "/records?filter=a&filter=b"] {
        let (status, body) = get(&app, uri, &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["status"], 400);
        assert_eq!(body["success"], false);
        assert_eq!(
            body["user_message"],
            "Invalid payload, please check the API doc and try again"
        );
    }
}

#[tokio::test]
async fn test_records_are_scoped_and_newest_first() {
    let (app, state) = create_test_app().await;
    let token = seed_records(&app, &state).await;

    let (status, body) = get(&app, "/records", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        types(&body, "operation_type"),
        vec!["random_string", "division", "addition", "addition", "addition"]
    );
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["user_balance"], 4.0);
    assert_eq!(body["data"][0]["operation_response"], "qwertyuiop");
    assert_eq!(body["data"][1]["operation_response"], "3");
}

#[tokio::test]
async fn test_records_filters() {
    let (app, state) = create_test_app().await;
    let token = seed_records(&app, &state).await;

    let (_, body) = get(&app, "/records?filter=operation__type:addition", &token).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (_, body) = get(&app, "/records?filter=amount__gt:0.15&order=amount", &token).await;
    assert_eq!(types(&body, "operation_type"), vec!["division", "random_string"]);

    let (_, body) = get(&app, "/records?filter=operation_response:12", &token).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = get(
        &app,
        "/records?filter=operation_response__contains:qwer",
        &token,
    )
    .await;
    assert_eq!(types(&body, "operation_type"), vec!["random_string"]);

    let (_, body) = get(
        &app,
        "/records?filter=user_balance__lt:4.5,operation__type:addition",
        &token,
    )
    .await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_records_search_is_case_insensitive() {
    let (app, state) = create_test_app().await;
    let token = seed_records(&app, &state).await;

    let (_, body) = get(&app, "/records?search=QWERTY", &token).await;
    assert_eq!(types(&body, "operation_type"), vec!["random_string"]);
    assert_eq!(body["search"], "QWERTY");

    let (_, body) = get(&app, "/records?search=Division", &token).await;
    assert_eq!(types(&body, "operation_type"), vec!["division"]);

    let (_, body) = get(&app, "/records?search=alice", &token).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);

    // Other users' rows never leak through search
    let (_, body) = get(&app, "/records?search=bob", &token).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    // Wildcards are literal
    let (_, body) = get(&app, "/records?search=%25", &token).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_records_order_and_pagination() {
    let (app, state) = create_test_app().await;
    let token = seed_records(&app, &state).await;

    let (_, body) = get(&app, "/records?order=user_balance", &token).await;
    let balances: Vec<f64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["user_balance"].as_f64().unwrap())
        .collect();
    assert_eq!(balances, vec![4.0, 4.5, 4.7, 4.8, 4.9]);

    let (_, all) = get(&app, "/records?order=id", &token).await;
    let all_ids = ids(&all);

    let (_, first) = get(&app, "/records?order=id&size=2&page=1", &token).await;
    let (_, last) = get(&app, "/records?order=id&size=2&page=3", &token).await;
    assert_eq!(first["total_pages"], 3);
    assert_eq!(ids(&first), all_ids[..2].to_vec());
    assert_eq!(ids(&last), all_ids[4..].to_vec());
}

#[tokio::test]
async fn test_deleted_records_stay_listed_and_filterable() {
    let (app, state) = create_test_app().await;
    let token = seed_records(&app, &state).await;

    let (_, body) = get(&app, "/records?order=id", &token).await;
    let first_id = ids(&body)[0];
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/record/delete?id={}", first_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get(&app, "/records", &token).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);

    let (_, body) = get(&app, "/records?filter=deleted:true", &token).await;
    assert_eq!(ids(&body), vec![first_id]);

    let (_, body) = get(&app, "/records?filter=deleted:false", &token).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
    assert_eq!(body["user_balance"], 4.0);
}

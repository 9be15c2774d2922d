use chrono::DateTime;
use rocket::{
    error::ErrorKind,
    figment::Figment,
    http::{ContentType, Header, Status},
    local::asynchronous::{Client, LocalResponse},
    serde::json::Value,
};

use crate::{
    api::problem::problem_json,
    score::{ScoreEntry, ScoreSubmission},
};

const TEST_ORIGIN: &str = "http://localhost:3000";

fn test_figment() -> Figment {
    rocket::Config::figment()
        .merge(("cors_allowed_origin", TEST_ORIGIN))
        .merge(("cors_max_age", 3600))
}

async fn spawn_client() -> Client {
    Client::tracked(super::build(test_figment()))
        .await
        .expect("valid rocket instance")
}

async fn spawn_sql_client() -> Client {
    let figment = test_figment().merge(("database_url", "sqlite::memory:"));
    Client::tracked(super::build(figment))
        .await
        .expect("valid rocket instance")
}

async fn deserialize_response<'a, T: rocket::serde::DeserializeOwned>(
    response: LocalResponse<'a>,
) -> rocket::serde::json::serde_json::Result<T> {
    let string = response.into_string().await.unwrap();
    rocket::serde::json::serde_json::from_str(&string)
}

/// Submits a score and returns the stored entry.
async fn add_score<'a>(
    client: &'a Client,
    submission: &ScoreSubmission,
) -> Result<ScoreEntry, LocalResponse<'a>> {
    let response = client.post("/api/scores").json(submission).dispatch().await;
    if response.status() != Status::Created {
        return Err(response);
    }
    assert_eq!(response.content_type(), Some(ContentType::JSON));

    Ok(deserialize_response::<ScoreEntry>(response).await.unwrap())
}

/// Fetches the current leaderboard.
async fn get_top(client: &Client) -> Vec<ScoreEntry> {
    let response = client.get("/api/scores/top").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    deserialize_response::<Vec<ScoreEntry>>(response).await.unwrap()
}

/// Asserts a problem body and returns it.
async fn expect_problem(response: LocalResponse<'_>, status: Status) -> Value {
    assert_eq!(response.status(), status);
    assert_eq!(response.content_type(), Some(problem_json()));
    deserialize_response::<Value>(response).await.unwrap()
}

#[rocket::async_test]
async fn post_valid_score_returns_created_entry() {
    let client = spawn_client().await;

    let response = client
        .post("/api/scores")
        .json(&ScoreSubmission::new("Alice", 123))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);

    let body = deserialize_response::<Value>(response).await.unwrap();
    assert!(body["id"].is_number());
    assert_eq!(body["playerName"], "Alice");
    assert_eq!(body["points"], 123);
    let created_at = body["createdAt"].as_str().unwrap();
    assert!(DateTime::parse_from_rfc3339(created_at).is_ok());

    let top = get_top(&client).await;
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].player_name, "Alice");
}

#[rocket::async_test]
async fn negative_points_are_rejected() {
    let client = spawn_client().await;

    let response = add_score(&client, &ScoreSubmission::new("Bob", -5)).await;
    let body = expect_problem(response.unwrap_err(), Status::BadRequest).await;

    assert_eq!(body["title"], "Bad Request");
    assert_eq!(body["detail"], "Validation failed");
    assert_eq!(body["instance"], "/api/scores");
    assert_eq!(body["errors"]["points"], "points must be >= 0");
    assert!(body["errors"].get("playerName").is_none());
    assert!(get_top(&client).await.is_empty());
}

#[rocket::async_test]
async fn excessive_points_are_rejected() {
    let client = spawn_client().await;

    let response = add_score(&client, &ScoreSubmission::new("Carol", 1_000_000_001)).await;
    let body = expect_problem(response.unwrap_err(), Status::BadRequest).await;

    assert!(body["errors"]["points"].is_string());
    assert!(get_top(&client).await.is_empty());
}

#[rocket::async_test]
async fn points_beyond_any_integer_width_are_rejected() {
    let client = spawn_client().await;

    for (points, message) in [
        ("100000000000000000000", "points must be <= 1000000000"),
        ("-100000000000000000000", "points must be >= 0"),
    ] {
        let response = client
            .post("/api/scores")
            .header(ContentType::JSON)
            .body(format!(r#"{{"playerName":"Eve","points":{}}}"#, points))
            .dispatch()
            .await;
        let body = expect_problem(response, Status::BadRequest).await;
        assert_eq!(body["detail"], "Validation failed");
        assert_eq!(body["errors"]["points"], message);
    }
    assert!(get_top(&client).await.is_empty());
}

#[rocket::async_test]
async fn blank_name_is_rejected() {
    let client = spawn_client().await;

    let response = add_score(&client, &ScoreSubmission::new("   ", 10)).await;
    let body = expect_problem(response.unwrap_err(), Status::BadRequest).await;

    assert_eq!(body["errors"]["playerName"], "playerName is required");
    assert!(get_top(&client).await.is_empty());
}

#[rocket::async_test]
async fn all_field_errors_are_reported_together() {
    let client = spawn_client().await;

    let response = client
        .post("/api/scores")
        .header(ContentType::JSON)
        .body(r#"{ "playerName": "" }"#)
        .dispatch()
        .await;
    let body = expect_problem(response, Status::BadRequest).await;

    assert_eq!(body["errors"]["playerName"], "playerName is required");
    assert_eq!(body["errors"]["points"], "points is required");
}

#[rocket::async_test]
async fn surrounding_whitespace_is_trimmed() {
    let client = spawn_client().await;

    let entry = add_score(&client, &ScoreSubmission::new("  Dave  ", 42))
        .await
        .unwrap();
    assert_eq!(entry.player_name, "Dave");
    assert_eq!(entry.points, 42);
}

#[rocket::async_test]
async fn malformed_bodies_get_problem_responses() {
    let client = spawn_client().await;

    let response = client
        .post("/api/scores")
        .header(ContentType::JSON)
        .body("{ not json")
        .dispatch()
        .await;
    let status = response.status();
    assert!(status == Status::BadRequest || status == Status::UnprocessableEntity);
    let body = expect_problem(response, status).await;
    assert_eq!(body["detail"], "Request body is malformed");
    assert!(get_top(&client).await.is_empty());
}

#[rocket::async_test]
async fn unknown_routes_get_problem_responses() {
    let client = spawn_client().await;

    let response = client.get("/api/nothing").dispatch().await;
    let body = expect_problem(response, Status::NotFound).await;
    assert_eq!(body["instance"], "/api/nothing");
}

#[rocket::async_test]
async fn top_scores_are_sorted_and_limited() {
    let client = spawn_client().await;

    for i in 1..=12 {
        let submission = ScoreSubmission::new(format!("Player{}", i), i * 10);
        add_score(&client, &submission).await.unwrap();
    }

    let top = get_top(&client).await;
    assert_eq!(top.len(), 10);
    assert_eq!(top[0].points, 120);
    assert_eq!(top[0].player_name, "Player12");
    assert_eq!(top[9].points, 30);
    assert_eq!(top[9].player_name, "Player3");

    // Reading again without writes gives the same answer
    assert_eq!(get_top(&client).await, top);
}

#[rocket::async_test]
async fn ties_prefer_the_newest_entry() {
    let client = spawn_client().await;

    let older = add_score(&client, &ScoreSubmission::new("Older", 500))
        .await
        .unwrap();
    let newer = add_score(&client, &ScoreSubmission::new("Newer", 500))
        .await
        .unwrap();
    assert!(newer.id > older.id);

    let top = get_top(&client).await;
    assert_eq!(top, vec![newer, older]);
}

#[rocket::async_test]
async fn sql_store_serves_the_same_contract() {
    let client = spawn_sql_client().await;

    for i in 1..=12 {
        let submission = ScoreSubmission::new(format!("Player{}", i), i * 10);
        add_score(&client, &submission).await.unwrap();
    }
    let rejected = add_score(&client, &ScoreSubmission::new("Bob", -5)).await;
    expect_problem(rejected.unwrap_err(), Status::BadRequest).await;

    let top = get_top(&client).await;
    assert_eq!(top.len(), 10);
    assert_eq!(top[0].player_name, "Player12");
    assert_eq!(top[9].player_name, "Player3");

    let response = client.get("/api/health").dispatch().await;
    let health = deserialize_response::<Value>(response).await.unwrap();
    assert_eq!(health["scores"], 12);
}

#[rocket::async_test]
async fn health_reports_the_entry_count() {
    let client = spawn_client().await;
    add_score(&client, &ScoreSubmission::new("Alice", 1))
        .await
        .unwrap();

    let response = client.get("/api/health").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let health = deserialize_response::<Value>(response).await.unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["scores"], 1);
}

#[rocket::async_test]
async fn preflight_from_allowed_origin() {
    let client = spawn_client().await;

    let response = client
        .options("/api/scores")
        .header(Header::new("Origin", TEST_ORIGIN))
        .header(Header::new("Access-Control-Request-Method", "POST"))
        .header(Header::new("Access-Control-Request-Headers", "content-type"))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::NoContent);
    let headers = response.headers();
    assert_eq!(headers.get_one("Access-Control-Allow-Origin"), Some(TEST_ORIGIN));
    assert_eq!(
        headers.get_one("Access-Control-Allow-Methods"),
        Some("GET, POST, OPTIONS")
    );
    assert_eq!(
        headers.get_one("Access-Control-Allow-Headers"),
        Some("content-type")
    );
    assert_eq!(headers.get_one("Access-Control-Max-Age"), Some("3600"));
    assert_eq!(headers.get_one("Access-Control-Allow-Credentials"), None);
}

#[rocket::async_test]
async fn preflight_from_other_origin_is_refused() {
    let client = spawn_client().await;

    let response = client
        .options("/api/scores/top")
        .header(Header::new("Origin", "https://elsewhere.example"))
        .header(Header::new("Access-Control-Request-Method", "GET"))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Forbidden);
    assert_eq!(response.headers().get_one("Access-Control-Allow-Origin"), None);
}

#[rocket::async_test]
async fn requests_from_other_origins_are_refused() {
    let client = spawn_client().await;
    let foreign = Header::new("Origin", "https://elsewhere.example");

    let response = client
        .post("/api/scores")
        .header(foreign.clone())
        .json(&ScoreSubmission::new("Mallory", 10))
        .dispatch()
        .await;
    assert_eq!(response.headers().get_one("Access-Control-Allow-Origin"), None);
    let body = expect_problem(response, Status::Forbidden).await;
    assert_eq!(body["detail"], "Requests from this origin are not allowed");

    let response = client.get("/api/scores/top").header(foreign).dispatch().await;
    expect_problem(response, Status::Forbidden).await;

    assert!(get_top(&client).await.is_empty());
}

#[rocket::async_test]
async fn requests_from_the_allowed_origin_are_served() {
    let client = spawn_client().await;

    let response = client
        .post("/api/scores")
        .header(Header::new("Origin", TEST_ORIGIN))
        .json(&ScoreSubmission::new("Alice", 10))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some(TEST_ORIGIN)
    );
}

#[rocket::async_test]
async fn cors_headers_only_on_api_routes() {
    let client = spawn_client().await;

    let response = client
        .get("/api/scores/top")
        .header(Header::new("Origin", TEST_ORIGIN))
        .dispatch()
        .await;
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some(TEST_ORIGIN)
    );
    assert_eq!(response.headers().get_one("Access-Control-Max-Age"), None);

    let response = client
        .get("/")
        .header(Header::new("Origin", TEST_ORIGIN))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.headers().get_one("Access-Control-Allow-Origin"), None);
}

#[rocket::async_test]
async fn unsupported_database_aborts_ignition() {
    let figment = test_figment().merge(("database_url", "mysql://localhost/scores"));
    match Client::tracked(super::build(figment)).await {
        Ok(_) => panic!("ignition should fail for an unsupported database"),
        Err(err) => assert!(matches!(err.kind(), ErrorKind::FailedFairings(_))),
    }
}

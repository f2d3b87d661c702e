//! Wire behavior of the REST remote against a mock backend.

use chrono::NaiveDate;
use ironlog_core::{
    ExerciseRepository, ExerciseSetRepository, NewExerciseDefinition, NewExerciseSet,
    NewTrainingDay, RemoteStore, StoreError, TrainingDayRepository, TrainingDayUpdate,
};
use ironlog_sync::{RemoteSettings, RestRemote};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER: &str = "user-1";

fn settings(server: &MockServer) -> RemoteSettings {
    RemoteSettings {
        url: Some(server.uri()),
        anon_key: "anon".into(),
        access_token: Some("session-token".into()),
        user_id: Some(USER.into()),
        timeout_secs: 5,
    }
}

fn day_json(id: &str, date: &str) -> Value {
    json!({
        "id": id,
        "date": date,
        "title": null,
        "status": "planned",
        "created_at": "2024-01-10T08:00:00Z",
        "updated_at": "2024-01-10T08:00:00Z",
        "user_id": USER
    })
}

fn set_json(id: &str, parent: &str, order: i64) -> Value {
    json!({
        "id": id,
        "day_exercise_id": parent,
        "set_order": order,
        "planned_reps": 10,
        "planned_weight": 60.0,
        "actual_reps": null,
        "actual_weight": null,
        "is_completed": false,
        "completed_at": null,
        "created_at": "2024-01-10T08:00:00Z",
        "updated_at": "2024-01-10T08:00:00Z",
        "user_id": USER
    })
}

fn jan_10() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
}

#[tokio::test]
async fn test_reads_send_auth_headers_and_owner_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/training_days"))
        .and(header("apikey", "anon"))
        .and(header("authorization", "Bearer session-token"))
        .and(query_param("user_id", "eq.user-1"))
        .and(query_param("date", "eq.2024-01-10"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([day_json("day-1", "2024-01-10")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let remote = RestRemote::new(&settings(&server)).unwrap();
    let day = remote
        .training_days()
        .find_by_date(jan_10())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(day.id, "day-1");
    assert_eq!(day.date, jan_10());
}

#[tokio::test]
async fn test_create_conflict_maps_to_store_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/exercises"))
        .and(header("prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key value"))
        .mount(&server)
        .await;

    let remote = RestRemote::new(&settings(&server)).unwrap();
    let err = remote
        .exercises()
        .create(&NewExerciseDefinition::new("Bench Press", "Chest"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        StoreError::conflict("ExerciseDefinition", "duplicate key value")
    );
}

#[tokio::test]
async fn test_status_codes_map_to_store_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/exercises"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/exercise_sets"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let remote = RestRemote::new(&settings(&server)).unwrap();

    assert_eq!(
        remote.exercises().find_all().await.unwrap_err(),
        StoreError::Unauthorized
    );
    assert!(remote
        .exercise_sets()
        .find_all()
        .await
        .unwrap_err()
        .is_transient());
}

#[tokio::test]
async fn test_get_or_create_returns_existing_day() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/training_days"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([day_json("remote-day", "2024-01-10")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/training_days"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let remote = RestRemote::new(&settings(&server)).unwrap();
    let (day, created) = remote
        .training_days()
        .get_or_create(&NewTrainingDay::new(jan_10()))
        .await
        .unwrap();

    assert_eq!(day.id, "remote-day");
    assert!(!created);
}

#[tokio::test]
async fn test_get_or_create_inserts_missing_day_with_owner() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/training_days"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/training_days"))
        .and(body_partial_json(json!([{ "date": "2024-01-10", "user_id": USER }])))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!([day_json("new-day", "2024-01-10")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let remote = RestRemote::new(&settings(&server)).unwrap();
    let (day, created) = remote
        .training_days()
        .get_or_create(&NewTrainingDay::new(jan_10()))
        .await
        .unwrap();

    assert_eq!(day.id, "new-day");
    assert!(created);
}

#[tokio::test]
async fn test_bulk_create_posts_one_array_under_parent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/exercise_sets"))
        .and(body_partial_json(json!([
            { "id": "s0", "day_exercise_id": "remote-entry", "set_order": 0 },
            { "id": "s1", "day_exercise_id": "remote-entry", "set_order": 1 }
        ])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            set_json("s0", "remote-entry", 0),
            set_json("s1", "remote-entry", 1)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let remote = RestRemote::new(&settings(&server)).unwrap();
    let inputs: Vec<NewExerciseSet> = (0..2)
        .map(|order| NewExerciseSet {
            id: Some(format!("s{order}")),
            ..NewExerciseSet::planned("local-entry", order, Some(10), Some(60.0))
        })
        .collect();

    let created = remote
        .exercise_sets()
        .bulk_create("remote-entry", &inputs)
        .await
        .unwrap();

    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|s| s.day_exercise_id == "remote-entry"));
}

#[tokio::test]
async fn test_bulk_create_with_no_inputs_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let remote = RestRemote::new(&settings(&server)).unwrap();
    let created = remote
        .exercise_sets()
        .bulk_create("remote-entry", &[])
        .await
        .unwrap();

    assert!(created.is_empty());
}

#[tokio::test]
async fn test_update_of_missing_row_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/training_days"))
        .and(query_param("id", "eq.gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let remote = RestRemote::new(&settings(&server)).unwrap();
    let update = TrainingDayUpdate {
        title: Some(Some("Legs".into())),
        ..Default::default()
    };
    let err = remote
        .training_days()
        .update("gone", &update)
        .await
        .unwrap_err();

    assert_eq!(err, StoreError::not_found("TrainingDay", "gone"));
}

#[test]
fn test_new_requires_session_user() {
    let settings = RemoteSettings {
        url: Some("https://project.example.co".into()),
        user_id: None,
        ..RemoteSettings::default()
    };

    assert!(RestRemote::new(&settings).unwrap_err().is_config_error());
}

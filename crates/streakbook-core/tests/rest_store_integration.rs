//! Integration tests for the hosted backend against a mock HTTP server.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use mockito::Matcher;
use streakbook_core::identity::IdentityProvider;
use streakbook_core::remote::{RestAuth, RestClient, RestStore};
use streakbook_core::{
    AuthError, CoreError, RecordStore, RowRange, SignUpOutcome, StoreError, StreakState, Tracker,
    TrackerSettings,
};

const PROFILE: &str = r#"[{
    "id": "u1",
    "name": "Ada",
    "streak_count": 4,
    "last_completed_date": "2024-06-01",
    "created_at": "2024-05-01T10:00:00.123456+00:00",
    "updated_at": "2024-06-01T10:00:00+00:00"
}]"#;

const SESSION: &str = r#"{
    "access_token": "access-1",
    "token_type": "bearer",
    "expires_in": 3600,
    "expires_at": 1900000000,
    "refresh_token": "refresh-1",
    "user": {"id": "u1", "email": "ada@example.com", "user_metadata": {"name": "Ada"}}
}"#;

fn client(server: &mockito::Server) -> Arc<RestClient> {
    Arc::new(RestClient::new(&server.url(), "anon-key", Duration::from_secs(5)).unwrap())
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn test_read_profile_sends_keys_and_filters() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("id".into(), "eq.u1".into()),
            Matcher::UrlEncoded("select".into(), "*".into()),
        ]))
        .match_header("apikey", "anon-key")
        .match_header("authorization", "Bearer user-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(PROFILE)
        .create();

    let store = RestStore::new(client(&server));
    store.set_access_token(Some("user-token"));
    let profile = store.read_profile("u1").unwrap().unwrap();

    mock.assert();
    assert_eq!(profile.name.as_deref(), Some("Ada"));
    assert_eq!(profile.streak(), StreakState::new(4, Some(d("2024-06-01"))));
}

#[test]
fn test_anon_key_is_bearer_without_session() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer anon-key")
        .with_status(200)
        .with_body("[]")
        .create();

    let store = RestStore::new(client(&server));
    assert!(store.read_profile("u1").unwrap().is_none());
    mock.assert();
}

#[test]
fn test_list_exercises_uses_range_and_reads_total() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/rest/v1/solved_exercises")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("user_id".into(), "eq.u1".into()),
            Matcher::UrlEncoded("order".into(), "date_completed.desc,id.desc".into()),
            Matcher::UrlEncoded(
                "select".into(),
                "*,problems(leetcode_number,title,link)".into(),
            ),
        ]))
        .match_header("range", "10-19")
        .match_header("prefer", "count=exact")
        .with_status(206)
        .with_header("content-range", "10-10/11")
        .with_body(
            r#"[{
                "id": 7, "user_id": "u1", "problem_id": 3, "notes": null,
                "date_completed": "2024-06-02", "primary_category": "Stack",
                "additional_tags": ["Monotonic Stack"],
                "created_at": "2024-06-02T08:00:00+00:00",
                "updated_at": "2024-06-02T08:00:00+00:00",
                "problems": {"leetcode_number": 739, "title": "Daily Temperatures",
                             "link": "https://leetcode.com/problems/daily-temperatures/"}
            }]"#,
        )
        .create();

    let store = RestStore::new(client(&server));
    let (rows, total) = store.list_exercises("u1", RowRange::new(10, 10)).unwrap();

    mock.assert();
    assert_eq!(total, 11);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].leetcode_number, 739);
    assert_eq!(rows[0].date_completed, d("2024-06-02"));
    assert_eq!(rows[0].additional_tags, vec!["Monotonic Stack".to_string()]);
}

#[test]
fn test_null_tags_and_streak_read_as_empty() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/rest/v1/solved_exercises")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-range", "0-0/1")
        .with_body(
            r#"[{
                "id": 8, "user_id": "u1", "problem_id": 4, "notes": null,
                "date_completed": "2024-06-03", "primary_category": "Graphs",
                "additional_tags": null,
                "created_at": "2024-06-03T08:00:00+00:00",
                "updated_at": "2024-06-03T08:00:00+00:00",
                "problems": {"leetcode_number": 200, "title": "Number of Islands",
                             "link": "https://leetcode.com/problems/number-of-islands/"}
            }]"#,
        )
        .create();
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"[{"id": "u1", "name": null, "streak_count": null,
                 "last_completed_date": null,
                 "created_at": "2024-05-01T10:00:00+00:00",
                 "updated_at": "2024-05-01T10:00:00+00:00"}]"#,
        )
        .create();

    let store = RestStore::new(client(&server));
    let (rows, total) = store.list_exercises("u1", RowRange::new(0, 10)).unwrap();
    assert_eq!(total, 1);
    assert!(rows[0].additional_tags.is_empty());
    assert_eq!(rows[0].leetcode_number, 200);

    let single = store.exercise("u1", 8).unwrap().unwrap();
    assert!(single.additional_tags.is_empty());

    let profile = store.read_profile("u1").unwrap().unwrap();
    assert_eq!(profile.streak(), StreakState::default());
}

#[test]
fn test_range_past_the_end_is_an_empty_page() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/rest/v1/medications")
        .match_query(Matcher::Any)
        .with_status(416)
        .with_header("content-range", "*/3")
        .with_body(r#"{"code":"PGRST103","message":"Requested range not satisfiable"}"#)
        .create();

    let store = RestStore::new(client(&server));
    let rows = store.list_medications("u1", RowRange::new(40, 20)).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn test_count_reads_content_range() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("HEAD", "/rest/v1/solved_exercises")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("user_id".into(), "eq.u1".into()),
            Matcher::UrlEncoded("date_completed".into(), "eq.2024-06-02".into()),
        ]))
        .match_header("prefer", "count=exact")
        .with_status(200)
        .with_header("content-range", "0-1/2")
        .create();

    let store = RestStore::new(client(&server));
    assert_eq!(store.count_events_on_date("u1", d("2024-06-02")).unwrap(), 2);
    mock.assert();
}

#[test]
fn test_error_mapping() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/rest/v1/medications")
        .match_query(Matcher::Any)
        .with_status(409)
        .with_body(r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#)
        .create();
    server
        .mock("PATCH", "/rest/v1/profiles")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create();
    server
        .mock("GET", "/rest/v1/problems")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("upstream down")
        .create();

    let store = RestStore::new(client(&server));
    let conflict = store.insert_medication(
        "u1",
        &streakbook_core::MedicationFields {
            name: "Aspirin".into(),
            description: None,
        },
    );
    assert!(matches!(conflict, Err(StoreError::Conflict(_))));

    // an update that matched no row
    let missing = store.write_streak("ghost", StreakState::default());
    assert!(matches!(missing, Err(StoreError::NotFound(_))));

    let down = store.find_problem_by_number(1);
    assert!(matches!(down, Err(StoreError::Unavailable(_))));
}

#[test]
fn test_unreachable_server_is_unavailable() {
    let client = RestClient::new("http://127.0.0.1:1", "anon-key", Duration::from_secs(2)).unwrap();
    let store = RestStore::new(Arc::new(client));
    assert!(matches!(
        store.read_profile("u1"),
        Err(StoreError::Unavailable(_))
    ));
}

#[test]
fn test_auth_sign_in_and_failures() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
        .match_body(Matcher::PartialJsonString(
            r#"{"email":"ada@example.com"}"#.into(),
        ))
        .with_status(200)
        .with_body(SESSION)
        .create();
    server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
        .match_body(Matcher::PartialJsonString(
            r#"{"email":"bob@example.com"}"#.into(),
        ))
        .with_status(400)
        .with_body(r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#)
        .create();
    server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
        .match_body(Matcher::PartialJsonString(
            r#"{"email":"eve@example.com"}"#.into(),
        ))
        .with_status(400)
        .with_body(r#"{"code":400,"error_code":"email_not_confirmed","msg":"Email not confirmed"}"#)
        .create();

    let auth = RestAuth::new(client(&server));
    let session = auth.sign_in("ada@example.com", "hunter22").unwrap();
    assert_eq!(session.access_token, "access-1");
    assert_eq!(session.user.name.as_deref(), Some("Ada"));
    assert_eq!(session.expires_at.timestamp(), 1_900_000_000);

    assert!(matches!(
        auth.sign_in("bob@example.com", "nope"),
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        auth.sign_in("eve@example.com", "hunter22"),
        Err(AuthError::EmailConfirmationRequired { .. })
    ));
}

#[test]
fn test_sign_up_pending_confirmation() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/auth/v1/signup")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"id":"u2","email":"eve@example.com","user_metadata":{},"confirmation_sent_at":"2024-06-01T00:00:00Z"}"#)
        .create();

    let auth = RestAuth::new(client(&server));
    let outcome = auth.sign_up("eve@example.com", "hunter22", None).unwrap();
    match outcome {
        SignUpOutcome::ConfirmationRequired(user) => assert_eq!(user.id, "u2"),
        other => panic!("expected confirmation, got {other:?}"),
    }
}

#[test]
fn test_refresh_rejection() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()))
        .with_status(400)
        .with_body(r#"{"error":"invalid_grant","error_description":"Invalid Refresh Token: Already Used"}"#)
        .create();

    let auth = RestAuth::new(client(&server));
    match auth.refresh_session("stale") {
        Err(AuthError::RefreshFailed(msg)) => assert!(msg.contains("Already Used")),
        other => panic!("expected refresh failure, got {other:?}"),
    }
}

#[test]
fn test_tracker_profile_falls_back_on_server_error() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(SESSION)
        .create();
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"message":"boom"}"#)
        .create();

    let shared = client(&server);
    let mut tracker = Tracker::new(
        Box::new(RestStore::new(shared.clone())),
        Box::new(RestAuth::new(shared)),
        TrackerSettings::default(),
    );
    tracker.sign_in("ada@example.com", "hunter22").unwrap();

    let profile = tracker.profile(d("2024-06-02")).unwrap();
    assert_eq!(profile.id, "u1");
    assert_eq!(profile.streak_count, 0);
}

#[test]
fn test_refresh_outage_keeps_session() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
        .with_status(200)
        .with_body(SESSION)
        .create();
    server
        .mock("POST", "/auth/v1/token")
        .match_query(Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()))
        .with_status(503)
        .with_body("upstream down")
        .create();

    let shared = client(&server);
    let mut tracker = Tracker::new(
        Box::new(RestStore::new(shared.clone())),
        Box::new(RestAuth::new(shared)),
        TrackerSettings::default(),
    );
    tracker.sign_in("ada@example.com", "hunter22").unwrap();

    let err = tracker.refresh().unwrap_err();
    assert!(matches!(
        err,
        CoreError::Auth(AuthError::Store(StoreError::Unavailable(_)))
    ));
    assert!(!err.ends_session());
    assert_eq!(
        tracker.session().map(|s| s.refresh_token.as_str()),
        Some("refresh-1")
    );
}

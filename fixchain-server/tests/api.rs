mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use tokio::sync::Notify;
use tower::ServiceExt;

use common::{
    app, body_json, body_text, dead_end_toolbox, hanging_toolbox, official_toolbox, request,
    sse_events, ALICE, BOB,
};
use fixchain_core::StreamEvent;
use fixchain_graph::FALLBACK_FAILURE_MESSAGE;
use fixchain_server::SESSION_ID_HEADER;
use fixchain_session::TurnStatus;

#[tokio::test]
async fn health_needs_no_credentials() {
    let (router, _) = app(official_toolbox());
    let response = router.oneshot(request("GET", "/", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn api_rejects_unknown_tokens() {
    let (router, _) = app(official_toolbox());
    let missing = router
        .clone()
        .oneshot(request("GET", "/api/sessions", None, None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = router
        .oneshot(request("GET", "/api/usage", Some("nope"), None))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sessions_are_scoped_to_their_owner() {
    let (router, _) = app(official_toolbox());
    let created = router
        .clone()
        .oneshot(request("POST", "/api/sessions", Some(ALICE), None))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::OK);
    let session_id = body_json(created).await["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let listed = body_json(
        router
            .clone()
            .oneshot(request("GET", "/api/sessions", Some(ALICE), None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(listed["sessions"].as_array().unwrap().len(), 1);

    let bobs = body_json(
        router
            .clone()
            .oneshot(request("GET", "/api/sessions", Some(BOB), None))
            .await
            .unwrap(),
    )
    .await;
    assert!(bobs["sessions"].as_array().unwrap().is_empty());

    let messages_uri = format!("/api/sessions/{session_id}/messages");
    let foreign = router
        .clone()
        .oneshot(request("GET", &messages_uri, Some(BOB), None))
        .await
        .unwrap();
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

    let session_uri = format!("/api/sessions/{session_id}");
    let foreign_delete = router
        .clone()
        .oneshot(request("DELETE", &session_uri, Some(BOB), None))
        .await
        .unwrap();
    assert_eq!(foreign_delete.status(), StatusCode::NOT_FOUND);

    let deleted = router
        .clone()
        .oneshot(request("DELETE", &session_uri, Some(ALICE), None))
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = router
        .oneshot(request("GET", &messages_uri, Some(ALICE), None))
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn chat_stream_answers_from_the_official_guide() {
    let (router, state) = app(official_toolbox());
    let response = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/chat/stream",
            Some(ALICE),
            Some(json!({ "message": "my PS5 fan is loud" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session_id = response
        .headers()
        .get(SESSION_ID_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let events = sse_events(&body_text(response).await);
    assert_eq!(events.last(), Some(&StreamEvent::Done));
    assert_eq!(
        events.iter().filter(|e| **e == StreamEvent::Done).count(),
        1
    );
    assert_eq!(events.first(), Some(&StreamEvent::Status("Normalizing query...".into())));
    let answer = events
        .iter()
        .find_map(|event| match event {
            StreamEvent::Response(text) => Some(text.clone()),
            _ => None,
        })
        .unwrap();
    assert!(answer.starts_with("# PlayStation 5 Fan Replacement"));
    assert!(!events.iter().any(|e| matches!(e, StreamEvent::Error(_))));

    let turns = state.history.load(&session_id).await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].text, "my PS5 fan is loud");
    assert_eq!(turns[1].text, answer);
    assert_eq!(turns[1].status, TurnStatus::Completed);

    let session = state.history.session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.title.as_deref(), Some("PS5 Fan Loud"));

    let usage = body_json(
        router
            .oneshot(request("GET", "/api/usage", Some(ALICE), None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(usage["user_id"], "alice");
    assert_eq!(usage["records"], 1);
    assert!(usage["total_tokens"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn follow_up_messages_keep_the_first_title() {
    let (router, state) = app(official_toolbox());
    let first = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/chat/stream",
            Some(ALICE),
            Some(json!({ "message": "my PS5 fan is loud" })),
        ))
        .await
        .unwrap();
    let session_id = first
        .headers()
        .get(SESSION_ID_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    body_text(first).await;

    let second = router
        .oneshot(request(
            "POST",
            "/api/chat/stream",
            Some(ALICE),
            Some(json!({ "message": "what about the disc drive", "session_id": session_id })),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    body_text(second).await;

    assert_eq!(state.history.load(&session_id).await.unwrap().len(), 4);
    let session = state.history.session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.title.as_deref(), Some("PS5 Fan Loud"));
}

#[tokio::test]
async fn chat_stream_reports_exhausted_fallback_once() {
    let (router, state) = app(dead_end_toolbox());
    let response = router
        .oneshot(request(
            "POST",
            "/api/chat/stream",
            Some(ALICE),
            Some(json!({ "message": "made-up gadget XQ9000 broken" })),
        ))
        .await
        .unwrap();
    let session_id = response
        .headers()
        .get(SESSION_ID_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let events = sse_events(&body_text(response).await);

    let n = events.len();
    assert!(n >= 2);
    assert_eq!(events[n - 2], StreamEvent::Error(FALLBACK_FAILURE_MESSAGE.into()));
    assert_eq!(events[n - 1], StreamEvent::Done);
    assert!(!events.iter().any(|e| matches!(e, StreamEvent::Response(_))));

    let turns = state.history.load(&session_id).await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].status, TurnStatus::Failed);
    assert_eq!(state.usage.total("alice").await.unwrap().records, 0);
}

#[tokio::test]
async fn chat_stream_validates_the_request() {
    let (router, _) = app(official_toolbox());
    let blank = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/chat/stream",
            Some(ALICE),
            Some(json!({ "message": "   " })),
        ))
        .await
        .unwrap();
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let created = router
        .clone()
        .oneshot(request("POST", "/api/sessions", Some(BOB), None))
        .await
        .unwrap();
    let bobs_session = body_json(created).await["session_id"]
        .as_str()
        .unwrap()
        .to_string();
    let foreign = router
        .oneshot(request(
            "POST",
            "/api/chat/stream",
            Some(ALICE),
            Some(json!({ "message": "my PS5 fan is loud", "session_id": bobs_session })),
        ))
        .await
        .unwrap();
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn explicit_cancel_stops_the_run_and_marks_history() {
    let entered = Arc::new(Notify::new());
    let (router, state) = app(hanging_toolbox(entered.clone()));
    let response = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/chat/stream",
            Some(ALICE),
            Some(json!({ "message": "my PS5 fan is loud" })),
        ))
        .await
        .unwrap();
    let session_id = response
        .headers()
        .get(SESSION_ID_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let body = tokio::spawn(body_text(response));

    tokio::time::timeout(Duration::from_secs(5), entered.notified())
        .await
        .unwrap();
    let cancelled = body_json(
        router
            .oneshot(request(
                "POST",
                &format!("/api/sessions/{session_id}/cancel"),
                Some(ALICE),
                None,
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(cancelled["cancelled"], true);

    let text = tokio::time::timeout(Duration::from_secs(5), body)
        .await
        .unwrap()
        .unwrap();
    let events = sse_events(&text);
    assert_eq!(
        events.last(),
        Some(&StreamEvent::Status("Fetching repair instructions...".into()))
    );
    assert!(!events
        .iter()
        .any(|e| matches!(e, StreamEvent::Response(_) | StreamEvent::Done)));

    let turns = state.history.load(&session_id).await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].status, TurnStatus::Cancelled);
    assert!(!state.active.is_active(&session_id));
}

#[tokio::test]
async fn client_disconnect_cancels_the_run() {
    let entered = Arc::new(Notify::new());
    let (router, state) = app(hanging_toolbox(entered.clone()));
    let response = router
        .oneshot(request(
            "POST",
            "/api/chat/stream",
            Some(ALICE),
            Some(json!({ "message": "my PS5 fan is loud" })),
        ))
        .await
        .unwrap();
    let session_id = response
        .headers()
        .get(SESSION_ID_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    tokio::time::timeout(Duration::from_secs(5), entered.notified())
        .await
        .unwrap();
    drop(response);

    let mut cancelled = false;
    for _ in 0..100 {
        let turns = state.history.load(&session_id).await.unwrap();
        if turns.last().map(|turn| turn.status) == Some(TurnStatus::Cancelled) {
            cancelled = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(cancelled, "history never recorded the cancellation");
}

// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use common::spawn_server;
use reqwest::StatusCode;
use sisyphus_domain_types::{Action, Command, TargetState};

mod common;

#[tokio::test]
async fn reg_without_sp_is_bad_request() {
    let server = spawn_server().await;

    let response = server
        .client
        .post(server.url("/reg"))
        .header("Origin", "http://observer.example")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*",
        "responses must be readable cross-origin"
    );
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], r#"Missing "sp" url value"#);

    let response = server.register("", "nameless").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reg_only_accepts_post() {
    let server = spawn_server().await;

    let response = server.client.get(server.url("/reg")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = server
        .client
        .request(reqwest::Method::OPTIONS, server.url("/reg"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn registration_is_broadcast_and_duplicate_fails() {
    let server = spawn_server().await;
    let (mut socket, _) = server.connect().await;

    let response = server.register("http://push.example/abcdefghij", "").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Command = response.json().await.unwrap();
    assert_eq!(body.action, Action::Add);
    assert_eq!(body.args[0].name, "cdefghij");
    assert_eq!(body.args[0].state, TargetState::New);

    let added = common::next_command(&mut socket).await;
    assert_eq!(added, body);

    let response = server.register("http://push.example/abcdefghij", "again").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let failed = common::next_command(&mut socket).await;
    assert_eq!(failed.action, Action::Error);
    assert!(failed.is_err());
    assert_eq!(failed.args[0].url, "http://push.example/abcdefghij");
}

#[tokio::test]
async fn ack_and_delete_update_the_table() {
    let server = spawn_server().await;
    server.register("http://x/1", "one").await;

    let response = server
        .client
        .post(server.url("/ack"))
        .form(&[("sp", "http://x/1")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (mut socket, hello) = server.connect().await;
    assert_eq!(hello.args.len(), 1);
    assert_eq!(hello.args[0].state, TargetState::Ack);

    let response = server
        .client
        .delete(server.url("/ack"))
        .form(&[("sp", "http://x/1")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let deleted = common::next_command(&mut socket).await;
    assert_eq!(deleted.action, Action::Del);

    common::send_text(&mut socket, r#"{"action":"hello"}"#).await;
    let hello = common::next_command(&mut socket).await;
    assert_eq!(hello.args.len(), 1);
    assert!(hello.args[0].is_placeholder());
}

#[tokio::test]
async fn ack_action_field_overrides_method() {
    let server = spawn_server().await;
    server.register("http://x/2", "two").await;

    let response = server
        .client
        .post(server.url("/ack"))
        .form(&[("sp", "http://x/2"), ("action", "del")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Command = response.json().await.unwrap();
    assert_eq!(body.action, Action::Del);

    let response = server
        .client
        .post(server.url("/ack"))
        .form(&[("sp", "http://x/2"), ("action", "add")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn readiness_reports_connections() {
    let server = spawn_server().await;
    let (_socket, _) = server.connect().await;

    let body: serde_json::Value = server
        .client
        .get(server.url("/readyz"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["connections"], 1);
}

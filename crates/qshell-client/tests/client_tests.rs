// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use qshell_app::{Action, Envelope};
use qshell_client::Client;
use serde_json::Value;
use std::io::Read;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

fn json_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

#[test]
fn unreachable_server_error_names_the_config_key() {
    let client =
        Client::new("http://127.0.0.1:1", Duration::from_millis(50)).expect("client should initialize");
    let error = client
        .evaluate("/department", Action::Produce, 1)
        .expect_err("evaluate should fail for unreachable endpoint");
    let message = error.to_string();
    assert!(message.contains("[server].base_url") || message.contains("[server].timeout"));
}

#[test]
fn evaluate_posts_the_query_and_decodes_a_product() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api", server.server_addr());

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/evaluate");
        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("request body should be readable");
        let body: Value = serde_json::from_str(&body).expect("request body is JSON");
        assert_eq!(body["query"], "/department");
        assert_eq!(body["action"], "produce");
        assert_eq!(body["page"], 2);

        let answer = qshell_testkit::evaluate("/department", "produce", 2).to_string();
        request
            .respond(json_response(&answer, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let envelope = client.evaluate("/department", Action::Produce, 2)?;
    let Envelope::Product(product) = envelope else {
        panic!("expected a product");
    };
    assert!(!product.more);
    assert_eq!(product.grid()?.body.len(), 7);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn complete_posts_the_path() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/complete");
        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("request body should be readable");
        let body: Value = serde_json::from_str(&body).expect("request body is JSON");
        assert_eq!(body, serde_json::json!({"names": ["department"]}));

        let answer = qshell_testkit::complete(&["department".to_owned()]).to_string();
        request
            .respond(json_response(&answer, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let names = client.complete(&["department".to_owned()])?;
    assert_eq!(names, vec!["code", "course", "name", "school"]);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn server_errors_surface_their_detail() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(r#"{"detail": "engine is restarting"}"#, 503))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .evaluate("/school", Action::Analyze, 1)
        .expect_err("503 should fail");
    assert_eq!(error.to_string(), "server error (503): engine is restarting");

    handle.join().expect("server thread should join");
    Ok(())
}

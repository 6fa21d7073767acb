// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use qshell_app::{Action, Envelope, RequestId, decode_names};
use qshell_client::Client;
use qshell_tui::{AppRuntime, InternalEvent};
use std::sync::mpsc::Sender;
use std::thread;

/// Talks to a live query engine. Requests run on worker threads so the
/// shell keeps drawing while the server thinks.
pub struct HttpRuntime {
    client: Client,
}

impl HttpRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AppRuntime for HttpRuntime {
    fn evaluate(&mut self, query: &str, action: Action, page: u32) -> Result<Envelope> {
        self.client.evaluate(query, action, page)
    }

    fn complete(&mut self, path: &[String]) -> Result<Vec<String>> {
        self.client.complete(path)
    }

    fn spawn_evaluate(
        &mut self,
        request_id: RequestId,
        query: &str,
        action: Action,
        page: u32,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        let query = query.to_owned();
        thread::Builder::new()
            .name("qshell-evaluate".to_owned())
            .spawn(move || {
                let result = client
                    .evaluate(&query, action, page)
                    .map_err(|error| format!("{error:#}"));
                let _ = tx.send(InternalEvent::Evaluated { request_id, result });
            })
            .context("spawn evaluation worker")?;
        Ok(())
    }

    fn spawn_complete(&mut self, path: &[String], tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        let path = path.to_vec();
        thread::Builder::new()
            .name("qshell-complete".to_owned())
            .spawn(move || {
                let result = client.complete(&path).map_err(|error| format!("{error:#}"));
                let _ = tx.send(InternalEvent::Completed { path, result });
            })
            .context("spawn completion worker")?;
        Ok(())
    }
}

/// Answers from the canned demo catalog instead of a server.
#[derive(Debug, Default)]
pub struct DemoRuntime;

impl AppRuntime for DemoRuntime {
    fn evaluate(&mut self, query: &str, action: Action, page: u32) -> Result<Envelope> {
        Envelope::from_json(qshell_testkit::evaluate(query, action.as_str(), page))
    }

    fn complete(&mut self, path: &[String]) -> Result<Vec<String>> {
        decode_names(qshell_testkit::complete(path))
    }
}

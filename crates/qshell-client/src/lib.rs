// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use qshell_app::{Action, CompleteRequest, Envelope, EvaluateRequest, decode_names};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Blocking client for the query engine's `/evaluate` and `/complete` endpoints.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("server.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "server.base_url must use http or https, got {:?}",
                parsed.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn evaluate(&self, query: &str, action: Action, page: u32) -> Result<Envelope> {
        log::debug!("evaluate {} page {page}: {query}", action.as_str());
        let body = self.post(
            "evaluate",
            &EvaluateRequest {
                query,
                action,
                page,
            },
        )?;
        Envelope::from_json(body)
    }

    pub fn complete(&self, path: &[String]) -> Result<Vec<String>> {
        log::debug!("complete {path:?}");
        let body = self.post("complete", &CompleteRequest { names: path })?;
        decode_names(body)
    }

    fn post<T: Serialize>(&self, endpoint: &str, request: &T) -> Result<Value> {
        let response = self
            .http
            .post(format!("{}/{endpoint}", self.base_url))
            .json(request)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        response
            .json()
            .with_context(|| format!("decode {endpoint} response"))
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!(
            "{base_url} did not answer in time -- raise [server].timeout or simplify the query ({error})"
        );
    }
    anyhow!(
        "cannot reach {base_url} -- is the query server running? check [server].base_url ({error})"
    )
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body)
        && let Some(message) = [parsed.detail, parsed.error, parsed.message]
            .into_iter()
            .flatten()
            .find(|message| !message.trim().is_empty())
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message.trim());
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 200 && !trimmed.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), trimmed);
    }

    anyhow!("server returned {}", status.as_u16())
}

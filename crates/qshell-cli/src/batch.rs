// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use qshell_app::{Action, Envelope};
use qshell_grid::{GridSheet, escape_grid, to_markup};
use qshell_tui::AppRuntime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "html" => Some(Self::Html),
            _ => None,
        }
    }
}

/// Evaluates one query and renders the answer for stdout. Error and
/// unsupported answers become errors so the process exits non-zero.
pub fn run_batch<R: AppRuntime>(
    runtime: &mut R,
    query: &str,
    action: Action,
    format: OutputFormat,
) -> Result<String> {
    let envelope = runtime.evaluate(query, action, 1)?;
    log::debug!("batch query answered with {}", envelope.kind());
    render_envelope(&envelope, format)
}

fn render_envelope(envelope: &Envelope, format: OutputFormat) -> Result<String> {
    match envelope {
        Envelope::Product(product) => {
            let grid = product.grid()?;
            match format {
                OutputFormat::Text => Ok(GridSheet::new(&grid, 0)?.to_text()),
                OutputFormat::Html => to_markup(&escape_grid(&grid)),
            }
        }
        Envelope::Empty => Ok("(no data)\n".to_owned()),
        Envelope::Sql { sql } => Ok(format!("{sql}\n")),
        Envelope::Error {
            detail,
            hint: Some(hint),
        } => bail!("{detail} (hint: {hint})"),
        Envelope::Error { detail, hint: None } => bail!("{detail}"),
        Envelope::Unsupported => bail!("the server cannot evaluate this input; queries start with '/'"),
    }
}

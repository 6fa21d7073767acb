// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use qshell_grid::{Field, Grid, layout};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Produce,
    Analyze,
}

impl Action {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Produce => "produce",
            Self::Analyze => "analyze",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "produce" => Some(Self::Produce),
            "analyze" => Some(Self::Analyze),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluateRequest<'a> {
    pub query: &'a str,
    pub action: Action,
    pub page: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompleteRequest<'a> {
    pub names: &'a [String],
}

/// A `product` response: the layout engine's input triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub meta: Field,
    pub data: Value,
    pub more: bool,
}

impl Product {
    pub fn grid(&self) -> Result<Grid> {
        layout(&self.meta, &self.data, self.more)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Product(Product),
    Empty,
    Sql { sql: String },
    Error { detail: String, hint: Option<String> },
    Unsupported,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawEnvelope {
    Product {
        meta: Value,
        #[serde(default)]
        data: Value,
        #[serde(default)]
        more: bool,
    },
    Empty,
    Sql {
        sql: String,
    },
    Error {
        detail: String,
        #[serde(default)]
        hint: Option<String>,
    },
    Unsupported,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawCompletion {
    Complete {
        names: Vec<String>,
    },
    Error {
        detail: String,
    },
}

impl Envelope {
    pub fn from_json(value: Value) -> Result<Self> {
        let raw: RawEnvelope =
            serde_json::from_value(value).context("decode result envelope")?;
        let envelope = match raw {
            RawEnvelope::Product { meta, data, more } => Self::Product(Product {
                meta: Field::from_json(&meta).context("decode result meta")?,
                data,
                more,
            }),
            RawEnvelope::Empty => Self::Empty,
            RawEnvelope::Sql { sql } => Self::Sql { sql },
            RawEnvelope::Error { detail, hint } => Self::Error { detail, hint },
            RawEnvelope::Unsupported => Self::Unsupported,
        };
        Ok(envelope)
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Product(_) => "product",
            Self::Empty => "empty",
            Self::Sql { .. } => "sql",
            Self::Error { .. } => "error",
            Self::Unsupported => "unsupported",
        }
    }

    pub const fn panel(&self) -> Panel {
        match self {
            Self::Product(_) | Self::Empty => Panel::Results,
            Self::Sql { .. } => Panel::Sql,
            Self::Error { .. } | Self::Unsupported => Panel::Error,
        }
    }

    pub fn has_more(&self) -> bool {
        matches!(self, Self::Product(product) if product.more)
    }
}

/// Decodes a `complete` response into its list of names.
pub fn decode_names(value: Value) -> Result<Vec<String>> {
    let raw: RawCompletion =
        serde_json::from_value(value).context("decode completion response")?;
    match raw {
        RawCompletion::Complete { names } => Ok(names),
        RawCompletion::Error { detail } => bail!("completion failed: {detail}"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Results,
    Sql,
    Error,
}

impl Panel {
    pub const ALL: [Self; 3] = [Self::Results, Self::Sql, Self::Error];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Results => "Results",
            Self::Sql => "SQL",
            Self::Error => "Error",
        }
    }
}

/// What to re-request on "load more", and where the body was scrolled to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub query: String,
    pub action: Action,
    pub page: u32,
    pub scroll_offset: usize,
}

impl Pagination {
    pub fn first(query: &str, action: Action) -> Self {
        Self {
            query: query.to_owned(),
            action,
            page: 1,
            scroll_offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Envelope, EvaluateRequest, Panel, decode_names};
    use anyhow::Result;
    use qshell_grid::Profile;
    use serde_json::json;

    #[test]
    fn product_envelope_decodes_its_profile() -> Result<()> {
        let envelope = Envelope::from_json(qshell_testkit::evaluate("/department", "produce", 1))?;
        let Envelope::Product(product) = &envelope else {
            panic!("expected a product, got {}", envelope.kind());
        };
        assert_eq!(product.meta.label.as_deref(), Some("department"));
        assert!(matches!(product.meta.profile, Profile::List { .. }));
        assert!(envelope.has_more());
        assert_eq!(envelope.panel(), Panel::Results);
        assert_eq!(product.grid()?.column_count, 4);
        Ok(())
    }

    #[test]
    fn other_envelopes_select_their_panel() -> Result<()> {
        let cases = [
            (json!({"type": "empty"}), Panel::Results),
            (json!({"type": "sql", "sql": "SELECT 1"}), Panel::Sql),
            (json!({"type": "error", "detail": "bad name"}), Panel::Error),
            (json!({"type": "unsupported"}), Panel::Error),
        ];
        for (value, panel) in cases {
            assert_eq!(Envelope::from_json(value)?.panel(), panel);
        }
        Ok(())
    }

    #[test]
    fn malformed_envelopes_are_errors() {
        let error = Envelope::from_json(json!({"type": "mystery"})).expect_err("unknown type");
        assert!(error.to_string().contains("decode result envelope"));

        let error = Envelope::from_json(json!({"type": "product", "meta": [], "data": null}))
            .expect_err("meta must be an object");
        assert!(error.to_string().contains("decode result meta"));
    }

    #[test]
    fn request_bodies_use_wire_names() -> Result<()> {
        let body = serde_json::to_value(EvaluateRequest {
            query: "/school",
            action: Action::Analyze,
            page: 2,
        })?;
        assert_eq!(body, json!({"query": "/school", "action": "analyze", "page": 2}));
        assert_eq!(Action::parse(Action::Produce.as_str()), Some(Action::Produce));
        Ok(())
    }

    #[test]
    fn completion_names_decode() -> Result<()> {
        let names = decode_names(json!({"type": "complete", "names": ["code", "name"]}))?;
        assert_eq!(names, vec!["code".to_owned(), "name".to_owned()]);
        let error = decode_names(json!({"type": "error", "detail": "no such table"}))
            .expect_err("error response");
        assert!(error.to_string().contains("no such table"));
        Ok(())
    }
}

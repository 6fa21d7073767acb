// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Map, Value};

/// Shape of a query result, decoded once from the `meta` of a product response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    Void,
    Scalar { domain: String },
    Record { fields: Vec<Field> },
    List { item: Box<Profile> },
}

/// A profile with an optional header label. Record fields and the top-level
/// result meta share this shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: Option<String>,
    pub profile: Profile,
}

impl Field {
    pub fn new(label: Option<&str>, profile: Profile) -> Self {
        Self {
            label: label.map(str::to_owned),
            profile,
        }
    }

    /// Decodes `{"header": .., "domain": {..}}`. A bare domain object is
    /// accepted as a profile without a header.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = expect_object(value, "profile")?;
        let label = match object.get("header") {
            None | Some(Value::Null) => None,
            Some(Value::String(label)) => Some(label.clone()),
            Some(other) => bail!("profile header must be a string, got {}", json_kind(other)),
        };
        let domain = object.get("domain").unwrap_or(value);
        Ok(Self {
            label,
            profile: Profile::from_domain(domain)?,
        })
    }

    pub(crate) fn has_label_row(&self) -> bool {
        self.label.is_some() && self.profile.column_count() > 0
    }
}

impl Profile {
    pub fn scalar(domain: &str) -> Self {
        Self::Scalar {
            domain: domain.to_owned(),
        }
    }

    pub fn record(fields: Vec<Field>) -> Self {
        Self::Record { fields }
    }

    pub fn list(item: Profile) -> Self {
        Self::List {
            item: Box::new(item),
        }
    }

    pub fn from_domain(value: &Value) -> Result<Self> {
        let object = expect_object(value, "domain")?;
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("domain is missing its \"type\" tag"))?;

        match kind {
            "void" => Ok(Self::Void),
            "list" => {
                let item = object
                    .get("item")
                    .ok_or_else(|| anyhow!("list domain is missing \"item\""))?;
                let item = Field::from_json(item).context("decode list item")?;
                Ok(Self::list(item.profile))
            }
            "record" => {
                let fields = object
                    .get("fields")
                    .and_then(Value::as_array)
                    .ok_or_else(|| anyhow!("record domain is missing a \"fields\" array"))?;
                let fields = fields
                    .iter()
                    .enumerate()
                    .map(|(index, field)| {
                        Field::from_json(field).with_context(|| format!("decode record field {index}"))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::Record { fields })
            }
            other => Ok(Self::scalar(other)),
        }
    }

    /// Number of grid columns the profile occupies. Lists add an index column.
    pub fn column_count(&self) -> usize {
        match self {
            Self::Void => 0,
            Self::Scalar { .. } => 1,
            Self::Record { fields } => fields.iter().map(|field| field.profile.column_count()).sum(),
            Self::List { item } => item.column_count() + 1,
        }
    }

    /// True when the row count is fixed by the type alone. A list never is,
    /// whatever its item looks like.
    pub fn is_bounded(&self) -> bool {
        match self {
            Self::Void | Self::Scalar { .. } => true,
            Self::Record { fields } => fields.iter().all(|field| field.profile.is_bounded()),
            Self::List { .. } => false,
        }
    }
}

fn expect_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| anyhow!("{what} must be a JSON object, got {}", json_kind(value)))
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{Field, Profile};
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn column_counts_follow_nesting() {
        let record = Profile::record(vec![
            Field::new(Some("code"), Profile::scalar("text")),
            Field::new(Some("name"), Profile::scalar("text")),
            Field::new(None, Profile::Void),
        ]);
        assert_eq!(Profile::Void.column_count(), 0);
        assert_eq!(Profile::scalar("integer").column_count(), 1);
        assert_eq!(record.column_count(), 2);
        assert_eq!(Profile::list(record.clone()).column_count(), 3);
        assert_eq!(Profile::list(Profile::Void).column_count(), 1);
    }

    #[test]
    fn lists_are_never_bounded() {
        let record = Profile::record(vec![Field::new(None, Profile::scalar("text"))]);
        assert!(record.is_bounded());
        assert!(!Profile::list(record.clone()).is_bounded());
        assert!(!Profile::list(Profile::Void).is_bounded());

        let with_list = Profile::record(vec![
            Field::new(None, Profile::scalar("text")),
            Field::new(None, Profile::list(Profile::scalar("text"))),
        ]);
        assert!(!with_list.is_bounded());
    }

    #[test]
    fn decodes_wrapped_and_bare_domains() -> Result<()> {
        let meta = json!({
            "header": "department",
            "domain": {
                "type": "list",
                "item": {
                    "domain": {
                        "type": "record",
                        "fields": [
                            {"header": "code", "domain": {"type": "text"}},
                            {"type": "integer"}
                        ]
                    }
                }
            }
        });

        let field = Field::from_json(&meta)?;
        assert_eq!(field.label.as_deref(), Some("department"));
        assert_eq!(
            field.profile,
            Profile::list(Profile::record(vec![
                Field::new(Some("code"), Profile::scalar("text")),
                Field::new(None, Profile::scalar("integer")),
            ]))
        );
        Ok(())
    }

    #[test]
    fn decode_rejects_missing_type_and_bad_header() {
        let error = Field::from_json(&json!({"domain": {}})).expect_err("missing type should fail");
        assert!(error.to_string().contains("\"type\""));

        let error = Field::from_json(&json!({"header": 3, "domain": {"type": "void"}}))
            .expect_err("numeric header should fail");
        assert!(error.to_string().contains("header must be a string"));

        let error = Field::from_json(&json!([1])).expect_err("array profile should fail");
        assert!(error.to_string().contains("got array"));
    }
}

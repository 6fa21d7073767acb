// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Schema-driven table layout.
//!
//! Every builder is asked for its natural height first and then for exactly
//! that many rows (or more, when a taller sibling forces it). Cells that do
//! not need the extra rows absorb them through `rowspan`, so the rows of a
//! group always line up across siblings.

use anyhow::{Result, bail, ensure};
use serde_json::Value;

use crate::cell::{Cell, CellClass, Grid, Row, blank_rows, merge_side_by_side, spanning};
use crate::profile::{Field, Profile, json_kind};

/// Lays out `data` according to the result meta. Fails when the data does
/// not have the shape the profile promises.
pub fn layout(meta: &Field, data: &Value, more: bool) -> Result<Grid> {
    Layout::new(meta).render(data, more)
}

#[derive(Debug, Clone, Copy)]
pub struct Layout<'a> {
    meta: &'a Field,
}

impl<'a> Layout<'a> {
    pub fn new(meta: &'a Field) -> Self {
        Self { meta }
    }

    pub fn column_count(&self) -> usize {
        self.meta.profile.column_count()
    }

    pub fn is_bounded(&self) -> bool {
        self.meta.profile.is_bounded()
    }

    pub fn head_height(&self) -> usize {
        field_head_height(self.meta)
    }

    pub fn head(&self, height: usize) -> Result<Vec<Row>> {
        ensure!(
            height >= self.head_height(),
            "head needs {} rows, {height} requested",
            self.head_height()
        );
        Ok(field_head(self.meta, height))
    }

    pub fn body_height(&self, data: &Value) -> Result<usize> {
        body_height(&self.meta.profile, data)
    }

    pub fn body(&self, data: &Value, height: usize) -> Result<Vec<Row>> {
        let needed = self.body_height(data)?;
        ensure!(
            height >= needed,
            "body needs {needed} rows, {height} requested"
        );
        body(&self.meta.profile, data, height)
    }

    pub fn foot_height(&self) -> usize {
        foot_height(&self.meta.profile)
    }

    pub fn foot(&self, more: bool, height: usize) -> Result<Vec<Row>> {
        ensure!(
            height >= self.foot_height(),
            "foot needs {} rows, {height} requested",
            self.foot_height()
        );
        Ok(foot(&self.meta.profile, more, height))
    }

    pub fn render(&self, data: &Value, more: bool) -> Result<Grid> {
        let head = self.head(self.head_height())?;
        let body = self.body(data, self.body_height(data)?)?;
        let foot = self.foot(more, self.foot_height())?;
        Ok(Grid {
            column_count: self.column_count(),
            bounded: self.is_bounded(),
            head,
            body,
            foot,
        })
    }
}

fn head_height(profile: &Profile) -> usize {
    match profile {
        Profile::Void | Profile::Scalar { .. } => 0,
        Profile::Record { fields } => fields.iter().map(field_head_height).max().unwrap_or(0),
        Profile::List { item } => head_height(item),
    }
}

fn field_head_height(field: &Field) -> usize {
    head_height(&field.profile) + usize::from(field.has_label_row())
}

fn head(profile: &Profile, height: usize) -> Vec<Row> {
    match profile {
        Profile::Void => blank_rows(height),
        Profile::Scalar { .. } => spanning(Cell::blank(), height),
        Profile::Record { fields } => {
            let mut rows = blank_rows(height);
            for field in fields {
                merge_side_by_side(&mut rows, field_head(field, height));
            }
            rows
        }
        Profile::List { item } => {
            let mut rows = head(item, height);
            if let Some(first) = rows.first_mut() {
                first.insert(
                    0,
                    Cell::blank()
                        .with_rowspan(height)
                        .with_class(CellClass::Index),
                );
            }
            rows
        }
    }
}

/// Header wrapper: adds the label row on top of whatever the profile builds.
/// When the profile has no header rows of its own, the label takes them all.
fn field_head(field: &Field, height: usize) -> Vec<Row> {
    let Some(label) = field.label.as_deref().filter(|_| field.has_label_row()) else {
        return head(&field.profile, height);
    };
    if height == 0 {
        return Vec::new();
    }

    let label = Cell::new(label).with_colspan(field.profile.column_count());
    if head_height(&field.profile) == 0 {
        return spanning(label, height);
    }

    let mut rows = vec![vec![label]];
    rows.extend(head(&field.profile, height - 1));
    rows
}

fn body_height(profile: &Profile, data: &Value) -> Result<usize> {
    match profile {
        Profile::Void => {
            expect_void(data)?;
            Ok(0)
        }
        Profile::Scalar { .. } => {
            expect_scalar(data)?;
            Ok(1)
        }
        Profile::Record { fields } => match data {
            Value::Null => Ok(1),
            Value::Array(values) => {
                expect_arity(fields, values)?;
                let mut height = 0;
                for (field, value) in fields.iter().zip(values) {
                    height = height.max(body_height(&field.profile, value)?);
                }
                Ok(height)
            }
            other => mismatch("record", other),
        },
        Profile::List { item } => match data {
            Value::Null => Ok(1),
            Value::Array(items) if items.is_empty() => Ok(1),
            Value::Array(items) => {
                let mut height = 0;
                for value in items {
                    height += body_height(item, value)?.max(1);
                }
                Ok(height)
            }
            other => mismatch("list", other),
        },
    }
}

fn body(profile: &Profile, data: &Value, height: usize) -> Result<Vec<Row>> {
    match profile {
        Profile::Void => Ok(blank_rows(height)),
        Profile::Scalar { .. } => Ok(spanning(scalar_cell(data)?, height)),
        Profile::Record { fields } => match data {
            Value::Null => Ok(null_filler(profile.column_count(), height)),
            Value::Array(values) => {
                expect_arity(fields, values)?;
                let mut rows = blank_rows(height);
                for (field, value) in fields.iter().zip(values) {
                    merge_side_by_side(&mut rows, body(&field.profile, value, height)?);
                }
                Ok(rows)
            }
            other => mismatch("record", other),
        },
        Profile::List { item } => match data {
            Value::Null => Ok(null_filler(profile.column_count(), height)),
            Value::Array(items) if items.is_empty() => {
                Ok(null_filler(profile.column_count(), height))
            }
            Value::Array(items) => list_body(item, items, height),
            other => mismatch("list", other),
        },
    }
}

fn list_body(item: &Profile, items: &[Value], height: usize) -> Result<Vec<Row>> {
    let mut heights = items
        .iter()
        .map(|value| body_height(item, value).map(|height| height.max(1)))
        .collect::<Result<Vec<_>>>()?;
    let natural: usize = heights.iter().sum();
    if let Some(last) = heights.last_mut() {
        *last += height.saturating_sub(natural);
    }

    let mut rows = Vec::with_capacity(height);
    for (position, (value, item_height)) in items.iter().zip(heights).enumerate() {
        let mut item_rows = body(item, value, item_height)?;
        if let Some(first) = item_rows.first_mut() {
            first.insert(
                0,
                Cell::new((position + 1).to_string())
                    .with_rowspan(item_height)
                    .with_class(CellClass::Index),
            );
            if !item.is_bounded() {
                for cell in first.iter_mut() {
                    cell.mark_leading(CellClass::Section);
                }
            }
        }
        rows.extend(item_rows);
    }
    Ok(rows)
}

fn foot_height(profile: &Profile) -> usize {
    usize::from(profile.column_count() > 0)
}

fn foot(profile: &Profile, more: bool, height: usize) -> Vec<Row> {
    match profile {
        Profile::Void => blank_rows(height),
        Profile::Scalar { .. } => spanning(foot_cell(more), height),
        Profile::Record { fields } => {
            let mut rows = blank_rows(height);
            for field in fields {
                merge_side_by_side(&mut rows, foot(&field.profile, more, height));
            }
            rows
        }
        Profile::List { item } => {
            let mut rows = foot(item, more, height);
            if let Some(first) = rows.first_mut() {
                first.insert(
                    0,
                    foot_cell(more)
                        .with_rowspan(height)
                        .with_class(CellClass::Index),
                );
            }
            rows
        }
    }
}

fn foot_cell(more: bool) -> Cell {
    Cell::blank().with_class(if more {
        CellClass::More
    } else {
        CellClass::Dummy
    })
}

fn scalar_cell(data: &Value) -> Result<Cell> {
    let cell = match data {
        Value::Null => Cell::blank().with_class(CellClass::NullVal),
        Value::Bool(true) => Cell::new("true").with_class(CellClass::TrueVal),
        Value::Bool(false) => Cell::new("false").with_class(CellClass::FalseVal),
        Value::Number(number) => Cell::new(number.to_string()),
        Value::String(text) if text.is_empty() => Cell::blank().with_class(CellClass::EmptyVal),
        Value::String(text) => Cell::new(text.as_str()),
        other => return mismatch("scalar", other),
    };
    Ok(cell)
}

/// One row of filler cells standing in for an absent record or an empty list.
fn null_filler(columns: usize, height: usize) -> Vec<Row> {
    let mut rows = blank_rows(height);
    if let Some(first) = rows.first_mut() {
        first.extend((0..columns).map(|_| {
            Cell::blank()
                .with_rowspan(height)
                .with_class(CellClass::NullRecVal)
        }));
    }
    rows
}

fn expect_void(data: &Value) -> Result<()> {
    match data {
        Value::Null => Ok(()),
        other => mismatch("void", other),
    }
}

fn expect_scalar(data: &Value) -> Result<()> {
    match data {
        Value::Array(_) | Value::Object(_) => mismatch("scalar", data),
        _ => Ok(()),
    }
}

fn expect_arity(fields: &[Field], values: &[Value]) -> Result<()> {
    if fields.len() != values.len() {
        bail!(
            "record with {} fields got {} values",
            fields.len(),
            values.len()
        );
    }
    Ok(())
}

fn mismatch<T>(expected: &str, found: &Value) -> Result<T> {
    log::warn!("result data does not match its profile: expected {expected}");
    bail!(
        "result data does not match its profile: expected {expected} data, got {}",
        json_kind(found)
    )
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt::Write as _;

use anyhow::Result;

use crate::cell::{Cell, CellClass, Grid, Row};
use crate::place::{place, with_filler};

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Returns a copy of `grid` with every cell's content escaped for markup.
pub fn escape_grid(grid: &Grid) -> Grid {
    let escape_rows = |rows: &[Row]| -> Vec<Row> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .map(|cell| Cell {
                        content: escape(&cell.content),
                        ..cell.clone()
                    })
                    .collect()
            })
            .collect()
    };
    Grid {
        column_count: grid.column_count,
        bounded: grid.bounded,
        head: escape_rows(&grid.head),
        body: escape_rows(&grid.body),
        foot: escape_rows(&grid.foot),
    }
}

/// Renders an already escaped grid. Each group is checked to be a full
/// rectangle first, so malformed spans never reach the output.
pub fn to_markup(grid: &Grid) -> Result<String> {
    let columns = grid.column_count + 1;
    let mut out = String::from("<table class=\"result\">\n");
    let groups = [
        ("thead", "th", with_filler(&grid.head)),
        ("tbody", "td", with_filler(&grid.body)),
        ("tfoot", "td", with_filler(&grid.foot)),
    ];
    for (group, tag, rows) in &groups {
        if rows.is_empty() {
            continue;
        }
        place(rows, columns)?;
        let _ = writeln!(out, "<{group}>");
        for row in rows {
            out.push_str("<tr>");
            for cell in row {
                write_cell(&mut out, tag, cell);
            }
            out.push_str("</tr>\n");
        }
        let _ = writeln!(out, "</{group}>");
    }
    out.push_str("</table>\n");
    Ok(out)
}

fn write_cell(out: &mut String, tag: &str, cell: &Cell) {
    let _ = write!(out, "<{tag}");
    if cell.rowspan > 1 {
        let _ = write!(out, " rowspan=\"{}\"", cell.rowspan);
    }
    if cell.colspan > 1 {
        let _ = write!(out, " colspan=\"{}\"", cell.colspan);
    }
    if !cell.classes.is_empty() {
        let classes = cell
            .classes
            .iter()
            .map(|class| class.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let _ = write!(out, " class=\"{classes}\"");
    }
    if cell.has_class(CellClass::Filler) {
        out.push_str(" style=\"width: 100%\"");
    }
    let _ = write!(out, ">{}</{tag}>", cell.content);
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::cell::{CellClass, Grid, Row};
use crate::place::{PlacedCell, place, with_filler};

const SEPARATOR: &str = "│";
const RULE: char = '─';
const MORE_MARK: &str = "⋯";
const NO_CLASSES: &[CellClass] = &[];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub x: usize,
    pub width: usize,
    pub text: String,
    pub classes: Vec<CellClass>,
    pub separator: bool,
}

impl Segment {
    fn padded(&self) -> String {
        let text: String = self.text.chars().take(self.width).collect();
        let pad = self.width.saturating_sub(text.chars().count());
        if self.classes.contains(&CellClass::Index) {
            format!("{}{text}", " ".repeat(pad))
        } else {
            format!("{text}{}", " ".repeat(pad))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaneLine {
    pub segments: Vec<Segment>,
}

/// A visible run of characters sharing one set of classes. Separators carry none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece<'a> {
    pub text: String,
    pub classes: &'a [CellClass],
}

impl PaneLine {
    /// Clips the line to `width` characters starting at `offset`.
    pub fn pieces(&self, offset: usize, width: usize) -> Vec<Piece<'_>> {
        let end = offset.saturating_add(width);
        let mut pieces = Vec::new();
        for segment in &self.segments {
            let mut parts = vec![(segment.x, segment.padded(), segment.classes.as_slice())];
            if segment.separator {
                parts.push((segment.x + segment.width, SEPARATOR.to_owned(), NO_CLASSES));
            }
            for (start, text, classes) in parts {
                let len = text.chars().count();
                let from = start.max(offset);
                let to = (start + len).min(end);
                if from >= to {
                    continue;
                }
                pieces.push(Piece {
                    text: text.chars().skip(from - start).take(to - from).collect(),
                    classes,
                });
            }
        }
        pieces
    }

    pub fn plain(&self) -> String {
        self.pieces(0, usize::MAX)
            .into_iter()
            .map(|piece| piece.text)
            .collect::<String>()
            .trim_end()
            .to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSheet {
    pub widths: Vec<usize>,
    pub head: Vec<PaneLine>,
    pub body: Vec<PaneLine>,
    pub foot: Vec<PaneLine>,
    pub more: bool,
}

impl GridSheet {
    pub fn new(grid: &Grid, target_width: usize) -> Result<Self> {
        let columns = grid.column_count + 1;
        let head_rows = with_filler(&grid.head);
        let body_rows = with_filler(&grid.body);
        let foot_rows = with_filler(&grid.foot);
        let head = place(&head_rows, columns)?;
        let body = place(&body_rows, columns)?;
        let foot = place(&foot_rows, columns)?;

        let widths = measure_widths(columns, [&body, &foot, &head], target_width);
        Ok(Self {
            head: render_lines(&head_rows, &head, &widths),
            body: render_lines(&body_rows, &body, &widths),
            foot: render_lines(&foot_rows, &foot, &widths),
            more: grid.has_more(),
            widths,
        })
    }

    pub fn content_width(&self) -> usize {
        let real = &self.widths[..self.widths.len() - 1];
        real.iter().map(|width| width + 1).sum()
    }

    pub fn to_text(&self) -> String {
        let mut lines = self.head.iter().map(PaneLine::plain).collect::<Vec<_>>();
        if !lines.is_empty() {
            lines.push(RULE.to_string().repeat(self.content_width()));
        }
        lines.extend(self.body.iter().map(PaneLine::plain));
        if self.more {
            lines.extend(self.foot.iter().map(PaneLine::plain));
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

fn measure_widths(
    columns: usize,
    groups: [&Vec<PlacedCell<'_>>; 3],
    target_width: usize,
) -> Vec<usize> {
    let filler = columns - 1;
    let mut widths = vec![1; columns];
    widths[filler] = 0;

    for placed in groups {
        for cell in placed.iter().filter(|cell| cell.cell.colspan == 1 && cell.column != filler) {
            widths[cell.column] = widths[cell.column].max(display_width(cell));
        }
    }
    for placed in groups {
        for cell in placed.iter().filter(|cell| cell.cell.colspan > 1) {
            let span = cell.column..cell.column + cell.cell.colspan;
            let available =
                widths[span.clone()].iter().sum::<usize>() + cell.cell.colspan - 1;
            let needed = display_width(cell);
            if needed > available {
                widths[span.end - 1] += needed - available;
            }
        }
    }

    let used: usize = widths[..filler].iter().map(|width| width + 1).sum();
    widths[filler] = target_width.saturating_sub(used);
    widths
}

fn render_lines(rows: &[Row], placed: &[PlacedCell<'_>], widths: &[usize]) -> Vec<PaneLine> {
    let filler = widths.len() - 1;
    let mut offsets = Vec::with_capacity(widths.len());
    let mut x = 0;
    for width in widths {
        offsets.push(x);
        x += width + 1;
    }

    let mut lines = vec![PaneLine::default(); rows.len()];
    for cell in placed {
        let span = cell.column..cell.column + cell.cell.colspan;
        let width = widths[span.clone()].iter().sum::<usize>() + cell.cell.colspan - 1;
        let separator = span.end - 1 != filler;
        for (offset, line) in lines[cell.row..cell.row + cell.cell.rowspan]
            .iter_mut()
            .enumerate()
        {
            line.segments.push(Segment {
                x: offsets[cell.column],
                width,
                text: if offset == 0 {
                    display_text(cell)
                } else {
                    String::new()
                },
                classes: cell.cell.classes.clone(),
                separator,
            });
        }
    }
    for line in &mut lines {
        line.segments.sort_by_key(|segment| segment.x);
    }
    lines
}

fn display_text(cell: &PlacedCell<'_>) -> String {
    if cell.cell.has_class(CellClass::More) {
        return MORE_MARK.to_owned();
    }
    cell.cell
        .content
        .chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect()
}

fn display_width(cell: &PlacedCell<'_>) -> usize {
    display_text(cell).chars().count()
}

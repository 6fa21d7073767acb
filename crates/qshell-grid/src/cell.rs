// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellClass {
    Section,
    Index,
    NullVal,
    TrueVal,
    FalseVal,
    EmptyVal,
    NullRecVal,
    More,
    Dummy,
    Filler,
}

impl CellClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Index => "index",
            Self::NullVal => "null-val",
            Self::TrueVal => "true-val",
            Self::FalseVal => "false-val",
            Self::EmptyVal => "empty-val",
            Self::NullRecVal => "null-rec-val",
            Self::More => "more",
            Self::Dummy => "dummy",
            Self::Filler => "filler",
        }
    }
}

/// One table cell. `content` is raw text; markup escaping is a separate pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub content: String,
    pub rowspan: usize,
    pub colspan: usize,
    pub classes: Vec<CellClass>,
}

impl Cell {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            rowspan: 1,
            colspan: 1,
            classes: Vec::new(),
        }
    }

    pub fn blank() -> Self {
        Self::new(String::new())
    }

    pub fn with_rowspan(mut self, rowspan: usize) -> Self {
        self.rowspan = rowspan;
        self
    }

    pub fn with_colspan(mut self, colspan: usize) -> Self {
        self.colspan = colspan;
        self
    }

    pub fn with_class(mut self, class: CellClass) -> Self {
        if !self.has_class(class) {
            self.classes.push(class);
        }
        self
    }

    pub fn has_class(&self, class: CellClass) -> bool {
        self.classes.contains(&class)
    }

    /// Puts `class` first unless the cell already carries it.
    pub fn mark_leading(&mut self, class: CellClass) {
        if !self.has_class(class) {
            self.classes.insert(0, class);
        }
    }
}

pub type Row = Vec<Cell>;

/// Output of the layout engine for one result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub column_count: usize,
    pub bounded: bool,
    pub head: Vec<Row>,
    pub body: Vec<Row>,
    pub foot: Vec<Row>,
}

impl Grid {
    pub fn groups(&self) -> [&[Row]; 3] {
        [&self.head, &self.body, &self.foot]
    }

    pub fn has_more(&self) -> bool {
        self.foot
            .iter()
            .flatten()
            .any(|cell| cell.has_class(CellClass::More))
    }
}

pub(crate) fn blank_rows(height: usize) -> Vec<Row> {
    vec![Row::new(); height]
}

/// Places `cell` in the first of `height` rows, spanning all of them.
pub(crate) fn spanning(cell: Cell, height: usize) -> Vec<Row> {
    let mut rows = blank_rows(height);
    if let Some(first) = rows.first_mut() {
        first.push(cell.with_rowspan(height));
    }
    rows
}

/// Appends `part` to the right of `rows`, row by row. Both must have the same height.
pub(crate) fn merge_side_by_side(rows: &mut [Row], part: Vec<Row>) {
    debug_assert_eq!(rows.len(), part.len(), "row groups disagree on height");
    for (row, cells) in rows.iter_mut().zip(part) {
        row.extend(cells);
    }
}

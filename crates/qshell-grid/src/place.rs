// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, ensure};

use crate::cell::{Cell, CellClass, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedCell<'a> {
    pub row: usize,
    pub column: usize,
    pub cell: &'a Cell,
}

/// Resolves each cell to its grid slot, skipping slots taken by row spans
/// from earlier rows. Errors if the group is not an exact `columns`-wide
/// rectangle: overflow, overlap, spans past the last row, or gaps.
pub fn place(rows: &[Row], columns: usize) -> Result<Vec<PlacedCell<'_>>> {
    let height = rows.len();
    let mut taken = vec![vec![false; columns]; height];
    let mut placed = Vec::new();

    for (row_index, row) in rows.iter().enumerate() {
        let mut column = 0;
        for cell in row {
            while column < columns && taken[row_index][column] {
                column += 1;
            }
            ensure!(
                cell.rowspan > 0 && cell.colspan > 0,
                "cell at row {row_index} has an empty span"
            );
            ensure!(
                column + cell.colspan <= columns,
                "row {row_index} overflows {columns} columns"
            );
            ensure!(
                row_index + cell.rowspan <= height,
                "cell at row {row_index} spans past the last row"
            );
            for slots in &mut taken[row_index..row_index + cell.rowspan] {
                for slot in &mut slots[column..column + cell.colspan] {
                    ensure!(!*slot, "cells overlap at row {row_index}, column {column}");
                    *slot = true;
                }
            }
            placed.push(PlacedCell {
                row: row_index,
                column,
                cell,
            });
            column += cell.colspan;
        }
    }

    for (row_index, slots) in taken.iter().enumerate() {
        ensure!(
            slots.iter().all(|slot| *slot),
            "row {row_index} leaves columns uncovered"
        );
    }
    Ok(placed)
}

/// Appends the full-height filler cell that soaks up leftover width.
pub fn with_filler(rows: &[Row]) -> Vec<Row> {
    let mut rows = rows.to_vec();
    let height = rows.len();
    if let Some(first) = rows.first_mut() {
        first.push(
            Cell::blank()
                .with_rowspan(height)
                .with_class(CellClass::Filler),
        );
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::{place, with_filler};
    use crate::cell::{Cell, CellClass};

    #[test]
    fn row_spans_push_later_cells_right() -> anyhow::Result<()> {
        let rows = vec![
            vec![Cell::new("1").with_rowspan(2), Cell::new("a")],
            vec![Cell::new("b")],
        ];
        let placed = place(&rows, 2)?;
        let slots = placed
            .iter()
            .map(|placed| (placed.row, placed.column, placed.cell.content.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(slots, vec![(0, 0, "1"), (0, 1, "a"), (1, 1, "b")]);
        Ok(())
    }

    #[test]
    fn rejects_gaps_and_overflow() {
        let gap = vec![vec![Cell::new("1").with_rowspan(2), Cell::new("a")], vec![]];
        let error = place(&gap, 2).expect_err("second row is short");
        assert!(error.to_string().contains("uncovered"));

        let wide = vec![vec![Cell::new("a").with_colspan(3)]];
        let error = place(&wide, 2).expect_err("colspan is too wide");
        assert!(error.to_string().contains("overflows"));

        let tall = vec![vec![Cell::new("a").with_rowspan(2)]];
        let error = place(&tall, 1).expect_err("rowspan is too tall");
        assert!(error.to_string().contains("past the last row"));
    }

    #[test]
    fn filler_spans_the_whole_group() -> anyhow::Result<()> {
        let rows = vec![vec![Cell::new("a")], vec![Cell::new("b")]];
        let filled = with_filler(&rows);
        let filler = filled[0].last().expect("filler appended");
        assert!(filler.has_class(CellClass::Filler));
        assert_eq!(filler.rowspan, 2);
        place(&filled, 2)?;
        assert!(with_filler(&[]).is_empty());
        Ok(())
    }
}

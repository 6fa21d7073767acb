// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use qshell_grid::{CellClass, Field, Grid, GridSheet, Profile, Row, escape_grid, layout, place};
use qshell_testkit as testkit;
use serde_json::{Value, json};

fn rendered(meta: &Value, rows: Vec<Value>, more: bool) -> Result<Grid> {
    layout(&Field::from_json(meta)?, &Value::Array(rows), more)
}

fn assert_rectangular(grid: &Grid) -> Result<()> {
    for group in grid.groups() {
        place(group, grid.column_count)?;
    }
    Ok(())
}

fn span_sums(rows: &[Row]) -> Vec<usize> {
    rows.iter()
        .map(|row| row.iter().map(|cell| cell.colspan).sum())
        .collect()
}

#[test]
fn every_catalog_result_is_a_full_rectangle() -> Result<()> {
    let cases = [
        (testkit::department_meta(), testkit::department_rows()),
        (testkit::department_school_meta(), testkit::department_school_rows()),
        (testkit::school_meta(), testkit::school_rows()),
        (testkit::course_meta(), testkit::course_rows()),
    ];
    for (meta, rows) in cases {
        for more in [false, true] {
            let grid = rendered(&meta, rows.clone(), more)?;
            assert_rectangular(&grid)?;
            assert_rectangular(&escape_grid(&grid))?;
        }
    }
    Ok(())
}

#[test]
fn header_rows_span_the_column_count() -> Result<()> {
    let grid = rendered(&testkit::department_meta(), testkit::department_rows(), false)?;
    assert_eq!(grid.column_count, 4);
    assert_eq!(span_sums(&grid.head[..1]), vec![4]);
    assert_eq!(span_sums(&grid.body), vec![4; 7]);
    assert_eq!(span_sums(&grid.foot), vec![4]);
    Ok(())
}

#[test]
fn layout_is_idempotent() -> Result<()> {
    let meta = testkit::school_meta();
    let first = rendered(&meta, testkit::school_rows(), true)?;
    let second = rendered(&meta, testkit::school_rows(), true)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn lists_stay_unbounded_whatever_the_item() -> Result<()> {
    for meta in [testkit::department_meta(), testkit::numbered_meta()] {
        let field = Field::from_json(&meta)?;
        assert!(!field.profile.is_bounded());
    }
    let count = Field::from_json(&testkit::count_meta())?;
    assert!(count.profile.is_bounded());
    assert_eq!(count.profile, Profile::scalar("integer"));
    Ok(())
}

#[test]
fn missing_school_fills_its_columns() -> Result<()> {
    let grid = rendered(
        &testkit::department_school_meta(),
        testkit::department_school_rows(),
        false,
    )?;
    let lang = &grid.body[5];
    assert_eq!(lang[1].content, "lang");
    assert_eq!(lang.len(), 4);
    assert!(
        lang[2..]
            .iter()
            .all(|cell| cell.classes == vec![CellClass::NullRecVal])
    );
    Ok(())
}

#[test]
fn nested_lists_open_sections() -> Result<()> {
    let grid = rendered(&testkit::school_meta(), testkit::school_rows(), false)?;
    // art has 1 department, eng 2, ns 3.
    assert_eq!(grid.body.len(), 6);
    let section_rows = grid
        .body
        .iter()
        .enumerate()
        .filter(|(_, row)| row.first().is_some_and(|cell| cell.has_class(CellClass::Section)))
        .map(|(index, _)| index)
        .collect::<Vec<_>>();
    assert_eq!(section_rows, vec![0, 1, 3]);
    assert_eq!(grid.body[3][0].content, "3");
    assert_eq!(grid.body[3][0].rowspan, 3);
    Ok(())
}

#[test]
fn paginated_numbered_list() -> Result<()> {
    let grid = layout(
        &Field::from_json(&testkit::numbered_meta())?,
        &json!([[1], [2]]),
        true,
    )?;
    assert_eq!(grid.column_count, 2);
    assert!(grid.head.is_empty());
    let body = grid
        .body
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.content.as_str())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    assert_eq!(body, vec![vec!["1", "1"], vec!["2", "2"]]);
    assert!(grid.body.iter().all(|row| row[0].has_class(CellClass::Index)));
    assert_eq!(grid.foot.len(), 1);
    assert!(grid.foot[0][0].has_class(CellClass::More));
    assert!(grid.foot[0][0].has_class(CellClass::Index));
    Ok(())
}

#[test]
fn text_rendering_of_escaped_course_titles() -> Result<()> {
    let grid = rendered(&testkit::course_meta(), testkit::course_rows(), false)?;
    let text = GridSheet::new(&grid, 0)?.to_text();
    assert!(text.contains("<lab>"));
    assert!(text.lines().any(|line| line.starts_with("6│mth")));
    let markup = qshell_grid::to_markup(&escape_grid(&grid))?;
    assert!(markup.contains("&lt;lab&gt;"));
    assert!(!markup.contains("<lab>"));
    Ok(())
}

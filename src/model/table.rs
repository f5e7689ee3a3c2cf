//! Tables, the cell grid builder, and coverage-preserving edits.
//!
//! Every `(row, col)` of a table is owned by at most one cell. A cell with
//! `row_span > 1` or `col_span > 1` covers the positions to its right and
//! below; covered positions never hold a cell of their own.

use super::element::Element;
use super::paragraph::Paragraph;
use super::shape::{Margins, ObjectProps};
use super::style::BorderFill;
use crate::common::{Error, Result};
use fixedbitset::FixedBitSet;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

impl VerticalAlign {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => VerticalAlign::Center,
            2 => VerticalAlign::Bottom,
            _ => VerticalAlign::Top,
        }
    }

    pub fn from_hwpx_name(name: &str) -> Self {
        match name {
            "CENTER" => VerticalAlign::Center,
            "BOTTOM" => VerticalAlign::Bottom,
            _ => VerticalAlign::Top,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub row_span: u32,
    pub col_span: u32,
    pub width: u32,
    pub height: u32,
    pub margins: Margins,
    pub vertical_align: VerticalAlign,
    pub header: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_fill_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_fill: Option<BorderFill>,
    pub elements: Vec<Element>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            row: 0,
            col: 0,
            row_span: 1,
            col_span: 1,
            width: 0,
            height: 0,
            margins: Margins::default(),
            vertical_align: VerticalAlign::Top,
            header: false,
            border_fill_id: None,
            border_fill: None,
            elements: Vec::new(),
        }
    }
}

impl Cell {
    /// An empty 1x1 cell holding one empty paragraph.
    pub fn empty() -> Self {
        Self {
            elements: vec![Element::Paragraph(Paragraph::empty())],
            ..Default::default()
        }
    }

    #[inline]
    pub fn covers(&self, row: u32, col: u32) -> bool {
        row >= self.row
            && row < self.row + self.row_span
            && col >= self.col
            && col < self.col + self.col_span
    }

    /// Plain text of the cell's elements, one line per element.
    pub fn text(&self) -> String {
        self.elements
            .iter()
            .map(Element::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    pub object: ObjectProps,
    pub row_count: u32,
    pub col_count: u32,
    pub cell_spacing: u32,
    pub inner_margins: Margins,
    pub repeat_header: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_fill_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_fill: Option<BorderFill>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flat_map(|r| r.cells.iter())
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.rows.iter_mut().flat_map(|r| r.cells.iter_mut())
    }

    /// The cell owning `(row, col)`, whether as anchor or through a span.
    pub fn cell_at(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells().find(|c| c.covers(row, col))
    }

    /// Positions covered by a span but not anchoring a cell, in row-major order.
    pub fn covered_positions(&self) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        for cell in self.cells() {
            for r in cell.row..cell.row + cell.row_span {
                for c in cell.col..cell.col + cell.col_span {
                    if (r, c) != (cell.row, cell.col) {
                        out.push((r, c));
                    }
                }
            }
        }
        out.sort_unstable();
        out
    }

    /// Check that every position is owned by at most one cell and that all
    /// spans stay inside the grid.
    pub fn is_coverage_consistent(&self) -> bool {
        let mut owned = FixedBitSet::new();
        for cell in self.cells() {
            if cell.row_span == 0
                || cell.col_span == 0
                || cell.row.saturating_add(cell.row_span) > self.row_count
                || cell.col.saturating_add(cell.col_span) > self.col_count
            {
                return false;
            }
            for r in cell.row..cell.row + cell.row_span {
                for c in cell.col..cell.col + cell.col_span {
                    let index = r as usize * self.col_count as usize + c as usize;
                    if index >= owned.len() {
                        owned.grow(index + 1);
                    }
                    if owned.put(index) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Plain text: cells separated by tabs, rows by newlines.
    pub fn text(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .map(Cell::text)
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Insert an empty row before `at` (`at == row_count` appends).
    ///
    /// Cells spanning across the insertion point grow by one row; every
    /// other position of the new row gets an empty cell.
    pub fn insert_row(&mut self, at: u32) -> Result<()> {
        if at > self.row_count {
            return Err(Error::Other(format!(
                "row {} out of range for {} rows",
                at, self.row_count
            )));
        }
        let mut cells = self.take_cells();
        for cell in &mut cells {
            if cell.row >= at {
                cell.row += 1;
            } else if cell.row + cell.row_span > at {
                cell.row_span += 1;
            }
        }
        for col in 0..self.col_count {
            if !cells.iter().any(|c| c.covers(at, col)) {
                cells.push(Cell {
                    row: at,
                    col,
                    ..Cell::empty()
                });
            }
        }
        self.row_count += 1;
        self.regroup(cells);
        Ok(())
    }

    /// Delete row `at`. Spanning cells shrink; a spanning cell anchored on
    /// the deleted row keeps its content and moves down.
    pub fn delete_row(&mut self, at: u32) -> Result<()> {
        if at >= self.row_count {
            return Err(Error::Other(format!(
                "row {} out of range for {} rows",
                at, self.row_count
            )));
        }
        let cells = self.take_cells();
        let mut kept = Vec::with_capacity(cells.len());
        for mut cell in cells {
            if cell.row == at {
                if cell.row_span == 1 {
                    continue;
                }
                cell.row_span -= 1;
            } else if cell.row > at {
                cell.row -= 1;
            } else if cell.row + cell.row_span > at {
                cell.row_span -= 1;
            }
            kept.push(cell);
        }
        self.row_count -= 1;
        self.regroup(kept);
        Ok(())
    }

    /// Insert an empty column before `at` (`at == col_count` appends).
    pub fn insert_column(&mut self, at: u32) -> Result<()> {
        if at > self.col_count {
            return Err(Error::Other(format!(
                "column {} out of range for {} columns",
                at, self.col_count
            )));
        }
        let mut cells = self.take_cells();
        for cell in &mut cells {
            if cell.col >= at {
                cell.col += 1;
            } else if cell.col + cell.col_span > at {
                cell.col_span += 1;
            }
        }
        for row in 0..self.row_count {
            if !cells.iter().any(|c| c.covers(row, at)) {
                cells.push(Cell {
                    row,
                    col: at,
                    ..Cell::empty()
                });
            }
        }
        self.col_count += 1;
        self.regroup(cells);
        Ok(())
    }

    /// Delete column `at`, shrinking spans that cross it.
    pub fn delete_column(&mut self, at: u32) -> Result<()> {
        if at >= self.col_count {
            return Err(Error::Other(format!(
                "column {} out of range for {} columns",
                at, self.col_count
            )));
        }
        let cells = self.take_cells();
        let mut kept = Vec::with_capacity(cells.len());
        for mut cell in cells {
            if cell.col == at {
                if cell.col_span == 1 {
                    continue;
                }
                cell.col_span -= 1;
            } else if cell.col > at {
                cell.col -= 1;
            } else if cell.col + cell.col_span > at {
                cell.col_span -= 1;
            }
            kept.push(cell);
        }
        self.col_count -= 1;
        self.regroup(kept);
        Ok(())
    }

    fn take_cells(&mut self) -> Vec<Cell> {
        std::mem::take(&mut self.rows)
            .into_iter()
            .flat_map(|r| r.cells)
            .collect()
    }

    fn regroup(&mut self, mut cells: Vec<Cell>) {
        cells.sort_by_key(|c| (c.row, c.col));
        let mut rows: Vec<Row> = (0..self.row_count).map(|_| Row::default()).collect();
        for cell in cells {
            if let Some(row) = rows.get_mut(cell.row as usize) {
                row.cells.push(cell);
            }
        }
        self.rows = rows;
    }
}

/// Upper bound on `rows * cols` for a decoded grid. Declared dimensions past
/// it are clamped before anything is allocated.
pub const MAX_GRID_POSITIONS: usize = 1 << 20;

/// Places decoded cells into a `rows x cols` grid.
///
/// Cells land at their explicit address when it is inside the grid, else at
/// a row-major cursor that skips placed and covered positions. Once the
/// cursor passes the last position no further cells are accepted.
///
/// Storage is sparse: only placed cells and the positions their spans cover
/// take memory, whatever the declared dimensions.
#[derive(Debug)]
pub struct TableGrid {
    rows: u32,
    cols: u32,
    anchors: BTreeMap<usize, Cell>,
    covered: FixedBitSet,
    cursor: usize,
}

impl TableGrid {
    pub fn new(rows: u32, cols: u32) -> Self {
        let (mut rows, mut cols) = (rows, cols);
        if (rows as u64) * (cols as u64) > MAX_GRID_POSITIONS as u64 {
            tracing::debug!(rows, cols, "table dimensions clamped");
            cols = cols.min(MAX_GRID_POSITIONS as u32);
            rows = rows.min((MAX_GRID_POSITIONS / cols as usize) as u32);
        }
        Self {
            rows,
            cols,
            anchors: BTreeMap::new(),
            covered: FixedBitSet::new(),
            cursor: 0,
        }
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[inline]
    fn total(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    #[inline]
    fn index(&self, row: u32, col: u32) -> usize {
        row as usize * self.cols as usize + col as usize
    }

    #[inline]
    fn is_taken(&self, index: usize) -> bool {
        self.anchors.contains_key(&index) || self.covered.contains(index)
    }

    /// Whether the cursor has run past the grid.
    pub fn is_full(&self) -> bool {
        self.next_free(self.cursor).is_none()
    }

    fn next_free(&self, from: usize) -> Option<usize> {
        (from..self.total()).find(|&i| !self.is_taken(i))
    }

    /// Place a cell; returns its final `(row, col)` or `None` when rejected.
    ///
    /// A cell whose address is already owned or covered is dropped. Spans are
    /// clamped to the grid and then shrunk so the footprint never reaches a
    /// position some earlier cell owns.
    pub fn place(&mut self, address: Option<(u32, u32)>, mut cell: Cell) -> Option<(u32, u32)> {
        let index = match address {
            Some((r, c)) if r < self.rows && c < self.cols => {
                let index = self.index(r, c);
                if self.is_taken(index) {
                    tracing::debug!(row = r, col = c, "cell address already owned, cell dropped");
                    return None;
                }
                index
            },
            _ => {
                if let Some((r, c)) = address {
                    tracing::debug!(row = r, col = c, "cell address outside table grid");
                }
                match self.next_free(self.cursor) {
                    Some(i) => i,
                    None => {
                        tracing::debug!("table grid full, cell dropped");
                        return None;
                    },
                }
            },
        };

        let row = (index / self.cols as usize) as u32;
        let col = (index % self.cols as usize) as u32;
        cell.row = row;
        cell.col = col;
        let (row_span, col_span) = self.free_footprint(
            row,
            col,
            cell.row_span.clamp(1, self.rows - row),
            cell.col_span.clamp(1, self.cols - col),
        );
        if (row_span, col_span) != (cell.row_span, cell.col_span) {
            tracing::debug!(row, col, row_span, col_span, "cell span reduced");
        }
        cell.row_span = row_span;
        cell.col_span = col_span;

        for r in row..row + row_span {
            for c in col..col + col_span {
                if (r, c) != (row, col) {
                    let i = self.index(r, c);
                    if i >= self.covered.len() {
                        self.covered.grow(i + 1);
                    }
                    self.covered.insert(i);
                }
            }
        }
        self.anchors.insert(index, cell);
        self.cursor = self.cursor.max(index + 1);
        Some((row, col))
    }

    /// Largest span no larger than requested whose footprint is free apart
    /// from the anchor. Columns are cut along the anchor row first, rows after.
    fn free_footprint(&self, row: u32, col: u32, row_span: u32, col_span: u32) -> (u32, u32) {
        let col_span = (1..col_span)
            .find(|&dc| self.is_taken(self.index(row, col + dc)))
            .unwrap_or(col_span);
        let row_span = (1..row_span)
            .find(|&dr| (col..col + col_span).any(|c| self.is_taken(self.index(row + dr, c))))
            .unwrap_or(row_span);
        (row_span, col_span)
    }

    /// Emit rows; covered and unplaced positions produce nothing.
    pub fn finish(self) -> Vec<Row> {
        let mut rows: Vec<Row> = (0..self.rows).map(|_| Row::default()).collect();
        for cell in self.anchors.into_values() {
            rows[cell.row as usize].cells.push(cell);
        }
        rows
    }
}

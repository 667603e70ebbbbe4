//! Grid placement of form rows.
//!
//! A [`FormGrid`] keeps a cursor ([`GridPosition`]) and places each row it is
//! given at the cursor, advancing the cursor as the active
//! [`LayoutStrategy`] dictates. Rows come in three shapes:
//!
//! - a label paired with a field,
//! - a solitary item,
//! - a separator spanning every column.
//!
//! Sub-forms are laid out in their own grid and then spliced into the parent
//! with [`FormGrid::absorb`], which replays the child's rows at the parent's
//! cursor. The child's own coordinates are discarded.
//!
//! ```
//! use horizon_forms_core::{FormGrid, FormRow, GridPosition, LayoutStrategy};
//!
//! let mut grid = FormGrid::new(LayoutStrategy::Paired);
//! grid.push(FormRow::Separator);
//! grid.push(FormRow::Separator);
//! assert_eq!(grid.cursor(), GridPosition::new(2, 0));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::widget::Element;

/// A cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct GridPosition {
    pub row: usize,
    pub column: usize,
}

impl GridPosition {
    /// The top-left cell.
    pub const ORIGIN: Self = Self { row: 0, column: 0 };

    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    fn down(self, rows: usize) -> Self {
        Self::new(self.row + rows, self.column)
    }

    fn right(self, columns: usize) -> Self {
        Self::new(self.row, self.column + columns)
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// How label/field pairs are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStrategy {
    /// Label and field side by side on one row.
    #[default]
    Paired,
    /// Label above its field.
    Stacked,
}

/// Cells occupied by a label/field pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairPlacement {
    pub label: GridPosition,
    pub field: GridPosition,
    pub next: GridPosition,
}

impl LayoutStrategy {
    /// Number of grid columns the strategy uses.
    pub fn column_count(self) -> usize {
        match self {
            Self::Paired => 2,
            Self::Stacked => 1,
        }
    }

    pub fn place_pair(self, at: GridPosition) -> PairPlacement {
        match self {
            Self::Paired => PairPlacement {
                label: at,
                field: at.right(1),
                next: at.down(1),
            },
            Self::Stacked => PairPlacement {
                label: at,
                field: at.down(1),
                next: at.down(2),
            },
        }
    }

    /// A solitary item: its cell and the next cursor.
    pub fn place_single(self, at: GridPosition) -> (GridPosition, GridPosition) {
        (at, at.down(1))
    }

    /// A separator: its cell, its column span and the next cursor.
    pub fn place_separator(self, at: GridPosition) -> (GridPosition, usize, GridPosition) {
        (at, self.column_count(), at.down(1))
    }
}

/// One unit of placement. The grid turns each row into cells at its cursor
/// using the active [`LayoutStrategy`].
#[derive(Debug, Clone)]
pub enum FormRow {
    /// Takes a `place_pair` slot: two cells side by side when paired, one
    /// above the other when stacked.
    LabelField { label: Element, field: Element },
    /// Takes one cell at the cursor.
    Spanning { item: Element },
    /// Spans the strategy's column count on a line of its own.
    Separator,
}

impl FormRow {
    pub fn has_label(&self) -> bool {
        matches!(self, FormRow::LabelField { .. })
    }

    /// The leading element of a pair.
    pub fn label(&self) -> Option<&Element> {
        match self {
            FormRow::LabelField { label, .. } => Some(label),
            _ => None,
        }
    }

    /// The trailing element of a pair. For attribute rows this is the
    /// field widget; for a nested section header it is a separator.
    pub fn field(&self) -> Option<&Element> {
        match self {
            FormRow::LabelField { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// An element at its final position.
#[derive(Debug, Clone, Copy)]
pub struct PlacedElement<'a> {
    pub position: GridPosition,
    pub column_span: usize,
    pub element: &'a Element,
}

static SEPARATOR: Element = Element::Separator;

#[derive(Debug, Clone)]
struct PlacedRow {
    row: FormRow,
    anchor: GridPosition,
}

/// Rows placed on a grid by a strategy-driven cursor.
#[derive(Debug, Clone)]
pub struct FormGrid {
    strategy: LayoutStrategy,
    cursor: GridPosition,
    rows: Vec<PlacedRow>,
}

impl FormGrid {
    /// An empty grid with its cursor at the origin.
    pub fn new(strategy: LayoutStrategy) -> Self {
        Self::starting_at(strategy, GridPosition::ORIGIN)
    }

    /// An empty grid with its cursor at `start`.
    pub fn starting_at(strategy: LayoutStrategy, start: GridPosition) -> Self {
        Self {
            strategy,
            cursor: start,
            rows: Vec::new(),
        }
    }

    pub fn strategy(&self) -> LayoutStrategy {
        self.strategy
    }

    /// Where the next row will go.
    pub fn cursor(&self) -> GridPosition {
        self.cursor
    }

    /// Places a row at the cursor and advances it. Returns the new cursor.
    pub fn push(&mut self, row: FormRow) -> GridPosition {
        let anchor = self.cursor;
        self.cursor = match &row {
            FormRow::LabelField { .. } => self.strategy.place_pair(anchor).next,
            FormRow::Spanning { .. } => self.strategy.place_single(anchor).1,
            FormRow::Separator => self.strategy.place_separator(anchor).2,
        };
        self.rows.push(PlacedRow { row, anchor });
        self.cursor
    }

    pub fn add_row(&mut self, label: Element, field: Element) -> GridPosition {
        self.push(FormRow::LabelField { label, field })
    }

    pub fn add_widget(&mut self, item: Element) -> GridPosition {
        self.push(FormRow::Spanning { item })
    }

    pub fn add_separator(&mut self) -> GridPosition {
        self.push(FormRow::Separator)
    }

    /// Replays every row of `child` at this grid's cursor, in order.
    pub fn absorb(&mut self, child: FormGrid) -> GridPosition {
        for placed in child.rows {
            self.push(placed.row);
        }
        self.cursor
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = &FormRow> {
        self.rows.iter().map(|placed| &placed.row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every element with its cell, in insertion order.
    pub fn elements(&self) -> Vec<PlacedElement<'_>> {
        let mut out = Vec::with_capacity(self.rows.len() * 2);
        for placed in &self.rows {
            match &placed.row {
                FormRow::LabelField { label, field } => {
                    let cells = self.strategy.place_pair(placed.anchor);
                    out.push(PlacedElement {
                        position: cells.label,
                        column_span: 1,
                        element: label,
                    });
                    out.push(PlacedElement {
                        position: cells.field,
                        column_span: 1,
                        element: field,
                    });
                }
                FormRow::Spanning { item } => out.push(PlacedElement {
                    position: self.strategy.place_single(placed.anchor).0,
                    column_span: 1,
                    element: item,
                }),
                FormRow::Separator => {
                    let (position, column_span, _) = self.strategy.place_separator(placed.anchor);
                    out.push(PlacedElement {
                        position,
                        column_span,
                        element: &SEPARATOR,
                    });
                }
            }
        }
        out
    }
}

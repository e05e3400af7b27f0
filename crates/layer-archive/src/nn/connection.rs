use serde::{Deserialize, Serialize};

/// Which input channels feed which output channels of a windowed layer.
///
/// Conceptually a `rows x cols` boolean matrix in row-major order, rows being input channels
/// and columns output channels. A table where every cell is connected holds no cells at all.
/// The `0 x 0` table stands for "every input is connected to every output" until a layer
/// constructor expands it to its channel counts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ConnectionTableData", into = "ConnectionTableData")]
pub struct ConnectionTable {
    rows: usize,
    cols: usize,
    cells: Cells,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Cells {
    #[default]
    All,
    Dense(Vec<bool>),
}

impl ConnectionTable {
    /// Fully connected table of the given dimensions.
    pub fn full(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: Cells::All,
        }
    }

    /// Build a table from a predicate over `(row, col)`.
    pub fn from_fn(rows: usize, cols: usize, connected: impl Fn(usize, usize) -> bool) -> Self {
        let cells = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| (row, col)))
            .map(|(row, col)| connected(row, col))
            .collect();

        Self::dense(rows, cols, cells)
    }

    /// Build a table from its row-major cells.
    ///
    /// Returns `None` when `connected` does not hold exactly `rows * cols` cells.
    pub fn from_cells(rows: usize, cols: usize, connected: Vec<bool>) -> Option<Self> {
        if rows.checked_mul(cols)? != connected.len() {
            return None;
        }

        Some(Self::dense(rows, cols, connected))
    }

    fn dense(rows: usize, cols: usize, cells: Vec<bool>) -> Self {
        let cells = if cells.iter().all(|cell| *cell) {
            Cells::All
        } else {
            Cells::Dense(cells)
        };

        Self { rows, cols, cells }
    }

    /// Number of rows (input channels).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (output channels).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major cells, or `None` when every cell is connected.
    pub fn cells(&self) -> Option<&[bool]> {
        match &self.cells {
            Cells::All => None,
            Cells::Dense(cells) => Some(cells),
        }
    }

    /// True for the `0 x 0` placeholder of a fully connected table.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 && self.cols == 0
    }

    /// True when every cell is connected.
    pub fn is_fully_connected(&self) -> bool {
        matches!(self.cells, Cells::All)
    }

    /// Whether input channel `row` feeds output channel `col`.
    ///
    /// Out of range positions are connected only in the empty placeholder table.
    pub fn is_connected(&self, row: usize, col: usize) -> bool {
        if self.is_empty() {
            return true;
        }
        if row >= self.rows || col >= self.cols {
            return false;
        }

        match &self.cells {
            Cells::All => true,
            Cells::Dense(cells) => cells[row * self.cols + col],
        }
    }
}

/// Configuration file layout of a [ConnectionTable]. Missing cells mean fully connected.
#[derive(Serialize, Deserialize)]
struct ConnectionTableData {
    rows: usize,
    cols: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    connected: Option<Vec<bool>>,
}

impl TryFrom<ConnectionTableData> for ConnectionTable {
    type Error = String;

    fn try_from(data: ConnectionTableData) -> Result<Self, Self::Error> {
        let ConnectionTableData {
            rows,
            cols,
            connected,
        } = data;

        match connected {
            None => Ok(Self::full(rows, cols)),
            Some(cells) => {
                let len = cells.len();
                Self::from_cells(rows, cols, cells).ok_or_else(|| {
                    format!("connection table is {rows}x{cols} but holds {len} cells")
                })
            }
        }
    }
}

impl From<ConnectionTable> for ConnectionTableData {
    fn from(table: ConnectionTable) -> Self {
        Self {
            rows: table.rows,
            cols: table.cols,
            connected: match table.cells {
                Cells::All => None,
                Cells::Dense(cells) => Some(cells),
            },
        }
    }
}

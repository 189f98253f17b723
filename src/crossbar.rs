//! Crossbar device matrices for two-level sub-functions.
//!
//! A crossbar realizes one level of the decomposition. Its layout is:
//!
//! ```text
//!                 inputs & complements        o0  not_o0  o1  not_o1 ...
//! IL            | 1 1 1 ... 1              |  0    0      0    0
//! minterm rows  | 1 at each literal column |  0    1 at not_<output>
//! not_o0        | 0 ...                    |  2    1      0    0
//! not_o1        | 0 ...                    |  0    0      3    1
//! ```
//!
//! Cell values: `0` is no device, `1` a device that is not read out, and `n >= 2`
//! a device whose sensed state drives output bit `n - 2` (see [`OutputBit`]).
//!
//! Rows and columns are addressed by label through a [`CrossbarIndex`]: product
//! labels (see [`Minterm::label`]) and signal names. The input line always sits
//! at row [`INPUT_LINE_ROW`] and has no label of its own, so any signal may be
//! named like it.

use std::fmt;
use std::ops::{Index, IndexMut};

use indexmap::IndexSet;
use log::debug;

use crate::error::{Result, SynthError};
use crate::function::{complement, Function, Minterm};
use crate::types::{Level, OutputBit};

/// Display name of the input-line row.
pub const INPUT_LINE: &str = "IL";

/// Position of the input-line row.
pub const INPUT_LINE_ROW: usize = 0;

/// Cell value of an empty intersection.
pub const NO_DEVICE: u32 = 0;

/// Cell value of a device that is not read out.
pub const DEVICE: u32 = 1;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}

/// Bijection between row/column positions and their labels.
///
/// Labelled rows start right after the input line.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CrossbarIndex {
    level: Level,
    rows: IndexSet<String>,
    columns: IndexSet<String>,
}

impl CrossbarIndex {
    /// Assigns positions to every label of `func`.
    ///
    /// Columns: inputs in declaration order, then each output followed by its
    /// complement. Rows: the input line, each distinct product in first-seen
    /// order, then each output complement.
    pub fn build(func: &Function, level: Level) -> Result<Self> {
        let mut index = Self {
            level,
            rows: IndexSet::new(),
            columns: IndexSet::new(),
        };

        for input in func.inputs() {
            index.insert(Axis::Column, input.clone())?;
        }
        for output in func.outputs() {
            index.insert(Axis::Column, output.clone())?;
            index.insert(Axis::Column, complement(output))?;
        }

        for minterm in func.distinct_minterms() {
            index.insert(Axis::Row, minterm.label())?;
        }
        for output in func.outputs() {
            index.insert(Axis::Row, complement(output))?;
        }

        debug!("index of level {}: rows = {:?}", level, index.rows);
        debug!("index of level {}: columns = {:?}", level, index.columns);
        Ok(index)
    }

    fn insert(&mut self, axis: Axis, label: String) -> Result<()> {
        let set = match axis {
            Axis::Row => &mut self.rows,
            Axis::Column => &mut self.columns,
        };
        if set.contains(&label) {
            return Err(SynthError::DuplicateLabel {
                label,
                axis,
                level: self.level,
            });
        }
        set.insert(label);
        Ok(())
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn num_rows(&self) -> usize {
        1 + self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn input_line(&self) -> usize {
        INPUT_LINE_ROW
    }

    /// Position of a labelled row. The input line is not looked up by label.
    pub fn row(&self, label: &str) -> Option<usize> {
        self.rows.get_index_of(label).map(|i| i + 1)
    }

    pub fn column(&self, label: &str) -> Option<usize> {
        self.columns.get_index_of(label)
    }

    pub fn row_label(&self, row: usize) -> Option<&str> {
        match row.checked_sub(1) {
            None => Some(INPUT_LINE),
            Some(i) => self.rows.get_index(i).map(String::as_str),
        }
    }

    pub fn column_label(&self, column: usize) -> Option<&str> {
        self.columns.get_index(column).map(String::as_str)
    }

    /// Row labels in position order, starting with [`INPUT_LINE`].
    pub fn rows(&self) -> impl Iterator<Item = &str> {
        std::iter::once(INPUT_LINE).chain(self.rows.iter().map(String::as_str))
    }

    /// Column labels in position order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Like [`row`][Self::row], but a missing label is an error.
    pub fn require_row(&self, label: &str) -> Result<usize> {
        self.row(label).ok_or_else(|| SynthError::MissingLabel {
            label: label.to_string(),
            axis: Axis::Row,
            level: self.level,
        })
    }

    /// Like [`column`][Self::column], but a missing label is an error.
    pub fn require_column(&self, label: &str) -> Result<usize> {
        self.column(label).ok_or_else(|| SynthError::MissingLabel {
            label: label.to_string(),
            axis: Axis::Column,
            level: self.level,
        })
    }

    /// Row of a minterm, found by its product label.
    pub fn minterm_row(&self, minterm: &Minterm) -> Result<usize> {
        self.require_row(&minterm.label())
    }
}

/// Rectangular grid of device cells, stored row-major.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Matrix {
    rows: usize,
    columns: usize,
    cells: Vec<u32>,
}

impl Matrix {
    /// Creates an empty (device-free) matrix.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![NO_DEVICE; rows * columns],
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns
    }

    /// Number of cells, `rows * columns`.
    pub fn area(&self) -> usize {
        self.rows * self.columns
    }

    pub fn row(&self, row: usize) -> &[u32] {
        &self.cells[row * self.columns..(row + 1) * self.columns]
    }

    /// Iterates over rows as slices.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[u32]> {
        // `max(1)` keeps `chunks` valid for zero-width matrices.
        self.cells.chunks(self.columns.max(1)).take(self.rows)
    }

    /// Number of devices (non-zero cells).
    pub fn num_devices(&self) -> usize {
        self.cells.iter().filter(|&&c| c != NO_DEVICE).count()
    }

    /// Position of the cell carrying `bit`, if any.
    pub fn find_output(&self, bit: OutputBit) -> Option<(usize, usize)> {
        let pos = self.cells.iter().position(|&c| c == bit.cell())?;
        Some((pos / self.columns, pos % self.columns))
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = u32;

    fn index(&self, (row, column): (usize, usize)) -> &Self::Output {
        assert!(row < self.rows && column < self.columns);
        &self.cells[row * self.columns + column]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, column): (usize, usize)) -> &mut Self::Output {
        assert!(row < self.rows && column < self.columns);
        &mut self.cells[row * self.columns + column]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.iter_rows() {
            let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            writeln!(f, "{}", cells.join("\t"))?;
        }
        Ok(())
    }
}

/// A synthesized crossbar: its label index and device matrix.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Crossbar {
    index: CrossbarIndex,
    matrix: Matrix,
}

impl Crossbar {
    /// Builds the index and populates the device matrix for `func`.
    pub fn synthesize(func: &Function, level: Level) -> Result<Self> {
        let index = CrossbarIndex::build(func, level)?;
        let rows = 1 + func.num_distinct_minterms() + func.num_outputs();
        let columns = func.num_inputs() + 2 * func.num_outputs();
        debug_assert_eq!(index.num_rows(), rows);
        debug_assert_eq!(index.num_columns(), columns);

        let mut crossbar = Self {
            index,
            matrix: Matrix::new(rows, columns),
        };
        crossbar.populate(func)?;
        debug!("crossbar of level {} ({}x{}):\n{}", level, rows, columns, crossbar.matrix);
        Ok(crossbar)
    }

    fn populate(&mut self, func: &Function) -> Result<()> {
        let index = &self.index;
        let matrix = &mut self.matrix;

        // Input line
        let il = index.input_line();
        for input in func.inputs() {
            matrix[(il, index.require_column(input)?)] = DEVICE;
        }

        // Minterm rows
        for (output, minterm) in func.entries() {
            if minterm.is_empty() {
                return Err(SynthError::EmptyMinterm {
                    output: output.to_string(),
                });
            }
            let row = index.minterm_row(minterm)?;
            matrix[(row, index.require_column(&complement(output))?)] = DEVICE;
            for literal in minterm.literals() {
                matrix[(row, index.require_column(literal)?)] = DEVICE;
            }
        }

        // Output rows
        for (bit, output) in func.outputs().iter().enumerate() {
            let bit = OutputBit::new(bit as u32);
            let not_output = complement(output);
            let row = index.require_row(&not_output)?;
            matrix[(row, index.require_column(&not_output)?)] = DEVICE;
            matrix[(row, index.require_column(output)?)] = bit.cell();
        }

        Ok(())
    }

    pub fn index(&self) -> &CrossbarIndex {
        &self.index
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn level(&self) -> Level {
        self.index.level()
    }

    pub fn height(&self) -> usize {
        self.matrix.num_rows()
    }

    pub fn width(&self) -> usize {
        self.matrix.num_columns()
    }

    pub fn num_devices(&self) -> usize {
        self.matrix.num_devices()
    }

    pub fn area(&self) -> usize {
        self.matrix.area()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    fn xnor() -> Function {
        let mut f = Function::default();
        f.add_inputs(["a", "not_a", "b", "not_b"]);
        f.add_output("z");
        f.add_minterm("z", Minterm::new(["a", "b"]));
        f.add_minterm("z", Minterm::new(["not_a", "not_b"]));
        f
    }

    #[test]
    fn test_index_order() {
        let index = CrossbarIndex::build(&xnor(), Level::new(1)).unwrap();
        assert_eq!(
            index.columns().collect::<Vec<_>>(),
            vec!["a", "not_a", "b", "not_b", "z", "not_z"]
        );
        assert_eq!(
            index.rows().collect::<Vec<_>>(),
            vec![INPUT_LINE, "a*b", "not_a*not_b", "not_z"]
        );
    }

    fn assert_bijection(index: &CrossbarIndex) {
        assert_eq!(index.row_label(index.input_line()), Some(INPUT_LINE));
        for pos in 1..index.num_rows() {
            let label = index.row_label(pos).unwrap();
            assert_eq!(index.row(label), Some(pos));
        }
        for pos in 0..index.num_columns() {
            let label = index.column_label(pos).unwrap();
            assert_eq!(index.column(label), Some(pos));
        }
        assert_eq!(index.row_label(index.num_rows()), None);
        assert_eq!(index.column_label(index.num_columns()), None);
        assert_eq!(index.rows().count(), index.num_rows());
        assert_eq!(index.columns().count(), index.num_columns());
    }

    #[test]
    fn test_index_bijection() {
        assert_bijection(&CrossbarIndex::build(&xnor(), Level::new(1)).unwrap());
    }

    #[test]
    fn test_index_bijection_shared_product() {
        let mut f = Function::default();
        f.add_inputs(["a", "b", "c", "not_a", "not_b", "not_c"]);
        f.add_outputs(["x", "y"]);
        f.add_minterm("x", Minterm::new(["a", "b"]));
        f.add_minterm("x", Minterm::new(["not_c"]));
        f.add_minterm("y", Minterm::new(["a", "b"]));
        f.add_minterm("y", Minterm::new(["c", "not_a"]));

        let index = CrossbarIndex::build(&f, Level::new(2)).unwrap();
        assert_eq!(index.num_rows(), 1 + 3 + 2);
        assert_eq!(index.num_columns(), 6 + 4);
        assert_bijection(&index);
    }

    #[test]
    fn test_input_named_like_input_line() {
        let mut f = Function::default();
        f.add_inputs(["IL", "b", "not_IL", "not_b"]);
        f.add_output("z");
        f.add_minterm("z", Minterm::new(["IL"]));
        f.add_minterm("z", Minterm::new(["b"]));

        let xbar = Crossbar::synthesize(&f, Level::new(1)).unwrap();
        let index = xbar.index();
        assert_eq!(
            index.rows().collect::<Vec<_>>(),
            vec![INPUT_LINE, "IL", "b", "not_z"]
        );
        assert_eq!(index.row("IL"), Some(1));
        assert_bijection(index);

        let m = xbar.matrix();
        assert_eq!(m.row(INPUT_LINE_ROW), &[1, 1, 1, 1, 0, 0]);
        assert_eq!(m.row(1), &[1, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_duplicate_products_share_a_row() {
        let mut f = Function::default();
        f.add_inputs(["a", "not_a", "b", "not_b"]);
        f.add_outputs(["x", "y"]);
        f.add_minterm("x", Minterm::new(["a", "b"]));
        f.add_minterm("y", Minterm::new(["a", "b"]));

        let xbar = Crossbar::synthesize(&f, Level::new(1)).unwrap();
        assert_eq!(xbar.height(), 1 + 1 + 2);
        let row = xbar.index().row("a*b").unwrap();
        // Both output complement columns are driven by the shared row.
        assert_eq!(xbar.matrix()[(row, xbar.index().column("not_x").unwrap())], DEVICE);
        assert_eq!(xbar.matrix()[(row, xbar.index().column("not_y").unwrap())], DEVICE);
    }

    #[test]
    fn test_xnor_matrix() {
        let xbar = Crossbar::synthesize(&xnor(), Level::new(1)).unwrap();
        assert_eq!(xbar.height(), 4);
        assert_eq!(xbar.width(), 6);
        assert_eq!(xbar.num_devices(), 12);
        assert_eq!(xbar.area(), 24);

        let m = xbar.matrix();
        assert_eq!(m.row(0), &[1, 1, 1, 1, 0, 0]);
        assert_eq!(m.row(1), &[1, 0, 1, 0, 0, 1]);
        assert_eq!(m.row(2), &[0, 1, 0, 1, 0, 1]);
        assert_eq!(m.row(3), &[0, 0, 0, 0, 2, 1]);
    }

    #[test]
    fn test_output_encoding() {
        let mut f = Function::default();
        f.add_inputs(["a", "not_a"]);
        f.add_outputs(["p", "q", "r"]);
        f.add_minterm("p", Minterm::new(["a"]));
        f.add_minterm("q", Minterm::new(["not_a"]));
        f.add_minterm("r", Minterm::new(["a"]));

        let xbar = Crossbar::synthesize(&f, Level::new(3)).unwrap();
        for (bit, output) in f.outputs().iter().enumerate() {
            let bit = OutputBit::new(bit as u32);
            let expected = (
                xbar.index().row(&complement(output)).unwrap(),
                xbar.index().column(output).unwrap(),
            );
            assert_eq!(xbar.matrix().find_output(bit), Some(expected));
            let count = xbar.matrix().iter_rows().flatten().filter(|&&c| c == bit.cell()).count();
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn test_input_line_row() {
        let xbar = Crossbar::synthesize(&xnor(), Level::new(1)).unwrap();
        let il = xbar.index().input_line();
        assert_eq!(il, INPUT_LINE_ROW);
        assert_eq!(xbar.index().row(INPUT_LINE), None);
        for (col, &cell) in xbar.matrix().row(il).iter().enumerate() {
            let label = xbar.index().column_label(col).unwrap();
            let is_input = xnor().is_input(label);
            assert_eq!(cell, if is_input { DEVICE } else { NO_DEVICE });
        }
    }

    #[test]
    fn test_undeclared_literal_is_missing_label() {
        let mut f = xnor();
        f.add_minterm("z", Minterm::new(["a", "q"]));
        let err = Crossbar::synthesize(&f, Level::new(1)).unwrap_err();
        assert_eq!(
            err,
            SynthError::MissingLabel {
                label: "q".to_string(),
                axis: Axis::Column,
                level: Level::new(1),
            }
        );
    }

    #[test]
    fn test_empty_minterm_fails() {
        let mut f = xnor();
        f.add_minterm("z", Minterm::new(Vec::<String>::new()));
        let err = Crossbar::synthesize(&f, Level::new(1)).unwrap_err();
        assert_eq!(err, SynthError::EmptyMinterm { output: "z".to_string() });
    }

    #[test]
    fn test_label_collision_is_reported() {
        let mut f = Function::default();
        f.add_inputs(["z", "not_z"]);
        f.add_output("z");
        f.add_minterm("z", Minterm::new(["not_z"]));
        let err = CrossbarIndex::build(&f, Level::new(1)).unwrap_err();
        assert_eq!(
            err,
            SynthError::DuplicateLabel {
                label: "z".to_string(),
                axis: Axis::Column,
                level: Level::new(1),
            }
        );
    }

    #[test]
    fn test_matrix_display() {
        let mut m = Matrix::new(2, 3);
        m[(0, 1)] = DEVICE;
        m[(1, 2)] = 2;
        assert_eq!(m.to_string(), "0\t1\t0\n0\t0\t2\n");
        assert_eq!(m.num_devices(), 2);
    }
}

use indexmap::IndexMap;
use prec_core::{ErrorInfo, PrecError};
use serde::{Deserialize, Serialize};

use crate::expr::CompiledExpr;

/// A single named column.
///
/// Numeric columns carry identifiers, masses and weights; text columns carry
/// labels such as the originating sample name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Column {
    /// Floating point values.
    Float(Vec<f64>),
    /// String labels.
    Text(Vec<String>),
}

impl Column {
    /// Number of entries in the column.
    pub fn len(&self) -> usize {
        match self {
            Column::Float(values) => values.len(),
            Column::Text(values) => values.len(),
        }
    }

    /// Returns true when the column has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> &'static str {
        match self {
            Column::Float(_) => "float",
            Column::Text(_) => "text",
        }
    }

    fn take(&self, mask: &[bool]) -> Column {
        match self {
            Column::Float(values) => Column::Float(
                values
                    .iter()
                    .zip(mask)
                    .filter_map(|(v, keep)| keep.then_some(*v))
                    .collect(),
            ),
            Column::Text(values) => Column::Text(
                values
                    .iter()
                    .zip(mask)
                    .filter_map(|(v, keep)| keep.then(|| v.clone()))
                    .collect(),
            ),
        }
    }

    fn extend(&mut self, other: &Column) -> bool {
        match (self, other) {
            (Column::Float(a), Column::Float(b)) => {
                a.extend_from_slice(b);
                true
            }
            (Column::Text(a), Column::Text(b)) => {
                a.extend(b.iter().cloned());
                true
            }
            _ => false,
        }
    }
}

/// Ordered, in-memory, column-oriented table.
///
/// All columns share the same length. Column order is insertion order and is
/// preserved by [`Table::select`] and [`Table::concat`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "TablePayload", into = "TablePayload")]
pub struct Table {
    columns: IndexMap<String, Column>,
    n_rows: usize,
}

#[derive(Serialize, Deserialize)]
struct TablePayload {
    columns: IndexMap<String, Column>,
}

impl TryFrom<TablePayload> for Table {
    type Error = PrecError;

    fn try_from(payload: TablePayload) -> Result<Self, Self::Error> {
        Table::from_columns(payload.columns)
    }
}

impl From<Table> for TablePayload {
    fn from(table: Table) -> Self {
        TablePayload {
            columns: table.columns,
        }
    }
}

pub(crate) fn data_error(code: &str, message: impl Into<String>) -> PrecError {
    PrecError::Data(ErrorInfo::new(code, message))
}

fn unknown_column(name: &str) -> PrecError {
    PrecError::Data(
        ErrorInfo::new("unknown-column", format!("column '{name}' not found"))
            .with_context("column", name),
    )
}

impl Table {
    /// Creates an empty table with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from named columns, checking that lengths agree.
    pub fn from_columns(columns: IndexMap<String, Column>) -> Result<Self, PrecError> {
        let mut table = Table::new();
        for (name, column) in columns {
            table.insert(name, column)?;
        }
        Ok(table)
    }

    /// Inserts (or replaces) a column.
    pub fn insert(&mut self, name: impl Into<String>, column: Column) -> Result<(), PrecError> {
        let name = name.into();
        let replacing_only = self.columns.len() == 1 && self.columns.contains_key(&name);
        if !self.columns.is_empty() && !replacing_only && column.len() != self.n_rows {
            return Err(PrecError::Data(
                ErrorInfo::new("column-length", "column length does not match table")
                    .with_context("column", name)
                    .with_context("expected", self.n_rows.to_string())
                    .with_context("found", column.len().to_string()),
            ));
        }
        self.n_rows = column.len();
        self.columns.insert(name, column);
        Ok(())
    }

    /// Inserts (or replaces) a numeric column.
    pub fn insert_float(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), PrecError> {
        self.insert(name, Column::Float(values))
    }

    /// Inserts (or replaces) a text column.
    pub fn insert_text(
        &mut self,
        name: impl Into<String>,
        values: Vec<String>,
    ) -> Result<(), PrecError> {
        self.insert(name, Column::Text(values))
    }

    /// Builder-style variant of [`Table::insert_float`].
    pub fn with_float(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self, PrecError> {
        self.insert_float(name, values)?;
        Ok(self)
    }

    /// Builder-style variant of [`Table::insert_text`].
    pub fn with_text(mut self, name: impl Into<String>, values: Vec<String>) -> Result<Self, PrecError> {
        self.insert_text(name, values)?;
        Ok(self)
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Returns true when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Column names in table order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    /// Returns true when a column with this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Returns the named column.
    pub fn column(&self, name: &str) -> Result<&Column, PrecError> {
        self.columns.get(name).ok_or_else(|| unknown_column(name))
    }

    /// Returns the named numeric column.
    pub fn float(&self, name: &str) -> Result<&[f64], PrecError> {
        match self.column(name)? {
            Column::Float(values) => Ok(values),
            other => Err(column_type(name, "float", other)),
        }
    }

    /// Returns the named text column.
    pub fn text(&self, name: &str) -> Result<&[String], PrecError> {
        match self.column(name)? {
            Column::Text(values) => Ok(values),
            other => Err(column_type(name, "text", other)),
        }
    }

    /// Returns a read-only view of row `index`.
    pub fn row(&self, index: usize) -> RowView<'_> {
        RowView { table: self, index }
    }

    /// Keeps the rows whose mask entry is true.
    pub fn filter(&self, mask: &[bool]) -> Result<Table, PrecError> {
        if mask.len() != self.n_rows {
            return Err(data_error(
                "mask-length",
                format!("mask has {} entries, table has {} rows", mask.len(), self.n_rows),
            ));
        }
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| (name.clone(), column.take(mask)))
            .collect::<IndexMap<_, _>>();
        let n_rows = mask.iter().filter(|keep| **keep).count();
        Ok(Table { columns, n_rows })
    }

    /// Projects the table onto the listed columns, in the listed order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table, PrecError> {
        let mut columns = IndexMap::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            columns.insert(name.to_string(), self.column(name)?.clone());
        }
        Ok(Table {
            columns,
            n_rows: if names.is_empty() { 0 } else { self.n_rows },
        })
    }

    /// Row-wise concatenation. Every table must carry the same column names and types.
    pub fn concat(tables: &[Table]) -> Result<Table, PrecError> {
        let Some((first, rest)) = tables.split_first() else {
            return Ok(Table::new());
        };
        let mut out = first.clone();
        for table in rest {
            if table.columns.len() != out.columns.len() {
                return Err(data_error(
                    "concat-columns",
                    "tables to concatenate have different column sets",
                ));
            }
            for (name, column) in out.columns.iter_mut() {
                let other = table.column(name)?;
                if !column.extend(other) {
                    return Err(column_type(name, column.kind(), other));
                }
            }
            out.n_rows += table.n_rows;
        }
        Ok(out)
    }

    /// Evaluates a compiled expression for every row.
    pub fn eval(&self, expr: &CompiledExpr) -> Result<Vec<f64>, PrecError> {
        let columns = expr
            .required_columns
            .iter()
            .map(|name| self.float(name))
            .collect::<Result<Vec<_>, _>>()?;
        if columns.is_empty() {
            return Ok(vec![expr.eval_row(&[]); self.n_rows]);
        }
        Ok(expr.eval_bulk(&columns))
    }

    /// Evaluates a boolean expression; a row passes when the value is positive.
    pub fn mask(&self, expr: &CompiledExpr) -> Result<Vec<bool>, PrecError> {
        Ok(self.eval(expr)?.into_iter().map(|v| v > 0.0).collect())
    }

    /// Parses `expr` and keeps the rows for which it holds.
    pub fn query(&self, expr: &str) -> Result<Table, PrecError> {
        let compiled = CompiledExpr::compile(expr)?;
        let mask = self.mask(&compiled)?;
        self.filter(&mask)
    }
}

fn column_type(name: &str, expected: &str, found: &Column) -> PrecError {
    PrecError::Data(
        ErrorInfo::new("column-type", format!("column '{name}' is not a {expected} column"))
            .with_context("column", name)
            .with_context("found", found.kind()),
    )
}

/// Borrowed view of one table row, handed to per-row weight readers.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> RowView<'a> {
    /// Index of the row within its table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Numeric value of `column` in this row.
    pub fn get(&self, column: &str) -> Result<f64, PrecError> {
        let values = self.table.float(column)?;
        values.get(self.index).copied().ok_or_else(|| {
            data_error(
                "row-index",
                format!("row {} out of range for column '{column}'", self.index),
            )
        })
    }

    /// Text value of `column` in this row.
    pub fn label(&self, column: &str) -> Result<&'a str, PrecError> {
        let values = self.table.text(column)?;
        values.get(self.index).map(String::as_str).ok_or_else(|| {
            data_error(
                "row-index",
                format!("row {} out of range for column '{column}'", self.index),
            )
        })
    }
}

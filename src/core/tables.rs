//! In-memory reference tables (the `REF_*` sheets of the tariff workbook).

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The six sheets a reference workbook must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceSheet {
    /// Local distribution tolls (`tf`, `tv`).
    Local,
    /// Regasification tolls.
    Regas,
    /// Ministry surcharge.
    Cargo,
    /// Transport tolls.
    Transporte,
    Multiplicadores,
    Rules,
}

impl ReferenceSheet {
    pub const ALL: [ReferenceSheet; 6] = [
        Self::Local,
        Self::Regas,
        Self::Cargo,
        Self::Transporte,
        Self::Multiplicadores,
        Self::Rules,
    ];

    /// Exact sheet name in the workbook.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            Self::Local => "REF_peajes_local",
            Self::Regas => "REF_peajes_regas",
            Self::Cargo => "REF_cargo_ministerio",
            Self::Transporte => "REF_peajes_transporte",
            Self::Multiplicadores => "REF_multiplicadores",
            Self::Rules => "REF_rules_conceptos",
        }
    }
}

impl std::fmt::Display for ReferenceSheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sheet_name())
    }
}

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(Decimal),
    Bool(bool),
}

impl Cell {
    /// Whether this cell equals a join key such as a tariff class.
    ///
    /// Text compares trimmed; numbers compare by their normalized rendering,
    /// so a numeric `31` cell matches the key `"31"`.
    pub fn matches_key(&self, key: &str) -> bool {
        let key = key.trim();
        match self {
            Cell::Text(s) => s.trim() == key,
            Cell::Number(n) => n.normalize().to_string() == key,
            Cell::Empty | Cell::Bool(_) => false,
        }
    }

    /// Numeric value of the cell.
    ///
    /// `None` for blank cells, `Some(Err(text))` when the cell holds
    /// something that is not a number.
    pub fn as_decimal(&self) -> Option<Result<Decimal, String>> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(Ok(*n)),
            Cell::Text(s) => {
                let t = s.trim();
                if t.is_empty() {
                    return None;
                }
                Some(
                    Decimal::from_str(t)
                        .or_else(|_| Decimal::from_scientific(t))
                        .map_err(|_| s.clone()),
                )
            }
            Cell::Bool(b) => Some(Err(b.to_string())),
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<Decimal> for Cell {
    fn from(n: Decimal) -> Self {
        Cell::Number(n)
    }
}

/// A sheet: named columns taken from the first row, then data rows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; short rows are padded with [`Cell::Empty`].
    pub fn with_row(mut self, cells: Vec<Cell>) -> Self {
        self.push_row(cells);
        self
    }

    pub fn push_row(&mut self, mut cells: Vec<Cell>) {
        if cells.len() < self.columns.len() {
            cells.resize(self.columns.len(), Cell::Empty);
        }
        self.rows.push(cells);
    }

    /// Index of a column by exact (trimmed) header name.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// First column of `candidates` present in this table.
    pub fn first_present<'a>(&self, candidates: &'a [String]) -> Option<(&'a str, usize)> {
        candidates
            .iter()
            .find_map(|c| self.column_index(c).map(|idx| (c.as_str(), idx)))
    }

    /// First row whose `key_column` matches `key`.
    pub fn find_row(&self, key_column: usize, key: &str) -> Option<&[Cell]> {
        self.rows
            .iter()
            .find(|row| row.get(key_column).is_some_and(|c| c.matches_key(key)))
            .map(Vec::as_slice)
    }

    pub fn first_row(&self) -> Option<&[Cell]> {
        self.rows.first().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The full set of reference sheets, loaded once per validation run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReferenceTables {
    pub local: Table,
    pub regas: Table,
    pub cargo: Table,
    pub transporte: Table,
    pub multiplicadores: Table,
    pub rules: Table,
}

impl ReferenceTables {
    /// Empty tables, each carrying its sheet name.
    pub fn empty() -> Self {
        let named = |s: ReferenceSheet| Table {
            name: s.sheet_name().to_string(),
            ..Table::default()
        };
        Self {
            local: named(ReferenceSheet::Local),
            regas: named(ReferenceSheet::Regas),
            cargo: named(ReferenceSheet::Cargo),
            transporte: named(ReferenceSheet::Transporte),
            multiplicadores: named(ReferenceSheet::Multiplicadores),
            rules: named(ReferenceSheet::Rules),
        }
    }

    pub fn get(&self, sheet: ReferenceSheet) -> &Table {
        match sheet {
            ReferenceSheet::Local => &self.local,
            ReferenceSheet::Regas => &self.regas,
            ReferenceSheet::Cargo => &self.cargo,
            ReferenceSheet::Transporte => &self.transporte,
            ReferenceSheet::Multiplicadores => &self.multiplicadores,
            ReferenceSheet::Rules => &self.rules,
        }
    }

    pub fn get_mut(&mut self, sheet: ReferenceSheet) -> &mut Table {
        match sheet {
            ReferenceSheet::Local => &mut self.local,
            ReferenceSheet::Regas => &mut self.regas,
            ReferenceSheet::Cargo => &mut self.cargo,
            ReferenceSheet::Transporte => &mut self.transporte,
            ReferenceSheet::Multiplicadores => &mut self.multiplicadores,
            ReferenceSheet::Rules => &mut self.rules,
        }
    }

    /// Replace one sheet.
    pub fn with_table(mut self, sheet: ReferenceSheet, table: Table) -> Self {
        *self.get_mut(sheet) = table;
        self
    }
}

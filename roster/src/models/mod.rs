//! Domain models shared by every pass.
//!
//! - [`Table`] - ordered records sharing one column schema, plus on-disk format
//! - [`Record`] - one player row
//! - [`TableFormat`] - delimiter, line ending, BOM and source encoding
//! - [`Span`] - inclusive integer range, used for rating ranges and random deltas
//! - [`PositionFamily`] - attacking / defensive / midfield / goalkeeper

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{FormatError, ValueError};

// =============================================================================
// Ratings
// =============================================================================

/// Lowest rating any pass may produce.
pub const RATING_MIN: i32 = 51;

/// Highest rating any pass may produce.
pub const RATING_MAX: i32 = 99;

/// Clamp a rating into `RATING_MIN..=RATING_MAX`.
pub fn clamp_rating(value: i32) -> i32 {
    value.clamp(RATING_MIN, RATING_MAX)
}

/// Parse an integer cell. Surrounding whitespace is ignored.
pub fn parse_int(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

// =============================================================================
// Span
// =============================================================================

/// Inclusive integer range, serialized as a two-element array `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span(pub i32, pub i32);

impl Span {
    pub fn lo(&self) -> i32 {
        self.0.min(self.1)
    }

    pub fn hi(&self) -> i32 {
        self.0.max(self.1)
    }

    pub fn contains(&self, value: i32) -> bool {
        (self.lo()..=self.hi()).contains(&value)
    }

    /// Clamp `value` into the span.
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.lo(), self.hi())
    }

    /// Draw a uniform value from the span.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        rng.gen_range(self.lo()..=self.hi())
    }

    /// True when the spans share at least one value.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.lo() <= other.hi() && other.lo() <= self.hi()
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.0, self.1)
    }
}

// =============================================================================
// Position Family
// =============================================================================

/// Coarse grouping of position codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionFamily {
    Attacking,
    Defensive,
    Midfield,
    Goalkeeper,
}

impl PositionFamily {
    pub fn label(&self) -> &'static str {
        match self {
            PositionFamily::Attacking => "attacking",
            PositionFamily::Defensive => "defensive",
            PositionFamily::Midfield => "midfield",
            PositionFamily::Goalkeeper => "goalkeeper",
        }
    }
}

impl std::fmt::Display for PositionFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Table Format
// =============================================================================

/// Line terminator found in the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

/// How a table was laid out on disk, so that a save reproduces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableFormat {
    pub delimiter: u8,
    pub line_ending: LineEnding,
    /// Source started with a UTF-8 byte order mark
    pub bom: bool,
    /// Encoding the source was decoded from (output is always UTF-8)
    pub encoding: String,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            delimiter: b',',
            line_ending: LineEnding::Lf,
            bom: false,
            encoding: "utf-8".to_string(),
        }
    }
}

// =============================================================================
// Record
// =============================================================================

/// One row of the table. Values are positional, indexed like [`Table::headers`].
#[derive(Debug, Clone, Eq)]
pub struct Record {
    values: Vec<String>,
    line: usize,
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Record {
    pub fn new(values: Vec<String>, line: usize) -> Self {
        Self { values, line }
    }

    /// Value at column index `col`.
    pub fn get(&self, col: usize) -> &str {
        self.values.get(col).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, col: usize, value: impl Into<String>) {
        if let Some(slot) = self.values.get_mut(col) {
            *slot = value.into();
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// 1-based line in the source file, used for error context.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Parse column `col` as an integer, failing with context.
    pub fn int(&self, col: usize, column_name: &str) -> Result<i32, ValueError> {
        let raw = self.get(col);
        parse_int(raw).ok_or_else(|| {
            ValueError::new(self.line, "not an integer")
                .with_column(column_name)
                .with_value(raw)
        })
    }
}

// =============================================================================
// Table
// =============================================================================

/// Ordered records sharing an identical, ordered column schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    records: Vec<Record>,
    format: TableFormat,
}

impl Table {
    /// Build a table from a header and rows.
    ///
    /// Rows are numbered as if they followed the header directly (line 2, 3, ...).
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, FormatError> {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, values)| Record::new(values, i + 2))
            .collect();
        Self::from_records(headers, records, TableFormat::default())
    }

    /// Build a table from records, checking the schema invariant.
    pub fn from_records(
        headers: Vec<String>,
        records: Vec<Record>,
        format: TableFormat,
    ) -> Result<Self, FormatError> {
        if headers.is_empty() {
            return Err(FormatError::MissingHeader);
        }
        for (i, header) in headers.iter().enumerate() {
            if headers[..i].contains(header) {
                return Err(FormatError::DuplicateColumn(header.clone()));
            }
        }
        for record in &records {
            if record.values.len() != headers.len() {
                return Err(FormatError::FieldCount {
                    line: record.line as u64,
                    expected: headers.len(),
                    found: record.values.len(),
                });
            }
        }
        Ok(Self { headers, records, format })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn format(&self) -> &TableFormat {
        &self.format
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of column `name`, if present.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of column `name`, failing when the pass cannot run without it.
    pub fn column(&self, name: &str) -> Result<usize, FormatError> {
        self.find_column(name)
            .ok_or_else(|| FormatError::MissingColumn(name.to_string()))
    }

    /// Index of column `name`, appending it with empty cells when absent.
    pub fn add_column(&mut self, name: &str) -> usize {
        if let Some(col) = self.find_column(name) {
            return col;
        }
        self.headers.push(name.to_string());
        for record in &mut self.records {
            record.values.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Value of `column` in record `row`, `None` if either is absent.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.find_column(column)?;
        self.records.get(row).map(|r| r.get(col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_table_rejects_short_row() {
        let err = Table::new(row(&["a", "b"]), vec![row(&["1", "2"]), row(&["3"])]).unwrap_err();
        assert_eq!(err, FormatError::FieldCount { line: 3, expected: 2, found: 1 });
    }

    #[test]
    fn test_table_rejects_duplicate_header() {
        let err = Table::new(row(&["a", "a"]), vec![]).unwrap_err();
        assert_eq!(err, FormatError::DuplicateColumn("a".into()));
    }

    #[test]
    fn test_column_lookup() {
        let table = Table::new(row(&["姓名", "综合能力"]), vec![row(&["孟夜", "90"])]).unwrap();
        assert_eq!(table.column("综合能力").unwrap(), 1);
        assert_eq!(table.value(0, "姓名"), Some("孟夜"));
        assert!(matches!(table.column("速度"), Err(FormatError::MissingColumn(_))));
    }

    #[test]
    fn test_add_column_appends_once() {
        let mut table = Table::new(row(&["姓名"]), vec![row(&["孟夜"]), row(&["杨林"])]).unwrap();
        assert_eq!(table.add_column("身价"), 1);
        assert_eq!(table.add_column("身价"), 1);
        assert_eq!(table.headers(), &["姓名", "身价"]);
        assert_eq!(table.value(1, "身价"), Some(""));
        assert!(table.records().iter().all(|r| r.values().len() == 2));
    }

    #[test]
    fn test_record_int_error_has_context() {
        let record = Record::new(row(&["x", "abc"]), 7);
        let err = record.int(1, "综合能力").unwrap_err();
        assert_eq!(err.line, 7);
        assert_eq!(err.value.as_deref(), Some("abc"));
    }

    #[test]
    fn test_span_draw_is_inclusive() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let span = Span(-2, 4);
        let draws: Vec<i32> = (0..500).map(|_| span.draw(&mut rng)).collect();
        assert!(draws.iter().all(|d| span.contains(*d)));
        assert!(draws.contains(&-2));
        assert!(draws.contains(&4));
    }

    #[test]
    fn test_span_overlaps() {
        assert!(Span(92, 99).overlaps(&Span(89, 94)));
        assert!(!Span(90, 95).overlaps(&Span(80, 88)));
    }

    #[test]
    fn test_clamp_rating() {
        assert_eq!(clamp_rating(120), RATING_MAX);
        assert_eq!(clamp_rating(3), RATING_MIN);
        assert_eq!(clamp_rating(77), 77);
    }
}

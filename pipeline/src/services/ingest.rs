//! Table ingestion service
//!
//! Owns the `write_table` capability (create-or-replace persistence of a
//! column-typed row set) and the raw-data loader that turns a directory of
//! CSV files into database tables, one table per file.

use std::path::{Path, PathBuf};
use std::time::Instant;

use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};

/// SQLite column affinity for a written table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    fn as_sql(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

/// A single nullable cell value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// Typed column definition
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

/// A column-typed, row-major table ready to be persisted
#[derive(Debug, Clone)]
pub struct TableData {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<SqlValue>>,
}

/// Per-table result of a raw-data load
#[derive(Debug, Clone, PartialEq)]
pub struct TableReport {
    pub table: String,
    pub rows: u64,
}

/// Table ingestion service
#[derive(Clone)]
pub struct IngestService {
    db: SqlitePool,
}

impl IngestService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Persist a table with create-or-replace semantics: drop the existing
    /// table, recreate it from the column definitions, and insert every row
    /// in one transaction. Returns the number of rows written.
    pub async fn write_table(&self, table: &TableData) -> AppResult<u64> {
        let name = sanitize_identifier(&table.name)?;
        let columns = table
            .columns
            .iter()
            .map(|c| Ok((sanitize_identifier(&c.name)?, c.column_type)))
            .collect::<AppResult<Vec<_>>>()?;

        if columns.is_empty() {
            return Err(AppError::Ingest(format!("table {} has no columns", name)));
        }

        let create_columns = columns
            .iter()
            .map(|(name, ty)| format!("\"{}\" {}", name, ty.as_sql()))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        let insert_sql = format!("INSERT INTO \"{}\" VALUES ({})", name, placeholders);

        let mut tx = self.db.begin().await?;

        sqlx::query(&format!("DROP TABLE IF EXISTS \"{}\"", name))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("CREATE TABLE \"{}\" ({})", name, create_columns))
            .execute(&mut *tx)
            .await?;

        for row in &table.rows {
            if row.len() != columns.len() {
                return Err(AppError::Ingest(format!(
                    "table {}: row has {} values, expected {}",
                    name,
                    row.len(),
                    columns.len()
                )));
            }

            let mut query = sqlx::query(&insert_sql);
            for value in row {
                query = match value {
                    SqlValue::Null => query.bind(None::<String>),
                    SqlValue::Integer(i) => query.bind(*i),
                    SqlValue::Real(f) => query.bind(*f),
                    SqlValue::Text(s) => query.bind(s.as_str()),
                };
            }
            query.execute(&mut *tx).await?;
        }

        tx.commit().await?;

        tracing::debug!(table = %name, rows = table.rows.len(), "table written");
        Ok(table.rows.len() as u64)
    }

    /// Load every `*.csv` file in `dir` into the database, one table per file
    /// named after the file stem. Re-running replaces the tables.
    pub async fn load_raw_data(&self, dir: &Path) -> AppResult<Vec<TableReport>> {
        let started = Instant::now();

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .collect();
        files.sort();

        let mut reports = Vec::with_capacity(files.len());
        for path in &files {
            let table = read_csv_table(path)?;
            let rows = self.write_table(&table).await?;
            tracing::info!(table = %table.name, rows, "raw file ingested");
            reports.push(TableReport {
                table: table.name,
                rows,
            });
        }

        tracing::info!(
            tables = reports.len(),
            elapsed = ?started.elapsed(),
            "raw data load complete"
        );
        Ok(reports)
    }
}

/// Parse one CSV file into a typed table. Column types are inferred from the
/// data: all values integers -> INTEGER, otherwise all numeric -> REAL,
/// otherwise TEXT. Empty fields are NULL and do not influence inference.
fn read_csv_table(path: &Path) -> AppResult<TableData> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| AppError::Ingest(format!("unusable file name: {}", path.display())))?;
    let name = sanitize_identifier(stem)?;

    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(AppError::Ingest(format!("{}: empty header", path.display())));
    }

    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record?);
    }

    let types: Vec<ColumnType> = (0..headers.len())
        .map(|i| infer_column_type(records.iter().map(|r| r.get(i).unwrap_or(""))))
        .collect();

    let columns = headers
        .into_iter()
        .zip(types.iter().copied())
        .map(|(name, column_type)| Column { name, column_type })
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            record
                .iter()
                .zip(types.iter().copied())
                .map(|(field, ty)| parse_value(field, ty))
                .collect::<AppResult<Vec<_>>>()
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(TableData {
        name,
        columns,
        rows,
    })
}

fn infer_column_type<'a>(values: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut saw_value = false;
    let mut all_integer = true;
    let mut all_real = true;

    for raw in values {
        let field = raw.trim();
        if field.is_empty() {
            continue;
        }
        saw_value = true;
        if field.parse::<i64>().is_err() {
            all_integer = false;
        }
        if field.parse::<f64>().is_err() {
            all_real = false;
        }
    }

    if !saw_value {
        ColumnType::Text
    } else if all_integer {
        ColumnType::Integer
    } else if all_real {
        ColumnType::Real
    } else {
        ColumnType::Text
    }
}

fn parse_value(raw: &str, ty: ColumnType) -> AppResult<SqlValue> {
    let field = raw.trim();
    if field.is_empty() {
        return Ok(SqlValue::Null);
    }

    match ty {
        ColumnType::Integer => field
            .parse::<i64>()
            .map(SqlValue::Integer)
            .map_err(|_| AppError::Ingest(format!("non-integer value {:?}", raw))),
        ColumnType::Real => field
            .parse::<f64>()
            .map(SqlValue::Real)
            .map_err(|_| AppError::Ingest(format!("non-numeric value {:?}", raw))),
        ColumnType::Text => Ok(SqlValue::Text(raw.to_string())),
    }
}

/// Fold a raw name into a safe SQL identifier: non-alphanumerics become `_`,
/// a leading digit gets a `_` prefix.
pub fn sanitize_identifier(raw: &str) -> AppResult<String> {
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if name.is_empty() {
        return Err(AppError::InvalidIdentifier(raw.to_string()));
    }
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }

    Ok(name)
}

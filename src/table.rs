//! Table Handle: owns one registered type's physical table name, compiled
//! column list, and parameterized SQL — the create/insert/query/clear
//! surface a schema-compiled type needs against its backing tables, built
//! from the compiled column list rather than any runtime reflection (see
//! [`crate::schema`]).
//!
//! Every statement goes through `Connection::prepare_cached` rather than a
//! stored `Statement` field: a `Statement<'conn>` borrows its `Connection`,
//! and `TableHandle` does not own one (the owning [`crate::store::Store`]
//! outlives every `TableHandle` built against it), so a literal stored
//! statement would make this struct self-referential. `prepare_cached` gives
//! the same amortized-parse benefit through rusqlite's per-connection
//! statement cache instead.

use rusqlite::{types::ToSql, Connection};

use crate::error::{EngineError, EngineResult};
use crate::schema::{column_for_path, Cell, Column, SqlType};

fn decode_row(row: &rusqlite::Row<'_>, sql_types: &[SqlType]) -> rusqlite::Result<StoredRow> {
    let timestamp_millis: i64 = row.get(0)?;
    let num_seconds_active: i64 = row.get(1)?;
    let mut cells = Vec::with_capacity(sql_types.len());
    for (i, sql_type) in sql_types.iter().enumerate() {
        let idx = 2 + i;
        let cell = match sql_type {
            SqlType::Integer => Cell::Integer(row.get(idx)?),
            SqlType::Real => Cell::Real(row.get(idx)?),
            SqlType::Text => Cell::Text(row.get(idx)?),
        };
        cells.push(cell);
    }
    Ok(StoredRow {
        timestamp_millis,
        num_seconds_active: num_seconds_active as u32,
        cells,
    })
}

/// One closed chunk as stored: when it closed, how much of the chunk was
/// covered by real readings, and its payload cells in column order.
pub struct StoredRow {
    pub timestamp_millis: i64,
    pub num_seconds_active: u32,
    pub cells: Vec<Cell>,
}

pub struct TableHandle {
    table_name: String,
    columns: Vec<Column>,
    create_sql: String,
    insert_sql: String,
    select_range_sql: String,
    select_from_sql: String,
    clear_sql: String,
}

fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

impl TableHandle {
    /// `type_name` and `suffix` (e.g. a tier's `table_suffix`) are joined and
    /// sanitized into the physical table name. `suffix: None` names the raw
    /// table after the type alone: one raw table per registered type, whose
    /// id is the type name (sanitized).
    pub fn new(type_name: &str, suffix: Option<&str>, columns: Vec<Column>) -> Self {
        let table_name = match suffix {
            Some(suffix) => sanitize_identifier(&format!("{type_name}_{suffix}")),
            None => sanitize_identifier(type_name),
        };

        let mut column_defs = String::new();
        let mut insert_columns = String::new();
        let mut insert_placeholders = String::new();
        for (i, col) in columns.iter().enumerate() {
            column_defs.push_str(&format!(", \"{}\" {}", col.column_name, col.sql_type.as_sql()));
            if i > 0 {
                insert_columns.push_str(", ");
                insert_placeholders.push_str(", ");
            }
            insert_columns.push_str(&format!("\"{}\"", col.column_name));
            insert_placeholders.push('?');
        }

        let create_sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{table_name}\" (\
                id INTEGER PRIMARY KEY AUTOINCREMENT, \
                timestamp INTEGER NOT NULL, \
                num_seconds_active INTEGER NOT NULL\
                {column_defs})"
        );

        let insert_sql = format!(
            "INSERT INTO \"{table_name}\" (timestamp, num_seconds_active{comma}{insert_columns}) \
             VALUES (?, ?{comma}{insert_placeholders})",
            comma = if columns.is_empty() { "" } else { ", " },
        );

        let select_range_sql = format!(
            "SELECT timestamp, num_seconds_active{comma}{insert_columns} FROM \"{table_name}\" \
             WHERE timestamp >= ?1 AND timestamp < ?2 ORDER BY timestamp ASC",
            comma = if columns.is_empty() { "" } else { ", " },
        );

        let select_from_sql = format!(
            "SELECT timestamp, num_seconds_active{comma}{insert_columns} FROM \"{table_name}\" \
             WHERE timestamp >= ?1 ORDER BY timestamp ASC",
            comma = if columns.is_empty() { "" } else { ", " },
        );

        let clear_sql = format!("DELETE FROM \"{table_name}\"");

        Self {
            table_name,
            columns,
            create_sql,
            insert_sql,
            select_range_sql,
            select_from_sql,
            clear_sql,
        }
    }

    pub fn create(&self, conn: &Connection) -> EngineResult<()> {
        conn.execute(&self.create_sql, [])?;
        Ok(())
    }

    /// Creates an index on the compiled column backing `path`, letting a
    /// caller index by logical property path rather than by physical column
    /// name.
    pub fn create_index(&self, conn: &Connection, path: &str) -> EngineResult<()> {
        let column = column_for_path(&self.columns, path)?;
        let index_name = sanitize_identifier(&format!("idx_{}_{}", self.table_name, column.column_name));
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS \"{index_name}\" ON \"{}\" (\"{}\")",
            self.table_name, column.column_name
        );
        conn.execute(&sql, [])?;
        Ok(())
    }

    /// Every LOD/raw table gets this index unconditionally: the only WHERE
    /// clause the core ever issues filters on `timestamp`.
    pub fn create_timestamp_index(&self, conn: &Connection) -> EngineResult<()> {
        let index_name = sanitize_identifier(&format!("idx_{}_timestamp", self.table_name));
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS \"{index_name}\" ON \"{}\" (\"timestamp\")",
            self.table_name
        );
        conn.execute(&sql, [])?;
        Ok(())
    }

    pub fn insert(
        &self,
        conn: &Connection,
        timestamp_millis: i64,
        num_seconds_active: u32,
        cells: &[Cell],
    ) -> EngineResult<()> {
        if cells.len() != self.columns.len() {
            return Err(EngineError::logic(format!(
                "table '{}' expects {} payload cells, got {}",
                self.table_name,
                self.columns.len(),
                cells.len()
            )));
        }

        let mut stmt = conn.prepare_cached(&self.insert_sql)?;
        let mut params: Vec<&dyn ToSql> = Vec::with_capacity(2 + cells.len());
        params.push(&timestamp_millis);
        params.push(&num_seconds_active);
        for cell in cells {
            params.push(cell);
        }
        stmt.execute(params.as_slice())?;
        Ok(())
    }

    /// Rows with `timestamp` in `[start_millis, end_millis)`, ascending.
    pub fn query_range(
        &self,
        conn: &Connection,
        start_millis: i64,
        end_millis: i64,
    ) -> EngineResult<Vec<StoredRow>> {
        let mut stmt = conn.prepare_cached(&self.select_range_sql)?;
        let sql_types: Vec<_> = self.columns.iter().map(|c| c.sql_type).collect();
        let rows = stmt.query_map([start_millis, end_millis], move |row| decode_row(row, &sql_types))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Rows with `timestamp >= start_millis`, ascending, with no upper
    /// bound — used when closing a coarser tier's chunk, where every row a
    /// finer tier has written since the chunk started belongs to it.
    pub fn query_from(&self, conn: &Connection, start_millis: i64) -> EngineResult<Vec<StoredRow>> {
        let mut stmt = conn.prepare_cached(&self.select_from_sql)?;
        let sql_types: Vec<_> = self.columns.iter().map(|c| c.sql_type).collect();
        let rows = stmt.query_map([start_millis], move |row| decode_row(row, &sql_types))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn clear(&self, conn: &Connection) -> EngineResult<()> {
        conn.execute(&self.clear_sql, [])?;
        Ok(())
    }
}

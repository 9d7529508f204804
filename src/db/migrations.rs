use rusqlite::Connection;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::AppResult;

/// Apply every `*.sql` file in `migrations_dir` that has not run yet, in file
/// name order. Each file runs in its own transaction together with its
/// bookkeeping row. A missing directory applies nothing; any other read
/// failure is an error.
pub fn run_migrations(conn: &mut Connection, migrations_dir: &Path) -> AppResult<usize> {
    tracing::debug!(dir = %migrations_dir.display(), "Checking for database migrations");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let mut entries: Vec<_> = match fs::read_dir(migrations_dir) {
        Ok(rd) => rd
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "sql"))
            .collect(),
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    if entries.is_empty() {
        tracing::warn!(dir = %migrations_dir.display(), "No migration files found");
    }

    entries.sort_by_key(|e| e.file_name());

    let mut applied_count = 0;
    for entry in entries {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        let already_applied: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM _migrations WHERE name = ?)",
            [&*name],
            |row| row.get(0),
        )?;
        if already_applied {
            continue;
        }

        let sql = fs::read_to_string(entry.path())?;

        tracing::info!(migration = %name, "Applying migration");
        let tx = conn.transaction()?;
        tx.execute_batch(&sql)?;
        tx.execute("INSERT INTO _migrations (name) VALUES (?)", [&*name])?;
        tx.commit()?;
        applied_count += 1;
    }

    if applied_count > 0 {
        tracing::info!(count = applied_count, "Migrations applied successfully");
    } else {
        tracing::debug!("No new migrations to apply");
    }

    Ok(applied_count)
}

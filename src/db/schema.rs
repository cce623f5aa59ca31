use std::collections::HashSet;

use anyhow::{Context, Result};
use rusqlite::Connection;

struct Migration {
    version: &'static str,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001",
        name: "initial",
        sql: include_str!("migrations/001_initial.sql"),
    },
    Migration {
        version: "002",
        name: "length_checks",
        sql: include_str!("migrations/002_length_checks.sql"),
    },
    Migration {
        version: "003",
        name: "project_category_index",
        sql: include_str!("migrations/003_project_category_index.sql"),
    },
];

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .context("Failed to create schema_migrations table")?;

    let applied = applied_versions(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(m.version))
        .collect();

    if pending.is_empty() {
        return Ok(());
    }

    // Table rebuilds drop and rename referenced tables, which foreign key
    // enforcement would reject. The pragma is a no-op inside a transaction.
    conn.pragma_update(None, "foreign_keys", "OFF")?;
    let result = upgrade_unversioned_tables(conn).and_then(|()| {
        pending
            .into_iter()
            .try_for_each(|migration| apply_migration(conn, migration))
    });
    conn.pragma_update(None, "foreign_keys", "ON")?;

    result
}

/// Bring tables written before version tracking up to the shape migration
/// 001 expects. Migration 001 itself only creates what is missing.
fn upgrade_unversioned_tables(conn: &Connection) -> Result<()> {
    if !table_exists(conn, "project")? {
        return Ok(());
    }

    // Projects predate categories in the earliest deployments
    if !column_exists(conn, "project", "category_id")? {
        conn.execute_batch("ALTER TABLE project ADD COLUMN category_id INTEGER REFERENCES category(id)")
            .context("Failed to add project.category_id")?;
        tracing::info!("Added missing project.category_id column");
    }

    let oversized: i64 = conn.query_row(
        "SELECT COUNT(*) FROM project
         WHERE length(name) > 100 OR length(name) = 0 OR length(description) > 500",
        [],
        |row| row.get(0),
    )?;
    if oversized > 0 {
        tracing::warn!(
            "{} project(s) exceed the length limits and will be trimmed",
            oversized
        );
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i32 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let count: i32 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?",
        [table, column],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn applied_versions(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<HashSet<String>>>()?;
    Ok(versions)
}

fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)",
        (
            migration.version,
            migration.name,
            chrono::Utc::now().to_rfc3339(),
        ),
    )?;
    Ok(())
}

fn apply_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    tracing::info!(
        "Applying migration {}: {}",
        migration.version,
        migration.name
    );

    let applied = conn.execute_batch(&format!("BEGIN TRANSACTION; {} COMMIT;", migration.sql));
    if applied.is_err() && !conn.is_autocommit() {
        conn.execute_batch("ROLLBACK")?;
    }
    applied.with_context(|| {
        format!(
            "Failed to apply migration {}: {}",
            migration.version, migration.name
        )
    })?;

    record_migration(conn, migration)?;

    tracing::info!("Migration {} applied successfully", migration.version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foreign_keys_enabled(conn: &Connection) -> bool {
        conn.query_row("PRAGMA foreign_keys", [], |row| row.get::<_, i32>(0))
            .unwrap()
            == 1
    }

    fn recorded_versions(conn: &Connection) -> Vec<String> {
        let mut versions: Vec<String> = applied_versions(conn).unwrap().into_iter().collect();
        versions.sort();
        versions
    }

    fn projects(conn: &Connection) -> Vec<(i64, String, Option<String>, Option<i64>)> {
        conn.prepare("SELECT id, name, description, category_id FROM project ORDER BY id")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap()
    }

    /// An unversioned connection as left behind by the earlier deployment,
    /// which never enforced foreign keys.
    fn legacy_conn(schema_and_rows: &str) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&format!("PRAGMA foreign_keys = OFF; {schema_and_rows}"))
            .unwrap();
        conn
    }

    const LEGACY_CATEGORY: &str =
        "CREATE TABLE category (id INTEGER NOT NULL, name VARCHAR(50) NOT NULL, PRIMARY KEY (id), UNIQUE (name));";

    const LEGACY_PROJECT: &str = "
        CREATE TABLE project (
            id INTEGER NOT NULL,
            name VARCHAR(100) NOT NULL,
            description VARCHAR(500),
            category_id INTEGER,
            PRIMARY KEY (id),
            FOREIGN KEY(category_id) REFERENCES category (id)
        );";

    #[test]
    fn test_migrations_run_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('project', 'category')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);

        assert_eq!(recorded_versions(&conn), vec!["001", "002", "003"]);
        assert!(foreign_keys_enabled(&conn));
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(recorded_versions(&conn), vec!["001", "002", "003"]);
    }

    #[test]
    fn test_length_checks_are_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let long_name = "x".repeat(101);
        assert!(conn
            .execute("INSERT INTO project (name) VALUES (?)", [&long_name])
            .is_err());
        assert!(conn
            .execute("INSERT INTO project (name) VALUES ('')", [])
            .is_err());
        assert!(conn
            .execute("INSERT INTO category (name) VALUES (?)", [&"y".repeat(51)])
            .is_err());
    }

    #[test]
    fn test_existing_db_is_upgraded_and_dangling_references_cleared() {
        let conn = legacy_conn(&format!(
            "{LEGACY_CATEGORY} {LEGACY_PROJECT}
            INSERT INTO category (id, name) VALUES (1, 'Web Apps');
            INSERT INTO project (id, name, description, category_id) VALUES (1, 'Site', '', 1);
            INSERT INTO project (id, name, description, category_id) VALUES (2, 'Orphan', NULL, 9);"
        ));

        run_migrations(&conn).unwrap();

        assert_eq!(recorded_versions(&conn), vec!["001", "002", "003"]);
        assert_eq!(
            projects(&conn),
            vec![
                (1, "Site".to_string(), Some(String::new()), Some(1)),
                (2, "Orphan".to_string(), None, None),
            ]
        );
        assert!(foreign_keys_enabled(&conn));
    }

    #[test]
    fn test_existing_db_with_oversized_values_is_trimmed() {
        let long_name = "n".repeat(150);
        let long_description = "d".repeat(600);
        let long_category = "c".repeat(60);
        let conn = legacy_conn(&format!(
            "{LEGACY_CATEGORY} {LEGACY_PROJECT}
            INSERT INTO category (id, name) VALUES (3, '{long_category}');
            INSERT INTO project (id, name, description, category_id)
                VALUES (1, '{long_name}', '{long_description}', 3);
            INSERT INTO project (id, name, description, category_id) VALUES (2, '', NULL, NULL);"
        ));

        run_migrations(&conn).unwrap();

        let rows = projects(&conn);
        assert_eq!(rows[0].1, "n".repeat(100));
        assert_eq!(rows[0].2, Some("d".repeat(500)));
        assert_eq!(rows[0].3, Some(3));
        assert_eq!(rows[1].1, "Project #2");

        let category: String = conn
            .query_row("SELECT name FROM category WHERE id = 3", [], |row| row.get(0))
            .unwrap();
        assert_eq!(category, format!("{}#3", "c".repeat(48)));
    }

    #[test]
    fn test_existing_db_without_categories_is_upgraded() {
        let conn = legacy_conn(
            "CREATE TABLE project (
                id INTEGER NOT NULL,
                name VARCHAR(100) NOT NULL,
                description VARCHAR(500),
                PRIMARY KEY (id)
            );
            INSERT INTO project (id, name, description) VALUES (1, 'Site', 'Kept');",
        );

        run_migrations(&conn).unwrap();

        assert_eq!(recorded_versions(&conn), vec!["001", "002", "003"]);
        assert_eq!(
            projects(&conn),
            vec![(1, "Site".to_string(), Some("Kept".to_string()), None)]
        );

        conn.execute("INSERT INTO category (name) VALUES ('Web Apps')", [])
            .unwrap();
        conn.execute("UPDATE project SET category_id = 1 WHERE id = 1", [])
            .unwrap();
        assert!(conn
            .execute("UPDATE project SET category_id = 99 WHERE id = 1", [])
            .is_err());
    }
}

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};
use std::path::Path;

const CREATE_ESTIMATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS a001_estimate (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL,
        comment TEXT,
        project_name TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
"#;

const CREATE_ESTIMATE_ITEM_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS a002_estimate_item (
        id TEXT PRIMARY KEY NOT NULL,
        estimate_id TEXT NOT NULL,
        name TEXT NOT NULL,
        unit TEXT NOT NULL DEFAULT '',
        quantity REAL NOT NULL DEFAULT 0,
        apartment_label TEXT,
        section TEXT,
        subsection TEXT,
        category TEXT,
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at TEXT
    );
"#;

const CREATE_ESTIMATE_ITEM_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_a002_estimate_item_estimate
    ON a002_estimate_item (estimate_id, sort_order);
"#;

/// Колонки, появившиеся после первой версии схемы.
/// Старые базы получают их через ALTER TABLE при старте.
const LATE_COLUMNS: &[(&str, &str, &str)] = &[
    ("a001_estimate", "project_name", "TEXT"),
    ("a002_estimate_item", "apartment_label", "TEXT"),
    ("a002_estimate_item", "subsection", "TEXT"),
    ("a002_estimate_item", "category", "TEXT"),
    ("a002_estimate_item", "sort_order", "INTEGER NOT NULL DEFAULT 0"),
];

/// Открыть файл БД (создаётся при отсутствии) и привести схему к актуальной
pub async fn initialize_database(db_file: &Path) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    tracing::info!("Opening database {}", db_url);
    let conn = Database::connect(&db_url).await?;
    bootstrap_schema(&conn).await?;
    Ok(conn)
}

/// БД в памяти с той же схемой (одно соединение, иначе у каждого своя база)
pub async fn connect_in_memory() -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let conn = Database::connect(options).await?;
    bootstrap_schema(&conn).await?;
    Ok(conn)
}

async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    for sql in [
        CREATE_ESTIMATE_TABLE,
        CREATE_ESTIMATE_ITEM_TABLE,
        CREATE_ESTIMATE_ITEM_INDEX,
    ] {
        execute(conn, sql).await?;
    }

    for (table, column, ddl) in LATE_COLUMNS {
        if !has_column(conn, table, column).await? {
            tracing::info!("Adding column {}.{}", table, column);
            execute(
                conn,
                &format!("ALTER TABLE {} ADD COLUMN {} {};", table, column, ddl),
            )
            .await?;
        }
    }

    Ok(())
}

async fn has_column(conn: &DatabaseConnection, table: &str, column: &str) -> anyhow::Result<bool> {
    let rows = conn
        .query_all(Statement::from_string(
            DatabaseBackend::Sqlite,
            format!("PRAGMA table_info({});", table),
        ))
        .await?;

    Ok(rows.iter().any(|row| {
        row.try_get::<String>("", "name")
            .map(|name| name.eq_ignore_ascii_case(column))
            .unwrap_or(false)
    }))
}

async fn execute(conn: &DatabaseConnection, sql: &str) -> anyhow::Result<()> {
    conn.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        sql.to_string(),
    ))
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_creates_tables() {
        let conn = connect_in_memory().await.unwrap();
        assert!(has_column(&conn, "a001_estimate", "project_name").await.unwrap());
        assert!(has_column(&conn, "a002_estimate_item", "sort_order").await.unwrap());
        assert!(!has_column(&conn, "a002_estimate_item", "price").await.unwrap());
    }

    #[tokio::test]
    async fn test_bootstrap_is_repeatable() {
        let conn = connect_in_memory().await.unwrap();
        bootstrap_schema(&conn).await.unwrap();
        assert!(has_column(&conn, "a002_estimate_item", "category").await.unwrap());
    }
}

use sqlx::{Pool, Sqlite};

use crate::storage::validate_sqlite_table_schema;
use crate::userdb::errors::UserError;
use crate::userdb::types::User;

use super::types::{UserRow, map_insert_error};

pub(super) async fn create_tables_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
) -> Result<(), UserError> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table_name} (
            email TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            public_key BLOB NOT NULL UNIQUE,
            wrapped_private_key BLOB NOT NULL,
            wrapped_master_key BLOB NOT NULL,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await
    .map_err(|e| UserError::Storage(e.to_string()))?;

    Ok(())
}

/// Validates that the users table schema matches what we expect
pub(super) async fn validate_user_tables_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
) -> Result<(), UserError> {
    let expected_columns = [
        ("email", "TEXT"),
        ("name", "TEXT"),
        ("public_key", "BLOB"),
        ("wrapped_private_key", "BLOB"),
        ("wrapped_master_key", "BLOB"),
        ("created_at", "TIMESTAMP"),
        ("updated_at", "TIMESTAMP"),
    ];

    validate_sqlite_table_schema(pool, table_name, &expected_columns, UserError::Storage).await
}

pub(super) async fn get_user_by_pk_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
    public_key: &[u8],
) -> Result<Option<User>, UserError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        SELECT * FROM {table_name} WHERE public_key = ?
        "#
    ))
    .bind(public_key)
    .fetch_optional(pool)
    .await?;

    row.map(User::try_from).transpose()
}

pub(super) async fn get_user_by_email_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
    email: &str,
) -> Result<Option<User>, UserError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        SELECT * FROM {table_name} WHERE email = ?
        "#
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.map(User::try_from).transpose()
}

pub(super) async fn insert_user_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
    user: &User,
) -> Result<(), UserError> {
    let row = UserRow::from(user);

    sqlx::query(&format!(
        r#"
        INSERT INTO {table_name}
            (email, name, public_key, wrapped_private_key, wrapped_master_key, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#
    ))
    .bind(&row.email)
    .bind(&row.name)
    .bind(&row.public_key)
    .bind(&row.wrapped_private_key)
    .bind(&row.wrapped_master_key)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(pool)
    .await
    .map_err(|e| map_insert_error(e, &row.email))?;

    Ok(())
}

/// Returns the number of deleted rows
pub(super) async fn delete_user_by_email_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
    email: &str,
) -> Result<u64, UserError> {
    let result = sqlx::query(&format!(
        r#"
        DELETE FROM {table_name} WHERE email = ?
        "#
    ))
    .bind(email)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

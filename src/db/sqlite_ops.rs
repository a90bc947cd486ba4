// src/db/sqlite_ops.rs
//! `Repository` implementation for [`SqliteRepository`]
//!
//! Timestamps are stored as fixed-width RFC 3339 text (microseconds, `Z`), so
//! string order equals time order. Ids are stored hyphenated, which sorts the
//! same way as the raw UUID bytes. Token and id sets are bound as a single
//! `rarray` parameter, so their size is not capped by SQLite's bind-variable limit.

use chrono::{DateTime, SecondsFormat, Utc};
use std::rc::Rc;

use rusqlite::types::{ToSql, Type, Value};
use rusqlite::{params, params_from_iter, ErrorCode, OptionalExtension, Row};
use uuid::Uuid;

use super::sqlite_conn::SqliteRepository;
use super::{ListQuery, OrderBy, RecordFilter, RepoResult, Repository};
use crate::error::RepositoryError;
use crate::record::{RecordField, SecretRecord};

const COLUMNS: &str =
    "id, token, encrypted_value, created_at, updated_at, expires_at, soft_deleted_at";

fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn ts_opt(at: Option<DateTime<Utc>>) -> Value {
    at.map_or(Value::Null, |at| Value::Text(ts(at)))
}

type Args = Vec<Box<dyn ToSql>>;

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|at| at.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

fn required_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    parse_ts(row, idx)?.ok_or(rusqlite::Error::InvalidColumnType(
        idx,
        "timestamp".into(),
        Type::Null,
    ))
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<SecretRecord> {
    let id: String = row.get(0)?;
    Ok(SecretRecord {
        id: Uuid::parse_str(&id).map_err(|e| conversion_error(0, e))?,
        token: row.get(1)?,
        encrypted_value: row.get(2)?,
        created_at: required_ts(row, 3)?,
        updated_at: required_ts(row, 4)?,
        expires_at: parse_ts(row, 5)?,
        soft_deleted_at: parse_ts(row, 6)?,
    })
}

/// Append `column IN rarray(?)` with the whole set as one parameter; an empty
/// set matches nothing
fn push_in(clauses: &mut Vec<String>, args: &mut Args, column: &str, values: Vec<String>) {
    if values.is_empty() {
        clauses.push("0".into());
        return;
    }
    clauses.push(format!("{column} IN rarray(?)"));
    let set: Vec<Value> = values.into_iter().map(Value::Text).collect();
    args.push(Box::new(Rc::new(set)));
}

/// Translate a filter into a `WHERE` clause plus its bound values
fn where_clause(filter: &RecordFilter) -> (String, Args) {
    let mut clauses = Vec::new();
    let mut args: Args = Vec::new();

    if !filter.include_soft_deleted {
        clauses.push("soft_deleted_at IS NULL".to_string());
    }
    if let Some(id) = filter.id {
        clauses.push("id = ?".into());
        args.push(Box::new(id.to_string()));
    }
    if let Some(ids) = &filter.id_in {
        push_in(&mut clauses, &mut args, "id", ids.iter().map(Uuid::to_string).collect());
    }
    if let Some(token) = &filter.token {
        clauses.push("token = ?".into());
        args.push(Box::new(token.clone()));
    }
    if let Some(tokens) = &filter.token_in {
        push_in(&mut clauses, &mut args, "token", tokens.clone());
    }

    if clauses.is_empty() {
        (String::new(), args)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), args)
    }
}

fn map_insert_error(err: rusqlite::Error, token: &str) -> RepositoryError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::ConstraintViolation => {
            RepositoryError::Duplicate {
                token: token.to_string(),
            }
        }
        other => RepositoryError::Sql(other),
    }
}

impl Repository for SqliteRepository {
    fn create(&self, record: &SecretRecord) -> RepoResult<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!("INSERT INTO secrets ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                record.id.to_string(),
                &record.token,
                &record.encrypted_value,
                ts(record.created_at),
                ts(record.updated_at),
                ts_opt(record.expires_at),
                ts_opt(record.soft_deleted_at),
            ],
        )
        .map_err(|e| map_insert_error(e, &record.token))?;
        Ok(())
    }

    fn update(&self, record: &SecretRecord, fields: &[RecordField]) -> RepoResult<()> {
        if fields.is_empty() {
            return Ok(());
        }

        let mut sets = Vec::with_capacity(fields.len());
        let mut args = Vec::with_capacity(fields.len() + 1);
        for field in fields {
            let (column, value) = match field {
                RecordField::EncryptedValue => {
                    ("encrypted_value", Value::Text(record.encrypted_value.clone()))
                }
                RecordField::UpdatedAt => ("updated_at", Value::Text(ts(record.updated_at))),
                RecordField::ExpiresAt => ("expires_at", ts_opt(record.expires_at)),
                RecordField::SoftDeletedAt => ("soft_deleted_at", ts_opt(record.soft_deleted_at)),
            };
            sets.push(format!("{column} = ?"));
            args.push(value);
        }
        args.push(Value::Text(record.id.to_string()));

        let sql = format!("UPDATE secrets SET {} WHERE id = ?", sets.join(", "));
        let changed = self.conn()?.execute(&sql, params_from_iter(args))?;
        if changed == 0 {
            return Err(RepositoryError::MissingId(record.id));
        }
        Ok(())
    }

    fn delete_by_id(&self, id: Uuid) -> RepoResult<()> {
        let changed = self
            .conn()?
            .execute("DELETE FROM secrets WHERE id = ?1", [id.to_string()])?;
        if changed == 0 {
            return Err(RepositoryError::MissingId(id));
        }
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> RepoResult<Option<SecretRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM secrets WHERE id = ?1"),
                [id.to_string()],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn find_by_token(&self, token: &str) -> RepoResult<Option<SecretRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM secrets WHERE token = ?1"),
                [token],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn list(&self, query: &ListQuery) -> RepoResult<Vec<SecretRecord>> {
        let (where_sql, mut args) = where_clause(&query.filter);
        let order = match query.order_by.unwrap_or_default() {
            OrderBy::Id => "id",
            OrderBy::CreatedAt => "created_at, id",
            OrderBy::Token => "token, id",
        };
        // SQLite needs a LIMIT to accept an OFFSET; -1 means unbounded
        let limit = query
            .limit
            .map_or(-1, |limit| i64::try_from(limit).unwrap_or(i64::MAX));
        args.push(Box::new(limit));
        args.push(Box::new(i64::try_from(query.offset).unwrap_or(i64::MAX)));

        let sql =
            format!("SELECT {COLUMNS} FROM secrets{where_sql} ORDER BY {order} LIMIT ? OFFSET ?");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(args), row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn count(&self, filter: &RecordFilter) -> RepoResult<u64> {
        let (where_sql, args) = where_clause(filter);
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM secrets{where_sql}"),
            params_from_iter(args),
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

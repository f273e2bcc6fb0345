//! Generic record gateway contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide one CRUD contract reusable across record kinds.
//! - Run every call in its own session; writes in their own transaction.
//!
//! # Invariants
//! - A failed write is rolled back before its error reaches the caller.
//! - Argument guards (`InvalidArgument`, `UnknownField`) fire before any
//!   session is opened.
//! - Single-row lookups return `Ok(None)` for absence and
//!   `MultipleResults` when more than one row matches.

use super::fields::FieldMap;
use super::record::{MajorMember, Projection, Record};
use crate::db::{DbError, Store};
use crate::model::major::Major;
use crate::model::RecordId;
use log::{debug, error, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for gateway operations.
#[derive(Debug)]
pub enum RepoError {
    /// The store rejected the operation or could not be reached.
    Persistence(DbError),
    /// Guard-rail violation detected before touching the store.
    InvalidArgument(String),
    /// Filter or assignment names a column the record does not have.
    UnknownField { table: &'static str, field: String },
    /// A single-row lookup matched more than one row.
    MultipleResults { table: &'static str },
    /// A referenced row that must exist is missing.
    NotFound { table: &'static str, id: RecordId },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl RepoError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Persistence(err) if err.is_constraint_violation())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persistence(err) => write!(f, "{err}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::UnknownField { table, field } => {
                write!(f, "unknown field `{field}` for table `{table}`")
            }
            Self::MultipleResults { table } => {
                write!(f, "multiple rows in `{table}` matched a single-row lookup")
            }
            Self::NotFound { table, id } => write!(f, "row {id} not found in `{table}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            Self::InvalidArgument(_) => None,
            Self::UnknownField { .. } => None,
            Self::MultipleResults { .. } => None,
            Self::NotFound { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Persistence(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(DbError::Sqlite(value))
    }
}

/// CRUD contract bound to one record kind.
pub trait RecordGateway<R: Record> {
    /// Returns every row, in store order.
    fn find_all(&self) -> RepoResult<Vec<R>>;
    /// Inserts one row and returns it as persisted.
    fn add(&self, fields: &FieldMap) -> RepoResult<R>;
    /// Sets `fields` on every row matching `filter`; returns affected count.
    fn update(&self, filter: &FieldMap, fields: &FieldMap) -> RepoResult<usize>;
    /// Deletes rows matching `filter`. An empty filter needs `delete_all`.
    fn delete(&self, filter: &FieldMap, delete_all: bool) -> RepoResult<usize>;
    fn find_one_or_none_by_id(&self, id: RecordId) -> RepoResult<Option<R>>;
    fn find_one_or_none(&self, filter: &FieldMap) -> RepoResult<Option<R>>;
}

/// SQLite-backed gateway for record kind `R`.
pub struct SqliteGateway<'store, R> {
    store: &'store Store,
    record: PhantomData<fn() -> R>,
}

impl<'store, R: Record> SqliteGateway<'store, R> {
    pub fn new(store: &'store Store) -> Self {
        Self {
            store,
            record: PhantomData,
        }
    }

    pub fn store(&self) -> &'store Store {
        self.store
    }

    /// Returns every row matching `filter`; an empty filter matches all rows.
    pub fn find_where(&self, filter: &FieldMap) -> RepoResult<Vec<R>> {
        filter.validate_for::<R>()?;
        let session = self.store.session()?;
        let records = select_where::<R>(&session, filter, None)?;
        debug!(
            "event=record_find module=repo status=ok table={} rows={}",
            R::TABLE,
            records.len()
        );
        Ok(records)
    }

    /// Same as [`RecordGateway::update`], but also returns the affected rows
    /// as re-read inside the updating transaction.
    pub fn update_and_fetch(&self, filter: &FieldMap, fields: &FieldMap) -> RepoResult<Vec<R>> {
        check_update_args::<R>(filter, fields)?;
        in_write_tx(self.store, "record_update", R::TABLE, |tx| {
            let ids = update_returning_ids::<R>(tx, filter, fields)?;
            let mut refreshed = Vec::with_capacity(ids.len());
            for id in ids {
                let record = select_by_id::<R>(tx, id)?.ok_or(RepoError::NotFound {
                    table: R::TABLE,
                    id,
                })?;
                refreshed.push(record);
            }
            Ok(refreshed)
        })
    }

    /// Inserts inside an open transaction and returns the generated id.
    ///
    /// Every insert path goes through here; store triggers fire as part of
    /// the same statement.
    pub(crate) fn insert_in(tx: &Transaction<'_>, fields: &FieldMap) -> RepoResult<RecordId> {
        if fields.is_empty() {
            tx.execute(&format!("INSERT INTO \"{}\" DEFAULT VALUES;", R::TABLE), [])?;
        } else {
            let (columns, placeholders, binds) = fields.insert_clause();
            tx.execute(
                &format!(
                    "INSERT INTO \"{}\" ({columns}) VALUES ({placeholders});",
                    R::TABLE
                ),
                params_from_iter(binds),
            )?;
        }
        Ok(tx.last_insert_rowid())
    }
}

impl<R: MajorMember> SqliteGateway<'_, R> {
    /// Loads one record plus its major's name under the `major` key.
    ///
    /// Returns `Ok(None)` when the record is absent and `major: null` when
    /// it has no major. A `major_id` pointing at a missing major is reported
    /// as `NotFound`.
    pub fn find_full_data(&self, id: RecordId) -> RepoResult<Option<Projection>> {
        let session = self.store.session()?;
        let Some(record) = select_by_id::<R>(&session, id)? else {
            return Ok(None);
        };

        let major_name = match record.major_id() {
            Some(major_id) => {
                let major = select_by_id::<Major>(&session, major_id)?.ok_or_else(|| {
                    error!(
                        "event=record_full_data module=repo status=error table={} id={} error_code=dangling_major major_id={}",
                        R::TABLE,
                        id,
                        major_id
                    );
                    RepoError::NotFound {
                        table: Major::TABLE,
                        id: major_id,
                    }
                })?;
                serde_json::Value::String(major.major_name)
            }
            None => serde_json::Value::Null,
        };

        let mut projection = record.to_projection()?;
        projection.insert("major".to_string(), major_name);
        Ok(Some(projection))
    }
}

impl<R: Record> RecordGateway<R> for SqliteGateway<'_, R> {
    fn find_all(&self) -> RepoResult<Vec<R>> {
        self.find_where(&FieldMap::new())
    }

    fn add(&self, fields: &FieldMap) -> RepoResult<R> {
        fields.validate_for::<R>()?;
        let record = in_write_tx(self.store, "record_add", R::TABLE, |tx| {
            let id = Self::insert_in(tx, fields)?;
            select_by_id::<R>(tx, id)?.ok_or(RepoError::NotFound { table: R::TABLE, id })
        })?;
        debug!(
            "event=record_add module=repo status=ok table={} id={}",
            R::TABLE,
            record.id()
        );
        Ok(record)
    }

    fn update(&self, filter: &FieldMap, fields: &FieldMap) -> RepoResult<usize> {
        check_update_args::<R>(filter, fields)?;
        in_write_tx(self.store, "record_update", R::TABLE, |tx| {
            Ok(update_returning_ids::<R>(tx, filter, fields)?.len())
        })
    }

    fn delete(&self, filter: &FieldMap, delete_all: bool) -> RepoResult<usize> {
        if filter.is_empty() && !delete_all {
            return Err(RepoError::InvalidArgument(
                "delete requires at least one filter field unless delete_all is set".to_string(),
            ));
        }
        filter.validate_for::<R>()?;

        in_write_tx(self.store, "record_delete", R::TABLE, |tx| {
            let deleted = match filter.where_clause(None) {
                Some((predicate, binds)) => tx.execute(
                    &format!("DELETE FROM \"{}\" WHERE {predicate};", R::TABLE),
                    params_from_iter(binds),
                )?,
                None => tx.execute(&format!("DELETE FROM \"{}\";", R::TABLE), [])?,
            };
            Ok(deleted)
        })
    }

    fn find_one_or_none_by_id(&self, id: RecordId) -> RepoResult<Option<R>> {
        let session = self.store.session()?;
        select_by_id::<R>(&session, id)
    }

    fn find_one_or_none(&self, filter: &FieldMap) -> RepoResult<Option<R>> {
        filter.validate_for::<R>()?;
        let session = self.store.session()?;
        // Two rows are enough to tell "one" from "many".
        let mut records = select_where::<R>(&session, filter, Some(2))?;
        if records.len() > 1 {
            return Err(RepoError::MultipleResults { table: R::TABLE });
        }
        Ok(records.pop())
    }
}

/// Runs `work` inside an immediate transaction on a fresh session.
///
/// Commits on success. On failure the transaction is rolled back first and
/// the original error is returned unchanged.
pub(crate) fn in_write_tx<T>(
    store: &Store,
    event: &'static str,
    table: &'static str,
    work: impl FnOnce(&Transaction<'_>) -> RepoResult<T>,
) -> RepoResult<T> {
    let started_at = Instant::now();
    let mut session = store.session()?;
    let tx = session.transaction_with_behavior(TransactionBehavior::Immediate)?;

    match work(&tx) {
        Ok(value) => {
            if let Err(err) = tx.commit() {
                error!(
                    "event={event} module=repo status=error table={table} duration_ms={} error_code=commit_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
            debug!(
                "event={event} module=repo status=committed table={table} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                error!(
                    "event={event} module=repo status=error table={table} error_code=rollback_failed error={}",
                    rollback_err
                );
            }
            warn!(
                "event={event} module=repo status=rolled_back table={table} duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn check_update_args<R: Record>(filter: &FieldMap, fields: &FieldMap) -> RepoResult<()> {
    if fields.is_empty() {
        return Err(RepoError::InvalidArgument(
            "update requires at least one field to set".to_string(),
        ));
    }
    filter.validate_for::<R>()?;
    fields.validate_for::<R>()
}

fn update_returning_ids<R: Record>(
    tx: &Transaction<'_>,
    filter: &FieldMap,
    fields: &FieldMap,
) -> RepoResult<Vec<RecordId>> {
    let (assignments, mut binds) = fields.set_clause();
    let mut sql = format!("UPDATE \"{}\" SET {assignments}", R::TABLE);
    if let Some((predicate, filter_binds)) = filter.where_clause(None) {
        sql.push_str(" WHERE ");
        sql.push_str(&predicate);
        binds.extend(filter_binds);
    }
    sql.push_str(" RETURNING \"id\";");

    let mut stmt = tx.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(binds))?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

pub(crate) fn select_by_id<R: Record>(conn: &Connection, id: RecordId) -> RepoResult<Option<R>> {
    let mut records = select_where::<R>(conn, &FieldMap::new().integer("id", id), Some(1))?;
    Ok(records.pop())
}

fn select_where<R: Record>(
    conn: &Connection,
    filter: &FieldMap,
    limit: Option<u32>,
) -> RepoResult<Vec<R>> {
    let mut sql = format!("SELECT {} FROM \"{}\"", R::select_list(None), R::TABLE);
    let mut binds: Vec<Value> = Vec::new();
    if let Some((predicate, filter_binds)) = filter.where_clause(None) {
        sql.push_str(" WHERE ");
        sql.push_str(&predicate);
        binds = filter_binds;
    }
    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        binds.push(Value::Integer(i64::from(limit)));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(binds))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(R::from_row(row)?);
    }
    Ok(records)
}

//! Student gateway.
//!
//! # Responsibility
//! - Specialize the generic gateway for `students`.
//! - Provide composite reads that resolve each student's major name.
//!
//! # Invariants
//! - Every insert path (`add`, `add_student`) lands in the same SQL insert,
//!   so the store's insert trigger bumps `majors.count_students` exactly once
//!   per new student, inside the inserting transaction.
//! - Deleting a student leaves `majors.count_students` unchanged.
//! - `find_students` resolves majors with one joined query.

use super::fields::FieldMap;
use super::gateway::{in_write_tx, RecordGateway, RepoResult, SqliteGateway};
use super::record::{Projection, Record};
use crate::db::Store;
use crate::model::student::Student;
use crate::model::RecordId;
use log::{debug, info};
use rusqlite::params_from_iter;
use rusqlite::types::Value;

/// Gateway bound to [`Student`] records.
pub struct StudentGateway<'store> {
    base: SqliteGateway<'store, Student>,
}

impl<'store> StudentGateway<'store> {
    pub fn new(store: &'store Store) -> Self {
        Self {
            base: SqliteGateway::new(store),
        }
    }

    /// Generic gateway this one specializes.
    pub fn base(&self) -> &SqliteGateway<'store, Student> {
        &self.base
    }

    /// Inserts one student and returns only its generated id.
    pub fn add_student(&self, fields: &FieldMap) -> RepoResult<RecordId> {
        fields.validate_for::<Student>()?;
        let id = in_write_tx(self.base.store(), "student_add", Student::TABLE, |tx| {
            SqliteGateway::<'_, Student>::insert_in(tx, fields)
        })?;
        debug!("event=student_add module=repo status=ok id={id}");
        Ok(id)
    }

    /// Deletes one student by id.
    ///
    /// Returns `Ok(None)` when no such student exists. The referenced major's
    /// `count_students` is left as is.
    pub fn delete_student_by_id(&self, id: RecordId) -> RepoResult<Option<RecordId>> {
        let deleted = in_write_tx(self.base.store(), "student_delete", Student::TABLE, |tx| {
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM students WHERE id = ?1);",
                [id],
                |row| row.get(0),
            )?;
            if !exists {
                return Ok(None);
            }

            tx.execute("DELETE FROM students WHERE id = ?1;", [id])?;
            Ok(Some(id))
        })?;

        match deleted {
            Some(id) => info!("event=student_delete module=repo status=ok id={id}"),
            None => debug!("event=student_delete module=repo status=not_found id={id}"),
        }
        Ok(deleted)
    }

    /// Loads one student plus its major's name under `major`.
    pub fn find_full_data(&self, id: RecordId) -> RepoResult<Option<Projection>> {
        self.base.find_full_data(id)
    }

    /// Returns matching students as records, without major resolution.
    pub fn find_all_students(&self, filter: &FieldMap) -> RepoResult<Vec<Student>> {
        self.base.find_where(filter)
    }

    /// Returns matching students as projections with `major` resolved.
    ///
    /// Majors are joined in the same statement; students without a major
    /// get `major: null`.
    pub fn find_students(&self, filter: &FieldMap) -> RepoResult<Vec<Projection>> {
        filter.validate_for::<Student>()?;

        let mut sql = format!(
            "SELECT {}, m.\"major_name\" AS major
             FROM students s
             LEFT JOIN majors m ON m.\"id\" = s.\"major_id\"",
            Student::select_list(Some("s"))
        );
        let mut binds: Vec<Value> = Vec::new();
        if let Some((predicate, filter_binds)) = filter.where_clause(Some("s")) {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate);
            binds = filter_binds;
        }

        let session = self.base.store().session()?;
        let mut stmt = session.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut students = Vec::new();
        while let Some(row) = rows.next()? {
            let student = Student::from_row(row)?;
            let major = match row.get::<_, Option<String>>("major")? {
                Some(name) => serde_json::Value::String(name),
                None => serde_json::Value::Null,
            };
            let mut projection = student.to_projection()?;
            projection.insert("major".to_string(), major);
            students.push(projection);
        }

        debug!(
            "event=student_find module=repo status=ok rows={}",
            students.len()
        );
        Ok(students)
    }
}

impl RecordGateway<Student> for StudentGateway<'_> {
    fn find_all(&self) -> RepoResult<Vec<Student>> {
        self.base.find_all()
    }

    fn add(&self, fields: &FieldMap) -> RepoResult<Student> {
        self.base.add(fields)
    }

    fn update(&self, filter: &FieldMap, fields: &FieldMap) -> RepoResult<usize> {
        self.base.update(filter, fields)
    }

    fn delete(&self, filter: &FieldMap, delete_all: bool) -> RepoResult<usize> {
        self.base.delete(filter, delete_all)
    }

    fn find_one_or_none_by_id(&self, id: RecordId) -> RepoResult<Option<Student>> {
        self.base.find_one_or_none_by_id(id)
    }

    fn find_one_or_none(&self, filter: &FieldMap) -> RepoResult<Option<Student>> {
        self.base.find_one_or_none(filter)
    }
}

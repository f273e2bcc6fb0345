//! Typed field maps for filters and assignments.
//!
//! # Responsibility
//! - Collect `column -> value` pairs for equality filters and SET lists.
//! - Validate keys against the bound record's column set before SQL is built.
//!
//! # Invariants
//! - Only validated column names are ever interpolated into SQL text.
//! - Iteration order is the column name order, so generated SQL is stable.

use super::gateway::{RepoError, RepoResult};
use super::record::Record;
use rusqlite::types::Value;
use std::collections::BTreeMap;

/// Column/value pairs keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: BTreeMap<String, Value>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn text(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(field, Value::Text(value.into()))
    }

    pub fn integer(self, field: impl Into<String>, value: i64) -> Self {
        self.with(field, Value::Integer(value))
    }

    pub fn optional_text(self, field: impl Into<String>, value: Option<String>) -> Self {
        match value {
            Some(value) => self.text(field, value),
            None => self.null(field),
        }
    }

    pub fn optional_integer(self, field: impl Into<String>, value: Option<i64>) -> Self {
        match value {
            Some(value) => self.integer(field, value),
            None => self.null(field),
        }
    }

    pub fn null(self, field: impl Into<String>) -> Self {
        self.with(field, Value::Null)
    }

    /// Sets one field, returning the previous value if any.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(field.into(), value.into())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }

    /// Rejects any key that is not a column of `R`.
    pub fn validate_for<R: Record>(&self) -> RepoResult<()> {
        match self
            .entries
            .keys()
            .find(|field| !R::COLUMNS.contains(&field.as_str()))
        {
            Some(field) => Err(RepoError::UnknownField {
                table: R::TABLE,
                field: field.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Renders the map as an AND-joined equality predicate.
    ///
    /// NULL values compare with `IS`, everything else with `=`. Returns
    /// `None` for an empty map.
    pub(crate) fn where_clause(&self, qualifier: Option<&str>) -> Option<(String, Vec<Value>)> {
        if self.is_empty() {
            return None;
        }

        let mut predicates = Vec::with_capacity(self.len());
        let mut binds = Vec::with_capacity(self.len());
        for (field, value) in self.iter() {
            let column = qualified(qualifier, field);
            let operator = if matches!(value, Value::Null) { "IS" } else { "=" };
            predicates.push(format!("{column} {operator} ?"));
            binds.push(value.clone());
        }

        Some((predicates.join(" AND "), binds))
    }

    /// Renders the map as a `SET` assignment list.
    pub(crate) fn set_clause(&self) -> (String, Vec<Value>) {
        let assignments = self
            .iter()
            .map(|(field, _)| format!("\"{field}\" = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let binds = self.entries.values().cloned().collect();
        (assignments, binds)
    }

    /// Renders the map as an insert column list, placeholder list and binds.
    pub(crate) fn insert_clause(&self) -> (String, String, Vec<Value>) {
        let columns = self
            .iter()
            .map(|(field, _)| format!("\"{field}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; self.len()].join(", ");
        let binds = self.entries.values().cloned().collect();
        (columns, placeholders, binds)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (field, value) in iter {
            map.insert(field, value);
        }
        map
    }
}

fn qualified(qualifier: Option<&str>, field: &str) -> String {
    match qualifier {
        Some(alias) => format!("{alias}.\"{field}\""),
        None => format!("\"{field}\""),
    }
}

#[cfg(test)]
mod tests {
    use super::FieldMap;
    use crate::model::major::Major;
    use crate::model::student::Student;
    use crate::repo::gateway::RepoError;
    use rusqlite::types::Value;

    #[test]
    fn validate_rejects_unknown_column() {
        let filter = FieldMap::new().text("nickname", "Ace");
        let err = filter.validate_for::<Student>().unwrap_err();
        assert!(matches!(
            err,
            RepoError::UnknownField { table: "students", ref field } if field == "nickname"
        ));
    }

    #[test]
    fn validate_accepts_known_columns() {
        let filter = FieldMap::new()
            .text("major_name", "History")
            .integer("count_students", 0);
        filter.validate_for::<Major>().unwrap();
    }

    #[test]
    fn where_clause_uses_is_for_null_values() {
        let filter = FieldMap::new().null("major_id").integer("course", 2);
        let (sql, binds) = filter.where_clause(Some("s")).unwrap();
        assert_eq!(sql, "s.\"course\" = ? AND s.\"major_id\" IS ?");
        assert_eq!(binds, vec![Value::Integer(2), Value::Null]);
    }

    #[test]
    fn empty_map_has_no_where_clause() {
        assert!(FieldMap::new().where_clause(None).is_none());
    }

    #[test]
    fn later_insert_replaces_earlier_value() {
        let mut fields = FieldMap::new().integer("course", 1);
        let previous = fields.insert("course", 3_i64);
        assert_eq!(previous, Some(Value::Integer(1)));
        assert_eq!(fields.get("course"), Some(&Value::Integer(3)));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn collects_from_pairs() {
        let fields: FieldMap = [("course", 2_i64), ("enrollment_year", 2023_i64)]
            .into_iter()
            .collect();
        let (columns, placeholders, binds) = fields.insert_clause();
        assert_eq!(columns, "\"course\", \"enrollment_year\"");
        assert_eq!(placeholders, "?, ?");
        assert_eq!(binds, vec![Value::Integer(2), Value::Integer(2023)]);
    }
}

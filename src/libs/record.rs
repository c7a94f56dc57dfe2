use crate::error::{Error, Result};
use crate::libs::schema::Table;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A row in progress: one value per column of its table.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    table: Arc<Table>,
    values: Vec<Value>,
}

impl Record {
    /// Builds a record from `(column, value)` pairs.
    ///
    /// Absent columns take their default, or `null` when nullable or
    /// generated by the database. Every other absent column is reported.
    pub fn new<I, K>(table: &Arc<Table>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut supplied: HashMap<String, Value> = HashMap::new();
        for (key, value) in values {
            let key = key.into();
            if table.column(&key).is_none() {
                return Err(Error::unknown_column(table.name(), key));
            }
            supplied.insert(key, value);
        }

        let mut missing = Vec::new();
        let mut row = Vec::with_capacity(table.columns().len());
        for column in table.columns() {
            let value = match (supplied.remove(column.name()), column.default_value()) {
                (Some(value), _) => value,
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    if column.is_required() {
                        missing.push(column.name().to_string());
                    }
                    Value::Null
                }
            };
            row.push(value);
        }

        if !missing.is_empty() {
            return Err(Error::MissingColumns {
                table: table.name().to_string(),
                missing,
            });
        }

        Ok(Self {
            table: Arc::clone(table),
            values: row,
        })
    }

    /// Builds a record from a serializable struct, ignoring fields that are
    /// not columns of `table`.
    pub fn from_model<T: Serialize>(table: &Arc<Table>, model: &T) -> Result<Self> {
        match serde_json::to_value(model)? {
            Value::Object(map) => Self::new(
                table,
                map.into_iter()
                    .filter(|(key, _)| table.column(key).is_some()),
            ),
            other => Err(Error::TypeMismatch {
                column: None,
                expected: "object".to_string(),
                found: other.to_string(),
            }),
        }
    }

    /// Converts the record into a typed struct.
    pub fn into_model<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.project(&[])?))?)
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.table.position(column).map(|i| &self.values[i])
    }

    /// Stores a value, e.g. an id returned by `INSERT ... RETURNING`.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Result<()> {
        let i = self
            .table
            .position(column)
            .ok_or_else(|| Error::unknown_column(self.table.name(), column))?;
        self.values[i] = value.into();
        Ok(())
    }

    /// Maps the requested columns (all of them when `columns` is empty) to
    /// their current values.
    pub fn project(&self, columns: &[&str]) -> Result<Map<String, Value>> {
        let mut map = Map::new();
        if columns.is_empty() {
            for (column, value) in self.table.columns().iter().zip(&self.values) {
                map.insert(column.name().to_string(), value.clone());
            }
            return Ok(map);
        }

        for name in columns {
            let value = self
                .get(name)
                .ok_or_else(|| Error::unknown_column(self.table.name(), *name))?;
            map.insert(name.to_string(), value.clone());
        }
        Ok(map)
    }

    /// Values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::column::Column;
    use crate::libs::schema::TableDef;
    use crate::libs::types::{Boolean, Serial, Text};
    use serde::Deserialize;
    use serde_json::json;

    fn users() -> Arc<Table> {
        let table = TableDef::new("User")
            .column(
                "id",
                Column::builder(Serial::default()).primary_key().build().unwrap(),
            )
            .column("username", Column::builder(Text::default()).build().unwrap())
            .column("email", Column::builder(Text::default()).unique().build().unwrap())
            .column("bio", Column::builder(Text::default()).nullable().build().unwrap())
            .column("active", Column::builder(Boolean).default(true).build().unwrap())
            .finish()
            .unwrap();
        Arc::new(table)
    }

    #[test]
    fn test_defaults_and_nulls() {
        let record = Record::new(
            &users(),
            [("username", json!("frank")), ("email", json!("frank@doesnotexist"))],
        )
        .unwrap();
        assert_eq!(record.get("id"), Some(&Value::Null));
        assert_eq!(record.get("bio"), Some(&Value::Null));
        assert_eq!(record.get("active"), Some(&json!(true)));
    }

    #[test]
    fn test_missing_required_columns() {
        let err = Record::new(&users(), Vec::<(String, Value)>::new()).unwrap_err();
        match &err {
            Error::MissingColumns { table, missing } => {
                assert_eq!(table, "users");
                assert_eq!(missing, &vec!["username".to_string(), "email".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("'username' and 'email'"));
    }

    #[test]
    fn test_unknown_supplied_column() {
        let err = Record::new(&users(), [("age", json!(3))]).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { ref column, .. } if column == "age"));
    }

    #[test]
    fn test_project() {
        let mut record = Record::new(
            &users(),
            [("username", json!("frank")), ("email", json!("f@x"))],
        )
        .unwrap();
        record.set("id", 5).unwrap();

        let some = record.project(&["id", "username"]).unwrap();
        assert_eq!(Value::Object(some), json!({"id": 5, "username": "frank"}));

        let all = record.project(&[]).unwrap();
        assert_eq!(all.len(), 5);

        let err = record.project(&["password"]).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { .. }));
        assert!(record.set("password", "x").is_err());
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct User {
        id: Option<i64>,
        username: String,
        email: String,
        bio: Option<String>,
        active: bool,
        #[serde(default)]
        session: Option<String>,
    }

    #[test]
    fn test_model_round_trip() {
        let table = users();
        let user = User {
            id: None,
            username: "ada".into(),
            email: "ada@mail.com".into(),
            bio: None,
            active: false,
            session: Some("ignored".into()),
        };
        let record = Record::from_model(&table, &user).unwrap();
        assert_eq!(record.get("active"), Some(&json!(false)));
        let back: User = record.into_model().unwrap();
        assert_eq!(back, User { session: None, ..user });
    }
}

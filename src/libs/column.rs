use crate::error::{Error, Result};
use crate::libs::index::Index;
use crate::libs::types::{Native, SqlType, is_decimal};
use serde_json::Value;

/// Declares a column; [`ColumnBuilder::build`] checks the constraints.
///
/// ```
/// use postdb::{Column, Integer, Text};
///
/// let id = Column::builder(Integer::default()).primary_key().build()?;
/// let email = Column::builder(Text::default()).unique().build()?;
/// # Ok::<(), postdb::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ColumnBuilder {
    column_type: SqlType,
    name: Option<String>,
    primary_key: bool,
    nullable: bool,
    unique: bool,
    default: Option<Value>,
    index: Option<Index>,
}

impl ColumnBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// A JSON `null` default counts as no default.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.default = (!value.is_null()).then_some(value);
        self
    }

    /// Attaches a default [`Index`] (unique btree, ascending).
    pub fn index(self) -> Self {
        self.with_index(Index::new())
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.index = Some(index);
        self
    }

    pub fn build(self) -> Result<Column> {
        let constraints = [self.unique, self.primary_key, self.default.is_some()];
        if constraints.iter().filter(|set| **set).count() > 1 {
            return Err(Error::schema(
                "'unique', 'primary_key', and 'default' are mutually exclusive.",
            ));
        }

        let default = match self.default {
            Some(value) if !self.nullable => Some(match &self.name {
                Some(name) => self.column_type.coerce(value).map_err(|e| e.in_column(name))?,
                None => self.column_type.coerce(value)?,
            }),
            other => other,
        };

        Ok(Column {
            name: self.name,
            column_type: self.column_type,
            primary_key: self.primary_key,
            nullable: self.nullable,
            unique: self.unique,
            default,
            index: self.index,
            table: None,
        })
    }
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: Option<String>,
    column_type: SqlType,
    primary_key: bool,
    nullable: bool,
    unique: bool,
    default: Option<Value>,
    index: Option<Index>,
    table: Option<String>,
}

impl Column {
    pub fn builder(column_type: impl Into<SqlType>) -> ColumnBuilder {
        ColumnBuilder {
            column_type: column_type.into(),
            name: None,
            primary_key: false,
            nullable: false,
            unique: false,
            default: None,
            index: None,
        }
    }

    /// Empty until the column is registered on a table, unless named explicitly.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn column_type(&self) -> &SqlType {
        &self.column_type
    }

    pub const fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn index(&self) -> Option<&Index> {
        self.index.as_ref()
    }

    /// Name of the owning table, once registered.
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Must be supplied when building a record.
    pub fn is_required(&self) -> bool {
        !self.nullable && self.default.is_none() && !self.column_type.is_auto_generated()
    }

    pub(crate) fn bind(&mut self, field: &str, table: &str) {
        if self.name.is_none() {
            self.name = Some(field.to_string());
        }
        self.table = Some(table.to_string());

        let name = self.name().to_string();
        if let Some(index) = self.index.as_mut() {
            index.bind(table, &name);
        }
    }

    /// `<name> <type> [DEFAULT <literal>|UNIQUE] [NOT NULL]`
    pub fn create_table_sql(&self) -> String {
        let mut builder = vec![self.name().to_string(), self.column_type.to_sql()];

        if let Some(default) = &self.default {
            builder.push("DEFAULT".to_string());
            builder.push(self.default_literal(default));
        } else if self.unique {
            builder.push("UNIQUE".to_string());
        }
        if !self.nullable {
            builder.push("NOT NULL".to_string());
        }

        builder.join(" ")
    }

    fn default_literal(&self, value: &Value) -> String {
        match value {
            Value::String(s) if matches!(self.column_type, SqlType::Text(_)) => quote(s),
            Value::Bool(b) => bool_literal(*b).to_string(),
            other => format!("({})", sql_literal(&self.column_type, other)),
        }
    }
}

fn bool_literal(b: bool) -> &'static str {
    if b { "TRUE" } else { "FALSE" }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn sql_literal(ty: &SqlType, value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => bool_literal(*b).to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if ty.native() == Native::Decimal && is_decimal(s) => s.trim().to_string(),
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let element = match ty {
                SqlType::Array(array) => array.element(),
                other => other,
            };
            let items: Vec<String> = items.iter().map(|item| sql_literal(element, item)).collect();
            format!("ARRAY[{}]", items.join(", "))
        }
        Value::Object(_) => quote(&value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::types::{
        Array, Boolean, Date, DateTime, ForeignKey, Integer, Numeric, Serial, Text,
    };
    use serde_json::json;

    fn bound(builder: ColumnBuilder, name: &str) -> Column {
        let mut col = builder.build().unwrap();
        col.bind(name, "things");
        col
    }

    #[test]
    fn test_constraint_exclusivity() {
        for unique in [false, true] {
            for primary in [false, true] {
                for with_default in [false, true] {
                    let mut builder = Column::builder(Integer::default());
                    if unique {
                        builder = builder.unique();
                    }
                    if primary {
                        builder = builder.primary_key();
                    }
                    if with_default {
                        builder = builder.default(1);
                    }
                    let set = [unique, primary, with_default].iter().filter(|b| **b).count();
                    let result = builder.build();
                    if set > 1 {
                        assert!(matches!(result, Err(Error::Schema(_))));
                    } else {
                        assert!(result.is_ok());
                    }
                }
            }
        }
    }

    #[test]
    fn test_default_is_coerced() {
        let col = Column::builder(Integer::default()).default("10").build().unwrap();
        assert_eq!(col.default_value(), Some(&json!(10)));

        let err = Column::builder(Integer::default()).default("ten").build();
        assert!(matches!(err, Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_nullable_default_kept_as_given() {
        let col = Column::builder(Integer::default())
            .nullable()
            .default("ten")
            .build()
            .unwrap();
        assert_eq!(col.default_value(), Some(&json!("ten")));
    }

    #[test]
    fn test_null_default_is_no_default() {
        let col = Column::builder(Text::default()).default(Value::Null).unique().build();
        assert!(col.is_ok());
    }

    #[test]
    fn test_column_sql() {
        let col = bound(Column::builder(Integer::default()).primary_key(), "id");
        assert_eq!(col.create_table_sql(), "id INTEGER NOT NULL");

        let col = bound(Column::builder(Text::default()).unique(), "email");
        assert_eq!(col.create_table_sql(), "email TEXT UNIQUE NOT NULL");

        let col = bound(Column::builder(Text::varchar(10)).nullable(), "nick");
        assert_eq!(col.create_table_sql(), "nick VARCHAR(10)");
    }

    #[test]
    fn test_default_literals() {
        let col = bound(Column::builder(Text::default()).default("it's"), "motto");
        assert_eq!(col.create_table_sql(), "motto TEXT DEFAULT 'it''s' NOT NULL");

        let col = bound(Column::builder(Boolean).default(true), "active");
        assert_eq!(col.create_table_sql(), "active BOOLEAN DEFAULT TRUE NOT NULL");

        let col = bound(Column::builder(Integer::default()).default(0), "score");
        assert_eq!(col.create_table_sql(), "score INTEGER DEFAULT (0) NOT NULL");

        let col = bound(Column::builder(Numeric::default()).default(2.5), "ratio");
        assert_eq!(col.create_table_sql(), "ratio NUMERIC DEFAULT (2.5) NOT NULL");

        let tags = Array::new(Integer::default()).unwrap();
        let col = bound(Column::builder(tags).default(json!([1, 2])), "tags");
        assert_eq!(
            col.create_table_sql(),
            "tags INTEGER ARRAY DEFAULT (ARRAY[1, 2]) NOT NULL"
        );
    }

    #[test]
    fn test_decimal_default_rendered_exactly() {
        let balance = Numeric::new(Some(30), Some(2)).unwrap();
        let col = bound(Column::builder(balance).default("12345678901234567890.12"), "bal");
        assert_eq!(
            col.create_table_sql(),
            "bal NUMERIC(30, 2) DEFAULT (12345678901234567890.12) NOT NULL"
        );

        let col = bound(Column::builder(Numeric::default()).default("0.10"), "fee");
        assert_eq!(col.default_value(), Some(&json!("0.10")));
        assert_eq!(col.create_table_sql(), "fee NUMERIC DEFAULT (0.10) NOT NULL");

        let rates = Array::new(Numeric::default()).unwrap();
        let col = bound(Column::builder(rates).default(json!(["1.50", 2])), "rates");
        assert_eq!(
            col.create_table_sql(),
            "rates NUMERIC ARRAY DEFAULT (ARRAY[1.50, 2]) NOT NULL"
        );
    }

    #[test]
    fn test_temporal_defaults() {
        let col = bound(Column::builder(Date).default("2024-06-15"), "born");
        assert_eq!(col.create_table_sql(), "born DATE DEFAULT ('2024-06-15') NOT NULL");

        let err = Column::builder(Date).name("born").default("banana").build().unwrap_err();
        assert!(matches!(&err, Error::TypeMismatch { column: Some(c), .. } if c == "born"));

        let err = Column::builder(DateTime::default()).default("not a time").build();
        assert!(matches!(err, Err(Error::TypeMismatch { column: None, .. })));
    }

    #[test]
    fn test_foreign_key_column() {
        let fk = ForeignKey::new("users", "id").unwrap();
        let col = bound(Column::builder(fk), "author_id");
        assert_eq!(
            col.create_table_sql(),
            "author_id INTEGER REFERENCES users(id) ON DELETE CASCADE ON UPDATE NO ACTION NOT NULL"
        );
    }

    #[test]
    fn test_required() {
        assert!(Column::builder(Integer::default()).build().unwrap().is_required());
        assert!(!Column::builder(Serial::default()).build().unwrap().is_required());
        assert!(!Column::builder(Text::default()).nullable().build().unwrap().is_required());
        assert!(!Column::builder(Text::default()).default("x").build().unwrap().is_required());
    }

    #[test]
    fn test_bind_keeps_explicit_name() {
        let col = bound(Column::builder(Text::default()).name("mail").index(), "email");
        assert_eq!(col.name(), "mail");
        assert_eq!(col.table(), Some("things"));
        assert_eq!(col.index().unwrap().resolve_name().unwrap(), "things_mail_idx");
    }
}

// schema.rs
use crate::error::{Error, Result};
use crate::libs::column::Column;
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// A type that declares a table. Usually implemented by `#[model]`.
pub trait Model: 'static {
    /// Columns in declaration order, keyed by field name.
    fn definition() -> Result<TableDef>;

    fn register(registry: &mut Registry) -> Result<Arc<Table>>
    where
        Self: Sized,
    {
        registry.register::<Self>()
    }
}

/// A table declaration before registration.
///
/// ```
/// use postdb::{Column, Integer, TableDef, Text};
///
/// let users = TableDef::new("User")
///     .column("id", Column::builder(Integer::default()).primary_key().build()?)
///     .column("username", Column::builder(Text::default()).build()?)
///     .finish()?;
/// assert_eq!(users.name(), "users");
/// # Ok::<(), postdb::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct TableDef {
    type_name: String,
    tablename: Option<String>,
    columns: Vec<(String, Column)>,
}

impl TableDef {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            tablename: None,
            columns: Vec::new(),
        }
    }

    /// Overrides the derived `<lowercase type name>s` table name.
    pub fn tablename(mut self, name: impl Into<String>) -> Self {
        self.tablename = Some(name.into());
        self
    }

    pub fn column(mut self, field: impl Into<String>, column: Column) -> Self {
        self.columns.push((field.into(), column));
        self
    }

    /// Names the table and its columns and binds every column (and index)
    /// to the table.
    pub fn finish(self) -> Result<Table> {
        let name = self
            .tablename
            .unwrap_or_else(|| format!("{}s", self.type_name.to_lowercase()));

        if name.is_empty() {
            return Err(Error::schema("table name cannot be empty"));
        }
        if self.columns.is_empty() {
            return Err(Error::schema(format!("table {} declares no columns", name)));
        }

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(self.columns.len());
        for (field, mut column) in self.columns {
            column.bind(&field, &name);
            if !seen.insert(column.name().to_string()) {
                return Err(Error::schema(format!(
                    "table {} declares column '{}' twice",
                    name,
                    column.name()
                )));
            }
            columns.push(column);
        }

        Ok(Table {
            name,
            type_name: self.type_name,
            columns,
        })
    }
}

/// Finalized, immutable table metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    type_name: String,
    columns: Vec<Column>,
}

impl Table {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn primary_keys(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_primary_key())
            .map(Column::name)
            .collect()
    }

    /// The `CREATE TABLE` statement followed, after an empty line, by one
    /// `CREATE INDEX` statement per indexed column.
    pub fn create_table_sql(&self, if_not_exists: bool) -> String {
        let mut builder = vec!["CREATE TABLE"];
        if if_not_exists {
            builder.push("IF NOT EXISTS");
        }
        builder.push(&self.name);

        let mut elements: Vec<String> = self.columns.iter().map(Column::create_table_sql).collect();
        let pks = self.primary_keys();
        if !pks.is_empty() {
            elements.push(format!("PRIMARY KEY ({})", pks.join(", ")));
        }

        let mut statements = vec![format!(
            "{} (\n    {}\n);",
            builder.join(" "),
            elements.join(",\n    ")
        )];

        let indexes = self.create_index_sql();
        if !indexes.is_empty() {
            statements.push(String::new());
            statements.extend(indexes);
        }

        statements.join("\n")
    }

    /// One `CREATE INDEX` statement per indexed column, in column order.
    pub fn create_index_sql(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter_map(|c| c.index().map(|index| index.render(&self.name, c.name())))
            .collect()
    }

    pub fn drop_table_sql(&self, if_exists: bool, cascade: bool) -> String {
        let mut builder = vec!["DROP TABLE"];
        if if_exists {
            builder.push("IF EXISTS");
        }
        builder.push(&self.name);
        builder.push(if cascade { "CASCADE;" } else { "RESTRICT;" });
        builder.join(" ")
    }
}

/// Every table declared by the program, in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    tables: Vec<Arc<Table>>,
    by_type: HashMap<TypeId, Arc<Table>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `M` on first call; later calls return the same table.
    pub fn register<M: Model>(&mut self) -> Result<Arc<Table>> {
        if let Some(table) = self.by_type.get(&TypeId::of::<M>()) {
            return Ok(Arc::clone(table));
        }
        let table = self.register_def(M::definition()?)?;
        self.by_type.insert(TypeId::of::<M>(), Arc::clone(&table));
        Ok(table)
    }

    /// Registers a hand-built definition. Table names must be unique.
    pub fn register_def(&mut self, def: TableDef) -> Result<Arc<Table>> {
        let table = def.finish()?;
        if self.get(table.name()).is_some() {
            return Err(Error::DuplicateTable {
                name: table.name().to_string(),
            });
        }

        debug!(
            "Registered table {} ({} columns) for {}",
            table.name(),
            table.columns().len(),
            table.type_name()
        );

        let table = Arc::new(table);
        self.tables.push(Arc::clone(&table));
        Ok(table)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Table>> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn table<M: Model>(&self) -> Option<&Arc<Table>> {
        self.by_type.get(&TypeId::of::<M>())
    }

    pub fn tables(&self) -> impl Iterator<Item = &Arc<Table>> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

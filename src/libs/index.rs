use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Access method used by `CREATE INDEX ... USING`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexMethod {
    #[default]
    Btree,
    Hash,
    Gist,
    Gin,
}

impl IndexMethod {
    pub const ALL: [IndexMethod; 4] = [
        IndexMethod::Btree,
        IndexMethod::Hash,
        IndexMethod::Gist,
        IndexMethod::Gin,
    ];

    pub const fn as_sql(self) -> &'static str {
        match self {
            IndexMethod::Btree => "btree",
            IndexMethod::Hash => "hash",
            IndexMethod::Gist => "gist",
            IndexMethod::Gin => "gin",
        }
    }
}

impl FromStr for IndexMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_sql() == s)
            .ok_or_else(|| {
                Error::schema("Invalid index method, must be one of: btree, hash, gist, gin")
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            _ => Err(Error::schema("Invalid index order, must be one of: ASC, DESC")),
        }
    }
}

/// An index on a single column.
///
/// Unless named explicitly, the name is derived as `<table>_<column>_idx` the
/// first time it is needed, which requires the owning table to be registered.
#[derive(Debug, Clone)]
pub struct Index {
    method: IndexMethod,
    order: SortOrder,
    unique: bool,
    explicit_name: Option<String>,
    owner: Option<(String, String)>,
    resolved: OnceLock<String>,
}

impl Default for Index {
    fn default() -> Self {
        Self::new()
    }
}

impl Index {
    /// A unique btree index in ascending order.
    pub fn new() -> Self {
        Self {
            method: IndexMethod::Btree,
            order: SortOrder::Asc,
            unique: true,
            explicit_name: None,
            owner: None,
            resolved: OnceLock::new(),
        }
    }

    /// Builds an index from textual method and order, e.g. `("hash", "DESC")`.
    pub fn parse(method: &str, order: &str) -> Result<Self> {
        Ok(Self::new().method(method.parse()?).order(order.parse()?))
    }

    pub fn method(mut self, method: IndexMethod) -> Self {
        self.method = method;
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.explicit_name = Some(name.into());
        self
    }

    pub const fn index_method(&self) -> IndexMethod {
        self.method
    }

    pub const fn sort_order(&self) -> SortOrder {
        self.order
    }

    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    /// `(table, column)` this index was attached to at registration.
    pub fn owner(&self) -> Option<(&str, &str)> {
        self.owner.as_ref().map(|(t, c)| (t.as_str(), c.as_str()))
    }

    /// Attaches the index to `table.column`, dropping any name derived for a
    /// previous owner.
    pub(crate) fn bind(&mut self, table: &str, column: &str) {
        self.owner = Some((table.to_string(), column.to_string()));
        self.resolved = OnceLock::new();
    }

    /// Returns the explicit name, or derives and memoizes the default one.
    pub fn resolve_name(&self) -> Result<&str> {
        if let Some(name) = &self.explicit_name {
            return Ok(name.as_str());
        }
        let (table, column) = self.bound()?;
        Ok(self.name_for(table, column))
    }

    /// `CREATE [UNIQUE] INDEX <name> ON <table> USING <method> (<column> <order>);`
    pub fn create_index_sql(&self) -> Result<String> {
        let (table, column) = self.bound()?;
        Ok(self.render(table, column))
    }

    fn bound(&self) -> Result<(&str, &str)> {
        match (&self.explicit_name, self.owner()) {
            (_, Some(owner)) => Ok(owner),
            (Some(name), None) => Err(Error::schema(format!(
                "index {} is not attached to a table",
                name
            ))),
            (None, None) => Err(Error::schema(
                "index name requested before its table was registered",
            )),
        }
    }

    fn name_for(&self, table: &str, column: &str) -> &str {
        match &self.explicit_name {
            Some(name) => name.as_str(),
            None => self
                .resolved
                .get_or_init(|| format!("{}_{}_idx", table, column))
                .as_str(),
        }
    }

    pub(crate) fn render(&self, table: &str, column: &str) -> String {
        let mut builder = vec!["CREATE"];
        if self.unique {
            builder.push("UNIQUE");
        }
        builder.extend([
            "INDEX",
            self.name_for(table, column),
            "ON",
            table,
            "USING",
            self.method.as_sql(),
        ]);

        format!("{} ({} {});", builder.join(" "), column, self.order.as_sql())
    }
}

impl PartialEq for Index {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method
            && self.order == other.order
            && self.unique == other.unique
            && self.explicit_name == other.explicit_name
            && self.owner == other.owner
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolve_name() {
            Ok(name) => write!(f, "{} ({})", name, self.method.as_sql()),
            Err(_) => write!(f, "<unbound> ({})", self.method.as_sql()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let idx = Index::new();
        assert_eq!(idx.index_method(), IndexMethod::Btree);
        assert_eq!(idx.sort_order(), SortOrder::Asc);
        assert!(idx.is_unique());
    }

    #[test]
    fn test_parse_validates() {
        let idx = Index::parse("gin", "DESC").unwrap();
        assert_eq!(idx.index_method(), IndexMethod::Gin);
        assert_eq!(idx.sort_order(), SortOrder::Desc);
        assert!(matches!(Index::parse("rtree", "ASC"), Err(Error::Schema(_))));
        assert!(matches!(Index::parse("btree", "UP"), Err(Error::Schema(_))));
    }

    #[test]
    fn test_auto_name() {
        let mut idx = Index::new();
        assert!(idx.resolve_name().is_err());
        idx.bind("users", "username");
        assert_eq!(idx.resolve_name().unwrap(), "users_username_idx");
        // memoized
        assert_eq!(idx.resolve_name().unwrap(), "users_username_idx");
    }

    #[test]
    fn test_explicit_name_wins() {
        let mut idx = Index::new().name("by_mail");
        assert_eq!(idx.resolve_name().unwrap(), "by_mail");
        assert!(idx.create_index_sql().is_err());
        idx.bind("users", "email");
        assert_eq!(idx.resolve_name().unwrap(), "by_mail");
    }

    #[test]
    fn test_create_index_sql() {
        let mut idx = Index::new();
        idx.bind("users", "username");
        assert_eq!(
            idx.create_index_sql().unwrap(),
            "CREATE UNIQUE INDEX users_username_idx ON users USING btree (username ASC);"
        );

        let mut idx = Index::new()
            .unique(false)
            .method(IndexMethod::Hash)
            .order(SortOrder::Desc);
        idx.bind("posts", "author_id");
        assert_eq!(
            idx.create_index_sql().unwrap(),
            "CREATE INDEX posts_author_id_idx ON posts USING hash (author_id DESC);"
        );
    }

    #[test]
    fn test_rebind_derives_fresh_name() {
        let mut idx = Index::new();
        idx.bind("as", "x");
        assert_eq!(idx.resolve_name().unwrap(), "as_x_idx");

        let mut copy = idx.clone();
        copy.bind("bs", "x");
        assert_eq!(copy.resolve_name().unwrap(), "bs_x_idx");
        assert_eq!(
            copy.create_index_sql().unwrap(),
            "CREATE UNIQUE INDEX bs_x_idx ON bs USING btree (x ASC);"
        );
        assert_eq!(idx.resolve_name().unwrap(), "as_x_idx");
    }

    #[test]
    fn test_unbound_sql_fails() {
        assert!(Index::new().create_index_sql().is_err());
    }
}

//! # postdb
//!
//! Declarative PostgreSQL schemas. Tables are declared as structs (or built by
//! hand with [`TableDef`]), registered once into a [`Registry`], and rendered
//! into `CREATE TABLE`, `CREATE INDEX` and `DROP TABLE` statements.
//!
//! ```
//! use postdb::*;
//!
//! #[model]
//! struct User {
//!     #[column(Integer::default(), primary_key)]
//!     id: i64,
//!     #[column(Text::default())]
//!     username: String,
//!     #[column(Text::default(), unique)]
//!     email: String,
//! }
//!
//! let mut registry = Registry::new();
//! let users = registry.register::<User>()?;
//! assert!(users.create_table_sql(true).starts_with("CREATE TABLE IF NOT EXISTS users ("));
//! # Ok::<(), postdb::Error>(())
//! ```
//!
//! Generated SQL is executed through the [`Executor`] trait, implemented for
//! the sqlx-backed [`Pool`].

extern crate self as postdb;

pub mod config;
pub mod error;
mod libs;

pub use config::PoolConfig;
pub use error::{Error, Result};
pub use libs::*;
pub use postdb_derive::model;

//! End-to-end tests for `#[model]` declarations.

use postdb::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[model]
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[column(Integer::default(), primary_key)]
    pub id: i64,
    #[column(Text::default())]
    pub username: String,
    #[column(Text::default(), unique)]
    pub email: String,
}

#[model(tablename = "articles")]
#[derive(Debug, Serialize, Deserialize)]
pub struct Post {
    #[column(Serial::default(), primary_key)]
    pub id: Option<i64>,
    #[column(Text::varchar(120), name = "headline", unique)]
    pub title: String,
    #[column(Text::default(), nullable)]
    pub content: Option<String>,
    #[column(Boolean, default = false)]
    pub draft: bool,
    #[column(
        ForeignKey::new("users", "id")?.on_delete("set null")?,
        index = Index::new().unique(false).method(IndexMethod::Hash)
    )]
    pub author_id: i64,
    #[column(Array::new(Text::default())?, nullable, index)]
    pub tags: Option<Vec<String>>,
    #[serde(skip)]
    pub cached_score: u32,
}

#[model]
pub struct Bad {
    #[column(Integer::default(), primary_key, unique)]
    pub id: i64,
}

#[model]
pub struct Invoice {
    #[column(Serial::default(), primary_key)]
    pub id: Option<i64>,
    #[column(Numeric::new(Some(30), Some(2))?, default = "12345678901234567890.12")]
    pub total: String,
    #[column(Date, default = "2024-06-15")]
    pub issued: String,
}

#[model]
pub struct BadDate {
    #[column(Date, default = "banana")]
    pub born: String,
}

#[test]
fn test_user_table_sql() {
    let mut registry = Registry::new();
    let users = registry.register::<User>().unwrap();
    assert_eq!(
        users.create_table_sql(true),
        "CREATE TABLE IF NOT EXISTS users (\n    id INTEGER NOT NULL,\n    username TEXT NOT NULL,\n    email TEXT UNIQUE NOT NULL,\n    PRIMARY KEY (id)\n);"
    );
    assert_eq!(users.drop_table_sql(true, true), "DROP TABLE IF EXISTS users CASCADE;");
}

#[test]
fn test_post_table_sql() {
    let mut registry = Registry::new();
    let posts = registry.register::<Post>().unwrap();
    assert_eq!(posts.name(), "articles");
    assert_eq!(posts.type_name(), "Post");
    assert_eq!(
        posts.create_table_sql(true),
        "CREATE TABLE IF NOT EXISTS articles (\n    \
         id SERIAL NOT NULL,\n    \
         headline VARCHAR(120) UNIQUE NOT NULL,\n    \
         content TEXT,\n    \
         draft BOOLEAN DEFAULT FALSE NOT NULL,\n    \
         author_id INTEGER REFERENCES users(id) ON DELETE SET NULL ON UPDATE NO ACTION NOT NULL,\n    \
         tags TEXT ARRAY,\n    \
         PRIMARY KEY (id)\n);\n\
         \n\
         CREATE INDEX articles_author_id_idx ON articles USING hash (author_id ASC);\n\
         CREATE UNIQUE INDEX articles_tags_idx ON articles USING btree (tags ASC);"
    );
    assert_eq!(posts.drop_table_sql(true, false), "DROP TABLE IF EXISTS articles RESTRICT;");
}

#[test]
fn test_columns_follow_declaration_order() {
    let table = Post::definition().unwrap().finish().unwrap();
    let names: Vec<&str> = table.columns().iter().map(Column::name).collect();
    assert_eq!(names, ["id", "headline", "content", "draft", "author_id", "tags"]);
}

#[test]
fn test_invalid_declaration_fails() {
    let mut registry = Registry::new();
    assert!(matches!(registry.register::<Bad>(), Err(Error::Schema(_))));
    assert!(registry.is_empty());
}

#[test]
fn test_registry_enumerates_models() {
    let mut registry = Registry::new();
    registry.register::<User>().unwrap();
    registry.register::<Post>().unwrap();
    registry.register::<User>().unwrap();
    let names: Vec<&str> = registry.tables().map(|t| t.name()).collect();
    assert_eq!(names, ["users", "articles"]);
    assert!(registry.get("articles").is_some());
}

#[test]
fn test_records() {
    let mut registry = Registry::new();
    let users = registry.register::<User>().unwrap();

    let user = User {
        id: 5,
        username: "frank".into(),
        email: "frank@doesnotexist".into(),
    };
    let record = Record::from_model(&users, &user).unwrap();
    assert_eq!(
        serde_json::Value::Object(record.project(&["id", "username"]).unwrap()),
        json!({"id": 5, "username": "frank"})
    );
    assert_eq!(record.into_model::<User>().unwrap(), user);

    let err = Record::new(&users, [("id", json!(1))]).unwrap_err();
    assert!(err.to_string().contains("'username' and 'email'"));
}

#[test]
fn test_serial_and_defaults_are_optional() {
    let mut registry = Registry::new();
    let posts = registry.register::<Post>().unwrap();
    let record = Record::new(
        &posts,
        [("headline", json!("Hello World")), ("author_id", json!(1))],
    )
    .unwrap();
    assert_eq!(record.get("draft"), Some(&json!(false)));
    assert_eq!(record.get("id"), Some(&serde_json::Value::Null));
}

#[test]
fn test_typed_defaults() {
    let mut registry = Registry::new();
    let invoices = registry.register::<Invoice>().unwrap();
    assert_eq!(
        invoices.create_table_sql(false),
        "CREATE TABLE invoices (\n    id SERIAL NOT NULL,\n    total NUMERIC(30, 2) DEFAULT (12345678901234567890.12) NOT NULL,\n    issued DATE DEFAULT ('2024-06-15') NOT NULL,\n    PRIMARY KEY (id)\n);"
    );

    let record = Record::new(&invoices, Vec::<(String, serde_json::Value)>::new()).unwrap();
    assert_eq!(record.get("total"), Some(&json!("12345678901234567890.12")));
}

#[test]
fn test_bad_default_names_field() {
    let err = BadDate::definition().unwrap_err();
    match err {
        Error::TypeMismatch { column, expected, .. } => {
            assert_eq!(column.as_deref(), Some("born"));
            assert_eq!(expected, "DATE");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

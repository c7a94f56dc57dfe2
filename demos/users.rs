//! Declares two tables, prints their DDL and, when `DATABASE_URL` is set,
//! creates and drops them.

use postdb::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

#[model]
#[derive(Debug, Serialize, Deserialize)]
pub struct User {
    #[column(Serial::default(), primary_key)]
    pub id: Option<i64>,
    #[column(Text::default())]
    pub username: String,
    #[column(Text::default(), unique)]
    pub email: String,
}

#[model]
#[derive(Debug, Serialize, Deserialize)]
pub struct Post {
    #[column(Serial::default(), primary_key)]
    pub id: Option<i64>,
    #[column(Text::default(), unique)]
    pub title: String,
    #[column(Text::default())]
    pub content: String,
    #[column(ForeignKey::new("users", "id")?, index = Index::parse("btree", "ASC")?)]
    pub author_id: i64,
}

#[tokio::main]
async fn main() -> postdb::Result<()> {
    let mut registry = Registry::new();
    let users = registry.register::<User>()?;
    let posts = registry.register::<Post>()?;

    println!("{}", users.create_table_sql(true));
    println!("{}", posts.create_table_sql(true));

    let mut user = Record::new(
        &users,
        [("username", json!("frank")), ("email", json!("frank@doesnotexist"))],
    )?;
    println!("{:?}", user.project(&[])?);

    let config = match PoolConfig::from_env() {
        Ok(config) => config,
        Err(_) => return Ok(()),
    };
    let pool = Pool::open(&config).await?;
    registry.create_all(&pool, true).await?;

    let row = pool
        .fetchrow(
            "INSERT INTO users (username, email) VALUES ($1, $2) \
             ON CONFLICT (email) DO NOTHING RETURNING id",
            &[json!("frank"), json!("frank@doesnotexist")],
        )
        .await?;
    match row.and_then(|r| r.get("id").cloned()) {
        Some(id) => user.set("id", id)?,
        None => println!("A user with this email already exists."),
    }
    println!("{:?}", user.into_model::<User>());
    println!("{:?}", pool.fetch("SELECT * FROM users", &[]).await?);

    registry.drop_all(&pool, true).await?;
    pool.close(Duration::from_secs(3)).await
}

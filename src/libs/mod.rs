pub mod column;
pub mod index;
pub mod orm;
pub mod record;
pub mod schema;
pub mod types;

// Re-export them for easier access from the crate root
pub use column::*;
pub use index::*;
pub use orm::*;
pub use record::*;
pub use schema::*;
pub use types::*;

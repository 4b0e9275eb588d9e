mod schema;
mod settings;
mod storage;

pub use schema::SchemaManager;
pub use settings::{Auth, Database, Settings};
pub use storage::Storage;

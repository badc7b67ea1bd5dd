pub mod manager;
pub mod memory;
pub mod object_id;
pub mod postgres;
pub mod store;

pub use manager::DatabaseManager;
pub use memory::MemoryStore;
pub use object_id::{canonical_object_id, is_object_id, parse_object_id};
pub use postgres::PgDocumentStore;
pub use store::{DeleteResult, Document, DocumentStore, StoreError, Update, UpdateResult};

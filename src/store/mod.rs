// Adapters for the document store port.

pub mod memory;
pub mod mongo;

pub use memory::{MemoryStore, StoreOp};
pub use mongo::MongoStore;

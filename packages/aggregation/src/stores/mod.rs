//! Store implementations.
//!
//! Only the in-memory store lives in the library; the Postgres
//! implementations live with the service binary, which owns the pool.

pub mod memory;

pub use memory::MemoryStore;

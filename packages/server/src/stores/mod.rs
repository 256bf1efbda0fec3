//! Store backends owned by the service binary.

pub mod postgres;

pub use postgres::PgStore;

//! # Storage adapters
//!
//! Implementations of the `domains` repository ports.
//!
//! - [`memory::MemoryStore`]: always compiled; `DashMap`-backed, used for
//!   development and the test suites.
//! - `postgres::PgStore`: feature `db-postgres`; sqlx over PostgreSQL with
//!   embedded migrations.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::MemoryStore;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;

//! The central domain logic and interface definitions for MovieSpace.
//!
//! Nothing in this crate performs I/O: it defines entities, the search
//! plan layer, pagination rules and the ports adapters implement.

pub mod errors;
pub mod models;
pub mod pagination;
pub mod ports;
pub mod search;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use pagination::*;
pub use ports::*;

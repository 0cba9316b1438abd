//! # Domain Models
//!
//! These structs represent the core entities of MovieSpace.
//! Media is addressed polymorphically through [`MediaRef`] so comments,
//! ratings, shelves, history and lists share one shape.

pub mod engagement;
pub mod media;
pub mod moderation;
pub mod social;
pub mod user;

pub use engagement::*;
pub use media::*;
pub use moderation::*;
pub use social::*;
pub use user::*;

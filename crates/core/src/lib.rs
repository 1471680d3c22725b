//! Core value types for futon
//!
//! This crate defines the foundational types shared by the client:
//! - ComplexKey / KeyComponent: composite view keys and their JSON encoding
//! - PageRequest / ResumeKey: immutable pagination cursors and opaque tokens
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod error;
pub mod key;

pub use cursor::{PageRequest, ResumeKey};
pub use error::{Error, Result};
pub use key::{ComplexKey, KeyComponent};

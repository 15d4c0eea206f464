//! Collectibles Types - Pure type definitions shared by server and tests
//!
//! This crate contains only serde data types with no async runtime
//! dependencies: stored records, creation payloads, patch payloads and the
//! message envelope used for non-resource responses.

pub mod lenient;
pub mod order;
pub mod product;
pub mod user;

pub use order::*;
pub use product::*;
pub use user::*;

use serde::{Deserialize, Serialize};

/// JSON wrapper for non-resource responses (errors, confirmations).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub message: String,
}

impl Envelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

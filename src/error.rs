//! Error handling for pack and unpack operations
//!
//! The error type lives in [`crate::common`] next to the types it reports
//! on; this module re-exports it under the conventional name.

pub use crate::common::LzwError;
pub use crate::common::Result;

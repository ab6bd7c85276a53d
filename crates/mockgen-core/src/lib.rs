//! Go mock generator core.
//!
//! Takes a structural [`model::Package`] (produced by an external front end) and emits a
//! formatted Go source file containing, per interface, a pegomock stand-in and its
//! verification API.

pub mod aliases;
pub mod diagnostics;
pub mod go_emit;
pub mod gofmt;
pub mod model;
pub mod signature;
pub mod validate;

pub use go_emit::{generate_output, GenerateOptions};

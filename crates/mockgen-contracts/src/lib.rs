//! Shared, version-pinned protocol identifiers.
//!
//! These constants are the single source of truth for the schema/version strings that
//! appear in machine-readable I/O, and for the names the generated Go code hardcodes.

pub const MODEL_SCHEMA_VERSION: &str = "mockgen.model@0.1.0";
pub const MANIFEST_SCHEMA_VERSION: &str = "mockgen.manifest@0.1.0";

/// Name written into the "Code generated by ..." header.
pub const GENERATOR_NAME: &str = "pegomock";

/// Import path of the runtime the generated mocks call into.
pub const RUNTIME_IMPORT_PATH: &str = "github.com/petergtz/pegomock/v4";
/// Alias under which the runtime is always imported; the generated code names it directly.
pub const RUNTIME_ALIAS: &str = "pegomock";

/// Standard library packages every generated file imports.
pub const SUPPORT_IMPORT_PATHS: &[&str] = &["reflect", "time"];

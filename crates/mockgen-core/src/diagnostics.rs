use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    Parse,
    Validate,
    Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticCode {
    MG0001ModelParseError,
    MG0002SchemaVersionMismatch,
    MG0100InvalidIdentifier,
    MG0101KeywordIdentifier,
    MG0110DuplicateMethod,
    MG0111DuplicateTypeParam,
    MG0112ReservedMethodName,
    MG0113DuplicateInterface,
    MG0114DuplicateGeneratedName,
    MG0120EmptyTypeName,
    MG0121UnknownTypeParam,
    MG0130InvalidPackagePath,
    MG0900FormatFailed,
}

impl DiagnosticCode {
    pub fn code_str(self) -> &'static str {
        match self {
            DiagnosticCode::MG0001ModelParseError => "MG0001",
            DiagnosticCode::MG0002SchemaVersionMismatch => "MG0002",
            DiagnosticCode::MG0100InvalidIdentifier => "MG0100",
            DiagnosticCode::MG0101KeywordIdentifier => "MG0101",
            DiagnosticCode::MG0110DuplicateMethod => "MG0110",
            DiagnosticCode::MG0111DuplicateTypeParam => "MG0111",
            DiagnosticCode::MG0112ReservedMethodName => "MG0112",
            DiagnosticCode::MG0113DuplicateInterface => "MG0113",
            DiagnosticCode::MG0114DuplicateGeneratedName => "MG0114",
            DiagnosticCode::MG0120EmptyTypeName => "MG0120",
            DiagnosticCode::MG0121UnknownTypeParam => "MG0121",
            DiagnosticCode::MG0130InvalidPackagePath => "MG0130",
            DiagnosticCode::MG0900FormatFailed => "MG0900",
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            DiagnosticCode::MG0001ModelParseError | DiagnosticCode::MG0002SchemaVersionMismatch => {
                Phase::Parse
            }
            DiagnosticCode::MG0900FormatFailed => Phase::Format,
            _ => Phase::Validate,
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            DiagnosticCode::MG0001ModelParseError => "failed to parse interface model",
            DiagnosticCode::MG0002SchemaVersionMismatch => {
                "interface model schema_version mismatch"
            }
            DiagnosticCode::MG0100InvalidIdentifier => "invalid Go identifier",
            DiagnosticCode::MG0101KeywordIdentifier => "Go keyword used as identifier",
            DiagnosticCode::MG0110DuplicateMethod => "duplicate method name",
            DiagnosticCode::MG0111DuplicateTypeParam => "duplicate type parameter",
            DiagnosticCode::MG0112ReservedMethodName => {
                "method name collides with the generated mock API"
            }
            DiagnosticCode::MG0113DuplicateInterface => "duplicate interface name",
            DiagnosticCode::MG0114DuplicateGeneratedName => {
                "two interfaces would generate the same Go declaration"
            }
            DiagnosticCode::MG0120EmptyTypeName => "empty type name",
            DiagnosticCode::MG0121UnknownTypeParam => {
                "type parameter is not declared on the interface"
            }
            DiagnosticCode::MG0130InvalidPackagePath => "invalid package path",
            DiagnosticCode::MG0900FormatFailed => "generated source failed to format",
        }
    }

    pub fn default_help(self) -> Option<&'static str> {
        match self {
            DiagnosticCode::MG0002SchemaVersionMismatch => {
                Some("Regenerate the model with a front end that targets this mockgen version.")
            }
            DiagnosticCode::MG0121UnknownTypeParam => Some(
                "Type parameters are declared once on the interface and referenced by name from its methods.",
            ),
            DiagnosticCode::MG0114DuplicateGeneratedName => Some(
                "A mock name override applies to every interface; generate one interface per file when using it.",
            ),
            DiagnosticCode::MG0900FormatFailed => Some(
                "This is a bug in mockgen. Please report it with the input model.",
            ),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub phase: Phase,
    pub severity: Severity,
    pub message: String,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            phase: code.phase(),
            severity: Severity::Error,
            message: message.into(),
            help: code.default_help().map(|s| s.to_string()),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} {:?}: {}",
            self.code.code_str(),
            self.phase,
            self.severity,
            self.message
        )?;
        if let Some(help) = &self.help {
            write!(f, "\n  help: {help}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

pub fn render_diagnostics_md() -> String {
    let mut rows: Vec<(&'static str, Phase, &'static str, &'static str)> = all_codes()
        .iter()
        .map(|&code| {
            (
                code.code_str(),
                code.phase(),
                code.default_message(),
                code.default_help().unwrap_or(""),
            )
        })
        .collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));

    let mut out = String::new();
    out.push_str("# mockgen diagnostics catalog\n\n");
    out.push_str("This document is generated from `crates/mockgen-core/src/diagnostics.rs`.\n\n");
    out.push_str("| Code | Phase | Message | Help |\n");
    out.push_str("| ---- | ----- | ------- | ---- |\n");
    for (code, phase, msg, help) in rows {
        out.push_str(&format!("| {code} | {phase:?} | {msg} | {help} |\n"));
    }
    out
}

fn all_codes() -> &'static [DiagnosticCode] {
    &[
        DiagnosticCode::MG0001ModelParseError,
        DiagnosticCode::MG0002SchemaVersionMismatch,
        DiagnosticCode::MG0100InvalidIdentifier,
        DiagnosticCode::MG0101KeywordIdentifier,
        DiagnosticCode::MG0110DuplicateMethod,
        DiagnosticCode::MG0111DuplicateTypeParam,
        DiagnosticCode::MG0112ReservedMethodName,
        DiagnosticCode::MG0113DuplicateInterface,
        DiagnosticCode::MG0114DuplicateGeneratedName,
        DiagnosticCode::MG0120EmptyTypeName,
        DiagnosticCode::MG0121UnknownTypeParam,
        DiagnosticCode::MG0130InvalidPackagePath,
        DiagnosticCode::MG0900FormatFailed,
    ]
}

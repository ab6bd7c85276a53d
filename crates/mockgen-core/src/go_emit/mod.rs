//! Go source emission: one stand-in type plus its verification surface per interface.

mod intercept;
mod verify;

use std::collections::BTreeMap;

use anyhow::Result;
use mockgen_contracts::{GENERATOR_NAME, SUPPORT_IMPORT_PATHS};
use tracing::{debug, instrument};

use crate::aliases::{resolve_aliases, AliasMap};
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::gofmt;
use crate::model::{Interface, Package, Parameter};
use crate::signature::{project_with_reserved, ProjectedSignature};
use crate::validate::{validate_go_ident, validate_package, validate_package_path};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Label written into the `// Source:` header line.
    pub source: String,
    /// Overrides the `Mock<Interface>` type name for every interface.
    pub mock_name: Option<String>,
    /// Package clause of the generated file.
    pub package_name: String,
    /// Import path of the package the generated file lives in; its types stay unqualified.
    pub self_package: Option<String>,
}

/// Generates the formatted Go source for every interface in `pkg`.
#[instrument(skip_all, fields(source = %opts.source, package = %opts.package_name))]
pub fn generate_output(pkg: &Package, opts: &GenerateOptions) -> Result<String> {
    check_options(opts).map_err(|d| anyhow::anyhow!("{d}"))?;
    validate_package(pkg)?;
    check_declared_names(pkg, opts).map_err(|d| anyhow::anyhow!("{d}"))?;

    let aliases = resolve_aliases(&pkg.imports());
    let home = opts.self_package.as_deref();

    let mut w = GoWriter::new();
    emit_file_header(&mut w, pkg, opts, &aliases);
    for iface in &pkg.interfaces {
        let mock_name = mock_name_for(iface, opts);
        debug!(
            interface = %iface.name,
            mock = %mock_name,
            methods = iface.methods.len(),
            "emitting mock"
        );
        emit_interface(&mut w, iface, &mock_name, &aliases, home);
    }

    let raw = w.finish();
    gofmt::format_source(&raw).map_err(|e| {
        anyhow::anyhow!(
            "{}\n{}",
            Diagnostic::error(DiagnosticCode::MG0900FormatFailed, e.to_string()),
            numbered(&raw)
        )
    })
}

fn check_options(opts: &GenerateOptions) -> Result<(), Diagnostic> {
    validate_go_ident(&opts.package_name, "output package name")?;
    if let Some(name) = &opts.mock_name {
        validate_go_ident(name, "mock name")?;
    }
    if let Some(path) = &opts.self_package {
        validate_package_path(path, "self package")?;
    }
    Ok(())
}

fn mock_name_for(iface: &Interface, opts: &GenerateOptions) -> String {
    opts.mock_name
        .clone()
        .unwrap_or_else(|| format!("Mock{}", iface.name))
}

/// Top-level Go names are shared by every interface in the file.
fn check_declared_names(pkg: &Package, opts: &GenerateOptions) -> Result<(), Diagnostic> {
    let mut declared: BTreeMap<String, &str> = BTreeMap::new();
    for iface in &pkg.interfaces {
        let mock = mock_name_for(iface, opts);
        let mut names = vec![
            format!("New{mock}"),
            format!("Verifier{}", iface.name),
        ];
        names.extend(
            iface
                .methods
                .iter()
                .map(|m| format!("{mock}_{}_OngoingVerification", m.name)),
        );
        names.push(mock);
        for name in names {
            if let Some(prev) = declared.insert(name.clone(), &iface.name) {
                return Err(Diagnostic::error(
                    DiagnosticCode::MG0114DuplicateGeneratedName,
                    format!("{name} is generated for {prev} and again for {}", iface.name),
                ));
            }
        }
    }
    Ok(())
}

fn numbered(src: &str) -> String {
    src.lines()
        .enumerate()
        .map(|(i, l)| format!("{:>5} | {l}\n", i + 1))
        .collect()
}

/// Line accumulator. Lines are written unindented; [`gofmt`] lays them out.
pub(crate) struct GoWriter {
    out: String,
}

impl GoWriter {
    fn new() -> Self {
        GoWriter { out: String::new() }
    }

    pub(crate) fn line(&mut self, s: impl AsRef<str>) -> &mut Self {
        self.out.push_str(s.as_ref());
        self.out.push('\n');
        self
    }

    pub(crate) fn blank(&mut self) -> &mut Self {
        self.line("")
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Names shared by every unit generated for one interface.
pub(crate) struct MockNames {
    pub(crate) mock: String,
    pub(crate) verifier: String,
    /// `[K comparable, V any]`, or empty.
    pub(crate) type_params: String,
    /// `[K, V]`, or empty.
    pub(crate) type_args: String,
}

impl MockNames {
    fn new(iface: &Interface, mock: &str, aliases: &AliasMap, home: Option<&str>) -> Self {
        MockNames {
            mock: mock.to_string(),
            verifier: format!("Verifier{}", iface.name),
            type_params: type_param_list(&iface.type_params, aliases, home, true),
            type_args: type_param_list(&iface.type_params, aliases, home, false),
        }
    }

    pub(crate) fn mock_ty(&self) -> String {
        format!("{}{}", self.mock, self.type_args)
    }

    pub(crate) fn verifier_ty(&self) -> String {
        format!("{}{}", self.verifier, self.type_args)
    }

    pub(crate) fn ongoing(&self, method: &str) -> String {
        format!("{}_{}_OngoingVerification", self.mock, method)
    }
}

fn type_param_list(
    params: &[Parameter],
    aliases: &AliasMap,
    home: Option<&str>,
    with_constraints: bool,
) -> String {
    if params.is_empty() {
        return String::new();
    }
    let items: Vec<String> = params
        .iter()
        .map(|p| {
            if with_constraints {
                format!("{} {}", p.name, p.ty.render(aliases, home))
            } else {
                p.name.clone()
            }
        })
        .collect();
    format!("[{}]", items.join(", "))
}

fn emit_file_header(w: &mut GoWriter, pkg: &Package, opts: &GenerateOptions, aliases: &AliasMap) {
    w.line(format!(
        "// Code generated by {GENERATOR_NAME}. DO NOT EDIT."
    ))
    .line(format!("// Source: {}", opts.source))
    .blank()
    .line(format!("package {}", opts.package_name))
    .blank()
    .line("import (");
    for path in SUPPORT_IMPORT_PATHS {
        w.line(format!("\"{path}\""));
    }
    for (path, alias) in aliases.import_specs() {
        if Some(path) == opts.self_package.as_deref() || SUPPORT_IMPORT_PATHS.contains(&path) {
            continue;
        }
        w.line(format!("{alias} \"{path}\""));
    }
    for path in &pkg.dot_imports {
        w.line(format!(". \"{path}\""));
    }
    w.line(")");
}

fn emit_interface(
    w: &mut GoWriter,
    iface: &Interface,
    mock_name: &str,
    aliases: &AliasMap,
    home: Option<&str>,
) {
    let names = MockNames::new(iface, mock_name, aliases, home);
    let reserved: Vec<String> = iface.type_params.iter().map(|p| p.name.clone()).collect();
    let sigs: Vec<ProjectedSignature<'_>> = iface
        .methods
        .iter()
        .map(|m| project_with_reserved(m, aliases, home, &reserved))
        .collect();

    emit_mock_type(w, &names);
    for (m, sig) in iface.methods.iter().zip(&sigs) {
        intercept::emit_mock_method(w, &names, m, sig, aliases, home);
        w.blank();
    }

    verify::emit_verify_factories(w, &names);
    verify::emit_verifier_type(w, &names);
    for (m, sig) in iface.methods.iter().zip(&sigs) {
        let ongoing = names.ongoing(&m.name);
        verify::emit_verifier_method(w, &names, m, sig, &ongoing);
        verify::emit_ongoing_verification_type(w, &names, &ongoing);
        verify::emit_get_captured_arguments(w, &names, sig, &ongoing);
        verify::emit_get_all_captured_arguments(w, &names, sig, &ongoing);
    }
}

fn emit_mock_type(w: &mut GoWriter, names: &MockNames) {
    let mock_ty = names.mock_ty();
    w.blank()
        .line(format!("type {}{} struct {{", names.mock, names.type_params))
        .line("fail func(message string, callerSkip ...int)")
        .line("}")
        .blank()
        .line(format!(
            "func New{}{}(options ...pegomock.Option) *{mock_ty} {{",
            names.mock, names.type_params
        ))
        .line(format!("mock := &{mock_ty}{{}}"))
        .line("for _, option := range options {")
        .line("option.Apply(mock)")
        .line("}")
        .line("return mock")
        .line("}")
        .blank()
        .line(format!(
            "func (mock *{mock_ty}) SetFailHandler(fh pegomock.FailHandler) {{ mock.fail = fh }}"
        ))
        .line(format!(
            "func (mock *{mock_ty}) FailHandler() pegomock.FailHandler {{ return mock.fail }}"
        ))
        .blank();
}

/// `_params` construction shared by intercepting and verifier methods. A variadic tail is
/// flattened so the runtime sees one entry per argument actually passed.
pub(crate) fn emit_params_vector(w: &mut GoWriter, sig: &ProjectedSignature<'_>) {
    let names = sig.names();
    match names.split_last() {
        Some((last, fixed)) if sig.is_variadic() => {
            w.line(format!("_params := []pegomock.Param{{{}}}", fixed.join(", ")))
                .line(format!("for _, param := range {last} {{"))
                .line("_params = append(_params, param)")
                .line("}");
        }
        _ => {
            w.line(format!("_params := []pegomock.Param{{{}}}", names.join(", ")));
        }
    }
}

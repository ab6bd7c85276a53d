use std::collections::BTreeSet;

use anyhow::Result;

use crate::aliases::GO_KEYWORDS;
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::model::{Interface, Method, Package, Parameter, Type};

/// Methods every generated mock already declares.
const MOCK_API_METHODS: &[&str] = &[
    "SetFailHandler",
    "FailHandler",
    "VerifyWasCalledOnce",
    "VerifyWasCalled",
    "VerifyWasCalledInOrder",
    "VerifyWasCalledEventually",
];

/// Rejects models the emitters cannot turn into valid Go. Reports the first problem.
pub fn validate_package(pkg: &Package) -> Result<()> {
    check_package(pkg).map_err(|d| anyhow::anyhow!("{d}"))
}

pub fn validate_go_ident(name: &str, what: &str) -> Result<(), Diagnostic> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(Diagnostic::error(
            DiagnosticCode::MG0100InvalidIdentifier,
            format!("{what} must not be empty"),
        ));
    };
    if !(first.is_alphabetic() || first == '_')
        || !chars.all(|c| c.is_alphabetic() || c.is_ascii_digit() || c == '_')
    {
        return Err(Diagnostic::error(
            DiagnosticCode::MG0100InvalidIdentifier,
            format!("{what} {name:?} is not a Go identifier"),
        ));
    }
    if GO_KEYWORDS.contains(&name) {
        return Err(Diagnostic::error(
            DiagnosticCode::MG0101KeywordIdentifier,
            format!("{what} {name:?} is a Go keyword"),
        ));
    }
    Ok(())
}

pub fn validate_package_path(path: &str, what: &str) -> Result<(), Diagnostic> {
    let bad = path.is_empty()
        || path
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\\' | '`'));
    if bad {
        return Err(Diagnostic::error(
            DiagnosticCode::MG0130InvalidPackagePath,
            format!("{what} {path:?} is not a valid import path"),
        ));
    }
    Ok(())
}

fn check_package(pkg: &Package) -> Result<(), Diagnostic> {
    for path in &pkg.dot_imports {
        validate_package_path(path, "dot import")?;
    }
    let mut names: BTreeSet<&str> = BTreeSet::new();
    for iface in &pkg.interfaces {
        if !names.insert(iface.name.as_str()) {
            return Err(Diagnostic::error(
                DiagnosticCode::MG0113DuplicateInterface,
                format!("{} is declared twice in package {}", iface.name, pkg.name),
            ));
        }
        check_interface(iface)?;
    }
    Ok(())
}

fn check_interface(iface: &Interface) -> Result<(), Diagnostic> {
    validate_go_ident(&iface.name, "interface name")?;

    let mut scope: BTreeSet<&str> = BTreeSet::new();
    for tp in &iface.type_params {
        validate_go_ident(&tp.name, &format!("type parameter of {}", iface.name))?;
        if !scope.insert(tp.name.as_str()) {
            return Err(Diagnostic::error(
                DiagnosticCode::MG0111DuplicateTypeParam,
                format!("{}[{}] is declared twice", iface.name, tp.name),
            ));
        }
    }
    for tp in &iface.type_params {
        check_type(&tp.ty, &scope, &format!("constraint of {}[{}]", iface.name, tp.name))?;
    }

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for m in &iface.methods {
        if !seen.insert(m.name.as_str()) {
            return Err(Diagnostic::error(
                DiagnosticCode::MG0110DuplicateMethod,
                format!("{}.{} is declared twice", iface.name, m.name),
            ));
        }
        if MOCK_API_METHODS.contains(&m.name.as_str()) {
            return Err(Diagnostic::error(
                DiagnosticCode::MG0112ReservedMethodName,
                format!("{}.{}", iface.name, m.name),
            ));
        }
        check_method(&iface.name, m, &scope)?;
    }
    Ok(())
}

fn check_method(iface: &str, m: &Method, scope: &BTreeSet<&str>) -> Result<(), Diagnostic> {
    validate_go_ident(&m.name, &format!("method name in {iface}"))?;
    let ctx = format!("{iface}.{}", m.name);
    for p in m.params.iter().chain(&m.variadic) {
        check_param(p, scope, &ctx)?;
    }
    for r in &m.results {
        check_type(&r.ty, scope, &ctx)?;
    }
    Ok(())
}

fn check_param(p: &Parameter, scope: &BTreeSet<&str>, ctx: &str) -> Result<(), Diagnostic> {
    if !p.name.is_empty() && p.name != "_" {
        validate_go_ident(&p.name, &format!("parameter name in {ctx}"))?;
    }
    check_type(&p.ty, scope, ctx)
}

fn check_type(ty: &Type, scope: &BTreeSet<&str>, ctx: &str) -> Result<(), Diagnostic> {
    match ty {
        Type::Predeclared { name } => {
            if name.trim().is_empty() {
                return Err(empty_type_name(ctx));
            }
            Ok(())
        }
        Type::Named { package, name } => check_named(package, name, ctx),
        Type::Generic {
            package,
            name,
            type_args,
        } => {
            check_named(package, name, ctx)?;
            for t in type_args {
                check_type(t, scope, ctx)?;
            }
            Ok(())
        }
        Type::TypeParam { name } => {
            if !scope.contains(name.as_str()) {
                return Err(Diagnostic::error(
                    DiagnosticCode::MG0121UnknownTypeParam,
                    format!("{name} in {ctx}"),
                ));
            }
            Ok(())
        }
        Type::Pointer { elem } | Type::Slice { elem } | Type::Array { elem, .. } => {
            check_type(elem, scope, ctx)
        }
        Type::Chan { elem, .. } => check_type(elem, scope, ctx),
        Type::Map { key, value } => {
            check_type(key, scope, ctx)?;
            check_type(value, scope, ctx)
        }
        Type::Func {
            params,
            results,
            variadic,
        } => {
            for p in params.iter().chain(results) {
                check_type(&p.ty, scope, ctx)?;
            }
            if let Some(v) = variadic {
                check_type(&v.ty, scope, ctx)?;
            }
            Ok(())
        }
    }
}

fn check_named(package: &str, name: &str, ctx: &str) -> Result<(), Diagnostic> {
    if name.is_empty() {
        return Err(empty_type_name(ctx));
    }
    validate_go_ident(name, &format!("type name in {ctx}"))?;
    if !package.is_empty() {
        validate_package_path(package, &format!("package of {name} in {ctx}"))?;
    }
    Ok(())
}

fn empty_type_name(ctx: &str) -> Diagnostic {
    Diagnostic::error(DiagnosticCode::MG0120EmptyTypeName, format!("in {ctx}"))
}

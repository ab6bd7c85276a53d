use std::collections::BTreeSet;

use anyhow::Result;
use mockgen_contracts::MODEL_SCHEMA_VERSION;
use serde::{Deserialize, Serialize};

use crate::aliases::AliasMap;
use crate::diagnostics::{Diagnostic, DiagnosticCode};

/// On-disk envelope the front end writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDocument {
    pub schema_version: String,
    pub package: Package,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Name of the package the interfaces were declared in.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    /// Paths imported with `.`; re-emitted unaliased.
    #[serde(default)]
    pub dot_imports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<Method>,
    /// Type parameters of a generic interface; each `ty` is the constraint.
    #[serde(default)]
    pub type_params: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Parameter>,
    /// Trailing `...T` parameter; `ty` is the element type `T`.
    #[serde(default)]
    pub variadic: Option<Parameter>,
    #[serde(default)]
    pub results: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChanDir {
    #[default]
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    /// Builtin or literal type text (`string`, `error`, `any`, `interface{}`, `struct{}`).
    Predeclared { name: String },
    Named {
        #[serde(default)]
        package: String,
        name: String,
    },
    Pointer { elem: Box<Type> },
    Slice { elem: Box<Type> },
    Array { len: u64, elem: Box<Type> },
    Map { key: Box<Type>, value: Box<Type> },
    Func {
        #[serde(default)]
        params: Vec<Parameter>,
        #[serde(default)]
        results: Vec<Parameter>,
        #[serde(default)]
        variadic: Option<Box<Parameter>>,
    },
    Chan {
        #[serde(default)]
        dir: ChanDir,
        elem: Box<Type>,
    },
    /// Instantiation of a generic named type, e.g. `list.List[int]`.
    Generic {
        #[serde(default)]
        package: String,
        name: String,
        type_args: Vec<Type>,
    },
    /// Reference to a type parameter of the enclosing interface.
    TypeParam { name: String },
}

pub fn load_model_json(bytes: &[u8]) -> Result<Package> {
    let doc: ModelDocument = serde_json::from_slice(bytes).map_err(|e| {
        anyhow::anyhow!(
            "{}",
            Diagnostic::error(DiagnosticCode::MG0001ModelParseError, e.to_string())
        )
    })?;
    if doc.schema_version.trim() != MODEL_SCHEMA_VERSION {
        anyhow::bail!(
            "{}",
            Diagnostic::error(
                DiagnosticCode::MG0002SchemaVersionMismatch,
                format!(
                    "expected {MODEL_SCHEMA_VERSION} got {:?}",
                    doc.schema_version
                )
            )
        );
    }
    Ok(doc.package)
}

impl Package {
    /// Every package path mentioned by a type anywhere in the package's interfaces.
    pub fn imports(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for iface in &self.interfaces {
            for tp in &iface.type_params {
                tp.ty.collect_imports(&mut out);
            }
            for m in &iface.methods {
                for p in m.params.iter().chain(&m.variadic).chain(&m.results) {
                    p.ty.collect_imports(&mut out);
                }
            }
        }
        out
    }
}

impl Method {
    pub fn new(name: impl Into<String>) -> Self {
        Method {
            name: name.into(),
            params: Vec::new(),
            variadic: None,
            results: Vec::new(),
        }
    }

    pub fn with_param(mut self, name: &str, ty: Type) -> Self {
        self.params.push(Parameter::new(name, ty));
        self
    }

    pub fn with_variadic(mut self, name: &str, elem: Type) -> Self {
        self.variadic = Some(Parameter::new(name, elem));
        self
    }

    pub fn with_result(mut self, ty: Type) -> Self {
        self.results.push(Parameter::new("", ty));
        self
    }

    /// Number of argument slots, counting the variadic tail as one.
    pub fn arity(&self) -> usize {
        self.params.len() + usize::from(self.variadic.is_some())
    }
}

impl Parameter {
    pub fn new(name: &str, ty: Type) -> Self {
        Parameter {
            name: name.to_string(),
            ty,
        }
    }
}

impl Type {
    pub fn predeclared(name: &str) -> Self {
        Type::Predeclared {
            name: name.to_string(),
        }
    }

    pub fn named(package: &str, name: &str) -> Self {
        Type::Named {
            package: package.to_string(),
            name: name.to_string(),
        }
    }

    pub fn type_param(name: &str) -> Self {
        Type::TypeParam {
            name: name.to_string(),
        }
    }

    pub fn pointer(elem: Type) -> Self {
        Type::Pointer {
            elem: Box::new(elem),
        }
    }

    pub fn slice(elem: Type) -> Self {
        Type::Slice {
            elem: Box::new(elem),
        }
    }

    pub fn map(key: Type, value: Type) -> Self {
        Type::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn chan(dir: ChanDir, elem: Type) -> Self {
        Type::Chan {
            dir,
            elem: Box::new(elem),
        }
    }

    pub fn generic(package: &str, name: &str, type_args: Vec<Type>) -> Self {
        Type::Generic {
            package: package.to_string(),
            name: name.to_string(),
            type_args,
        }
    }

    /// Directional channel types, which the runtime may hand back undirected.
    pub fn directional_chan(&self) -> Option<(ChanDir, &Type)> {
        match self {
            Type::Chan { dir, elem } if *dir != ChanDir::Both => Some((*dir, elem)),
            _ => None,
        }
    }

    pub fn collect_imports(&self, out: &mut BTreeSet<String>) {
        match self {
            Type::Predeclared { .. } | Type::TypeParam { .. } => {}
            Type::Named { package, .. } => {
                if !package.is_empty() {
                    out.insert(package.clone());
                }
            }
            Type::Generic {
                package, type_args, ..
            } => {
                if !package.is_empty() {
                    out.insert(package.clone());
                }
                for t in type_args {
                    t.collect_imports(out);
                }
            }
            Type::Pointer { elem } | Type::Slice { elem } | Type::Array { elem, .. } => {
                elem.collect_imports(out)
            }
            Type::Chan { elem, .. } => elem.collect_imports(out),
            Type::Map { key, value } => {
                key.collect_imports(out);
                value.collect_imports(out);
            }
            Type::Func {
                params,
                results,
                variadic,
            } => {
                for p in params.iter().chain(results) {
                    p.ty.collect_imports(out);
                }
                if let Some(v) = variadic {
                    v.ty.collect_imports(out);
                }
            }
        }
    }

    /// Go source text for this type. Types defined in `home` are left unqualified.
    pub fn render(&self, aliases: &AliasMap, home: Option<&str>) -> String {
        let mut out = String::new();
        self.write(&mut out, aliases, home);
        out
    }

    fn write(&self, out: &mut String, aliases: &AliasMap, home: Option<&str>) {
        match self {
            Type::Predeclared { name } | Type::TypeParam { name } => out.push_str(name),
            Type::Named { package, name } => {
                write_qualifier(out, package, aliases, home);
                out.push_str(name);
            }
            Type::Generic {
                package,
                name,
                type_args,
            } => {
                write_qualifier(out, package, aliases, home);
                out.push_str(name);
                if !type_args.is_empty() {
                    out.push('[');
                    for (i, t) in type_args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        t.write(out, aliases, home);
                    }
                    out.push(']');
                }
            }
            Type::Pointer { elem } => {
                out.push('*');
                elem.write(out, aliases, home);
            }
            Type::Slice { elem } => {
                out.push_str("[]");
                elem.write(out, aliases, home);
            }
            Type::Array { len, elem } => {
                out.push_str(&format!("[{len}]"));
                elem.write(out, aliases, home);
            }
            Type::Map { key, value } => {
                out.push_str("map[");
                key.write(out, aliases, home);
                out.push(']');
                value.write(out, aliases, home);
            }
            Type::Chan { dir, elem } => {
                out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                // `chan <-chan T` would parse as `chan<- chan T`.
                let paren = *dir == ChanDir::Both
                    && matches!(
                        **elem,
                        Type::Chan {
                            dir: ChanDir::Recv,
                            ..
                        }
                    );
                if paren {
                    out.push('(');
                }
                elem.write(out, aliases, home);
                if paren {
                    out.push(')');
                }
            }
            Type::Func {
                params,
                results,
                variadic,
            } => {
                out.push_str("func(");
                let mut first = true;
                for p in params {
                    if !first {
                        out.push_str(", ");
                    }
                    first = false;
                    p.ty.write(out, aliases, home);
                }
                if let Some(v) = variadic {
                    if !first {
                        out.push_str(", ");
                    }
                    out.push_str("...");
                    v.ty.write(out, aliases, home);
                }
                out.push(')');
                let rendered: Vec<String> = results
                    .iter()
                    .map(|r| r.ty.render(aliases, home))
                    .collect();
                out.push_str(&result_list(&rendered));
            }
        }
    }
}

fn write_qualifier(out: &mut String, package: &str, aliases: &AliasMap, home: Option<&str>) {
    if package.is_empty() || home == Some(package) {
        return;
    }
    if let Some(alias) = aliases.alias_for(package) {
        out.push_str(alias);
        out.push('.');
    }
}

/// Result list as it follows a parameter list: nothing, ` T`, or ` (A, B)`.
pub fn result_list(rendered: &[String]) -> String {
    match rendered.len() {
        0 => String::new(),
        1 => format!(" {}", rendered[0]),
        _ => format!(" ({})", rendered.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::resolve_aliases;

    fn aliases_for(paths: &[&str]) -> AliasMap {
        resolve_aliases(&paths.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn renders_qualified_and_home_types() {
        let a = aliases_for(&["io", "example.com/app/store"]);
        let t = Type::map(
            Type::predeclared("string"),
            Type::slice(Type::pointer(Type::named("example.com/app/store", "Record"))),
        );
        assert_eq!(t.render(&a, None), "map[string][]*store.Record");
        assert_eq!(
            t.render(&a, Some("example.com/app/store")),
            "map[string][]*Record"
        );
        assert_eq!(Type::named("io", "Reader").render(&a, None), "io.Reader");
    }

    #[test]
    fn renders_func_types_without_parameter_names() {
        let a = aliases_for(&[]);
        let t = Type::Func {
            params: vec![Parameter::new("ctx", Type::predeclared("int"))],
            results: vec![
                Parameter::new("n", Type::predeclared("int")),
                Parameter::new("err", Type::predeclared("error")),
            ],
            variadic: Some(Box::new(Parameter::new("rest", Type::predeclared("string")))),
        };
        assert_eq!(t.render(&a, None), "func(int, ...string) (int, error)");

        let single = Type::Func {
            params: Vec::new(),
            results: vec![Parameter::new("", Type::predeclared("bool"))],
            variadic: None,
        };
        assert_eq!(single.render(&a, None), "func() bool");
    }

    #[test]
    fn renders_channel_directions() {
        let a = aliases_for(&[]);
        let int = Type::predeclared("int");
        assert_eq!(Type::chan(ChanDir::Both, int.clone()).render(&a, None), "chan int");
        assert_eq!(Type::chan(ChanDir::Send, int.clone()).render(&a, None), "chan<- int");
        assert_eq!(Type::chan(ChanDir::Recv, int.clone()).render(&a, None), "<-chan int");
        let nested = Type::chan(ChanDir::Both, Type::chan(ChanDir::Recv, int));
        assert_eq!(nested.render(&a, None), "chan (<-chan int)");
    }

    #[test]
    fn renders_generic_instantiation() {
        let a = aliases_for(&["container/list"]);
        let t = Type::generic(
            "container/list",
            "List",
            vec![Type::type_param("T"), Type::predeclared("string")],
        );
        assert_eq!(t.render(&a, None), "list.List[T, string]");
    }

    #[test]
    fn imports_cover_nested_types() {
        let pkg = Package {
            name: "app".to_string(),
            interfaces: vec![Interface {
                name: "Store".to_string(),
                type_params: vec![Parameter::new(
                    "K",
                    Type::named("golang.org/x/exp/constraints", "Ordered"),
                )],
                methods: vec![Method::new("Load")
                    .with_param(
                        "f",
                        Type::Func {
                            params: vec![Parameter::new("", Type::named("context", "Context"))],
                            results: Vec::new(),
                            variadic: None,
                        },
                    )
                    .with_variadic("opts", Type::named("example.com/opts", "Option"))
                    .with_result(Type::map(Type::type_param("K"), Type::named("io", "Reader")))],
            }],
            dot_imports: Vec::new(),
        };
        let got: Vec<String> = pkg.imports().into_iter().collect();
        assert_eq!(
            got,
            vec![
                "context",
                "example.com/opts",
                "golang.org/x/exp/constraints",
                "io"
            ]
        );
    }

    #[test]
    fn load_rejects_schema_mismatch() {
        let bytes = br#"{"schema_version":"mockgen.model@9.9.9","package":{"name":"x"}}"#;
        let err = load_model_json(bytes).unwrap_err().to_string();
        assert!(err.starts_with("MG0002"), "{err}");
    }

    #[test]
    fn load_reads_tagged_types() {
        let bytes = br#"{
            "schema_version": "mockgen.model@0.1.0",
            "package": {
                "name": "app",
                "interfaces": [{
                    "name": "Feed",
                    "methods": [{
                        "name": "Updates",
                        "results": [{"ty": {"kind": "chan", "dir": "recv", "elem": {"kind": "predeclared", "name": "string"}}}]
                    }]
                }]
            }
        }"#;
        let pkg = load_model_json(bytes).expect("load model");
        let m = &pkg.interfaces[0].methods[0];
        assert_eq!(
            m.results[0].ty,
            Type::chan(ChanDir::Recv, Type::predeclared("string"))
        );
        assert!(m.results[0].ty.directional_chan().is_some());
    }
}

//! Package alias assignment for the generated file's import block.
//!
//! Aliases depend only on the sorted set of referenced paths, so repeated runs over the
//! same model produce identical imports.

use std::collections::{BTreeMap, BTreeSet};

use mockgen_contracts::{RUNTIME_ALIAS, RUNTIME_IMPORT_PATH};

/// Go's reserved words.
pub const GO_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Identifiers the generated method bodies declare or call unqualified. A package alias
/// or parameter spelled like one of these would be shadowed inside, or would shadow, the
/// body that uses it.
pub const BODY_IDENTS: &[&str] = &[
    "mock",
    "verifier",
    "c",
    "_params",
    "_result",
    "methodInvocations",
    "option",
    "param",
    "ok",
    "u",
    "x",
    "append",
    "len",
    "make",
    "panic",
    "nil",
];

/// Go's predeclared types; the emitted code spells these unqualified.
pub const PREDECLARED_TYPES: &[&str] = &[
    "any",
    "bool",
    "byte",
    "comparable",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
];

/// Paths whose alias is fixed because the generated code spells it out.
const FIXED_ALIASES: &[(&str, &str)] = &[
    (RUNTIME_IMPORT_PATH, RUNTIME_ALIAS),
    ("reflect", "reflect"),
    ("time", "time"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    /// Full import path -> alias; drives type rendering.
    by_path: BTreeMap<String, String>,
    /// (vendor-trimmed path, alias) in resolution order; drives import specs.
    imports: Vec<(String, String)>,
}

impl AliasMap {
    pub fn alias_for(&self, path: &str) -> Option<&str> {
        self.by_path.get(path).map(String::as_str)
    }

    /// Import specs as `(path, alias)`, with vendored paths trimmed.
    pub fn import_specs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.imports.iter().map(|(p, a)| (p.as_str(), a.as_str()))
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.by_path.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

pub fn resolve_aliases(paths: &BTreeSet<String>) -> AliasMap {
    resolve_aliases_with(paths.iter().map(String::as_str), GO_KEYWORDS)
}

/// Resolves aliases against an explicit reserved-word table.
pub fn resolve_aliases_with<'p>(
    paths: impl IntoIterator<Item = &'p str>,
    reserved_words: &[&str],
) -> AliasMap {
    let mut sorted: BTreeSet<&str> = paths.into_iter().collect();
    sorted.insert(RUNTIME_IMPORT_PATH);

    let mut used: BTreeSet<String> = FIXED_ALIASES
        .iter()
        .map(|(_, alias)| *alias)
        .chain(BODY_IDENTS.iter().copied())
        .chain(PREDECLARED_TYPES.iter().copied())
        .map(str::to_string)
        .collect();
    let mut map = AliasMap::default();

    for path in sorted {
        let alias = match FIXED_ALIASES.iter().find(|(p, _)| *p == path) {
            Some((_, fixed)) => fixed.to_string(),
            None => {
                let base = sanitize(last_segment(path));
                let mut alias = base.clone();
                let mut i = 0usize;
                while used.contains(&alias) || reserved_words.contains(&alias.as_str()) {
                    alias = format!("{base}{i}");
                    i += 1;
                }
                alias
            }
        };
        tracing::trace!(path, alias = %alias, "assigned package alias");
        used.insert(alias.clone());
        map.imports.push((vendor_trimmed(path).to_string(), alias.clone()));
        map.by_path.insert(path.to_string(), alias);
    }
    map
}

fn last_segment(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((_, last)) => last,
        None if trimmed.is_empty() => ".",
        None => trimmed,
    }
}

/// Strips everything up to and including the innermost `/vendor/` segment.
pub fn vendor_trimmed(path: &str) -> &str {
    match path.rsplit_once("/vendor/") {
        Some((_, rest)) => rest,
        None => path,
    }
}

/// Turns a path segment into a usable Go package name.
pub fn sanitize(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        let ok = if out.is_empty() {
            c.is_alphabetic() || c == '_'
        } else {
            c.is_alphabetic() || c.is_ascii_digit() || c == '_'
        };
        out.push(if ok { c } else { '_' });
    }
    if out.is_empty() || out == "_" {
        return "x".to_string();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sanitize_replaces_illegal_characters() {
        assert_eq!(sanitize("go-yaml"), "go_yaml");
        assert_eq!(sanitize("v2"), "v2");
        assert_eq!(sanitize("2fa"), "_fa");
        assert_eq!(sanitize("-"), "x");
        assert_eq!(sanitize("."), "x");
        assert_eq!(sanitize("ünïcode"), "ünïcode");
    }

    #[test]
    fn colliding_basenames_get_numbered_in_sorted_order() {
        let m = resolve_aliases(&set(&["text/template", "html/template", "a/b/template"]));
        assert_eq!(m.alias_for("a/b/template"), Some("template"));
        assert_eq!(m.alias_for("html/template"), Some("template0"));
        assert_eq!(m.alias_for("text/template"), Some("template1"));
    }

    #[test]
    fn keywords_are_never_aliases() {
        let m = resolve_aliases(&set(&["example.com/case", "example.com/go"]));
        assert_eq!(m.alias_for("example.com/case"), Some("case0"));
        assert_eq!(m.alias_for("example.com/go"), Some("go0"));
    }

    #[test]
    fn runtime_alias_is_fixed_even_when_a_user_package_shares_its_name() {
        let m = resolve_aliases(&set(&["a/pegomock", "z/time", "y/reflect"]));
        assert_eq!(m.alias_for(RUNTIME_IMPORT_PATH), Some("pegomock"));
        assert_eq!(m.alias_for("a/pegomock"), Some("pegomock0"));
        assert_eq!(m.alias_for("z/time"), Some("time0"));
        assert_eq!(m.alias_for("y/reflect"), Some("reflect0"));
    }

    #[test]
    fn aliases_avoid_identifiers_the_bodies_use() {
        let m = resolve_aliases(&set(&[
            "github.com/stretchr/testify/mock",
            "example.com/x",
            "example.com/errors/error",
            "example.com/len",
        ]));
        assert_eq!(m.alias_for("github.com/stretchr/testify/mock"), Some("mock0"));
        assert_eq!(m.alias_for("example.com/x"), Some("x0"));
        assert_eq!(m.alias_for("example.com/errors/error"), Some("error0"));
        assert_eq!(m.alias_for("example.com/len"), Some("len0"));
    }

    #[test]
    fn runtime_is_always_present() {
        let m = resolve_aliases(&BTreeSet::new());
        assert_eq!(m.len(), 1);
        assert_eq!(
            m.import_specs().collect::<Vec<_>>(),
            vec![(RUNTIME_IMPORT_PATH, "pegomock")]
        );
    }

    #[test]
    fn aliases_are_pairwise_distinct() {
        let mut paths = BTreeSet::new();
        for i in 0..40 {
            paths.insert(format!("host{}/util", i % 7));
            paths.insert(format!("host{i}/util0"));
            paths.insert(format!("m{i}/type"));
        }
        let m = resolve_aliases(&paths);
        let aliases: Vec<&str> = m.aliases().collect();
        let distinct: BTreeSet<&str> = aliases.iter().copied().collect();
        assert_eq!(aliases.len(), distinct.len());
        assert!(aliases.iter().all(|a| !GO_KEYWORDS.contains(a)));
    }

    #[test]
    fn resolution_ignores_caller_order() {
        let forward = ["b/x", "a/x", "c/y"];
        let m1 = resolve_aliases_with(forward, GO_KEYWORDS);
        let m2 = resolve_aliases_with(forward.iter().rev().copied(), GO_KEYWORDS);
        assert_eq!(m1, m2);
    }

    #[test]
    fn vendored_paths_import_under_trimmed_path() {
        let m = resolve_aliases(&set(&["example.com/app/vendor/github.com/pkg/errors"]));
        assert_eq!(
            m.alias_for("example.com/app/vendor/github.com/pkg/errors"),
            Some("errors")
        );
        assert!(m
            .import_specs()
            .any(|(p, a)| p == "github.com/pkg/errors" && a == "errors"));
    }

    #[test]
    fn reserved_table_is_swappable() {
        let m = resolve_aliases_with(["example.com/async"], &["async"]);
        assert_eq!(m.alias_for("example.com/async"), Some("async0"));
    }
}

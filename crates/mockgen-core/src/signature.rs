use std::collections::BTreeSet;

use mockgen_contracts::SUPPORT_IMPORT_PATHS;

use crate::aliases::{AliasMap, BODY_IDENTS, PREDECLARED_TYPES};
use crate::model::{result_list, Method, Type};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedParam {
    pub name: String,
    /// `name T`, or `name ...T` for the variadic slot.
    pub decl: String,
    /// Type of one captured value per call; `[]T` for the variadic slot.
    pub captured_ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedReturn<'m> {
    pub ty: &'m Type,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedSignature<'m> {
    pub params: Vec<ProjectedParam>,
    /// Element type of the trailing variadic parameter, if any.
    pub variadic_elem: Option<String>,
    pub returns: Vec<ProjectedReturn<'m>>,
}

impl ProjectedSignature<'_> {
    pub fn is_variadic(&self) -> bool {
        self.variadic_elem.is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn captured_types(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.captured_ty.as_str()).collect()
    }

    /// Parameter list text without the surrounding parentheses.
    pub fn param_list(&self) -> String {
        self.params
            .iter()
            .map(|p| p.decl.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn return_texts(&self) -> Vec<String> {
        self.returns.iter().map(|r| r.text.clone()).collect()
    }

    /// Result list text as it follows the parameter list.
    pub fn result_list(&self) -> String {
        result_list(&self.return_texts())
    }
}

pub fn project<'m>(
    method: &'m Method,
    aliases: &AliasMap,
    home: Option<&str>,
) -> ProjectedSignature<'m> {
    project_with_reserved(method, aliases, home, &[])
}

/// Like [`project`], additionally renaming parameters that collide with `reserved`
/// (the enclosing interface's type parameter names).
pub fn project_with_reserved<'m>(
    method: &'m Method,
    aliases: &AliasMap,
    home: Option<&str>,
    reserved: &[String],
) -> ProjectedSignature<'m> {
    let mut taken: BTreeSet<String> = BODY_IDENTS
        .iter()
        .chain(PREDECLARED_TYPES)
        .map(|s| s.to_string())
        .collect();
    taken.extend(SUPPORT_IMPORT_PATHS.iter().map(|s| s.to_string()));
    taken.extend(aliases.aliases().map(str::to_string));
    taken.extend(reserved.iter().cloned());

    let mut used: BTreeSet<String> = BTreeSet::new();
    let mut params = Vec::with_capacity(method.arity());

    for (i, p) in method.params.iter().enumerate() {
        let name = param_name(&p.name, i, &taken, &mut used);
        let ty = p.ty.render(aliases, home);
        params.push(ProjectedParam {
            decl: format!("{name} {ty}"),
            captured_ty: ty,
            name,
        });
    }

    let mut variadic_elem = None;
    if let Some(v) = &method.variadic {
        let name = param_name(&v.name, method.params.len(), &taken, &mut used);
        let elem = v.ty.render(aliases, home);
        params.push(ProjectedParam {
            decl: format!("{name} ...{elem}"),
            captured_ty: format!("[]{elem}"),
            name,
        });
        variadic_elem = Some(elem);
    }

    let returns = method
        .results
        .iter()
        .map(|r| ProjectedReturn {
            ty: &r.ty,
            text: r.ty.render(aliases, home),
        })
        .collect();

    ProjectedSignature {
        params,
        variadic_elem,
        returns,
    }
}

fn param_name(
    declared: &str,
    index: usize,
    taken: &BTreeSet<String>,
    used: &mut BTreeSet<String>,
) -> String {
    let clashes = declared.is_empty()
        || declared == "_"
        || taken.contains(declared)
        || is_ret_holder(declared);
    let mut name = if clashes {
        format!("_param{index}")
    } else {
        declared.to_string()
    };
    while used.contains(&name) {
        name.push('_');
    }
    used.insert(name.clone());
    name
}

fn is_ret_holder(name: &str) -> bool {
    name.strip_prefix("_ret")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::resolve_aliases;
    use crate::model::Method;

    fn no_aliases() -> AliasMap {
        resolve_aliases(&BTreeSet::new())
    }

    #[test]
    fn unnamed_params_use_their_slot_index() {
        let m = Method::new("Put")
            .with_param("", Type::predeclared("string"))
            .with_param("", Type::predeclared("int"))
            .with_variadic("", Type::predeclared("bool"));
        let sig = project(&m, &no_aliases(), None);
        assert_eq!(sig.names(), vec!["_param0", "_param1", "_param2"]);
        assert_eq!(sig.param_list(), "_param0 string, _param1 int, _param2 ...bool");
        assert_eq!(sig.captured_types(), vec!["string", "int", "[]bool"]);
        assert_eq!(sig.variadic_elem.as_deref(), Some("bool"));
    }

    #[test]
    fn names_clashing_with_generated_locals_are_renamed() {
        let m = Method::new("Do")
            .with_param("mock", Type::predeclared("string"))
            .with_param("time", Type::named("time", "Time"))
            .with_param("_ret0", Type::predeclared("int"))
            .with_param("_", Type::predeclared("int"))
            .with_param("key", Type::predeclared("string"));
        let aliases = resolve_aliases(&["time".to_string()].into_iter().collect());
        let sig = project(&m, &aliases, None);
        assert_eq!(
            sig.names(),
            vec!["_param0", "_param1", "_param2", "_param3", "key"]
        );
        assert_eq!(sig.params[1].decl, "_param1 time.Time");
    }

    #[test]
    fn predeclared_type_names_are_renamed() {
        let m = Method::new("Get")
            .with_param("string", Type::predeclared("string"))
            .with_param("bool", Type::predeclared("int"))
            .with_result(Type::predeclared("string"));
        let sig = project(&m, &no_aliases(), None);
        assert_eq!(sig.param_list(), "_param0 string, _param1 int");
    }

    #[test]
    fn synthesized_names_never_duplicate_declared_ones() {
        let m = Method::new("Do")
            .with_param("_param1", Type::predeclared("int"))
            .with_param("", Type::predeclared("int"));
        let sig = project(&m, &no_aliases(), None);
        assert_eq!(sig.names(), vec!["_param1", "_param1_"]);
    }

    #[test]
    fn type_parameter_names_are_reserved() {
        let m = Method::new("Put").with_param("T", Type::type_param("T"));
        let sig = project_with_reserved(&m, &no_aliases(), None, &["T".to_string()]);
        assert_eq!(sig.params[0].decl, "_param0 T");
    }

    #[test]
    fn results_are_positional() {
        let m = Method::new("Get")
            .with_result(Type::predeclared("string"))
            .with_result(Type::predeclared("error"));
        let sig = project(&m, &no_aliases(), None);
        assert_eq!(sig.result_list(), " (string, error)");
        assert!(sig.params.is_empty());
        assert!(!sig.is_variadic());
    }
}

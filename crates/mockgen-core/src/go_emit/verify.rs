use crate::model::{result_list, Method};
use crate::signature::ProjectedSignature;

use super::{emit_params_vector, GoWriter, MockNames};

/// The four ways to obtain a verifier from the mock. Each populates exactly one
/// combination of count matcher, in-order context and timeout.
pub(super) fn emit_verify_factories(w: &mut GoWriter, names: &MockNames) {
    let factories: [(&str, &str, &[&str]); 4] = [
        (
            "VerifyWasCalledOnce",
            "",
            &["invocationCountMatcher: pegomock.Times(1),"],
        ),
        (
            "VerifyWasCalled",
            "invocationCountMatcher pegomock.InvocationCountMatcher",
            &["invocationCountMatcher: invocationCountMatcher,"],
        ),
        (
            "VerifyWasCalledInOrder",
            "invocationCountMatcher pegomock.InvocationCountMatcher, inOrderContext *pegomock.InOrderContext",
            &[
                "invocationCountMatcher: invocationCountMatcher,",
                "inOrderContext: inOrderContext,",
            ],
        ),
        (
            "VerifyWasCalledEventually",
            "invocationCountMatcher pegomock.InvocationCountMatcher, timeout time.Duration",
            &[
                "invocationCountMatcher: invocationCountMatcher,",
                "timeout: timeout,",
            ],
        ),
    ];

    let mock_ty = names.mock_ty();
    let verifier_ty = names.verifier_ty();
    for (name, params, fields) in factories {
        w.line(format!(
            "func (mock *{mock_ty}) {name}({params}) *{verifier_ty} {{"
        ))
        .line(format!("return &{verifier_ty}{{"))
        .line("mock: mock,");
        for field in fields {
            w.line(*field);
        }
        w.line("}").line("}").blank();
    }
}

pub(super) fn emit_verifier_type(w: &mut GoWriter, names: &MockNames) {
    w.line(format!(
        "type {}{} struct {{",
        names.verifier, names.type_params
    ))
    .line(format!("mock *{}", names.mock_ty()))
    .line("invocationCountMatcher pegomock.InvocationCountMatcher")
    .line("inOrderContext *pegomock.InOrderContext")
    .line("timeout time.Duration")
    .line("}")
    .blank();
}

pub(super) fn emit_verifier_method(
    w: &mut GoWriter,
    names: &MockNames,
    method: &Method,
    sig: &ProjectedSignature<'_>,
    ongoing: &str,
) {
    let ongoing_ty = format!("{ongoing}{}", names.type_args);
    w.line(format!(
        "func (verifier *{}) {}({}) *{ongoing_ty} {{",
        names.verifier_ty(),
        method.name,
        sig.param_list()
    ));
    emit_params_vector(w, sig);
    w.line(format!(
        "methodInvocations := pegomock.GetGenericMockFrom(verifier.mock).Verify(verifier.inOrderContext, verifier.invocationCountMatcher, \"{}\", _params, verifier.timeout)",
        method.name
    ))
    .line(format!(
        "return &{ongoing_ty}{{mock: verifier.mock, methodInvocations: methodInvocations}}"
    ))
    .line("}")
    .blank();
}

pub(super) fn emit_ongoing_verification_type(w: &mut GoWriter, names: &MockNames, ongoing: &str) {
    w.line(format!("type {ongoing}{} struct {{", names.type_params))
        .line(format!("mock *{}", names.mock_ty()))
        .line("methodInvocations []pegomock.MethodInvocation")
        .line("}")
        .blank();
}

/// Values from the most recent matched call, one per parameter.
pub(super) fn emit_get_captured_arguments(
    w: &mut GoWriter,
    names: &MockNames,
    sig: &ProjectedSignature<'_>,
    ongoing: &str,
) {
    let captured: Vec<String> = sig
        .captured_types()
        .into_iter()
        .map(str::to_string)
        .collect();
    w.line(format!(
        "func (c *{ongoing}{}) GetCapturedArguments(){} {{",
        names.type_args,
        result_list(&captured)
    ));
    let arg_names = sig.names();
    if !arg_names.is_empty() {
        let last: Vec<String> = arg_names
            .iter()
            .map(|n| format!("{n}[len({n})-1]"))
            .collect();
        w.line(format!(
            "{} := c.GetAllCapturedArguments()",
            arg_names.join(", ")
        ))
        .line(format!("return {}", last.join(", ")));
    }
    w.line("}").blank();
}

/// Per-parameter history over every matched call, rebuilt from the runtime's
/// parameter-by-call matrix.
pub(super) fn emit_get_all_captured_arguments(
    w: &mut GoWriter,
    names: &MockNames,
    sig: &ProjectedSignature<'_>,
    ongoing: &str,
) {
    let captured = sig.captured_types();
    let receiver = format!("c *{ongoing}{}", names.type_args);
    if captured.is_empty() {
        w.line(format!("func ({receiver}) GetAllCapturedArguments() {{"))
            .line("}")
            .blank();
        return;
    }

    let results: Vec<String> = captured
        .iter()
        .enumerate()
        .map(|(i, ty)| format!("_param{i} []{ty}"))
        .collect();
    w.line(format!(
        "func ({receiver}) GetAllCapturedArguments() ({}) {{",
        results.join(", ")
    ))
    .line("_params := pegomock.GetGenericMockFrom(c.mock).GetInvocationParams(c.methodInvocations)")
    .line("if len(_params) > 0 {");

    let last = captured.len() - 1;
    for (i, ty) in captured.iter().enumerate() {
        match sig.variadic_elem.as_deref() {
            Some(elem) if i == last => emit_variadic_history(w, i, ty, elem),
            _ => {
                w.line(format!("if len(_params) > {i} {{"))
                    .line(format!("_param{i} = make([]{ty}, len(c.methodInvocations))"))
                    .line(format!("for u, param := range _params[{i}] {{"))
                    .line("if param != nil {")
                    .line(format!("_param{i}[u] = param.({ty})"))
                    .line("}")
                    .line("}")
                    .line("}");
            }
        }
    }
    w.line("}").line("return").line("}").blank();
}

/// Columns at or after the variadic index hold that call's variadic values; a nil cell
/// means the call passed fewer values than the widest call.
fn emit_variadic_history(w: &mut GoWriter, i: usize, slice_ty: &str, elem: &str) {
    let width = if i == 0 {
        "len(_params)".to_string()
    } else {
        format!("len(_params)-{i}")
    };
    w.line(format!(
        "_param{i} = make([]{slice_ty}, len(c.methodInvocations))"
    ))
    .line("for u := 0; u < len(c.methodInvocations); u++ {")
    .line(format!("_param{i}[u] = make([]{elem}, 0, {width})"))
    .line(format!("for x := {i}; x < len(_params); x++ {{"))
    .line("if _params[x][u] != nil {")
    .line(format!(
        "_param{i}[u] = append(_param{i}[u], _params[x][u].({elem}))"
    ))
    .line("}")
    .line("}")
    .line("}");
}

use crate::aliases::AliasMap;
use crate::model::{ChanDir, Method, Type};
use crate::signature::ProjectedSignature;

use super::{emit_params_vector, GoWriter, MockNames};

/// Emits the method that records the call with the runtime and hands back whatever was
/// stubbed for it.
pub(super) fn emit_mock_method(
    w: &mut GoWriter,
    names: &MockNames,
    method: &Method,
    sig: &ProjectedSignature<'_>,
    aliases: &AliasMap,
    home: Option<&str>,
) {
    w.line(format!(
        "func (mock *{}) {}({}){} {{",
        names.mock_ty(),
        method.name,
        sig.param_list(),
        sig.result_list()
    ))
    .line("if mock == nil {")
    .line(format!(
        "panic(\"mock must not be nil. Use myMock := New{}().\")",
        names.mock
    ))
    .line("}");
    emit_params_vector(w, sig);

    let reflect_types: Vec<String> = sig
        .returns
        .iter()
        .map(|r| format!("reflect.TypeOf((*{})(nil)).Elem()", r.text))
        .collect();
    let invoke = format!(
        "pegomock.GetGenericMockFrom(mock).Invoke(\"{}\", _params, []reflect.Type{{{}}})",
        method.name,
        reflect_types.join(", ")
    );
    if sig.returns.is_empty() {
        w.line(invoke).line("}");
        return;
    }

    w.line(format!("_result := {invoke}"));
    for (i, r) in sig.returns.iter().enumerate() {
        w.line(format!("var _ret{i} {}", r.text));
    }
    // A zero-length result means nothing was stubbed: keep the zero values.
    w.line("if len(_result) != 0 {");
    for (i, r) in sig.returns.iter().enumerate() {
        w.line(format!("if _result[{i}] != nil {{"));
        match r.ty.directional_chan() {
            Some((_, elem)) => {
                // The runtime may have stored the channel without its direction.
                let undirected = Type::chan(ChanDir::Both, elem.clone()).render(aliases, home);
                w.line("var ok bool")
                    .line(format!("_ret{i}, ok = _result[{i}].({undirected})"))
                    .line("if !ok {")
                    .line(format!("_ret{i} = _result[{i}].({})", r.text))
                    .line("}");
            }
            None => {
                w.line(format!("_ret{i} = _result[{i}].({})", r.text));
            }
        }
        w.line("}");
    }
    w.line("}");

    let holders: Vec<String> = (0..sig.returns.len()).map(|i| format!("_ret{i}")).collect();
    w.line(format!("return {}", holders.join(", "))).line("}");
}

//! Source transformer tests.

use warden_engine::transform::{transform, transform_with, TransformError, TransformOptions};
use warden_engine::INTERNAL_STATE_NAME as S;

fn code(source: &str) -> String {
    transform(source).unwrap().code
}

fn expect_reserved(source: &str) {
    match transform(source) {
        Err(TransformError::ReservedIdentifier { name, .. }) => assert_eq!(name, S),
        other => panic!("expected reserved identifier error for {source:?}, got {other:?}"),
    }
}

#[test]
fn test_untouched_source_is_returned_verbatim() {
    let source = "var a = 1;\nfunction f(x) { return x + a; }\n";
    let output = transform(source).unwrap();
    assert_eq!(output.code, source);
    assert!(!output.has_async);
}

#[test]
fn test_catch_binding_is_sanitised() {
    assert_eq!(
        code("try { f(); } catch (e) { g(e); }"),
        format!("try {{ f(); }} catch (e) {{e={S}.handleException(e); g(e); }}")
    );
}

#[test]
fn test_catch_without_binding_is_untouched() {
    let source = "try { f(); } catch { g(); }";
    assert_eq!(code(source), source);
}

#[test]
fn test_nested_catches_are_all_sanitised() {
    let out = code("try { a(); } catch (x) { try { b(); } catch (y) { c(x, y); } }");
    assert!(out.contains(&format!("catch (x) {{x={S}.handleException(x);")));
    assert!(out.contains(&format!("catch (y) {{y={S}.handleException(y);")));
}

#[test]
fn test_destructuring_catch_rethrows_sanitised_value() {
    assert_eq!(
        code("try {} catch ({ message }) { log(message); }"),
        format!(
            "try {{}} catch(__warden_caught){{__warden_caught={S}.handleException(__warden_caught);\
             try{{throw __warden_caught;}}catch ({{ message }}) {{ log(message); }}}}"
        )
    );
}

#[test]
fn test_destructuring_catch_temp_avoids_source_names() {
    let out = code("var __warden_caught = 1;\ntry {} catch ([a]) { a; }");
    assert!(out.contains("catch(__warden_caught1){"));
    assert!(out.contains("throw __warden_caught1;"));
}

#[test]
fn test_with_operand_is_shielded() {
    assert_eq!(
        code("with (scope) { x = 1; }"),
        format!("with ({S}.wrapWith(scope)) {{ x = 1; }}")
    );
}

#[test]
fn test_with_operand_expression_is_wrapped_whole() {
    assert_eq!(
        code("with (a.b || c) y;"),
        format!("with ({S}.wrapWith(a.b || c)) y;")
    );
}

#[test]
fn test_with_comma_operand_stays_one_argument() {
    assert_eq!(
        code("with (a, b) x;"),
        format!("with ({S}.wrapWith((a, b))) x;")
    );
}

#[test]
fn test_template_substitutions_are_accepted() {
    for source in ["`a${b}c`;", "var s = `x${1}y`;", "f(`${b}`);", "tag`${a.b}-${c()}`;"] {
        assert_eq!(code(source), source);
    }
}

#[test]
fn test_catch_inside_template_substitution() {
    assert_eq!(
        code("`${(() => { try { f(); } catch (e) { return e; } })()}`;"),
        format!("`${{(() => {{ try {{ f(); }} catch (e) {{e={S}.handleException(e); return e; }} }})()}}`;")
    );
}

#[test]
fn test_dynamic_import_routes_through_state() {
    assert_eq!(
        code("import('fs').then(done);"),
        format!("{S}.import('fs').then(done);")
    );
}

#[test]
fn test_reserved_name_bare_assignment() {
    expect_reserved(&format!("{S} = 1;"));
}

#[test]
fn test_reserved_name_const() {
    expect_reserved(&format!("const {S} = 1;"));
}

#[test]
fn test_reserved_name_let() {
    expect_reserved(&format!("let {S} = 1;"));
}

#[test]
fn test_reserved_name_var() {
    expect_reserved(&format!("var {S} = 1;"));
}

#[test]
fn test_reserved_name_class() {
    expect_reserved(&format!("class {S} {{}}"));
}

#[test]
fn test_reserved_name_function() {
    expect_reserved(&format!("function {S}() {{}}"));
}

#[test]
fn test_reserved_name_reference() {
    expect_reserved(&format!("{S}.handleException(x);"));
}

#[test]
fn test_reserved_name_position() {
    match transform(&format!("\n\nlet {S} = 1;")) {
        Err(TransformError::ReservedIdentifier { line, .. }) => assert_eq!(line, 3),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_reserved_name_in_string_is_allowed() {
    let source = format!("var s = '{S}';");
    assert_eq!(code(&source), source);
}

#[test]
fn test_syntax_error_is_surfaced() {
    let err = transform("function (").unwrap_err();
    assert!(matches!(err, TransformError::Syntax(_)), "{err:?}");
}

#[test]
fn test_async_detection() {
    assert!(transform("async function f() { await g(); }").unwrap().has_async);
    assert!(transform("const f = async () => 1;").unwrap().has_async);
    assert!(!transform("function* g() { yield 1; }").unwrap().has_async);
}

#[test]
fn test_async_rejected_when_disabled() {
    let options = TransformOptions { allow_async: false };
    assert_eq!(
        transform_with("async function f() {}", &options),
        Err(TransformError::AsyncDisabled)
    );
    assert!(transform_with("function f() {}", &options).is_ok());
}

#[test]
fn test_line_layout_is_preserved() {
    let source = "try {\n  a();\n} catch (e) {\n  b(e);\n}\nwith (o) {\n  c();\n}\n";
    let out = code(source);
    assert_eq!(out.lines().count(), source.lines().count());
    for (before, after) in source.lines().zip(out.lines()) {
        if !before.contains("catch") && !before.contains("with") {
            assert_eq!(before, after);
        }
    }
}

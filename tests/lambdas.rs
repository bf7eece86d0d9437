use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lump::{value, Engine, Error, ErrorKind, Lambda, Value};

fn render(engine: &Engine, source: &str, ctx: Value) -> lump::Result<String> {
    engine.compile(source)?.render_value(&ctx)
}

#[test]
fn lambda_interpolation() {
    let engine = Engine::new();
    let ctx = value! { lambda: Lambda::new(|| "world") };
    assert_eq!(render(&engine, "Hello, {{lambda}}!", ctx).unwrap(), "Hello, world!");
}

#[test]
fn lambda_interpolation_is_rendered_as_template() {
    let engine = Engine::new();
    let ctx = value! { planet: "world", lambda: Lambda::new(|| "{{planet}}") };
    assert_eq!(render(&engine, "Hello, {{lambda}}!", ctx).unwrap(), "Hello, world!");
}

#[test]
fn lambda_interpolation_uses_default_delimiters() {
    let engine = Engine::new();
    let ctx = value! { planet: "world", lambda: Lambda::new(|| "|planet| => {{planet}}") };
    let result = render(&engine, "{{= | | =}}\nHello, (|&lambda|)!", ctx).unwrap();
    assert_eq!(result, "Hello, (|planet| => world)!");
}

#[test]
fn lambda_interpolation_is_escaped() {
    let engine = Engine::new();
    let ctx = value! { lambda: Lambda::new(|| ">") };
    assert_eq!(render(&engine, "<{{lambda}}{{{lambda}}}", ctx).unwrap(), "<&gt;>");
}

#[test]
fn lambda_interpolation_called_each_time() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let engine = Engine::new();
    let ctx = value! {
        lambda: Lambda::new(move || counter.fetch_add(1, Ordering::SeqCst) + 1)
    };
    let result = render(&engine, "{{lambda}} == {{{lambda}}} == {{lambda}}", ctx).unwrap();
    assert_eq!(result, "1 == 2 == 3");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn lambda_section_receives_raw_text() {
    let engine = Engine::new();
    let ctx = value! {
        x: "Error!",
        lambda: Lambda::section(|text: &str, _: &lump::LambdaHelper<'_>| {
            if text == "{{x}}" { "yes" } else { "no" }
        }),
    };
    assert_eq!(render(&engine, "<{{#lambda}}{{x}}{{/lambda}}>", ctx).unwrap(), "<yes>");
}

#[test]
fn lambda_section_result_is_rendered() {
    let engine = Engine::new();
    let ctx = value! {
        planet: "Earth",
        lambda: Lambda::section(|text, _| format!("{text}{{{{planet}}}}{text}")),
    };
    let result = render(&engine, "<{{#lambda}}-{{/lambda}}>", ctx).unwrap();
    assert_eq!(result, "<-Earth->");
}

#[test]
fn lambda_section_with_alternate_delimiters() {
    let engine = Engine::new();
    let ctx = value! {
        planet: "Earth",
        lambda: Lambda::section(|text, _| format!("{text}{{{{planet}}}} => |planet|{text}")),
    };
    let result = render(&engine, "{{= | | =}}<|#lambda|-|/lambda|>", ctx).unwrap();
    assert_eq!(result, "<-{{planet}} => Earth->");
}

#[test]
fn lambda_section_helper_renders_with_context() {
    let engine = Engine::new();
    let ctx = value! {
        item: { name: "inner" },
        name: "outer",
        wrap: Lambda::section(|text, helper| {
            Ok::<_, Error>(format!("<b>{}</b>", helper.render(text)?))
        }),
    };
    let result = render(&engine, "{{#item}}{{#wrap}}{{name}}{{/wrap}}{{/item}}", ctx).unwrap();
    assert_eq!(result, "<b>inner</b>");
}

#[test]
fn lambda_section_helper_uses_call_site_delimiters() {
    let engine = Engine::new();
    let ctx = value! {
        name: "Tater",
        wrap: Lambda::section(|text, helper| {
            Ok::<_, Error>(format!("<b>{}</b>", helper.render(text)?))
        }),
    };
    let result = render(&engine, "{{=<% %>=}}<%#wrap%><% name %> {{ name }}<%/wrap%>", ctx).unwrap();
    assert_eq!(result, "<b>Tater {{ name }}</b>");
}

#[test]
fn lambda_section_called_once_per_section() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let engine = Engine::new();
    let ctx = value! {
        lambda: Lambda::section(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            "__"
        }),
    };
    let result = render(&engine, "{{#lambda}}FILE{{/lambda}} != {{#lambda}}LINE{{/lambda}}", ctx).unwrap();
    assert_eq!(result, "__ != __");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn lambda_inverted_section() {
    let engine = Engine::new();
    let ctx = value! { lambda: Lambda::section(|_, _| "x") };
    let result = render(&engine, "<{{^lambda}}{{static}}{{/lambda}}>", ctx).unwrap();
    assert_eq!(result, "<>");
}

#[test]
fn lambda_filter_in_section_position_receives_text() {
    let engine = Engine::new();
    let ctx = value! {
        upper: Lambda::filter(|v: Value| match v {
            Value::String(s) => Value::from(s.to_uppercase()),
            v => v,
        }),
    };
    let result = render(&engine, "{{#upper}}hello{{/upper}}", ctx).unwrap();
    assert_eq!(result, "HELLO");
}

#[test]
fn lambda_lax_callable_list() {
    let engine = Engine::new();
    let ctx = value! {
        obj: [{ greet: Lambda::new(|| "hi") }, "greet"],
    };
    assert_eq!(render(&engine, "{{obj}}", ctx).unwrap(), "hi");
}

#[test]
fn lambda_strict_callables() {
    let engine = Engine::builder().strict_callables(true).build().unwrap();
    let ctx = value! {
        obj: [{ greet: Lambda::new(|| "hi") }, "greet"],
        lambda: Lambda::new(|| "still called"),
    };
    assert_eq!(render(&engine, "{{lambda}}", ctx.clone()).unwrap(), "still called");
    let err = render(&engine, "{{obj}}", ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
    assert_eq!(err.message(), "expected renderable value, found list");
}

#[test]
fn lambda_err_propagates() {
    let engine = Engine::new();
    let ctx = value! {
        lambda: Lambda::new(|| Err::<Value, _>(Error::from("boom"))),
    };
    let err = render(&engine, "a {{lambda}}", ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
    assert_eq!(err.to_string(), "boom between bytes 2 and 12");
}

#[test]
fn lambda_err_section_lambda_interpolated() {
    let engine = Engine::new();
    let ctx = value! { lambda: Lambda::section(|text, _| text.to_owned()) };
    let err = render(&engine, "{{lambda}}", ctx).unwrap_err();
    assert_eq!(err.message(), "section lambda cannot be interpolated");
}

#[test]
fn lambda_err_returns_list() {
    let engine = Engine::new();
    let ctx = value! { lambda: Lambda::new(|| vec![1, 2]) };
    let err = render(&engine, "{{lambda}}", ctx).unwrap_err();
    assert_eq!(err.message(), "expected renderable value, found list");
}

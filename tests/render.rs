use lump::{value, Engine, ErrorKind, Value};

#[test]
fn render_inline_var_bool() {
    let result = Engine::new()
        .compile("lorem {{ ipsum }}")
        .unwrap()
        .render(value! { ipsum: true })
        .unwrap();
    assert_eq!(result, "lorem true");
}

#[test]
fn render_inline_var_i64() {
    let result = Engine::new()
        .compile("lorem {{ ipsum }}")
        .unwrap()
        .render(value! { ipsum: 123_i64 })
        .unwrap();
    assert_eq!(result, "lorem 123");
}

#[test]
fn render_inline_var_f64() {
    let result = Engine::new()
        .compile("lorem {{ ipsum }}")
        .unwrap()
        .render(value! { ipsum: 123.4_f64 })
        .unwrap();
    assert_eq!(result, "lorem 123.4");
}

#[test]
fn render_inline_var_none() {
    let result = Engine::new()
        .compile("lorem {{ ipsum }}")
        .unwrap()
        .render(value! { ipsum: None })
        .unwrap();
    assert_eq!(result, "lorem ");
}

#[test]
fn render_inline_var_missing() {
    let result = Engine::new()
        .compile("lorem {{ ipsum }}dolor")
        .unwrap()
        .render(value! {})
        .unwrap();
    assert_eq!(result, "lorem dolor");
}

#[test]
fn render_escaped_html() {
    let engine = Engine::new();
    let ctx = value! { x: "<b>\"Tom\" & 'Jerry'</b>" };
    let result = engine.compile("{{ x }}").unwrap().render(&ctx).unwrap();
    assert_eq!(
        result,
        "&lt;b&gt;&quot;Tom&quot; &amp; 'Jerry'&lt;/b&gt;"
    );
}

#[test]
fn render_unescaped() {
    let engine = Engine::new();
    let ctx = value! { x: "<b>" };
    let result = engine
        .compile("{{{ x }}} {{& x }} {{x}}")
        .unwrap()
        .render(&ctx)
        .unwrap();
    assert_eq!(result, "<b> <b> &lt;b&gt;");
}

#[test]
fn render_dotted_name() {
    let result = Engine::new()
        .compile("{{ a.b.c }}")
        .unwrap()
        .render(value! { a: { b: { c: "deep" } } })
        .unwrap();
    assert_eq!(result, "deep");
}

#[test]
fn render_dotted_name_miss_is_empty() {
    let result = Engine::new()
        .compile("[{{ a.b.c }}]")
        .unwrap()
        .render(value! { a: { b: {} } })
        .unwrap();
    assert_eq!(result, "[]");
}

#[test]
fn render_dotted_name_does_not_fall_back_to_outer_frames() {
    let result = Engine::new()
        .compile("{{#a}}[{{ b.c }}]{{/a}}")
        .unwrap()
        .render(value! { a: { b: {} }, b: { c: "outer" } })
        .unwrap();
    assert_eq!(result, "[]");
}

#[test]
fn render_list_index() {
    let result = Engine::new()
        .compile("{{ items.1 }}")
        .unwrap()
        .render(value! { items: ["a", "b"] })
        .unwrap();
    assert_eq!(result, "b");
}

#[test]
fn render_section_list() {
    let engine = Engine::new();
    let template = engine.compile("{{#items}}{{name}}{{/items}}").unwrap();
    let result = template
        .render(value! { items: [{ name: "a" }, { name: "b" }] })
        .unwrap();
    assert_eq!(result, "ab");
    let result = template.render(value! { items: [] }).unwrap();
    assert_eq!(result, "");
}

#[test]
fn render_section_implicit_iterator() {
    let result = Engine::new()
        .compile("{{#items}}({{.}}){{/items}}")
        .unwrap()
        .render(value! { items: [1, "two", 3.5] })
        .unwrap();
    assert_eq!(result, "(1)(two)(3.5)");
}

#[test]
fn render_section_truthy_values() {
    let engine = Engine::new();
    let template = engine.compile("{{#x}}yes{{/x}}").unwrap();
    for x in [Value::from(true), Value::from(1), Value::from("0"), Value::from(" ")] {
        assert_eq!(template.render_value(&value! { x: x.clone() }).unwrap(), "yes", "{x:?}");
    }
    for x in [
        Value::None,
        Value::from(false),
        Value::from(0),
        Value::from(0.0),
        Value::from(""),
        Value::List(Vec::new()),
        Value::Map(lump::Map::new()),
    ] {
        assert_eq!(template.render_value(&value! { x: x.clone() }).unwrap(), "", "{x:?}");
    }
}

#[test]
fn render_section_map_is_a_single_frame() {
    let result = Engine::new()
        .compile("{{#person}}{{name}} is {{age}}{{/person}}")
        .unwrap()
        .render(value! { person: { name: "John", age: 42 } })
        .unwrap();
    assert_eq!(result, "John is 42");
}

#[test]
fn render_section_dense_map_is_iterated() {
    let result = Engine::new()
        .compile("{{#m}}<{{.}}>{{/m}}")
        .unwrap()
        .render(value! { m: { "0": "a", "1": "b", "2": "c" } })
        .unwrap();
    assert_eq!(result, "<a><b><c>");
}

#[test]
fn render_section_sparse_map_is_not_iterated() {
    let result = Engine::new()
        .compile("{{#m}}<{{1}}{{3}}>{{/m}}")
        .unwrap()
        .render(value! { m: { "1": "a", "3": "b" } })
        .unwrap();
    assert_eq!(result, "<ab>");
}

#[test]
fn render_section_out_of_order_map_is_not_iterated() {
    let result = Engine::new()
        .compile("{{#m}}<{{0}}{{1}}>{{/m}}")
        .unwrap()
        .render(value! { m: { "1": "b", "0": "a" } })
        .unwrap();
    assert_eq!(result, "<ab>");
}

#[test]
fn render_section_context_stack() {
    let result = Engine::new()
        .compile("{{#a}}{{#b}}{{x}}{{y}}{{z}}{{/b}}{{/a}}")
        .unwrap()
        .render(value! { a: { x: 1, b: { y: 2 } }, z: 3 })
        .unwrap();
    assert_eq!(result, "123");
}

#[test]
fn render_inverted_section() {
    let engine = Engine::new();
    let template = engine.compile("{{^items}}none{{/items}}").unwrap();
    assert_eq!(template.render(value! {}).unwrap(), "none");
    assert_eq!(template.render(value! { items: [] }).unwrap(), "none");
    assert_eq!(template.render(value! { items: false }).unwrap(), "none");
    assert_eq!(template.render(value! { items: [1] }).unwrap(), "");
}

#[test]
fn render_inverted_section_does_not_push_a_frame() {
    let result = Engine::new()
        .compile("{{^a}}{{b}}{{/a}}")
        .unwrap()
        .render(value! { a: None, b: "outer" })
        .unwrap();
    assert_eq!(result, "outer");
}

#[test]
fn render_anchored_dot() {
    let result = Engine::new()
        .compile("{{%ANCHORED-DOT}}{{#a}}[{{.x}}|{{x}}|{{.y}}]{{/a}}")
        .unwrap()
        .render(value! { x: "outer", a: { y: 1 } })
        .unwrap();
    assert_eq!(result, "[|outer|1]");
}

#[test]
fn render_anchored_dot_requires_pragma() {
    let result = Engine::new()
        .compile("{{#a}}[{{.y}}]{{/a}}")
        .unwrap()
        .render(value! { a: { y: 1 } })
        .unwrap();
    // Without the pragma `.y` is a dotted name whose first segment is empty.
    assert_eq!(result, "[]");
}

#[test]
fn render_comment() {
    let result = Engine::new()
        .compile("a{{! a comment }}b{{!}}c")
        .unwrap()
        .render(value! {})
        .unwrap();
    assert_eq!(result, "abc");
}

#[test]
fn render_delimiter_change() {
    let result = Engine::new()
        .compile("{{=<% %>=}}(<% a %>) {{ a }} <%={{ }}=%>{{ a }}")
        .unwrap()
        .render(value! { a: "x" })
        .unwrap();
    assert_eq!(result, "(x) {{ a }} x");
}

#[test]
fn render_triple_with_custom_delimiters() {
    let result = Engine::new()
        .compile("{{=| |=}}|{ a }|")
        .unwrap()
        .render(value! { a: "<i>" })
        .unwrap();
    assert_eq!(result, "<i>");
}

#[test]
fn render_dollar_name_without_blocks_pragma() {
    let result = Engine::new()
        .compile("{{ $price }}")
        .unwrap()
        .render(value! { "$price": 5 })
        .unwrap();
    assert_eq!(result, "5");
}

#[test]
fn render_err_list_not_renderable() {
    let err = Engine::new()
        .compile("lorem {{ ipsum }}")
        .unwrap()
        .render(value! { ipsum: [1, 2] })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Render);
    assert_eq!(
        format!("{err:#}"),
        "
   |
 1 | lorem {{ ipsum }}
   |       ^^^^^^^^^^^ expected renderable value, found list
"
    );
}

#[test]
fn render_serialize_struct() {
    #[derive(serde::Serialize)]
    struct Context {
        users: Vec<User>,
    }

    #[derive(serde::Serialize)]
    struct User {
        name: String,
        admin: bool,
    }

    let ctx = Context {
        users: vec![
            User {
                name: "John".into(),
                admin: true,
            },
            User {
                name: "Jane".into(),
                admin: false,
            },
        ],
    };
    let result = Engine::new()
        .compile("{{#users}}{{name}}{{#admin}}*{{/admin}};{{/users}}")
        .unwrap()
        .render(&ctx)
        .unwrap();
    assert_eq!(result, "John*;Jane;");
}

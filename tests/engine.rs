use std::sync::Arc;
use std::thread;

use lump::{value, ArrayLoader, EntityFlags, Engine, ErrorKind, Lambda, MemoryCache, Pragma};

#[test]
fn engine_debug() {
    format!("{:?}", Engine::new());
    format!("{:?}", Engine::builder());
}

#[test]
fn engine_send_and_sync() {
    let engine = Engine::new();
    thread::spawn(move || {
        let result = engine
            .compile("{{ lorem }}")
            .unwrap()
            .render(value! { lorem: "ipsum" })
            .unwrap();
        assert_eq!(result, "ipsum");
    })
    .join()
    .unwrap();
}

#[test]
fn engine_compile_non_static_source() -> lump::Result<()> {
    let engine = Engine::new();
    let source = String::from("{{ lorem }}");
    let result = engine.compile(&source)?.render(value! { lorem: "ipsum" })?;
    assert_eq!(result, "ipsum");
    Ok(())
}

#[test]
fn engine_render_with_string_loader() {
    let result = Engine::new()
        .render("Hello {{ planet }}!", value! { planet: "World" })
        .unwrap();
    assert_eq!(result, "Hello World!");
}

#[test]
fn engine_render_named_template() {
    let engine = Engine::builder()
        .loader(ArrayLoader::new([("hello", "Hello {{ planet }}!")]))
        .build()
        .unwrap();
    let result = engine
        .render_value("hello", &value! { planet: "World" })
        .unwrap();
    assert_eq!(result, "Hello World!");
    assert_eq!(engine.load_template("hello").unwrap().source(), "Hello {{ planet }}!");
}

#[test]
fn engine_err_unknown_template() {
    let engine = Engine::builder()
        .loader(ArrayLoader::new([("a", "A")]))
        .build()
        .unwrap();
    let err = engine.load_template("nope").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownTemplate);
    assert_eq!(err.name(), Some("nope"));
    assert_eq!(err.to_string(), "unknown template `nope`");
}

#[test]
fn engine_template_key_is_stable() {
    let a = Engine::new().template_key("Hello {{ name }}");
    let b = Engine::new().template_key("Hello {{ name }}");
    assert_eq!(a, b);
    assert_eq!(a.to_hex().len(), 64);
    assert_eq!(a.to_string(), a.to_hex());
    assert_ne!(a, Engine::new().template_key("Hello {{ name}}"));
}

#[test]
fn engine_template_key_depends_on_configuration() {
    let source = "{{ x }}";
    let default = Engine::new().template_key(source);
    let engines = [
        Engine::builder().entity_flags(EntityFlags::Quotes).build(),
        Engine::builder().charset("ISO-8859-1").build(),
        Engine::builder().strict_callables(true).build(),
        Engine::builder().pragma("FILTERS").build(),
        Engine::builder().escape(|s| s.to_owned()).build(),
    ];
    for engine in engines {
        assert_ne!(engine.unwrap().template_key(source), default);
    }
}

#[test]
fn engine_template_key_pragma_order_does_not_matter() {
    let a = Engine::builder()
        .pragmas(["FILTERS", "BLOCKS"])
        .build()
        .unwrap();
    let b = Engine::builder()
        .pragmas(["BLOCKS", "FILTERS", "BLOCKS"])
        .build()
        .unwrap();
    assert_eq!(a.template_key("x"), b.template_key("x"));
    assert_eq!(a.pragmas().collect::<Vec<_>>(), [Pragma::Blocks, Pragma::Filters]);
}

#[test]
fn engine_compile_is_memoized() {
    let engine = Engine::new();
    let a = engine.compile("{{#a}}{{b}}{{/a}}").unwrap();
    let b = engine.compile(String::from("{{#a}}{{b}}{{/a}}")).unwrap();
    assert_eq!(a.key(), b.key());
    assert!(Arc::ptr_eq(a.program(), b.program()));
}

#[test]
fn engine_shared_memory_cache() {
    let cache = Arc::new(MemoryCache::new());
    let first = Engine::builder().cache(Arc::clone(&cache)).build().unwrap();
    let second = Engine::builder().cache(Arc::clone(&cache)).build().unwrap();

    let a = first.compile("{{ x }}").unwrap();
    assert_eq!(cache.len(), 1);
    let b = second.compile("{{ x }}").unwrap();
    assert_eq!(cache.len(), 1);
    assert!(Arc::ptr_eq(a.program(), b.program()));
}

#[test]
fn engine_lambda_templates_not_cached_by_default() {
    let ctx = value! { x: 1, l: Lambda::new(|| "{{x}}") };

    let cache = Arc::new(MemoryCache::new());
    let engine = Engine::builder().cache(Arc::clone(&cache)).build().unwrap();
    assert_eq!(engine.compile("{{l}}").unwrap().render_value(&ctx).unwrap(), "1");
    assert_eq!(cache.len(), 1);

    let cache = Arc::new(MemoryCache::new());
    let engine = Engine::builder()
        .cache(Arc::clone(&cache))
        .cache_lambda_templates(true)
        .build()
        .unwrap();
    assert_eq!(engine.compile("{{l}}").unwrap().render_value(&ctx).unwrap(), "1");
    assert_eq!(cache.len(), 2);
}

#[test]
fn engine_helpers() {
    let mut engine = Engine::builder()
        .helper("site", "lump")
        .helpers([("year", 2024)])
        .build()
        .unwrap();
    let template = "{{ site }} {{ year }}";
    assert_eq!(engine.render(template, value! {}).unwrap(), "lump 2024");
    assert_eq!(
        engine.render(template, value! { site: "mine" }).unwrap(),
        "mine 2024"
    );

    engine.add_helper("site", "other");
    assert!(engine.has_helper("site"));
    assert_eq!(engine.get_helper("site").unwrap(), &lump::Value::from("other"));
    assert_eq!(engine.helpers().keys().collect::<Vec<_>>(), ["site", "year"]);

    assert_eq!(engine.remove_helper("site"), Some(lump::Value::from("other")));
    assert!(!engine.has_helper("site"));
    let err = engine.get_helper("site").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownHelper);
    assert_eq!(err.message(), "unknown helper `site`");
}

#[test]
fn engine_custom_escape() {
    let engine = Engine::builder()
        .escape(|s| s.replace('&', "and"))
        .build()
        .unwrap();
    let result = engine
        .render("{{ x }} {{{ x }}}", value! { x: "<a & b>" })
        .unwrap();
    assert_eq!(result, "<a and b> <a & b>");
}

#[test]
fn engine_entity_flags() {
    let ctx = value! { x: "\"it's\"" };
    for (flags, expected) in [
        (EntityFlags::Compat, "&quot;it's&quot;"),
        (EntityFlags::Quotes, "&quot;it&#039;s&quot;"),
        (EntityFlags::NoQuotes, "\"it's\""),
    ] {
        let engine = Engine::builder().entity_flags(flags).build().unwrap();
        assert_eq!(engine.entity_flags(), flags);
        assert_eq!(engine.render("{{ x }}", &ctx).unwrap(), expected);
    }
}

#[test]
fn engine_charset() {
    assert_eq!(Engine::new().charset(), "UTF-8");
    let engine = Engine::builder().charset("iso-8859-1").build().unwrap();
    assert_eq!(engine.charset(), "iso-8859-1");
}

#[test]
fn engine_err_unknown_pragma() {
    let err = Engine::builder().pragma("NOPE").build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(err.to_string(), "unknown pragma `NOPE`");
}

#[test]
fn engine_err_unknown_charset() {
    let err = Engine::builder().charset("EBCDIC").build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(err.to_string(), "unsupported charset `EBCDIC`");
}

#[test]
fn engine_err_zero_partial_depth() {
    let err = Engine::builder().max_partial_depth(0).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

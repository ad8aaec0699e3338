use core::cell::Cell;
use std::rc::Rc;

use stache_context::{
    ContextStack, Frame, Object, ParseErrorKind, Path, ResolveError, ResolveOptions, Value,
};
use stache_testhelpers::IPanic;

fn data<const N: usize>(entries: [(&str, Value); N]) -> Value {
    entries.into_iter().collect()
}

fn name_of(value: &Value) -> Value {
    match value.as_frame() {
        Some(Frame::Record(record)) => record.property("name").unwrap_or_else(Value::absent),
        Some(Frame::Mapping(map)) => map.get("name").cloned().unwrap_or_else(Value::absent),
        _ => Value::absent(),
    }
}

#[test]
fn dotted_paths_narrow() -> Result<(), IPanic> {
    stache_testhelpers::setup();

    let with_b = ContextStack::with_root(data([("a", data([("b", Value::from("X"))]))]));
    assert_eq!(with_b.lookup("a.b")?, Value::from("X"));

    let without_a = ContextStack::with_root(data([]));
    assert_eq!(without_a.lookup("a.b")?, Value::absent());

    let mut without_b = ContextStack::with_root(data([("b", Value::from("elsewhere"))]));
    without_b.push(data([("a", data([]))]));
    assert_eq!(without_b.lookup("a.b")?, Value::absent());
    assert_eq!(without_b.try_lookup("a.b")?, None);
    Ok(())
}

#[test]
fn paths_descend_through_records_and_lists() -> Result<(), IPanic> {
    stache_testhelpers::setup();

    let city = Object::new().with_property("name", "Lyon");
    let address = Object::new().with_method("city", move |_, _| Ok(Value::from(city.clone())));
    let items: Value = ["first", "second"].into_iter().map(Value::from).collect();
    let stack = ContextStack::with_root(data([
        ("address", Value::from(address)),
        ("items", items),
    ]));

    assert_eq!(stack.lookup("address.city.name")?, Value::from("Lyon"));
    assert_eq!(stack.lookup("items.1")?, Value::from("second"));
    assert_eq!(stack.lookup("items.1.length")?, Value::absent());
    Ok(())
}

#[test]
fn dot_is_the_innermost_frame() -> Result<(), IPanic> {
    stache_testhelpers::setup();

    let mut stack = ContextStack::with_root(data([("a", Value::from(1))]));
    let pushed = Value::from(vec![Value::from("x")]);
    stack.push(pushed.clone());

    let current = stack.resolve(&Path::Current)?;
    assert!(current.ptr_eq(&pushed));
    assert!(stack.lookup(" . ")?.ptr_eq(&pushed));
    Ok(())
}

#[test]
fn call_arguments_resolve_where_the_tag_appears() -> Result<(), IPanic> {
    stache_testhelpers::setup();

    let child = Object::new()
        .with_type_name("Child")
        .with_property("name", "outer child")
        .with_property("child", data([("name", Value::from("nested child"))]))
        .with_method("getName", |args, _| {
            Ok(args.first().map(name_of).unwrap_or_else(Value::absent))
        });
    let stack = ContextStack::with_root(data([("child", Value::from(child))]));

    // Narrowing would see the nested `child` property instead.
    assert_eq!(stack.lookup("child.child.name")?, Value::from("nested child"));
    assert_eq!(stack.lookup("child.getName(child)")?, Value::from("outer child"));
    assert_eq!(stack.lookup("child.getName(child.child)")?, Value::from("nested child"));
    Ok(())
}

#[test]
fn missing_arguments_are_passed_as_absent() -> Result<(), IPanic> {
    stache_testhelpers::setup();

    let counter = Object::new()
        .with_method("count", |args, _| Ok(Value::Int(args.len() as i64)))
        .with_method("first", |args, _| Ok(args[0].clone()));
    let stack = ContextStack::with_root(counter);

    assert_eq!(stack.lookup("count(nope, also.nope)")?, Value::Int(2));
    assert_eq!(stack.try_lookup("first(nope)")?, Some(Value::absent()));
    Ok(())
}

#[test]
fn helper_sees_the_calling_stack() -> Result<(), IPanic> {
    stache_testhelpers::setup();

    let mut stack = ContextStack::with_root(data([
        ("foo", Value::from(1)),
        ("bar", Value::from("b")),
        ("baz", data([("qux", Value::from("WIN"))])),
    ]));
    stack.push("MOAR WIN");

    let helper = stack.helper();
    assert_eq!(helper.find("foo")?, Value::Int(1));
    assert_eq!(helper.find("bar")?, Value::from("b"));
    assert_eq!(helper.find("baz.qux")?, Value::from("WIN"));
    assert_eq!(helper.find(".")?, Value::from("MOAR WIN"));
    assert_eq!(helper.last(), Some(&Value::from("MOAR WIN")));
    Ok(())
}

#[test]
fn callables_can_render_with_a_derived_stack() -> Result<(), IPanic> {
    stache_testhelpers::setup();

    let mut stack = ContextStack::with_root(data([("name", Value::from("outer"))]));
    stack.push(Object::new().with_method("nested", |_, helper| {
        let mut inner = helper.derive();
        inner.push(data([("name", Value::from("inner"))]));
        let name = inner.find("name")?;
        let here = helper.find("name")?;
        Ok(Value::from(format!("{}/{}", name.render_to_string(), here.render_to_string())))
    }));

    assert_eq!(stack.find("nested")?, Value::from("inner/outer"));
    assert_eq!(stack.len(), 2);
    Ok(())
}

#[test]
fn malformed_paths_never_reach_a_callable() {
    stache_testhelpers::setup();

    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let stack = ContextStack::with_root(Object::new().with_method("a", move |_, _| {
        counter.set(counter.get() + 1);
        Ok(Value::from("called"))
    }));

    for tag in ["a..b", "a.", ".a", "a(1", "a)", r#"a("x)"#, "a(b c)", ""] {
        match stack.lookup(tag) {
            Err(ResolveError::Parse(_)) => {}
            other => panic!("{tag:?} should not parse, got {other:?}"),
        }
    }
    assert_eq!(calls.get(), 0);
}

#[test]
fn parse_errors_carry_the_tag() {
    stache_testhelpers::setup();

    let stack = ContextStack::new();
    let Err(ResolveError::Parse(err)) = stack.lookup("user.format(date, 'short)") else {
        panic!("expected a parse error");
    };
    assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
    assert_eq!(err.range(), 18..25);
    insta::assert_snapshot!(err.to_string(), @"unterminated string literal");
}

#[test]
fn runaway_recursion_hits_the_depth_limit() {
    stache_testhelpers::setup();

    let mut stack = ContextStack::with_root(data([("plain", Value::from(1))]))
        .with_options(ResolveOptions::new().with_max_depth(8));
    stack.push(Object::new().with_method("again", |_, helper| Ok(helper.find("again()")?)));

    let err = stack.find("again").unwrap_err();
    assert!(matches!(err, ResolveError::DepthExceeded { limit: 8 }), "{err:?}");
    insta::assert_snapshot!(err.to_string(), @"resolution nested deeper than 8 levels");

    // The budget is released once the lookup unwinds.
    assert_eq!(stack.lookup("plain").unwrap(), Value::from(1));
}

#[test]
fn callable_errors_propagate() {
    stache_testhelpers::setup();

    let stack = ContextStack::with_root(Object::new().with_method("boom", |_, _| {
        Err(std::io::Error::other("disk on fire").into())
    }));

    let err = stack.lookup("boom(1)").unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"callable `boom` failed");
    let source = core::error::Error::source(&err).map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("disk on fire"));
}

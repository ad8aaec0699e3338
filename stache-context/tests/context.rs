use core::cell::Cell;
use std::rc::Rc;

use stache_context::{ContextStack, Object, Value};
use stache_testhelpers::IPanic;

fn data<const N: usize>(entries: [(&str, Value); N]) -> Value {
    entries.into_iter().collect()
}

#[test]
fn missing_names_are_absent() -> Result<(), IPanic> {
    stache_testhelpers::setup();

    let mut stack = ContextStack::with_root(data([("a", Value::from(1))]));
    stack.push(Object::new().with_property("b", 2));
    stack.push("scalar");

    for id in ["nope", "a_", "B", "0"] {
        assert_eq!(stack.find(id)?, Value::absent());
        assert_eq!(stack.try_find(id)?, None);
    }
    Ok(())
}

#[test]
fn shadowing_lasts_until_pop() -> Result<(), IPanic> {
    stache_testhelpers::setup();

    let mut stack = ContextStack::with_root(data([("k", Value::from("root"))]));
    assert_eq!(stack.find("k")?, Value::from("root"));

    stack.push(data([("k", Value::from("section"))]));
    stack.push(data([("other", Value::from(0))]));
    assert_eq!(stack.find("k")?, Value::from("section"));

    stack.pop();
    stack.pop();
    assert_eq!(stack.find("k")?, Value::from("root"));
    Ok(())
}

#[test]
fn first_match_is_not_a_merge() -> Result<(), IPanic> {
    stache_testhelpers::setup();

    let mut stack = ContextStack::with_root(data([(
        "person",
        data([("name", Value::from("Ann")), ("age", Value::from(40))]),
    )]));
    stack.push(data([("person", data([("name", Value::from("Bob"))]))]));

    assert_eq!(stack.lookup("person.name")?, Value::from("Bob"));
    assert_eq!(stack.lookup("person.age")?, Value::absent());
    Ok(())
}

#[test]
fn callable_wins_over_property_of_the_same_name() -> Result<(), IPanic> {
    stache_testhelpers::setup();

    let user = Object::new()
        .with_type_name("User")
        .with_property("title", "stored")
        .with_property("email", "a@b.c")
        .with_method("title", |_, _| Ok(Value::from("computed")));
    let stack = ContextStack::with_root(user);

    assert_eq!(stack.find("title")?, Value::from("computed"));
    assert_eq!(stack.find("email")?, Value::from("a@b.c"));
    assert_eq!(stack.peek().map(Value::type_name), Some("User"));
    Ok(())
}

#[test]
fn repeated_lookups_repeat_calls() -> Result<(), IPanic> {
    stache_testhelpers::setup();

    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let mut stack = ContextStack::with_root(data([("fixed", Value::from("same"))]));
    stack.push(Object::new().with_method("tick", move |_, _| {
        counter.set(counter.get() + 1);
        Ok(Value::Int(counter.get()))
    }));

    assert_eq!(stack.find("fixed")?, stack.find("fixed")?);
    assert_eq!(stack.find("tick")?, Value::Int(1));
    assert_eq!(stack.find("tick")?, Value::Int(2));
    assert_eq!(calls.get(), 2);
    assert_eq!(stack.len(), 2);
    Ok(())
}

#[test]
fn pushed_frames_keep_their_identity() {
    stache_testhelpers::setup();

    let frame = data([("x", Value::from(1))]);
    let mut stack = ContextStack::new();
    stack.push(frame.clone());

    assert!(stack.peek().is_some_and(|top| top.ptr_eq(&frame)));
    assert!(stack.pop().is_some_and(|popped| popped.ptr_eq(&frame)));
    assert!(stack.is_empty());
}

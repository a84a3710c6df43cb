use super::{parked, run};
use crate::builder::{
    base, Action, Builder, Callback, Completion, KeyedFactory, Predicate, StepFactory, StepResult,
    SyncBuilder,
};
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[test]
fn test_for_loop_runs_update_between_iterations() {
    let i = Rc::new(Cell::new(0));
    let seen = Rc::new(RefCell::new(Vec::new()));

    let test: Predicate = {
        let i = i.clone();
        Rc::new(move || Ok(i.get() < 3))
    };
    let update: Action = {
        let i = i.clone();
        Rc::new(move || {
            i.set(i.get() + 1);
            Ok(())
        })
    };
    let body: StepFactory = {
        let i = i.clone();
        let seen = seen.clone();
        Rc::new(move || -> StepResult {
            seen.borrow_mut().push(i.get());
            Ok(base::normal())
        })
    };

    let step = base::for_loop(Some(test), Some(update), body);
    assert_eq!(run(step), Completion::Normal(Value::Undefined));
    assert_eq!(*seen.borrow(), vec![0, 1, 2]);
}

#[test]
fn test_for_loop_without_test_ends_on_break() {
    let n = Rc::new(Cell::new(0));
    let body: StepFactory = {
        let n = n.clone();
        Rc::new(move || -> StepResult {
            n.set(n.get() + 1);
            if n.get() == 4 {
                Ok(base::break_loop())
            } else {
                Ok(base::continue_loop())
            }
        })
    };
    let step = base::for_loop(None, None, body);
    assert_eq!(run(step), Completion::Normal(Value::Undefined));
    assert_eq!(n.get(), 4);
}

#[test]
fn test_return_inside_loop_ends_it() {
    let body: StepFactory = Rc::new(|| -> StepResult { Ok(base::return_value(Value::str("out"))) });
    let always: Predicate = Rc::new(|| Ok(true));
    let step = base::while_loop(always, body);
    assert_eq!(run(step), Completion::Return(Value::str("out")));
}

#[test]
fn test_loop_test_error_becomes_throw() {
    let body: StepFactory = Rc::new(|| -> StepResult { Ok(base::normal()) });
    let failing: Predicate = Rc::new(|| Err(Value::type_error("test failed")));
    let step = base::while_loop(failing, body);
    assert_eq!(run(step), Completion::Throw(Value::type_error("test failed")));
}

#[test]
fn test_do_loop_runs_body_before_test() {
    let n = Rc::new(Cell::new(0));
    let body: StepFactory = {
        let n = n.clone();
        Rc::new(move || -> StepResult {
            n.set(n.get() + 1);
            Ok(base::normal())
        })
    };
    let never: Predicate = Rc::new(|| Ok(false));
    let step = base::do_loop(body, never);
    assert_eq!(run(step), Completion::Normal(Value::Undefined));
    assert_eq!(n.get(), 1);
}

#[test]
fn test_for_in_iterates_keys_present_at_start() {
    let mut entries = IndexMap::new();
    entries.insert("a".to_string(), Value::Num(1.0));
    entries.insert("b".to_string(), Value::Num(2.0));
    let object = Value::obj(entries);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let body: KeyedFactory = {
        let seen = seen.clone();
        let object = object.clone();
        Rc::new(move |key: Value| -> StepResult {
            seen.borrow_mut().push(key.to_string());
            if let Value::Obj(map) = &object {
                map.borrow_mut().insert("late".to_string(), Value::Null);
            }
            Ok(base::normal())
        })
    };

    let step = base::for_in(object, body);
    assert_eq!(run(step), Completion::Normal(Value::Undefined));
    assert_eq!(*seen.borrow(), vec!["a", "b"]);
}

#[test]
fn test_for_in_over_list_yields_indices() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let body: KeyedFactory = {
        let seen = seen.clone();
        Rc::new(move |key: Value| -> StepResult {
            seen.borrow_mut().push(key);
            Ok(base::normal())
        })
    };
    let step = base::for_in(Value::list(vec![Value::Null, Value::Null]), body);
    run(step);
    assert_eq!(*seen.borrow(), vec![Value::str("0"), Value::str("1")]);
}

#[test]
fn test_synchronous_iterations_do_not_grow_the_stack() {
    let n = Rc::new(Cell::new(0u32));
    let test: Predicate = {
        let n = n.clone();
        Rc::new(move || Ok(n.get() < 1_000_000))
    };
    let body: StepFactory = {
        let n = n.clone();
        Rc::new(move || -> StepResult {
            let n = n.clone();
            Ok(SyncBuilder.bind(
                Value::Undefined,
                Box::new(move |_| {
                    n.set(n.get() + 1);
                    Ok(base::normal())
                }),
            ))
        })
    };
    let step = base::while_loop(test, body);
    assert_eq!(run(step), Completion::Normal(Value::Undefined));
    assert_eq!(n.get(), 1_000_000);
}

#[test]
fn test_loop_resumes_after_suspended_body() {
    let slot: Rc<RefCell<Option<Callback>>> = Rc::new(RefCell::new(None));
    let n = Rc::new(Cell::new(0));
    let test: Predicate = {
        let n = n.clone();
        Rc::new(move || Ok(n.get() < 2))
    };
    let body: StepFactory = {
        let n = n.clone();
        let slot = slot.clone();
        Rc::new(move || -> StepResult {
            n.set(n.get() + 1);
            Ok(parked(&slot))
        })
    };

    let done: Rc<RefCell<Option<Completion>>> = Rc::new(RefCell::new(None));
    let sink = done.clone();
    base::while_loop(test, body).run(
        &Value::Undefined,
        Box::new(move |completion| *sink.borrow_mut() = Some(completion)),
    );
    assert_eq!(n.get(), 1);
    assert!(done.borrow().is_none());

    let resume = slot.borrow_mut().take().unwrap();
    resume(Completion::Normal(Value::Undefined));
    assert_eq!(n.get(), 2);
    assert!(done.borrow().is_none());

    let resume = slot.borrow_mut().take().unwrap();
    resume(Completion::Normal(Value::Undefined));
    assert_eq!(*done.borrow(), Some(Completion::Normal(Value::Undefined)));
}

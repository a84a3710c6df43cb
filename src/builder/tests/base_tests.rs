use super::run;
use crate::builder::{base, Builder, Completion, SyncBuilder};
use crate::value::Value;
use std::cell::Cell;
use std::rc::Rc;

fn counter() -> (Rc<Cell<u32>>, Rc<Cell<u32>>) {
    let count = Rc::new(Cell::new(0));
    (count.clone(), count)
}

#[test]
fn test_terminals() {
    assert_eq!(run(base::normal()), Completion::Normal(Value::Undefined));
    assert_eq!(
        run(base::return_value(Value::Num(1.0))),
        Completion::Return(Value::Num(1.0))
    );
    assert_eq!(run(base::break_loop()), Completion::Break);
    assert_eq!(run(base::continue_loop()), Completion::Continue);
    assert_eq!(
        run(base::throw(Value::str("e"))),
        Completion::Throw(Value::str("e"))
    );
}

#[test]
fn test_delay_is_lazy() {
    let (calls, seen) = counter();
    let step = base::delay(Box::new(move || {
        calls.set(calls.get() + 1);
        Ok(base::return_value(Value::Num(2.0)))
    }));
    assert_eq!(seen.get(), 0);
    assert_eq!(run(step), Completion::Return(Value::Num(2.0)));
    assert_eq!(seen.get(), 1);
}

#[test]
fn test_delay_thunk_error_becomes_throw() {
    let step = base::delay(Box::new(|| Err(Value::type_error("bad"))));
    assert_eq!(run(step), Completion::Throw(Value::type_error("bad")));
}

#[test]
fn test_combine_runs_second_after_normal() {
    let step = base::combine(base::normal(), base::return_value(Value::Num(3.0)));
    assert_eq!(run(step), Completion::Return(Value::Num(3.0)));
}

#[test]
fn test_combine_skips_second_after_abrupt_first() {
    let (calls, seen) = counter();
    let second = base::delay(Box::new(move || {
        calls.set(calls.get() + 1);
        Ok(base::normal())
    }));
    let step = base::combine(base::return_value(Value::Num(1.0)), second);
    assert_eq!(run(step), Completion::Return(Value::Num(1.0)));
    assert_eq!(seen.get(), 0);

    let step = base::combine(base::break_loop(), base::normal());
    assert_eq!(run(step), Completion::Break);
}

#[test]
fn test_bind_passes_value_to_continuation() {
    let step = SyncBuilder.bind(
        Value::Num(20.0),
        Box::new(|value| Ok(base::return_value(Value::Num(value.to_number() + 1.0)))),
    );
    assert_eq!(run(step), Completion::Return(Value::Num(21.0)));
}

#[test]
fn test_bind_continuation_error_becomes_throw() {
    let step = SyncBuilder.bind(
        Value::Undefined,
        Box::new(|_| Err(Value::reference_error("x is not defined"))),
    );
    assert_eq!(
        run(step),
        Completion::Throw(Value::reference_error("x is not defined"))
    );
}

#[test]
fn test_bind_skips_continuation_when_operand_throws() {
    let (calls, seen) = counter();
    let step = base::bind(
        base::throw(Value::str("nope")),
        Box::new(move |_| {
            calls.set(calls.get() + 1);
            Ok(base::normal())
        }),
    );
    assert_eq!(run(step), Completion::Throw(Value::str("nope")));
    assert_eq!(seen.get(), 0);
}

#[test]
fn test_catch_handles_throw() {
    let step = base::try_catch(
        base::throw(Value::str("boom")),
        Some(Box::new(|error| Ok(base::return_value(error)))),
        None,
    );
    assert_eq!(run(step), Completion::Return(Value::str("boom")));
}

#[test]
fn test_catch_is_not_called_for_non_throw() {
    let (calls, seen) = counter();
    let step = base::try_catch(
        base::return_value(Value::Num(1.0)),
        Some(Box::new(move |_| {
            calls.set(calls.get() + 1);
            Ok(base::normal())
        })),
        None,
    );
    assert_eq!(run(step), Completion::Return(Value::Num(1.0)));
    assert_eq!(seen.get(), 0);
}

#[test]
fn test_normal_finally_keeps_pending_completion() {
    let (calls, seen) = counter();
    let finally = base::delay(Box::new(move || {
        calls.set(calls.get() + 1);
        Ok(base::normal())
    }));
    let step = base::try_catch(base::throw(Value::str("e")), None, Some(finally));
    assert_eq!(run(step), Completion::Throw(Value::str("e")));
    assert_eq!(seen.get(), 1);
}

#[test]
fn test_abrupt_finally_overrides_pending_completion() {
    let step = base::try_catch(
        base::return_value(Value::Num(1.0)),
        None,
        Some(base::return_value(Value::Num(2.0))),
    );
    assert_eq!(run(step), Completion::Return(Value::Num(2.0)));

    let step = base::try_catch(
        base::throw(Value::str("first")),
        None,
        Some(base::throw(Value::str("second"))),
    );
    assert_eq!(run(step), Completion::Throw(Value::str("second")));
}

#[test]
fn test_error_from_catch_handler_still_runs_finally() {
    let (calls, seen) = counter();
    let finally = base::delay(Box::new(move || {
        calls.set(calls.get() + 1);
        Ok(base::normal())
    }));
    let step = base::try_catch(
        base::throw(Value::str("first")),
        Some(Box::new(|_| Err(Value::str("from handler")))),
        Some(finally),
    );
    assert_eq!(run(step), Completion::Throw(Value::str("from handler")));
    assert_eq!(seen.get(), 1);
}

#[test]
fn test_completion_display() {
    assert_eq!(Completion::Return(Value::Num(1.0)).to_string(), "return(1)");
    assert_eq!(Completion::Break.to_string(), "break");
    assert!(Completion::Normal(Value::Undefined).is_normal());
    assert_eq!(Completion::Throw(Value::Null).kind(), "throw");
}

//! Default combinators shared by every builder
//!
//! None of these know what an operand is; `bind` receives an already lifted
//! step. Loops run through [`LoopDriver`], which iterates in place while
//! bodies complete synchronously and resumes from the callback once a body
//! suspends, so the native stack does not grow per iteration.

use super::{
    step, Action, BoxStep, Callback, CatchHandler, Completion, Continuation, KeyedFactory,
    Predicate, StepFactory, Thunk,
};
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/* ===================== Terminals ===================== */

pub fn normal() -> BoxStep {
    step(|_, callback| callback(Completion::Normal(Value::Undefined)))
}

pub fn return_value(value: Value) -> BoxStep {
    step(move |_, callback| callback(Completion::Return(value)))
}

pub fn break_loop() -> BoxStep {
    step(|_, callback| callback(Completion::Break))
}

pub fn continue_loop() -> BoxStep {
    step(|_, callback| callback(Completion::Continue))
}

pub fn throw(error: Value) -> BoxStep {
    step(move |_, callback| callback(Completion::Throw(error)))
}

/* ===================== Sequencing ===================== */

pub fn delay(thunk: Thunk) -> BoxStep {
    step(move |ctx, callback| match thunk() {
        Ok(next) => next.run(ctx, callback),
        Err(error) => callback(Completion::Throw(error)),
    })
}

/// Run `second` only if `first` completes normally
pub fn combine(first: BoxStep, second: BoxStep) -> BoxStep {
    step(move |ctx, callback| {
        let ctx2 = ctx.clone();
        first.run(
            ctx,
            Box::new(move |completion| match completion {
                Completion::Normal(_) => second.run(&ctx2, callback),
                other => callback(other),
            }),
        )
    })
}

pub fn bind(lifted: BoxStep, k: Continuation) -> BoxStep {
    step(move |ctx, callback| {
        let ctx2 = ctx.clone();
        lifted.run(
            ctx,
            Box::new(move |completion| match completion {
                Completion::Normal(value) | Completion::Return(value) => match k(value) {
                    Ok(next) => next.run(&ctx2, callback),
                    Err(error) => callback(Completion::Throw(error)),
                },
                other => callback(other),
            }),
        )
    })
}

/* ===================== Exceptions ===================== */

pub fn try_catch(
    body: BoxStep,
    catch: Option<CatchHandler>,
    finally: Option<BoxStep>,
) -> BoxStep {
    step(move |ctx, callback| {
        let ctx2 = ctx.clone();
        body.run(
            ctx,
            Box::new(move |completion| {
                let ctx3 = ctx2.clone();
                let finish: Callback =
                    Box::new(move |completion| run_finally(completion, finally, &ctx3, callback));
                match (completion, catch) {
                    (Completion::Throw(error), Some(handler)) => match handler(error) {
                        Ok(handler_step) => handler_step.run(&ctx2, finish),
                        Err(error) => finish(Completion::Throw(error)),
                    },
                    (completion, _) => finish(completion),
                }
            }),
        )
    })
}

/// A non-normal completion of `finally` overrides the pending one
fn run_finally(pending: Completion, finally: Option<BoxStep>, ctx: &Value, callback: Callback) {
    match finally {
        None => callback(pending),
        Some(finally) => finally.run(
            ctx,
            Box::new(move |completion| match completion {
                Completion::Normal(_) => callback(pending),
                other => callback(other),
            }),
        ),
    }
}

/* ===================== Loops ===================== */

/// Produces the body step of the next iteration, or `None` when the loop is done.
/// The flag is true on the first call.
type Advance = Box<dyn FnMut(bool) -> Result<Option<BoxStep>, Value>>;

pub fn for_loop(test: Option<Predicate>, update: Option<Action>, body: StepFactory) -> BoxStep {
    LoopDriver::boxed(Box::new(move |first| {
        if !first {
            if let Some(update) = &update {
                update()?;
            }
        }
        if let Some(test) = &test {
            if !test()? {
                return Ok(None);
            }
        }
        body().map(Some)
    }))
}

pub fn while_loop(test: Predicate, body: StepFactory) -> BoxStep {
    LoopDriver::boxed(Box::new(move |_| {
        if !test()? {
            return Ok(None);
        }
        body().map(Some)
    }))
}

pub fn do_loop(body: StepFactory, test: Predicate) -> BoxStep {
    LoopDriver::boxed(Box::new(move |first| {
        if !first && !test()? {
            return Ok(None);
        }
        body().map(Some)
    }))
}

/// Iterate the keys `object` has when the loop starts
pub fn for_in(object: Value, body: KeyedFactory) -> BoxStep {
    let mut keys: Option<std::vec::IntoIter<String>> = None;
    LoopDriver::boxed(Box::new(move |_| {
        let keys = keys.get_or_insert_with(|| object.keys().into_iter());
        match keys.next() {
            Some(key) => body(Value::Str(key)).map(Some),
            None => Ok(None),
        }
    }))
}

struct LoopDriver {
    advance: RefCell<Advance>,
    callback: RefCell<Option<Callback>>,
    ctx: Value,
}

enum Verdict {
    Again,
    Done(Completion),
}

impl LoopDriver {
    fn boxed(advance: Advance) -> BoxStep {
        step(move |ctx, callback| {
            let driver = Rc::new(LoopDriver {
                advance: RefCell::new(advance),
                callback: RefCell::new(Some(callback)),
                ctx: ctx.clone(),
            });
            driver.drive(true);
        })
    }

    fn drive(self: Rc<Self>, mut first: bool) {
        loop {
            let next = {
                let mut advance = self.advance.borrow_mut();
                (&mut *advance)(first)
            };
            first = false;
            let body = match next {
                Ok(Some(body)) => body,
                Ok(None) => return self.finish(Completion::Normal(Value::Undefined)),
                Err(error) => return self.finish(Completion::Throw(error)),
            };

            let running_sync = Rc::new(Cell::new(true));
            let slot: Rc<RefCell<Option<Completion>>> = Rc::new(RefCell::new(None));
            let resume = {
                let driver = self.clone();
                let running_sync = running_sync.clone();
                let slot = slot.clone();
                Box::new(move |completion: Completion| {
                    if running_sync.get() {
                        *slot.borrow_mut() = Some(completion);
                    } else {
                        match Self::judge(completion) {
                            Verdict::Again => driver.drive(false),
                            Verdict::Done(completion) => driver.finish(completion),
                        }
                    }
                })
            };
            body.run(&self.ctx, resume);
            running_sync.set(false);

            let completed = slot.borrow_mut().take();
            match completed {
                // suspended; the callback picks the loop up again
                None => return,
                Some(completion) => match Self::judge(completion) {
                    Verdict::Again => continue,
                    Verdict::Done(completion) => return self.finish(completion),
                },
            }
        }
    }

    fn judge(completion: Completion) -> Verdict {
        match completion {
            Completion::Normal(_) | Completion::Continue => Verdict::Again,
            Completion::Break => Verdict::Done(Completion::Normal(Value::Undefined)),
            other => Verdict::Done(other),
        }
    }

    fn finish(&self, completion: Completion) {
        let callback = self.callback.borrow_mut().take();
        if let Some(callback) = callback {
            callback(completion);
        }
    }
}

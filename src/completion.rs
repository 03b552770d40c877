//! Single-assignment completion primitive used to sequence rendering work.
//!
//! A [`Completion`] is a shared handle to an outcome that is decided exactly
//! once. Callbacks can be registered before or after the outcome is known:
//! callbacks registered early are queued and fire, in registration order, when
//! the completion is settled; callbacks registered late fire immediately. Only
//! the callback matching the outcome runs, and every queued entry is consumed
//! exactly once.
//!
//! Everything here is single threaded. Firing happens synchronously inside
//! the call that settles the completion (or inside the registering call when
//! it is already settled); there are no timers and no threads involved.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::Error;

/// Outcome class of a settled completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
}

type SuccessFn<T> = Box<dyn FnOnce(&T)>;
type FailureFn<E> = Box<dyn FnOnce(&E)>;

struct Pending<T, E> {
    on_success: Option<SuccessFn<T>>,
    on_failure: Option<FailureFn<E>>,
}

struct State<T, E> {
    outcome: Option<Rc<Result<T, E>>>,
    pending: VecDeque<Pending<T, E>>,
    wakers: Vec<Waker>,
}

/// Shared handle to a deferred outcome.
///
/// Cloning the handle does not clone the outcome; all clones observe and may
/// settle the same completion.
pub struct Completion<T, E = Error> {
    state: Rc<RefCell<State<T, E>>>,
}

impl<T, E> Clone for Completion<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: 'static, E: 'static> Default for Completion<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Completion<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        let status = state.outcome.as_ref().map(|o| match **o {
            Ok(_) => Status::Success,
            Err(_) => Status::Failure,
        });
        f.debug_struct("Completion")
            .field("status", &status)
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl<T: 'static, E: 'static> Completion<T, E> {
    /// Create an unsettled completion.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                outcome: None,
                pending: VecDeque::new(),
                wakers: Vec::new(),
            })),
        }
    }

    /// Create a completion that already succeeded with `value`.
    pub fn succeeded(value: T) -> Self {
        let c = Self::new();
        c.succeed(value);
        c
    }

    /// Create a completion that already failed with `error`.
    pub fn failed(error: E) -> Self {
        let c = Self::new();
        c.fail(error);
        c
    }

    /// Create a completion already settled with `outcome`.
    pub fn from_result(outcome: Result<T, E>) -> Self {
        let c = Self::new();
        c.complete(outcome);
        c
    }

    /// Register a success and a failure callback.
    ///
    /// When the completion is already settled the matching callback fires
    /// before this call returns.
    pub fn register<S, F>(&self, on_success: S, on_failure: F) -> &Self
    where
        S: FnOnce(&T) + 'static,
        F: FnOnce(&E) + 'static,
    {
        self.push(Pending {
            on_success: Some(Box::new(on_success)),
            on_failure: Some(Box::new(on_failure)),
        })
    }

    /// Register a callback that only runs on success.
    pub fn on_success<S>(&self, on_success: S) -> &Self
    where
        S: FnOnce(&T) + 'static,
    {
        self.push(Pending {
            on_success: Some(Box::new(on_success)),
            on_failure: None,
        })
    }

    /// Register a callback that only runs on failure.
    pub fn on_failure<F>(&self, on_failure: F) -> &Self
    where
        F: FnOnce(&E) + 'static,
    {
        self.push(Pending {
            on_success: None,
            on_failure: Some(Box::new(on_failure)),
        })
    }

    /// Register callbacks bound to a shared context object.
    pub fn register_in<C, S, F>(&self, ctx: Rc<C>, on_success: S, on_failure: F) -> &Self
    where
        C: ?Sized + 'static,
        S: FnOnce(&C, &T) + 'static,
        F: FnOnce(&C, &E) + 'static,
    {
        let failure_ctx = Rc::clone(&ctx);
        self.register(
            move |value| on_success(&*ctx, value),
            move |error| on_failure(&*failure_ctx, error),
        )
    }

    /// Register one callback that runs whatever the outcome is.
    pub fn register_both<B>(&self, callback: B) -> &Self
    where
        B: FnOnce(Result<&T, &E>) + 'static,
    {
        let slot = Rc::new(RefCell::new(Some(callback)));
        let failure_slot = Rc::clone(&slot);
        self.register(
            move |value| {
                if let Some(cb) = slot.borrow_mut().take() {
                    cb(Ok(value));
                }
            },
            move |error| {
                if let Some(cb) = failure_slot.borrow_mut().take() {
                    cb(Err(error));
                }
            },
        )
    }

    /// Forward this completion's eventual outcome into `target`.
    pub fn pipe(&self, target: &Completion<T, E>) -> &Self
    where
        T: Clone,
        E: Clone,
    {
        let on_ok = target.clone();
        let on_err = target.clone();
        self.register(
            move |value| {
                on_ok.succeed(value.clone());
            },
            move |error| {
                on_err.fail(error.clone());
            },
        )
    }

    /// Chain a follow-up step that starts once this completion succeeds.
    ///
    /// Failures skip `next` and are forwarded unchanged.
    pub fn then<U, N>(&self, next: N) -> Completion<U, E>
    where
        U: Clone + 'static,
        E: Clone,
        N: FnOnce(&T) -> Completion<U, E> + 'static,
    {
        let chained = Completion::new();
        let on_ok = chained.clone();
        let on_err = chained.clone();
        self.register(
            move |value| {
                next(value).pipe(&on_ok);
            },
            move |error| {
                on_err.fail(error.clone());
            },
        );
        chained
    }

    /// Settle the completion and fire every queued callback that matches.
    ///
    /// Returns `false` (and leaves the first outcome in place) when the
    /// completion was already settled.
    pub fn complete(&self, outcome: Result<T, E>) -> bool {
        let wakers = {
            let mut state = self.state.borrow_mut();
            if state.outcome.is_some() {
                log::warn!("ignoring a second completion of an already settled completion");
                return false;
            }
            state.outcome = Some(Rc::new(outcome));
            std::mem::take(&mut state.wakers)
        };
        for waker in wakers {
            waker.wake();
        }
        self.drain();
        true
    }

    pub fn succeed(&self, value: T) -> bool {
        self.complete(Ok(value))
    }

    pub fn fail(&self, error: E) -> bool {
        self.complete(Err(error))
    }

    pub fn is_completed(&self) -> bool {
        self.state.borrow().outcome.is_some()
    }

    pub fn status(&self) -> Option<Status> {
        self.state.borrow().outcome.as_ref().map(|o| match **o {
            Ok(_) => Status::Success,
            Err(_) => Status::Failure,
        })
    }

    /// A copy of the outcome, if settled.
    pub fn outcome(&self) -> Option<Result<T, E>>
    where
        T: Clone,
        E: Clone,
    {
        self.state.borrow().outcome.as_ref().map(|o| (**o).clone())
    }

    fn push(&self, pending: Pending<T, E>) -> &Self {
        self.state.borrow_mut().pending.push_back(pending);
        self.drain();
        self
    }

    fn drain(&self) {
        loop {
            // The borrow must end before a callback runs: callbacks may
            // register on this same completion.
            let (step, outcome) = {
                let mut state = self.state.borrow_mut();
                let Some(outcome) = state.outcome.clone() else {
                    return;
                };
                match state.pending.pop_front() {
                    Some(step) => (step, outcome),
                    None => return,
                }
            };
            match &*outcome {
                Ok(value) => {
                    if let Some(cb) = step.on_success {
                        cb(value);
                    }
                }
                Err(error) => {
                    if let Some(cb) = step.on_failure {
                        cb(error);
                    }
                }
            }
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Future for Completion<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.state.borrow_mut();
        if let Some(outcome) = &state.outcome {
            return Poll::Ready((**outcome).clone());
        }
        state.wakers.push(cx.waker().clone());
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<String>>>;

    fn log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn queued_callbacks_fire_in_registration_order() {
        let seen = log();
        let c: Completion<u32, String> = Completion::new();
        for name in ["a", "b", "c"] {
            let s = Rc::clone(&seen);
            c.on_success(move |v| s.borrow_mut().push(format!("{name}{v}")));
        }
        assert!(seen.borrow().is_empty());
        c.succeed(1);
        assert_eq!(*seen.borrow(), vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn late_registration_fires_immediately() {
        let c: Completion<u32, String> = Completion::succeeded(7);
        let seen = log();
        let s = Rc::clone(&seen);
        c.on_success(move |v| s.borrow_mut().push(v.to_string()));
        assert_eq!(*seen.borrow(), vec!["7"]);
    }

    #[test]
    fn only_matching_callbacks_fire() {
        let seen = log();
        let c: Completion<u32, String> = Completion::new();
        let (a, b) = (Rc::clone(&seen), Rc::clone(&seen));
        c.register(
            move |_| a.borrow_mut().push("ok".into()),
            move |e| b.borrow_mut().push(format!("err:{e}")),
        );
        let s = Rc::clone(&seen);
        c.on_success(move |_| s.borrow_mut().push("never".into()));
        c.fail("boom".to_string());
        assert_eq!(*seen.borrow(), vec!["err:boom"]);
    }

    #[test]
    fn second_completion_is_ignored() {
        let c: Completion<u32, String> = Completion::new();
        assert!(c.succeed(1));
        assert!(!c.fail("late".into()));
        assert_eq!(c.outcome(), Some(Ok(1)));
        assert_eq!(c.status(), Some(Status::Success));
    }

    #[test]
    fn pipe_forwards_failure_once() {
        let source: Completion<u32, String> = Completion::new();
        let target: Completion<u32, String> = Completion::new();
        let hits = Rc::new(RefCell::new(0));
        let h = Rc::clone(&hits);
        target.on_failure(move |_| *h.borrow_mut() += 1);
        source.pipe(&target);
        source.fail("nope".into());
        assert_eq!(target.outcome(), Some(Err("nope".to_string())));
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn register_in_passes_the_context() {
        struct Ctx {
            prefix: &'static str,
            out: RefCell<Vec<String>>,
        }
        let ctx = Rc::new(Ctx {
            prefix: "px",
            out: RefCell::new(Vec::new()),
        });
        let c: Completion<u32, String> = Completion::new();
        c.register_in(
            Rc::clone(&ctx),
            |ctx, v| ctx.out.borrow_mut().push(format!("{}{v}", ctx.prefix)),
            |ctx, _| ctx.out.borrow_mut().push("failed".into()),
        );
        c.succeed(3);
        assert_eq!(*ctx.out.borrow(), vec!["px3"]);
    }

    #[test]
    fn register_both_sees_either_outcome() {
        let seen = log();
        let ok: Completion<u32, String> = Completion::new();
        let err: Completion<u32, String> = Completion::new();
        for c in [&ok, &err] {
            let s = Rc::clone(&seen);
            c.register_both(move |r| {
                s.borrow_mut().push(match r {
                    Ok(v) => format!("ok{v}"),
                    Err(e) => format!("err{e}"),
                })
            });
        }
        err.fail("x".into());
        ok.succeed(2);
        assert_eq!(*seen.borrow(), vec!["errx", "ok2"]);
    }

    #[test]
    fn then_chains_and_skips_on_failure() {
        let first: Completion<u32, String> = Completion::new();
        let second = first.then(|v| Completion::succeeded(v * 10));
        first.succeed(4);
        assert_eq!(second.outcome(), Some(Ok(40)));

        let failing: Completion<u32, String> = Completion::new();
        let ran = Rc::new(RefCell::new(false));
        let r = Rc::clone(&ran);
        let next = failing.then(move |v| {
            *r.borrow_mut() = true;
            Completion::succeeded(*v)
        });
        failing.fail("stop".into());
        assert!(!*ran.borrow());
        assert_eq!(next.outcome(), Some(Err("stop".to_string())));
    }

    #[test]
    fn callbacks_may_register_on_the_same_completion() {
        let seen = log();
        let c: Completion<u32, String> = Completion::new();
        let inner = c.clone();
        let s = Rc::clone(&seen);
        c.on_success(move |_| {
            let s2 = Rc::clone(&s);
            inner.on_success(move |v| s2.borrow_mut().push(format!("nested{v}")));
        });
        c.succeed(5);
        assert_eq!(*seen.borrow(), vec!["nested5"]);
    }

    #[test]
    fn completion_can_be_awaited() {
        let c: Completion<u32, String> = Completion::new();
        let settle = c.clone();
        let fut = async move { c.await };
        settle.succeed(9);
        assert_eq!(futures::executor::block_on(fut), Ok(9));
    }
}

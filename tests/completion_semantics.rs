use std::cell::RefCell;
use std::rc::Rc;

use domsnap::{Completion, Error, Status, TaskQueue};

#[test]
fn callbacks_fire_once_in_registration_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let c: Completion<u32> = Completion::new();
    for i in 0..3 {
        let ok = Rc::clone(&log);
        c.register(move |v| ok.borrow_mut().push(format!("ok{}:{}", i, v)), |_| panic!("failure fired"));
    }
    assert!(log.borrow().is_empty());
    assert!(c.succeed(7));
    assert!(!c.succeed(8));
    assert!(!c.fail(Error::Other("late".into())));
    assert_eq!(*log.borrow(), vec!["ok0:7", "ok1:7", "ok2:7"]);
    assert_eq!(c.status(), Some(Status::Success));
    assert_eq!(c.outcome(), Some(Ok(7)));
}

#[test]
fn late_registration_fires_immediately_with_matching_status() {
    let c: Completion<()> = Completion::failed(Error::image_load("u", "gone"));
    let seen = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&seen);
    c.register(|_| panic!("success fired"), move |e| *slot.borrow_mut() = Some(e.clone()));
    assert_eq!(*seen.borrow(), Some(Error::image_load("u", "gone")));
}

#[test]
fn pipe_forwards_across_queued_work() {
    let queue = TaskQueue::new();
    let source: Completion<&'static str> = Completion::new();
    let target = Completion::new();
    source.pipe(&target);

    let settle = source.clone();
    queue.spawn(move || {
        settle.succeed("done");
    });
    assert!(!target.is_completed());
    queue.run_until(|| target.is_completed()).unwrap();
    assert_eq!(target.outcome(), Some(Ok("done")));
}

#[test]
fn context_callbacks_share_state() {
    struct Counter {
        hits: RefCell<u32>,
    }
    let ctx = Rc::new(Counter { hits: RefCell::new(0) });
    let a: Completion<u32> = Completion::new();
    let b: Completion<u32> = Completion::new();
    a.register_in(Rc::clone(&ctx), |c, v| *c.hits.borrow_mut() += v, |_, _| {});
    b.register_in(Rc::clone(&ctx), |_, _| {}, |c, _| *c.hits.borrow_mut() += 100);
    a.succeed(2);
    b.fail(Error::Other("x".into()));
    assert_eq!(*ctx.hits.borrow(), 102);
}

#[test]
fn waiting_on_a_completion_nothing_settles_stalls() {
    let queue = TaskQueue::new();
    let never: Completion<()> = Completion::new();
    let err = queue.run_until(|| never.is_completed()).unwrap_err();
    assert!(matches!(err, Error::Stalled(_)));
}

#[test]
fn completions_can_be_awaited() {
    let c: Completion<u8> = Completion::new();
    let settle = c.clone();
    let value = futures::executor::block_on(async move {
        settle.succeed(5);
        c.await
    });
    assert_eq!(value, Ok(5));
}

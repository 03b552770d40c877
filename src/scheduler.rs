//! Cooperative single-threaded task queue.
//!
//! Image loads are queued here instead of running inside the call that
//! requested them, so every consumer observes them as asynchronous. The host
//! pumps the queue until the completion it is waiting on settles.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::{Error, Result};

type Task = Box<dyn FnOnce()>;

/// FIFO queue of deferred tasks shared by the components of one render.
#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run on a later pump.
    pub fn spawn<F>(&self, task: F)
    where
        F: FnOnce() + 'static,
    {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Run the oldest queued task. Returns `false` when the queue was empty.
    pub fn run_next(&self) -> bool {
        let task = self.tasks.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until `done` reports true.
    ///
    /// Fails with [`Error::Stalled`] when the queue drains first, which means
    /// nothing left can ever settle what the caller is waiting for.
    pub fn run_until<F>(&self, mut done: F) -> Result<()>
    where
        F: FnMut() -> bool,
    {
        while !done() {
            if !self.run_next() {
                return Err(Error::Stalled(
                    "task queue drained before the awaited work completed".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Run every queued task, including tasks queued while draining.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue").field("queued", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn runs_tasks_in_fifo_order() {
        let q = TaskQueue::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let o = Rc::clone(&order);
            q.spawn(move || o.borrow_mut().push(i));
        }
        assert_eq!(q.run_all(), 3);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn run_until_stops_as_soon_as_done() {
        let q = TaskQueue::new();
        let flag = Rc::new(Cell::new(false));
        let f = Rc::clone(&flag);
        q.spawn(move || f.set(true));
        q.spawn(|| {});
        q.run_until(|| flag.get()).unwrap();
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn run_until_reports_a_stall() {
        let q = TaskQueue::new();
        let err = q.run_until(|| false).unwrap_err();
        assert!(matches!(err, Error::Stalled(_)));
    }

    #[test]
    fn tasks_may_queue_more_tasks() {
        let q = TaskQueue::new();
        let hits = Rc::new(Cell::new(0));
        let (q2, h) = (q.clone(), Rc::clone(&hits));
        q.spawn(move || {
            let h2 = Rc::clone(&h);
            q2.spawn(move || h2.set(h2.get() + 1));
            h.set(h.get() + 1);
        });
        assert_eq!(q.run_all(), 2);
        assert_eq!(hits.get(), 2);
    }
}

// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Worker-to-main-thread handoff.
//!
//! All tree mutation happens on the thread that owns the [`SceneTree`].
//! Background work (asset decoding, long computations) runs on worker
//! threads and must hand its results back through this queue instead of
//! touching the tree directly.
//!
//! [`MainLoopQueue`] owns the receiving end and is drained by the run loop
//! between passes; [`MainLoopSender`] is a cheap `Send + Clone` handle that
//! enqueues boxed closures. The channel is bounded, so a runaway producer
//! blocks instead of growing the queue without limit.
//!
//! Delivery to a destroyed actor is a detected no-op, not a dangling write:
//! closures capture [`ActorId`](crate::actor::ActorId) handles and must
//! check [`SceneTree::is_alive`] before mutating, since the store panics on
//! stale handles by contract.

use std::boxed::Box;
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};

use crate::actor::SceneTree;

/// A deferred mutation applied to the tree on the main thread.
pub type MainLoopTask = Box<dyn FnOnce(&mut SceneTree) + Send>;

/// The main-thread end of the handoff queue.
#[derive(Debug)]
pub struct MainLoopQueue {
    receiver: Receiver<MainLoopTask>,
    sender: SyncSender<MainLoopTask>,
}

impl MainLoopQueue {
    /// Creates a queue bounded to `capacity` pending tasks.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = sync_channel(capacity);
        Self { receiver, sender }
    }

    /// Returns a sender handle for worker threads.
    #[must_use]
    pub fn sender(&self) -> MainLoopSender {
        MainLoopSender {
            sender: self.sender.clone(),
        }
    }

    /// Applies every pending task against the tree, in arrival order, and
    /// returns how many ran.
    ///
    /// Call this from the run loop before the layout/paint passes so that
    /// delivered results are visible in the same frame.
    pub fn drain(&self, tree: &mut SceneTree) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task(tree);
            ran += 1;
        }
        ran
    }
}

/// A `Send + Clone` handle that enqueues tasks for the main thread.
#[derive(Clone, Debug)]
pub struct MainLoopSender {
    sender: SyncSender<MainLoopTask>,
}

impl MainLoopSender {
    /// Enqueues a task, blocking while the queue is full.
    ///
    /// Returns `false` if the main loop has shut down (queue dropped).
    pub fn post(&self, task: MainLoopTask) -> bool {
        self.sender.send(task).is_ok()
    }

    /// Enqueues a task without blocking.
    ///
    /// Returns the task back if the queue is full or disconnected.
    pub fn try_post(&self, task: MainLoopTask) -> Result<(), MainLoopTask> {
        self.sender.try_send(task).map_err(|e| match e {
            TrySendError::Full(task) | TrySendError::Disconnected(task) => task,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_run_in_arrival_order() {
        let queue = MainLoopQueue::new(8);
        let sender = queue.sender();
        let mut tree = SceneTree::new();
        let actor = tree.create_actor();

        sender.post(Box::new(move |tree: &mut SceneTree| {
            tree.set_opacity(actor, 10);
        }));
        sender.post(Box::new(move |tree: &mut SceneTree| {
            tree.set_opacity(actor, 20);
        }));

        assert_eq!(queue.drain(&mut tree), 2);
        assert_eq!(tree.opacity(actor), 20);
    }

    #[test]
    fn delivery_to_destroyed_actor_is_a_detected_no_op() {
        let queue = MainLoopQueue::new(4);
        let sender = queue.sender();
        let mut tree = SceneTree::new();
        let actor = tree.create_actor();

        // A well-behaved result delivery checks liveness first.
        sender.post(Box::new(move |tree: &mut SceneTree| {
            if tree.is_alive(actor) {
                tree.set_opacity(actor, 0);
            }
        }));

        tree.destroy_actor(actor);
        assert_eq!(queue.drain(&mut tree), 1);
        assert!(!tree.is_alive(actor));
    }

    #[test]
    fn posts_from_a_worker_thread_arrive() {
        let queue = MainLoopQueue::new(4);
        let sender = queue.sender();
        let mut tree = SceneTree::new();
        let actor = tree.create_actor();

        let handle = std::thread::spawn(move || {
            sender.post(Box::new(move |tree: &mut SceneTree| {
                tree.set_opacity(actor, 128);
            }))
        });
        assert!(handle.join().expect("worker thread must not panic"));

        queue.drain(&mut tree);
        assert_eq!(tree.opacity(actor), 128);
    }

    #[test]
    fn try_post_reports_a_full_queue() {
        let queue = MainLoopQueue::new(1);
        let sender = queue.sender();
        assert!(sender.try_post(Box::new(|_| {})).is_ok());
        assert!(sender.try_post(Box::new(|_| {})).is_err());
    }
}

//! Serial execution queues.
//!
//! The capture pipeline runs on three logical contexts: the host's
//! presentation context (owned by the [`Presenter`](crate::overlay::Presenter)
//! implementation), a metadata/session queue, and a video-data queue. The
//! latter two are [`SerialQueue`]s: a dedicated worker thread draining jobs
//! in FIFO order. Dropping a queue drains everything already submitted and
//! joins the worker, so a stop scheduled during teardown always executes.

use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Job),
    Shutdown,
}

/// A named worker thread executing submitted jobs one at a time, in order.
pub struct SerialQueue {
    label: String,
    tx: Sender<Message>,
    worker: Option<JoinHandle<()>>,
}

/// A cloneable submission handle for a [`SerialQueue`].
///
/// Jobs submitted after the owning queue has shut down are dropped, the way
/// work dispatched to a released platform queue never runs.
#[derive(Clone)]
pub struct QueueHandle {
    tx: Sender<Message>,
}

impl QueueHandle {
    /// Submits a job for execution. Never blocks.
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) {
        let _ = self.tx.send(Message::Run(Box::new(job)));
    }
}

impl SerialQueue {
    /// Spawns the worker thread for a new queue with the given label.
    pub fn spawn(label: &str) -> Self {
        let (tx, rx) = mpsc::channel::<Message>();
        let thread_label = label.to_owned();
        let worker = thread::Builder::new()
            .name(label.to_owned())
            .spawn(move || {
                while let Ok(message) = rx.recv() {
                    match message {
                        Message::Run(job) => job(),
                        Message::Shutdown => break,
                    }
                }
                tracing::trace!(queue = %thread_label, "serial queue drained");
            })
            .expect("failed to spawn serial queue worker");
        Self {
            label: label.to_owned(),
            tx,
            worker: Some(worker),
        }
    }

    /// Submits a job for execution on this queue. Never blocks.
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) {
        let _ = self.tx.send(Message::Run(Box::new(job)));
    }

    /// Returns a cloneable submission handle.
    pub fn handle(&self) -> QueueHandle {
        QueueHandle {
            tx: self.tx.clone(),
        }
    }

    /// Blocks until every job submitted before this call has finished.
    pub fn sync(&self) {
        let (done_tx, done_rx) = mpsc::channel();
        self.dispatch(move || {
            let _ = done_tx.send(());
        });
        let _ = done_rx.recv();
    }

    /// Returns the queue label.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        let _ = self.tx.send(Message::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl std::fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialQueue")
            .field("label", &self.label)
            .finish()
    }
}

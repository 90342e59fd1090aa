use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

/// Session generation; bumped whenever a new session starts
pub type Generation = u64;

#[derive(Debug)]
struct Tagged<R> {
    generation: Generation,
    reply: R,
}

/// Runs backend calls as tokio tasks and hands their replies back to the
/// single-threaded event loop. Replies spawned under an older generation are
/// dropped, and their tasks are aborted when the generation moves on.
pub struct Dispatcher<R> {
    handle: Handle,
    generation: Generation,
    tx: UnboundedSender<Tagged<R>>,
    rx: UnboundedReceiver<Tagged<R>>,
    tasks: Vec<JoinHandle<()>>,
    exclusive_busy: Arc<AtomicBool>,
}

impl<R: Send + 'static> Dispatcher<R> {
    pub fn new(handle: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            handle,
            generation: 0,
            tx,
            rx,
            tasks: Vec::new(),
            exclusive_busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a new generation, cancelling everything still running
    pub fn begin_generation(&mut self) -> Generation {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.generation += 1;
        self.exclusive_busy = Arc::new(AtomicBool::new(false));
        debug!(generation = self.generation, "new generation");
        self.generation
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Run `fut` and deliver its output tagged with the current generation
    pub fn spawn<F>(&mut self, fut: F)
    where
        F: Future<Output = R> + Send + 'static,
    {
        let tx = self.tx.clone();
        let generation = self.generation;
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(self.handle.spawn(async move {
            let reply = fut.await;
            let _ = tx.send(Tagged { generation, reply });
        }));
    }

    /// Like `spawn`, but the task is never aborted: the request reaches the
    /// backend even if a new session starts. A stale reply is still dropped.
    pub fn spawn_to_completion<F>(&mut self, fut: F)
    where
        F: Future<Output = R> + Send + 'static,
    {
        let tx = self.tx.clone();
        let generation = self.generation;
        self.handle.spawn(async move {
            let reply = fut.await;
            let _ = tx.send(Tagged { generation, reply });
        });
    }

    /// Like `spawn`, but at most one exclusive request runs per generation.
    /// Returns false (and drops `fut`) when one is already in flight.
    pub fn spawn_exclusive<F>(&mut self, fut: F) -> bool
    where
        F: Future<Output = R> + Send + 'static,
    {
        if self.exclusive_busy.swap(true, Ordering::SeqCst) {
            return false;
        }
        let busy = Arc::clone(&self.exclusive_busy);
        self.spawn(async move {
            let reply = fut.await;
            busy.store(false, Ordering::SeqCst);
            reply
        });
        true
    }

    pub fn exclusive_in_flight(&self) -> bool {
        self.exclusive_busy.load(Ordering::SeqCst)
    }

    /// Fire-and-forget work that must outlive generation changes
    pub fn spawn_detached<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }

    /// Replies that have arrived for the current generation, without blocking
    pub fn drain(&mut self) -> Vec<R> {
        let mut replies = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(tagged) => {
                    if let Some(reply) = self.accept(tagged) {
                        replies.push(reply);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        replies
    }

    /// Wait for the next current-generation reply
    pub async fn next_reply(&mut self) -> Option<R> {
        while let Some(tagged) = self.rx.recv().await {
            if let Some(reply) = self.accept(tagged) {
                return Some(reply);
            }
        }
        None
    }

    fn accept(&self, tagged: Tagged<R>) -> Option<R> {
        if tagged.generation == self.generation {
            Some(tagged.reply)
        } else {
            debug!(
                stale = tagged.generation,
                current = self.generation,
                "dropping stale reply"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn replies_carry_through() {
        let mut d: Dispatcher<u32> = Dispatcher::new(Handle::current());
        d.begin_generation();
        d.spawn(async { 7 });

        assert_eq!(d.next_reply().await, Some(7));
    }

    #[tokio::test]
    async fn stale_generation_is_dropped() {
        let mut d: Dispatcher<u32> = Dispatcher::new(Handle::current());
        d.begin_generation();

        let (release, wait) = oneshot::channel::<()>();
        d.spawn(async move {
            let _ = wait.await;
            1
        });
        // the ready task queues its reply before the generation moves on
        d.spawn(async { 2 });
        tokio::time::sleep(Duration::from_millis(20)).await;

        d.begin_generation();
        let _ = release.send(());
        d.spawn(async { 3 });

        assert_eq!(d.next_reply().await, Some(3));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(d.drain().is_empty());
    }

    #[tokio::test]
    async fn exclusive_slot_skips_second_request() {
        let mut d: Dispatcher<&'static str> = Dispatcher::new(Handle::current());
        d.begin_generation();

        let (release, wait) = oneshot::channel::<()>();
        assert!(d.spawn_exclusive(async move {
            let _ = wait.await;
            "first"
        }));
        assert!(d.exclusive_in_flight());
        assert!(!d.spawn_exclusive(async { "second" }));

        let _ = release.send(());
        assert_eq!(d.next_reply().await, Some("first"));
        assert!(!d.exclusive_in_flight());
        assert!(d.spawn_exclusive(async { "third" }));
        assert_eq!(d.next_reply().await, Some("third"));
    }

    #[tokio::test]
    async fn new_generation_frees_exclusive_slot() {
        let mut d: Dispatcher<u8> = Dispatcher::new(Handle::current());
        d.begin_generation();
        assert!(d.spawn_exclusive(std::future::pending()));

        d.begin_generation();
        assert!(!d.exclusive_in_flight());
        assert!(d.spawn_exclusive(async { 1 }));
        assert_eq!(d.next_reply().await, Some(1));
    }

    #[tokio::test]
    async fn completed_request_from_old_generation_is_not_delivered() {
        let mut d: Dispatcher<u8> = Dispatcher::new(Handle::current());
        d.begin_generation();

        let (release, wait) = oneshot::channel::<()>();
        let (done_tx, done_rx) = oneshot::channel::<()>();
        d.spawn_to_completion(async move {
            let _ = wait.await;
            let _ = done_tx.send(());
            9
        });
        d.begin_generation();
        let _ = release.send(());

        // the request still ran to the end
        done_rx.await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(d.drain().is_empty());
    }

    #[tokio::test]
    async fn detached_work_survives_generation_change() {
        let mut d: Dispatcher<()> = Dispatcher::new(Handle::current());
        let (tx, rx) = oneshot::channel();
        d.spawn_detached(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = tx.send(42);
        });
        d.begin_generation();

        assert_eq!(rx.await.unwrap(), 42);
    }
}

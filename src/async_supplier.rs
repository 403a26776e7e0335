//! Producer-thread wrapper that decouples reading bytes from parsing them.
//!
//! [`AsyncQueueSupplier`] spawns exactly one producer thread that repeatedly calls
//! [`BufferSupplier::next_chunk`] on the wrapped supplier and offers the result to a bounded
//! queue. The calling thread (the parser) only ever talks to the queue, never to the
//! underlying source directly, so I/O latency on the producer side overlaps with parsing on
//! the consumer side.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::supplier::BufferSupplier;

/// Default bound on how long the producer will retry offering a chunk before giving up and
/// exiting, when the consumer has stopped reading without calling `close`.
pub const DEFAULT_PRODUCER_TIMEOUT: Duration = Duration::from_secs(5);

enum Message {
    Chunk(Box<[char]>),
    End,
}

/// Wraps a [`BufferSupplier`] with one producer thread and a bounded queue of depth `Q`.
///
/// `S` must be `Send + 'static` since it is moved onto the producer thread.
pub struct AsyncQueueSupplier {
    rx: Receiver<Message>,
    recycle_tx: Sender<Box<[char]>>,
    stop: Arc<AtomicBool>,
    envelope: Arc<Mutex<Option<Error>>>,
    handle: Option<JoinHandle<()>>,
    closed: bool,
}

impl AsyncQueueSupplier {
    /// Spawns a producer thread wrapping `supplier`, feeding a queue of depth `queue_depth`.
    pub fn spawn<S>(mut supplier: S, queue_depth: usize) -> Result<Self>
    where
        S: BufferSupplier + Send + 'static,
    {
        if queue_depth == 0 {
            return Err(Error::usage("async queue depth must be at least 1"));
        }

        let (tx, rx) = mpsc::sync_channel::<Message>(queue_depth);
        let (recycle_tx, recycle_rx) = mpsc::channel::<Box<[char]>>();
        let stop = Arc::new(AtomicBool::new(false));
        let envelope: Arc<Mutex<Option<Error>>> = Arc::new(Mutex::new(None));

        let thread_stop = Arc::clone(&stop);
        let thread_envelope = Arc::clone(&envelope);

        let handle = std::thread::Builder::new()
            .name("chario-producer".into())
            .spawn(move || {
                log::debug!("chario producer thread started");
                producer_loop(&mut supplier, &tx, &recycle_rx, &thread_stop, &thread_envelope);
                let _ = supplier.close();
                log::debug!("chario producer thread exiting");
            })
            .map_err(Error::from)?;

        Ok(AsyncQueueSupplier { rx, recycle_tx, stop, envelope, handle: Some(handle), closed: false })
    }

    fn take_envelope_error(&self) -> Option<Error> {
        self.envelope.lock().expect("envelope mutex poisoned").take()
    }
}

fn producer_loop<S: BufferSupplier>(
    supplier: &mut S,
    tx: &mpsc::SyncSender<Message>,
    recycle_rx: &Receiver<Box<[char]>>,
    stop: &AtomicBool,
    envelope: &Mutex<Option<Error>>,
) {
    loop {
        if stop.load(Ordering::Acquire) {
            return;
        }

        while let Ok(recycled) = recycle_rx.try_recv() {
            supplier.recycle(recycled);
        }

        let chunk = match supplier.next_chunk() {
            Ok(Some(chunk)) => chunk,
            Ok(None) => {
                let _ = tx.send(Message::End);
                return;
            }
            Err(err) => {
                *envelope.lock().expect("envelope mutex poisoned") = Some(err);
                let _ = tx.send(Message::End);
                return;
            }
        };

        if !offer_with_timeout(tx, Message::Chunk(chunk), stop, DEFAULT_PRODUCER_TIMEOUT) {
            log::warn!("chario producer gave up offering a chunk after {:?}; consumer appears stuck", DEFAULT_PRODUCER_TIMEOUT);
            return;
        }
    }
}

/// Repeatedly attempts a non-blocking send until it succeeds, the stop flag is observed, or
/// `timeout` elapses. `std::sync::mpsc` has no native timed send, so this polls with a short
/// sleep; see DESIGN.md for the trade-off.
fn offer_with_timeout(tx: &mpsc::SyncSender<Message>, mut msg: Message, stop: &AtomicBool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        match tx.try_send(msg) {
            Ok(()) => return true,
            Err(TrySendError::Disconnected(_)) => return false,
            Err(TrySendError::Full(returned)) => {
                msg = returned;
            }
        }
        if stop.load(Ordering::Acquire) || Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

impl BufferSupplier for AsyncQueueSupplier {
    fn next_chunk(&mut self) -> Result<Option<Box<[char]>>> {
        if self.closed {
            return Ok(None);
        }
        if let Some(err) = self.take_envelope_error() {
            return Err(err);
        }
        match self.rx.recv() {
            Ok(Message::Chunk(chunk)) => Ok(Some(chunk)),
            Ok(Message::End) | Err(_) => {
                if let Some(err) = self.take_envelope_error() {
                    return Err(err);
                }
                Ok(None)
            }
        }
    }

    fn recycle(&mut self, chunk: Box<[char]>) {
        let _ = self.recycle_tx.send(chunk);
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stop.store(true, Ordering::Release);
        while self.rx.try_recv().is_ok() {}
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("chario producer thread panicked during shutdown");
            }
        }
        if let Some(err) = self.take_envelope_error() {
            return Err(err);
        }
        Ok(())
    }
}

impl Drop for AsyncQueueSupplier {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supplier::{AllocatingSupplier, StrSource};

    #[test]
    fn async_supplier_preserves_order() {
        let inner = AllocatingSupplier::new(StrSource::new("the quick brown fox"), 4).unwrap();
        let mut async_sup = AsyncQueueSupplier::spawn(inner, 2).unwrap();
        let mut out = String::new();
        while let Some(chunk) = async_sup.next_chunk().unwrap() {
            out.extend(chunk.iter());
        }
        assert_eq!(out, "the quick brown fox");
        async_sup.close().unwrap();
    }

    #[test]
    fn async_supplier_close_is_idempotent() {
        let inner = AllocatingSupplier::new(StrSource::new("abc"), 4).unwrap();
        let mut async_sup = AsyncQueueSupplier::spawn(inner, 1).unwrap();
        async_sup.close().unwrap();
        async_sup.close().unwrap();
    }

    struct FailingSupplier;
    impl BufferSupplier for FailingSupplier {
        fn next_chunk(&mut self) -> Result<Option<Box<[char]>>> {
            Err(Error::usage("boom"))
        }
    }

    #[test]
    fn producer_error_is_propagated_once() {
        let mut async_sup = AsyncQueueSupplier::spawn(FailingSupplier, 1).unwrap();
        let first = async_sup.next_chunk();
        assert!(first.is_err());
    }

    #[test]
    fn zero_queue_depth_is_usage_error() {
        let inner = AllocatingSupplier::new(StrSource::new("x"), 4).unwrap();
        assert!(AsyncQueueSupplier::spawn(inner, 0).is_err());
    }
}

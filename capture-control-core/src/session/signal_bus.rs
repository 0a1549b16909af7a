use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::signal::Signal;
use crate::traits::signal_handler::SignalHandler;

/// Pending-signal count above which volmeter samples are dropped.
pub const VOLMETER_HIGH_WATER: usize = 256;

enum Message {
    Signal(Signal),
    Close,
}

struct BusShared {
    pending: AtomicUsize,
    dropped: AtomicU64,
    closed: AtomicBool,
    dispatcher_thread: Mutex<Option<ThreadId>>,
}

/// Ordered, single-consumer delivery of engine signals to one handler.
///
/// Emitters (engine threads, control calls) push into a queue through an
/// [`EventSink`]; one dispatch thread drains it and invokes the handler, so
/// the handler never runs concurrently with itself and sees signals in the
/// order they were emitted.
///
/// ```text
/// [engine tick thread] ─┐
/// [control calls]      ─┼→ [queue] → [signal-dispatch thread] → handler
/// [volmeter feed]      ─┘
/// ```
pub struct SignalBus {
    sender: Sender<Message>,
    shared: Arc<BusShared>,
    dispatcher: Option<thread::JoinHandle<()>>,
}

impl SignalBus {
    /// Spawn the dispatch thread for `handler`.
    pub fn start(handler: Arc<dyn SignalHandler>) -> Result<Self, CaptureError> {
        let (sender, receiver) = mpsc::channel();
        let shared = Arc::new(BusShared {
            pending: AtomicUsize::new(0),
            dropped: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            dispatcher_thread: Mutex::new(None),
        });

        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("signal-dispatch".into())
            .spawn(move || dispatch_loop(receiver, handler, thread_shared))
            .map_err(|e| CaptureError::Engine(format!("failed to spawn signal dispatcher: {}", e)))?;

        *shared.dispatcher_thread.lock() = Some(handle.thread().id());

        Ok(Self {
            sender,
            shared,
            dispatcher: Some(handle),
        })
    }

    /// A cloneable emitter feeding this bus.
    pub fn sink(&self) -> EventSink {
        EventSink {
            sender: Some(self.sender.clone()),
            shared: Some(Arc::clone(&self.shared)),
        }
    }

    /// Volmeter samples discarded under backpressure so far.
    pub fn dropped_count(&self) -> u64 {
        self.shared.dropped.load(Ordering::SeqCst)
    }

    /// Deliver everything already queued, then stop the dispatch thread.
    ///
    /// Signals emitted after this call are discarded. Safe to call from the
    /// handler itself; the dispatch thread is then left to exit on its own.
    pub fn close(&mut self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.sender.send(Message::Close);

        let on_dispatcher = *self.shared.dispatcher_thread.lock() == Some(thread::current().id());
        if let Some(handle) = self.dispatcher.take() {
            if on_dispatcher {
                log::debug!("Signal bus closed from its own handler; not joining dispatcher");
            } else if handle.join().is_err() {
                log::error!("Signal dispatcher panicked");
            }
        }
    }
}

impl Drop for SignalBus {
    fn drop(&mut self) {
        self.close();
    }
}

fn dispatch_loop(receiver: Receiver<Message>, handler: Arc<dyn SignalHandler>, shared: Arc<BusShared>) {
    while let Ok(message) = receiver.recv() {
        let signal = match message {
            Message::Signal(signal) => signal,
            Message::Close => break,
        };
        shared.pending.fetch_sub(1, Ordering::SeqCst);

        let delivered = panic::catch_unwind(AssertUnwindSafe(|| handler.on_signal(&signal)));
        if delivered.is_err() {
            log::error!("Signal handler panicked on {:?} signal '{}'", signal.category, signal.id);
        }
    }
    log::debug!("Signal dispatcher exiting");
}

/// Non-blocking emitter handed to the engine.
#[derive(Clone)]
pub struct EventSink {
    sender: Option<Sender<Message>>,
    shared: Option<Arc<BusShared>>,
}

impl EventSink {
    /// A sink that discards everything. Useful before a bus exists.
    pub fn disconnected() -> Self {
        Self {
            sender: None,
            shared: None,
        }
    }

    /// Queue a signal for delivery. Never blocks.
    ///
    /// Returns false if the signal was discarded: the bus is closed, or the
    /// signal is a volmeter sample and the queue is above its high-water mark.
    pub fn emit(&self, signal: Signal) -> bool {
        let (Some(sender), Some(shared)) = (&self.sender, &self.shared) else {
            return false;
        };
        if shared.closed.load(Ordering::SeqCst) {
            return false;
        }
        if signal.is_lossy() && shared.pending.load(Ordering::SeqCst) >= VOLMETER_HIGH_WATER {
            shared.dropped.fetch_add(1, Ordering::SeqCst);
            return false;
        }

        shared.pending.fetch_add(1, Ordering::SeqCst);
        if sender.send(Message::Signal(signal)).is_err() {
            shared.pending.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }
}

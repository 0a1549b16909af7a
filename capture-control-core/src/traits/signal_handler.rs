use crate::models::signal::Signal;

/// Receiver of engine signals.
///
/// Called from the single signal dispatch thread, never concurrently with
/// itself. Long-running work should be handed off elsewhere; a slow handler
/// only delays later signals, it never blocks the engine.
pub trait SignalHandler: Send + Sync {
    fn on_signal(&self, signal: &Signal);
}

impl<F> SignalHandler for F
where
    F: Fn(&Signal) + Send + Sync,
{
    fn on_signal(&self, signal: &Signal) {
        self(signal)
    }
}

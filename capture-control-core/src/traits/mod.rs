pub mod engine;
pub mod signal_handler;

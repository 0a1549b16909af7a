pub mod audio;
pub mod engine_session;
pub mod preview;
pub mod recording;
pub mod registry;
pub mod signal_bus;

#[cfg(test)]
pub(crate) mod mock_engine;

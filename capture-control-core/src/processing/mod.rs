pub mod levels;
pub mod ring_buffer;

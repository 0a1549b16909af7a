pub mod pipeline;
pub mod wav_format;
pub mod writer;

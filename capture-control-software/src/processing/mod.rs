pub mod mixer;
pub mod synth;

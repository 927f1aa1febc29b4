pub mod encoder;
mod output;
pub mod writer;

pub use output::Output;

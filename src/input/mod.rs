mod decoder;
mod reader;

pub use decoder::{Decoder, JsonDecoder};
pub use reader::{LineReader, Reader};

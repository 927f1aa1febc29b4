use crate::error::{Error, ErrorKind, Result};
use crate::query::RecordedResponse;

/// Turns one input line into a recorded backend response.
pub trait Decoder {
    fn decode(&self, buf: &[u8]) -> Result<RecordedResponse>;
}

pub struct JsonDecoder {}

impl JsonDecoder {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for JsonDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for JsonDecoder {
    fn decode(&self, buf: &[u8]) -> Result<RecordedResponse> {
        serde_json::from_slice(buf)
            .map_err(|e| Error::from(("response decoding failed", e)).into_kind(ErrorKind::Decode))
    }
}

use super::encoder::Encoder;
use crate::error::{Error, Result};
use crate::query::WidgetPayload;

/// Compact single-line JSON, the shape dashboards consume.
pub struct JsonEncoder {}

impl JsonEncoder {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for JsonEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for JsonEncoder {
    fn encode(&self, payload: &WidgetPayload) -> Result<Vec<u8>> {
        serde_json::to_vec(payload).map_err(|e| Error::from(("payload encoding failed", e)))
    }
}

use crate::error::Result;
use crate::query::WidgetPayload;

pub trait Encoder {
    fn encode(&self, payload: &WidgetPayload) -> Result<Vec<u8>>;
}

use super::encoder::Encoder;
use super::writer::Writer;
use crate::error::Result;
use crate::query::WidgetPayload;

pub struct Output {
    writer: Box<dyn Writer>,
    encoder: Box<dyn Encoder>,
}

impl Output {
    pub fn new(writer: Box<dyn Writer>, encoder: Box<dyn Encoder>) -> Self {
        Self { writer, encoder }
    }

    pub fn write(&mut self, payload: &WidgetPayload) -> Result<()> {
        let buf = self.encoder.encode(payload)?;

        self.writer
            .write(&buf)
            .map_err(|e| ("writer failed", e))?;

        Ok(())
    }
}

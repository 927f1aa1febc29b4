use std::io::{self, Write};

pub trait Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<()>;
}

/// Terminates every written payload with a newline.
pub struct LineWriter<W> {
    inner: W,
}

impl<W: Write> LineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Writer for LineWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)?;
        self.inner.write_all(b"\n")?;
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_writer() -> io::Result<()> {
        let mut writer = LineWriter::new(Vec::new());
        writer.write(b"{}")?;
        writer.write(b"[]")?;
        assert_eq!(writer.into_inner(), b"{}\n[]\n");
        Ok(())
    }
}

use std::io::{self, BufRead};

pub trait Reader {
    fn read(&mut self, buf: &mut Vec<u8>) -> io::Result<usize>;
}

/// One recorded response per line.
pub struct LineReader<R> {
    inner: R,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: BufRead> Reader for LineReader<R> {
    fn read(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        self.inner.read_until(b'\n', buf)
    }
}

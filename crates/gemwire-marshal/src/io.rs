//! Buffered byte access over caller-supplied read/write capabilities.

use std::io::{ErrorKind, Read, Write};

use gemwire_core::{DecodeError, EncodeError};

const BUF_SIZE: usize = 1024;

/// Buffered reader tracking the absolute byte offset for diagnostics.
pub struct ByteReader<R> {
    inner: R,
    buf: [u8; BUF_SIZE],
    pos: usize,
    len: usize,
    offset: u64,
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: [0; BUF_SIZE],
            pos: 0,
            len: 0,
            offset: 0,
        }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn fill(&mut self) -> Result<(), DecodeError> {
        self.pos = 0;
        self.len = 0;
        loop {
            match self.inner.read(&mut self.buf) {
                Ok(n) => {
                    self.len = n;
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(DecodeError::Io {
                        offset: self.offset,
                        source: e,
                    })
                }
            }
        }
    }

    /// Read the next byte; the end of input is a `Truncated` error.
    pub fn next_byte(&mut self) -> Result<u8, DecodeError> {
        if self.pos >= self.len {
            self.fill()?;
            if self.len == 0 {
                return Err(DecodeError::Truncated {
                    offset: self.offset,
                });
            }
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        self.offset += 1;
        Ok(b)
    }

    /// Copy the next `count` bytes into `out`, refilling across buffer
    /// boundaries.
    pub fn next_bytes(&mut self, count: usize, out: &mut Vec<u8>) -> Result<(), DecodeError> {
        let mut remaining = count;
        while remaining > 0 {
            if self.pos >= self.len {
                self.fill()?;
                if self.len == 0 {
                    return Err(DecodeError::Truncated {
                        offset: self.offset,
                    });
                }
            }
            let take = remaining.min(self.len - self.pos);
            out.extend_from_slice(&self.buf[self.pos..self.pos + take]);
            self.pos += take;
            self.offset += take as u64;
            remaining -= take;
        }
        Ok(())
    }
}

/// Buffered writer flushing in `BUF_SIZE` chunks.
pub struct ByteWriter<W: Write> {
    inner: W,
    buf: Vec<u8>,
}

impl<W: Write> ByteWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(BUF_SIZE),
        }
    }

    pub fn put_byte(&mut self, b: u8) -> Result<(), EncodeError> {
        if self.buf.len() >= BUF_SIZE {
            self.flush_buf()?;
        }
        self.buf.push(b);
        Ok(())
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.buf.extend_from_slice(bytes);
        if self.buf.len() >= BUF_SIZE {
            self.flush_buf()?;
        }
        Ok(())
    }

    fn flush_buf(&mut self) -> Result<(), EncodeError> {
        if !self.buf.is_empty() {
            self.inner.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }

    /// Drain the buffer to the underlying sink.
    pub fn flush(&mut self) -> Result<(), EncodeError> {
        self.flush_buf()?;
        self.inner.flush()?;
        Ok(())
    }
}

use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, encode_header, ContainerHeader, FrameConfig};
use crate::content::ContentKind;
use crate::error::{FormatError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes a container header followed by frames to any `Write` stream.
pub struct ContainerWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> ContainerWriter<T> {
    /// Write a header for `kind` with default configuration.
    pub fn create(inner: T, kind: ContentKind) -> Result<Self> {
        Self::create_with_config(inner, kind, FrameConfig::default())
    }

    /// Write a header for `kind` with explicit configuration.
    pub fn create_with_config(inner: T, kind: ContentKind, config: FrameConfig) -> Result<Self> {
        let mut writer = Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        };
        encode_header(&ContainerHeader::new(kind), &mut writer.buf);
        writer.write_buffered()?;
        Ok(writer)
    }

    /// Encode and write one frame.
    pub fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() > self.config.max_frame_size {
            return Err(FormatError::FrameTooLarge {
                offset: 0,
                size: payload.len(),
                max: self.config.max_frame_size,
            });
        }

        self.buf.clear();
        encode_frame(payload, &mut self.buf)?;
        self.write_buffered()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FormatError::Io(err)),
            }
        }
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FormatError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FormatError::Io(err)),
            }
        }
        self.buf.clear();
        self.flush()
    }
}

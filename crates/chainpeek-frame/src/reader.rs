use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::codec::{
    decode_header, ContainerHeader, Frame, FrameConfig, HEADER_SIZE, LENGTH_PREFIX_SIZE,
};
use crate::error::{FormatError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Reads a container header and then its frames from any `Read` stream.
///
/// The header is consumed exactly once, in [`ContainerReader::open`]; frames
/// are then pulled one at a time. At most one frame is buffered.
pub struct ContainerReader<T> {
    inner: T,
    buf: BytesMut,
    header: ContainerHeader,
    offset: u64,
    config: FrameConfig,
    finished: bool,
}

impl<T: Read> ContainerReader<T> {
    /// Read and validate the container header with default configuration.
    pub fn open(inner: T) -> Result<Self> {
        Self::open_with_config(inner, FrameConfig::default())
    }

    /// Read and validate the container header with explicit configuration.
    pub fn open_with_config(mut inner: T, config: FrameConfig) -> Result<Self> {
        let mut buf = BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY);
        fill(&mut inner, &mut buf, HEADER_SIZE)?;
        let header = decode_header(&buf)?;
        debug!(
            content_kind = %header.content_kind,
            content_version = header.content_version,
            "read dbin header"
        );
        buf.clear();

        Ok(Self {
            inner,
            buf,
            header,
            offset: HEADER_SIZE as u64,
            config,
            finished: false,
        })
    }

    /// The header read when the container was opened.
    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// Read the next frame (blocking).
    ///
    /// Returns `Ok(None)` when the stream ends cleanly on a frame boundary.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        let frame_offset = self.offset;

        let got = fill(&mut self.inner, &mut self.buf, LENGTH_PREFIX_SIZE)?;
        if got == 0 {
            return Ok(None);
        }
        if got < LENGTH_PREFIX_SIZE {
            return Err(FormatError::TruncatedLength {
                offset: frame_offset,
                got,
            });
        }

        let declared = (&self.buf[..]).get_u32() as usize;
        if declared > self.config.max_frame_size {
            return Err(FormatError::FrameTooLarge {
                offset: frame_offset,
                size: declared,
                max: self.config.max_frame_size,
            });
        }

        let got = fill(&mut self.inner, &mut self.buf, declared)?;
        if got < declared {
            return Err(FormatError::TruncatedFrame {
                offset: frame_offset,
                declared,
                got,
            });
        }

        self.offset += (LENGTH_PREFIX_SIZE + declared) as u64;
        let payload = self.buf.split().freeze();
        trace!(offset = frame_offset, size = declared, "read frame");

        Ok(Some(Frame {
            offset: frame_offset,
            payload,
        }))
    }

    /// Bytes consumed from the stream so far, header included.
    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T: Read> Iterator for ContainerReader<T> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Fill `buf` with exactly `want` bytes unless the stream ends first.
///
/// Returns the number of bytes actually read; `buf` holds only those bytes.
fn fill<R: Read>(inner: &mut R, buf: &mut BytesMut, want: usize) -> Result<usize> {
    buf.clear();
    buf.resize(want, 0);

    let mut filled = 0usize;
    while filled < want {
        match inner.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FormatError::Io(err)),
        }
    }

    buf.truncate(filled);
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BufMut;

    use super::*;
    use crate::codec::{encode_frame, encode_header};
    use crate::content::ContentKind;

    fn container(kind: ContentKind, frames: &[&[u8]]) -> Vec<u8> {
        let mut wire = BytesMut::new();
        encode_header(&ContainerHeader::new(kind), &mut wire);
        for frame in frames {
            encode_frame(frame, &mut wire).unwrap();
        }
        wire.to_vec()
    }

    #[test]
    fn read_header_then_frames() {
        let wire = container(ContentKind::Eos, &[b"one", b"two", b"three"]);
        let mut reader = ContainerReader::open(Cursor::new(wire)).unwrap();

        assert_eq!(reader.header().content_kind, ContentKind::Eos);
        let f1 = reader.read_frame().unwrap().unwrap();
        let f2 = reader.read_frame().unwrap().unwrap();
        let f3 = reader.read_frame().unwrap().unwrap();

        assert_eq!(f1.payload.as_ref(), b"one");
        assert_eq!(f2.payload.as_ref(), b"two");
        assert_eq!(f3.payload.as_ref(), b"three");
        assert_eq!(f1.offset, HEADER_SIZE as u64);
        assert_eq!(f2.offset, (HEADER_SIZE + 4 + 3) as u64);
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn empty_container_ends_cleanly() {
        let wire = container(ContentKind::Eth, &[]);
        let mut reader = ContainerReader::open(Cursor::new(wire)).unwrap();
        assert!(reader.read_frame().unwrap().is_none());
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn read_frame_with_large_payload() {
        let payload = vec![0xAB; 64 * 1024];
        let wire = container(ContentKind::Eos, &[&payload]);

        let mut reader = ContainerReader::open(Cursor::new(wire)).unwrap();
        let frame = reader.read_frame().unwrap().unwrap();
        assert_eq!(frame.payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn partial_read_handling() {
        let wire = container(ContentKind::Eos, &[b"slow", b"frames"]);
        let mut reader = ContainerReader::open(ByteByByteReader {
            bytes: wire,
            pos: 0,
        })
        .unwrap();

        let frames: Vec<_> = reader.by_ref().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].payload.as_ref(), b"frames");
    }

    #[test]
    fn unsupported_kind_rejected_before_frames() {
        let mut wire = container(ContentKind::Eos, &[b"frame"]);
        wire[5..8].copy_from_slice(b"XYZ");
        let result = ContainerReader::open(Cursor::new(wire));
        assert!(matches!(
            result,
            Err(FormatError::UnsupportedContentKind(_))
        ));
    }

    #[test]
    fn truncated_header_fails() {
        let result = ContainerReader::open(Cursor::new(b"dbi".to_vec()));
        assert!(matches!(result, Err(FormatError::Truncated { got: 3, .. })));
    }

    #[test]
    fn truncated_frame_fails_before_payload_is_returned() {
        let mut wire = container(ContentKind::Eos, &[]);
        wire.put_u32(16);
        wire.put_slice(b"only-part");

        let mut reader = ContainerReader::open(Cursor::new(wire)).unwrap();
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FormatError::TruncatedFrame {
                offset: 10,
                declared: 16,
                got: 9
            }
        ));
    }

    #[test]
    fn truncated_length_prefix_fails() {
        let mut wire = container(ContentKind::Eos, &[b"ok"]);
        wire.extend_from_slice(&[0x00, 0x01]);

        let mut reader = ContainerReader::open(Cursor::new(wire)).unwrap();
        assert!(reader.read_frame().unwrap().is_some());
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FormatError::TruncatedLength { got: 2, .. }));
    }

    #[test]
    fn oversized_frame_in_stream() {
        let mut wire = container(ContentKind::Eos, &[]);
        wire.put_u32(1024);

        let cfg = FrameConfig { max_frame_size: 16 };
        let mut reader = ContainerReader::open_with_config(Cursor::new(wire), cfg).unwrap();
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FormatError::FrameTooLarge {
                size: 1024,
                max: 16,
                ..
            }
        ));
    }

    #[test]
    fn iterator_stops_after_first_error() {
        let mut wire = container(ContentKind::Eos, &[b"good"]);
        wire.put_u32(8);
        wire.put_slice(b"bad");

        let reader = ContainerReader::open(Cursor::new(wire)).unwrap();
        let results: Vec<_> = reader.collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(FormatError::TruncatedFrame { .. })
        ));
    }

    #[test]
    fn interrupted_read_retries() {
        let wire = container(ContentKind::Eos, &[b"ok"]);
        let mut reader = ContainerReader::open(FlakyReader {
            fail_with: Some(ErrorKind::Interrupted),
            bytes: wire,
            pos: 0,
        })
        .unwrap();

        let frame = reader.read_frame().unwrap().unwrap();
        assert_eq!(frame.payload.as_ref(), b"ok");
    }

    #[test]
    fn other_io_errors_propagate() {
        let wire = container(ContentKind::Eos, &[b"ok"]);
        let result = ContainerReader::open(FlakyReader {
            fail_with: Some(ErrorKind::BrokenPipe),
            bytes: wire,
            pos: 0,
        });
        assert!(matches!(
            result,
            Err(FormatError::Io(e)) if e.kind() == ErrorKind::BrokenPipe
        ));
    }

    #[test]
    fn position_tracks_consumed_bytes() {
        let wire = container(ContentKind::Eth, &[b"abcd"]);
        let total = wire.len() as u64;
        let mut reader = ContainerReader::open(Cursor::new(wire)).unwrap();
        assert_eq!(reader.position(), HEADER_SIZE as u64);
        reader.read_frame().unwrap();
        assert_eq!(reader.position(), total);
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct FlakyReader {
        fail_with: Option<ErrorKind>,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for FlakyReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if let Some(kind) = self.fail_with.take() {
                return Err(std::io::Error::from(kind));
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }
}

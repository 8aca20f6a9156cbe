//! In-memory seekable byte stream backing message bodies.
//!
//! A [`ByteStream`] is a growable buffer with a single read/write cursor.
//! The cursor lives in `[0, size]`: `size` is the one-past-the-end position
//! reached after reading or writing the last byte, and [`eof`](ByteStream::eof)
//! holds exactly there. Seeking, `is_readable` and the `unread_bytes`
//! metadata all use the same convention.
//!
//! Messages hold their body through a [`Body`] handle. Cloning a handle, or
//! deriving a message from another, shares the same underlying stream.

use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::debug;

use crate::error::{MessageError, Result};

pub const SEEK_SET: i32 = 0;
pub const SEEK_CUR: i32 = 1;
pub const SEEK_END: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    FromStart,
    FromCurrent,
    FromEnd,
}

impl TryFrom<i32> for Whence {
    type Error = MessageError;

    fn try_from(whence: i32) -> Result<Self> {
        match whence {
            SEEK_SET => Ok(Whence::FromStart),
            SEEK_CUR => Ok(Whence::FromCurrent),
            SEEK_END => Ok(Whence::FromEnd),
            _ => Err(MessageError::UnsupportedSeek { whence }),
        }
    }
}

/// Fixed descriptor returned by [`ByteStream::metadata`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamMetadata {
    pub timed_out: bool,
    pub blocked: bool,
    pub eof: bool,
    pub unread_bytes: usize,
    pub mode: &'static str,
    pub seekable: bool,
}

/// A single metadata field, as returned by [`ByteStream::metadata_value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    Bool(bool),
    Size(usize),
    Str(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteStream {
    buf: Vec<u8>,
    position: usize,
}

impl ByteStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.buf.len()
    }

    pub fn tell(&self) -> usize {
        self.position
    }

    pub fn eof(&self) -> bool {
        self.position == self.buf.len()
    }

    pub fn is_seekable(&self) -> bool {
        true
    }

    pub fn is_writable(&self) -> bool {
        true
    }

    pub fn is_readable(&self) -> bool {
        !self.eof()
    }

    /// Writes `bytes` at the cursor, overwriting existing bytes and growing
    /// the buffer past its end. Returns the number of bytes written.
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        let overlap = bytes.len().min(self.buf.len() - self.position);
        let (head, tail) = bytes.split_at(overlap);
        self.buf[self.position..self.position + overlap].copy_from_slice(head);
        self.buf.extend_from_slice(tail);
        self.position += bytes.len();
        bytes.len()
    }

    /// Reads up to `length` bytes from the cursor. Fewer bytes, possibly none,
    /// are returned when the end of the buffer is reached first.
    pub fn read(&mut self, length: usize) -> Vec<u8> {
        let end = self.position.saturating_add(length).min(self.buf.len());
        let read = self.buf[self.position..end].to_vec();
        self.position = end;
        read
    }

    /// Reads everything from the cursor to the end of the buffer.
    pub fn get_contents(&mut self) -> Vec<u8> {
        self.read(self.buf.len() - self.position)
    }

    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<()> {
        let base = match whence {
            Whence::FromStart => 0,
            Whence::FromCurrent => self.position as i64,
            Whence::FromEnd => self.buf.len() as i64,
        };
        let target = base.saturating_add(offset);

        if target < 0 || target > self.buf.len() as i64 {
            debug!(offset = target, size = self.buf.len(), "rejected stream seek");
            return Err(MessageError::invalid_offset(target, self.buf.len()));
        }

        self.position = target as usize;
        Ok(())
    }

    /// Like [`seek`](Self::seek) with a numeric whence
    /// ([`SEEK_SET`], [`SEEK_CUR`] or [`SEEK_END`]).
    pub fn seek_raw(&mut self, offset: i64, whence: i32) -> Result<()> {
        self.seek(offset, Whence::try_from(whence)?)
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Nothing to release for an in-memory buffer.
    pub fn close(&mut self) {}

    /// There is no underlying resource to hand out.
    pub fn detach(&mut self) -> Option<Vec<u8>> {
        None
    }

    pub fn metadata(&self) -> StreamMetadata {
        StreamMetadata {
            timed_out: false,
            blocked: false,
            eof: self.eof(),
            unread_bytes: self.buf.len() - self.position,
            mode: "rw",
            seekable: true,
        }
    }

    /// Single metadata field by name, `None` for unknown keys.
    pub fn metadata_value(&self, key: &str) -> Option<MetadataValue> {
        let metadata = self.metadata();
        match key {
            "timed_out" => Some(MetadataValue::Bool(metadata.timed_out)),
            "blocked" => Some(MetadataValue::Bool(metadata.blocked)),
            "eof" => Some(MetadataValue::Bool(metadata.eof)),
            "unread_bytes" => Some(MetadataValue::Size(metadata.unread_bytes)),
            "mode" => Some(MetadataValue::Str(metadata.mode)),
            "seekable" => Some(MetadataValue::Bool(metadata.seekable)),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

impl From<Vec<u8>> for ByteStream {
    fn from(buf: Vec<u8>) -> Self {
        Self { buf, position: 0 }
    }
}

impl From<&[u8]> for ByteStream {
    fn from(buf: &[u8]) -> Self {
        Self::from(buf.to_vec())
    }
}

impl From<&str> for ByteStream {
    fn from(buf: &str) -> Self {
        Self::from(buf.as_bytes().to_vec())
    }
}

impl From<String> for ByteStream {
    fn from(buf: String) -> Self {
        Self::from(buf.into_bytes())
    }
}

impl fmt::Display for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.buf))
    }
}

impl io::Read for ByteStream {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let read = ByteStream::read(self, out.len());
        out[..read.len()].copy_from_slice(&read);
        Ok(read.len())
    }
}

impl io::Write for ByteStream {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        Ok(ByteStream::write(self, bytes))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Seek for ByteStream {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        match pos {
            io::SeekFrom::Start(offset) => {
                let offset = i64::try_from(offset)
                    .map_err(|_| MessageError::invalid_offset(i64::MAX, self.buf.len()))?;
                ByteStream::seek(self, offset, Whence::FromStart)?
            }
            io::SeekFrom::Current(offset) => ByteStream::seek(self, offset, Whence::FromCurrent)?,
            io::SeekFrom::End(offset) => ByteStream::seek(self, offset, Whence::FromEnd)?,
        }
        Ok(self.position as u64)
    }
}

/// Shared handle to a message body.
///
/// Derived messages share the handle of the message they came from, so the
/// stream and its cursor are seen by all of them. The stream has a single
/// cursor: callers that need independent readers should clone the stream
/// itself with [`Body::snapshot`].
#[derive(Clone, Default)]
pub struct Body {
    stream: Arc<Mutex<ByteStream>>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_stream(stream: ByteStream) -> Self {
        Self {
            stream: Arc::new(Mutex::new(stream)),
        }
    }

    /// Exclusive access to the stream.
    pub fn lock(&self) -> MutexGuard<'_, ByteStream> {
        self.stream.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Independent copy of the stream, cursor included.
    pub fn snapshot(&self) -> ByteStream {
        self.lock().clone()
    }

    /// Whether both handles point at the same stream.
    pub fn ptr_eq(&self, other: &Body) -> bool {
        Arc::ptr_eq(&self.stream, &other.stream)
    }
}

impl From<ByteStream> for Body {
    fn from(stream: ByteStream) -> Self {
        Self::from_stream(stream)
    }
}

impl From<&str> for Body {
    fn from(contents: &str) -> Self {
        Self::from_stream(ByteStream::from(contents))
    }
}

impl From<String> for Body {
    fn from(contents: String) -> Self {
        Self::from_stream(ByteStream::from(contents))
    }
}

impl From<Vec<u8>> for Body {
    fn from(contents: Vec<u8>) -> Self {
        Self::from_stream(ByteStream::from(contents))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stream.try_lock() {
            Ok(stream) => f.debug_tuple("Body").field(&*stream).finish(),
            Err(_) => f.write_str("Body(<locked>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read as _, Seek, SeekFrom, Write as _};

    #[test]
    fn write_rewind_read_back() {
        let mut stream = ByteStream::new();
        assert_eq!(stream.write(b"hello"), 5);
        assert_eq!(stream.tell(), 5);
        assert!(stream.eof());

        stream.rewind();
        assert_eq!(stream.get_contents(), b"hello");
        assert!(stream.eof());
    }

    #[test]
    fn write_overwrites_then_extends() {
        let mut stream = ByteStream::from("hello");
        stream.seek(3, Whence::FromStart).unwrap();
        stream.write(b"p me");

        assert_eq!(stream.to_string(), "help me");
        assert_eq!(stream.size(), 7);
        assert_eq!(stream.tell(), 7);
    }

    #[test]
    fn short_reads_at_end() {
        let mut stream = ByteStream::from("abc");
        assert_eq!(stream.read(2), b"ab");
        assert_eq!(stream.read(10), b"c");
        assert!(stream.read(10).is_empty());
        assert_eq!(stream.tell(), 3);
    }

    #[test]
    fn get_contents_from_cursor() {
        let mut stream = ByteStream::from("hello world");
        stream.seek(6, Whence::FromStart).unwrap();
        assert_eq!(stream.get_contents(), b"world");
        assert!(stream.get_contents().is_empty());
    }

    #[test]
    fn seek_relative() {
        let mut stream = ByteStream::from("0123456789");
        stream.seek(-3, Whence::FromEnd).unwrap();
        assert_eq!(stream.tell(), 7);
        stream.seek(-2, Whence::FromCurrent).unwrap();
        assert_eq!(stream.read(1), b"5");
        stream.seek(0, Whence::FromEnd).unwrap();
        assert!(stream.eof());
    }

    #[test]
    fn seek_out_of_range() {
        let mut stream = ByteStream::from("abc");
        assert_eq!(
            stream.seek(4, Whence::FromStart),
            Err(MessageError::InvalidOffset { offset: 4, max: 3 })
        );
        assert_eq!(
            stream.seek(-1, Whence::FromStart),
            Err(MessageError::InvalidOffset { offset: -1, max: 3 })
        );
        // a rejected seek leaves the cursor alone
        assert_eq!(stream.tell(), 0);
    }

    #[test]
    fn seek_unknown_whence() {
        let mut stream = ByteStream::from("abc");
        assert_eq!(
            stream.seek_raw(0, 7),
            Err(MessageError::UnsupportedSeek { whence: 7 })
        );
        stream.seek_raw(1, SEEK_SET).unwrap();
        stream.seek_raw(1, SEEK_CUR).unwrap();
        assert_eq!(stream.tell(), 2);
        stream.seek_raw(0, SEEK_END).unwrap();
        assert_eq!(stream.tell(), 3);
    }

    #[test]
    fn empty_stream_is_at_eof() {
        let stream = ByteStream::new();
        assert!(stream.eof());
        assert!(!stream.is_readable());
        assert_eq!(stream.metadata().unread_bytes, 0);
    }

    #[test]
    fn metadata_fields() {
        let mut stream = ByteStream::from("abcd");
        stream.read(1);

        let metadata = stream.metadata();
        assert_eq!(
            metadata,
            StreamMetadata {
                timed_out: false,
                blocked: false,
                eof: false,
                unread_bytes: 3,
                mode: "rw",
                seekable: true,
            }
        );
        assert_eq!(stream.metadata_value("mode"), Some(MetadataValue::Str("rw")));
        assert_eq!(stream.metadata_value("unread_bytes"), Some(MetadataValue::Size(3)));
        assert_eq!(stream.metadata_value("eof"), Some(MetadataValue::Bool(false)));
        assert_eq!(stream.metadata_value("uri"), None);
    }

    #[test]
    fn metadata_serializes() {
        let rendered = toml::to_string(&ByteStream::from("ab").metadata()).unwrap();
        assert!(rendered.contains("unread_bytes = 2"));
        assert!(rendered.contains("mode = \"rw\""));
    }

    #[test]
    fn std_io_traits() {
        let mut stream = ByteStream::new();
        stream.write_all(b"abcdef").unwrap();
        assert_eq!(Seek::seek(&mut stream, SeekFrom::Start(2)).unwrap(), 2);

        let mut out = [0u8; 3];
        stream.read_exact(&mut out).unwrap();
        assert_eq!(&out, b"cde");

        let err = Seek::seek(&mut stream, SeekFrom::Current(5)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"f");
    }

    #[test]
    fn body_handles_share_stream() {
        let body = Body::from("abc");
        let shared = body.clone();
        shared.lock().seek(0, Whence::FromEnd).unwrap();
        shared.lock().write(b"d");

        assert!(body.ptr_eq(&shared));
        assert_eq!(body.lock().to_string(), "abcd");

        let mut snapshot = body.snapshot();
        snapshot.rewind();
        assert_eq!(body.lock().tell(), 4);
        assert!(!Body::new().ptr_eq(&body));
    }
}

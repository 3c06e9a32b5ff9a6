//! Callback protocol between the extraction engine and the native decoder.
//!
//! The decoder calls back into the engine through two hooks:
//!
//! - [`Callback::supply_password`] fires at most once per entry, when the
//!   decoder finds encrypted data.
//! - [`Callback::accept_data`] receives decompressed bytes in order, as
//!   non-overlapping chunks. Returning `false` cancels processing; the
//!   decoder reports this as [`CallbackFault::Cancelled`].
//!
//! Three sinks implement the protocol: [`Listing`] discards data,
//! [`FileSink`] writes to an open file, and [`BufferSink`] collects bytes in
//! memory. All three borrow a [`PasswordState`] owned by the caller, so the
//! "was a password requested" flag outlives the sink and is visible to the
//! error translator after the native call returns.
//!
//! [`CallbackFault::Cancelled`]: crate::native::CallbackFault::Cancelled

use std::fs::File;
use std::io;
use std::io::Write;

use crc32fast::Hasher;

/// The two hooks invoked by the native decoder.
pub trait Callback {
    /// Returns the password for the entry being processed, if any.
    fn supply_password(&mut self) -> Option<String>;

    /// Receives a chunk of decompressed output. Returns `false` to stop.
    fn accept_data(&mut self, chunk: &[u8]) -> bool;
}

/// Password configured for a session and whether the decoder asked for it.
///
/// The `requested` flag is scoped to one entry and cleared with
/// [`PasswordState::reset`] before the next one.
#[derive(Debug, Clone, Default)]
pub struct PasswordState {
    password: Option<String>,
    requested: bool,
}

impl PasswordState {
    /// Creates the state with an optional password.
    #[must_use]
    pub const fn new(password: Option<String>) -> Self {
        Self {
            password,
            requested: false,
        }
    }

    /// Marks the password as requested and returns it.
    pub fn request(&mut self) -> Option<String> {
        self.requested = true;
        self.password.clone()
    }

    /// Returns `true` if the decoder asked for the password since the last
    /// reset.
    #[must_use]
    #[inline]
    pub const fn was_requested(&self) -> bool {
        self.requested
    }

    /// Returns `true` if a password was configured.
    #[must_use]
    #[inline]
    pub const fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Clears the requested flag.
    #[inline]
    pub fn reset(&mut self) {
        self.requested = false;
    }
}

/// Sink used for header reading and skips: supplies the password, discards
/// any data.
#[derive(Debug)]
pub struct Listing<'a> {
    password: &'a mut PasswordState,
}

impl<'a> Listing<'a> {
    /// Creates a discarding sink.
    pub fn new(password: &'a mut PasswordState) -> Self {
        Self { password }
    }
}

impl Callback for Listing<'_> {
    fn supply_password(&mut self) -> Option<String> {
        self.password.request()
    }

    fn accept_data(&mut self, _chunk: &[u8]) -> bool {
        true
    }
}

/// Sink that writes chunks to an open file and keeps a running CRC32.
///
/// The CRC is seeded, so a file reconstructed from several volume parts ends
/// with the checksum of its full content. A write failure is kept and
/// processing is cancelled; retrieve it with [`FileSink::take_error`].
#[derive(Debug)]
pub struct FileSink<'a> {
    password: &'a mut PasswordState,
    file: &'a mut File,
    crc: Hasher,
    written: u64,
    error: Option<io::Error>,
}

impl<'a> FileSink<'a> {
    /// Creates a sink over `file` continuing the checksum from `seed`.
    pub fn new(password: &'a mut PasswordState, file: &'a mut File, seed: u32) -> Self {
        Self {
            password,
            file,
            crc: Hasher::new_with_initial(seed),
            written: 0,
            error: None,
        }
    }

    /// Returns the running checksum.
    #[must_use]
    pub fn crc(&self) -> u32 {
        self.crc.clone().finalize()
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    #[inline]
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Takes the write error that cancelled processing, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}

impl Callback for FileSink<'_> {
    fn supply_password(&mut self) -> Option<String> {
        self.password.request()
    }

    fn accept_data(&mut self, chunk: &[u8]) -> bool {
        if let Err(err) = self.file.write_all(chunk) {
            self.error = Some(err);
            return false;
        }
        self.crc.update(chunk);
        self.written += chunk.len() as u64;
        true
    }
}

/// Sink that collects chunks in memory.
///
/// With a limit set, a chunk that would push the buffer past the limit
/// cancels processing and marks the sink as [`exceeded`](Self::exceeded).
#[derive(Debug)]
pub struct BufferSink<'a> {
    password: &'a mut PasswordState,
    buffer: Vec<u8>,
    crc: Hasher,
    limit: Option<u64>,
    exceeded: bool,
}

impl<'a> BufferSink<'a> {
    /// Creates an empty buffering sink.
    pub fn new(password: &'a mut PasswordState, limit: Option<u64>) -> Self {
        Self::resume(password, Vec::new(), 0, limit)
    }

    /// Continues collecting after `buffer`, whose CRC32 is `seed`.
    pub fn resume(
        password: &'a mut PasswordState,
        buffer: Vec<u8>,
        seed: u32,
        limit: Option<u64>,
    ) -> Self {
        Self {
            password,
            buffer,
            crc: Hasher::new_with_initial(seed),
            limit,
            exceeded: false,
        }
    }

    /// Returns `true` if the limit stopped processing.
    #[must_use]
    #[inline]
    pub const fn exceeded(&self) -> bool {
        self.exceeded
    }

    /// Consumes the sink, returning the bytes and their CRC32.
    #[must_use]
    pub fn into_parts(self) -> (Vec<u8>, u32) {
        (self.buffer, self.crc.finalize())
    }
}

impl Callback for BufferSink<'_> {
    fn supply_password(&mut self) -> Option<String> {
        self.password.request()
    }

    fn accept_data(&mut self, chunk: &[u8]) -> bool {
        if let Some(limit) = self.limit {
            let total = self.buffer.len() as u64 + chunk.len() as u64;
            if total > limit {
                self.exceeded = true;
                return false;
            }
        }
        self.buffer.extend_from_slice(chunk);
        self.crc.update(chunk);
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::io::Seek;
    use std::io::SeekFrom;

    #[test]
    fn test_password_state_request_sets_flag() {
        let mut state = PasswordState::new(Some("secret".into()));
        assert!(!state.was_requested());
        assert_eq!(state.request().as_deref(), Some("secret"));
        assert!(state.was_requested());

        state.reset();
        assert!(!state.was_requested());
        assert!(state.has_password());
    }

    #[test]
    fn test_listing_requests_password_and_discards() {
        let mut state = PasswordState::new(None);
        let mut listing = Listing::new(&mut state);
        assert!(listing.accept_data(b"ignored"));
        assert_eq!(listing.supply_password(), None);
        assert!(state.was_requested());
    }

    #[test]
    fn test_file_sink_writes_and_checksums() {
        let mut state = PasswordState::default();
        let mut file = tempfile::tempfile().unwrap();
        let mut sink = FileSink::new(&mut state, &mut file, 0);

        assert!(sink.accept_data(b"hello "));
        assert!(sink.accept_data(b"world"));
        assert_eq!(sink.written(), 11);
        assert_eq!(sink.crc(), crc32fast::hash(b"hello world"));
        assert!(sink.take_error().is_none());

        file.seek(SeekFrom::Start(0)).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        assert_eq!(content, "hello world");
    }

    #[test]
    fn test_file_sink_seed_continues_checksum() {
        let mut state = PasswordState::default();
        let mut file = tempfile::tempfile().unwrap();
        let seed = crc32fast::hash(b"first part ");
        let mut sink = FileSink::new(&mut state, &mut file, seed);

        sink.accept_data(b"second part");
        assert_eq!(sink.crc(), crc32fast::hash(b"first part second part"));
    }

    #[test]
    fn test_buffer_sink_collects() {
        let mut state = PasswordState::default();
        let mut sink = BufferSink::new(&mut state, None);
        sink.accept_data(b"abc");
        sink.accept_data(b"def");

        let (data, crc) = sink.into_parts();
        assert_eq!(data, b"abcdef");
        assert_eq!(crc, crc32fast::hash(b"abcdef"));
    }

    #[test]
    fn test_buffer_sink_resume() {
        let mut state = PasswordState::default();
        let seed = crc32fast::hash(b"abc");
        let mut sink = BufferSink::resume(&mut state, b"abc".to_vec(), seed, Some(6));
        assert!(sink.accept_data(b"def"));
        assert!(!sink.accept_data(b"g"));

        let (data, crc) = sink.into_parts();
        assert_eq!(data, b"abcdef");
        assert_eq!(crc, crc32fast::hash(b"abcdef"));
    }

    #[test]
    fn test_buffer_sink_limit_cancels() {
        let mut state = PasswordState::default();
        let mut sink = BufferSink::new(&mut state, Some(4));
        assert!(sink.accept_data(b"abc"));
        assert!(!sink.accept_data(b"de"));
        assert!(sink.exceeded());

        let (data, _) = sink.into_parts();
        assert_eq!(data, b"abc");
    }
}

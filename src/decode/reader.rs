//! Byte source to character adapter whose charset can change mid-stream.
//!
//! Bytes sit in a fixed cache that slides forward: once fewer than
//! [`CHAR_MARGIN`] unread bytes remain, the tail moves to the front and the
//! cache is topped up from the source. Bytes reach the decoder one at a time,
//! so nothing past the current character has been decoded when the charset
//! is swapped.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::{Mutex, PoisonError};

use encoding_rs::{Decoder, Encoding};

use crate::constants::{CHAR_MARGIN, DEFAULT_CACHE_SIZE, MIN_CACHE_SIZE, REPLACEMENT_CHAR};

const DECODE_BUFFER: usize = 32;

pub struct FlexReader<R> {
    source: R,
    decoder: Mutex<Decoder>,
    cache: Box<[u8]>,
    position: usize,
    limit: usize,
    source_done: bool,
    flushed: bool,
    pending: VecDeque<char>,
}

impl<R: Read> FlexReader<R> {
    pub fn new(source: R, encoding: &'static Encoding) -> Self {
        Self::with_cache_size(source, encoding, DEFAULT_CACHE_SIZE)
    }

    /// A `cache_size` of zero selects the default; smaller sizes are raised
    /// to [`MIN_CACHE_SIZE`].
    pub fn with_cache_size(source: R, encoding: &'static Encoding, cache_size: usize) -> Self {
        let capacity = match cache_size {
            0 => DEFAULT_CACHE_SIZE,
            size => size.max(MIN_CACHE_SIZE),
        };
        Self {
            source,
            decoder: Mutex::new(encoding.new_decoder_with_bom_removal()),
            cache: vec![0u8; capacity].into_boxed_slice(),
            position: 0,
            limit: 0,
            source_done: false,
            flushed: false,
            pending: VecDeque::new(),
        }
    }

    /// Next decoded character, `None` once the source and cache are drained.
    /// Malformed byte sequences come back as U+FFFD.
    pub fn read_char(&mut self) -> io::Result<Option<char>> {
        loop {
            if let Some(ch) = self.pending.pop_front() {
                return Ok(Some(ch));
            }
            if self.flushed {
                return Ok(None);
            }
            self.fill_cache()?;

            let mut out = [0u8; DECODE_BUFFER];
            let decoder = self
                .decoder
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner);
            let written = if self.position < self.limit {
                let src = &self.cache[self.position..self.position + 1];
                let (_, read, written, _) = decoder.decode_to_utf8(src, &mut out, false);
                if read == 0 && written == 0 {
                    self.position += 1;
                    self.pending.push_back(REPLACEMENT_CHAR);
                    continue;
                }
                self.position += read;
                written
            } else {
                let (_, _, written, _) = decoder.decode_to_utf8(&[], &mut out, true);
                self.flushed = true;
                written
            };

            match std::str::from_utf8(&out[..written]) {
                Ok(text) => self.pending.extend(text.chars()),
                Err(_) => self.pending.push_back(REPLACEMENT_CHAR),
            }
        }
    }

    fn fill_cache(&mut self) -> io::Result<()> {
        if self.source_done || self.limit - self.position >= CHAR_MARGIN {
            return Ok(());
        }
        if self.position > 0 {
            self.cache.copy_within(self.position..self.limit, 0);
            self.limit -= self.position;
            self.position = 0;
        }
        while self.limit < self.cache.len() {
            match self.source.read(&mut self.cache[self.limit..]) {
                Ok(0) => {
                    self.source_done = true;
                    break;
                }
                Ok(n) => self.limit += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Replaces the active decoder; every byte not yet consumed is decoded
    /// with `encoding`.
    /// Takes `&self` so a reader shared behind a reference can still be
    /// switched; the read path itself goes through `get_mut` without locking.
    pub fn set_encoding(&self, encoding: &'static Encoding) {
        let mut decoder = self.decoder.lock().unwrap_or_else(PoisonError::into_inner);
        *decoder = encoding.new_decoder_without_bom_handling();
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.decoder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .encoding()
    }

    pub fn cache_position(&self) -> usize {
        self.position
    }

    pub fn cache_len(&self) -> usize {
        self.limit
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache.len()
    }

    pub fn into_inner(self) -> R {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_8, WINDOWS_1251};

    struct Trickle<'a> {
        data: &'a [u8],
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[0];
            self.data = &self.data[1..];
            Ok(1)
        }
    }

    fn read_all<R: Read>(reader: &mut FlexReader<R>) -> String {
        let mut out = String::new();
        while let Some(ch) = reader.read_char().expect("read") {
            out.push(ch);
        }
        out
    }

    #[rstest::rstest]
    fn test_reads_ascii() {
        let mut reader = FlexReader::new(&b"a=\"1\""[..], UTF_8);
        assert_eq!(read_all(&mut reader), "a=\"1\"");
        assert_eq!(reader.read_char().expect("read"), None);
        assert_eq!(reader.read_char().expect("read"), None);
    }

    #[rstest::rstest]
    fn test_empty_source() {
        let mut reader = FlexReader::new(&b""[..], UTF_8);
        assert_eq!(reader.read_char().expect("read"), None);
    }

    #[rstest::rstest]
    #[case(0, DEFAULT_CACHE_SIZE)]
    #[case(1, MIN_CACHE_SIZE)]
    #[case(1000, 1000)]
    fn test_cache_capacity(#[case] requested: usize, #[case] expected: usize) {
        let reader = FlexReader::with_cache_size(&b""[..], UTF_8, requested);
        assert_eq!(reader.cache_capacity(), expected);
    }

    #[rstest::rstest]
    fn test_multibyte_across_cache_windows() {
        let text = "значение=\"Привет, мир\" 🦀 ".repeat(40);
        let mut reader = FlexReader::with_cache_size(text.as_bytes(), UTF_8, MIN_CACHE_SIZE);
        assert_eq!(read_all(&mut reader), text);
    }

    #[rstest::rstest]
    fn test_multibyte_from_trickling_source() {
        let text = "ключ=\"🦀 значение\"\n".repeat(30);
        let source = Trickle {
            data: text.as_bytes(),
        };
        let mut reader = FlexReader::with_cache_size(source, UTF_8, MIN_CACHE_SIZE);
        assert_eq!(read_all(&mut reader), text);
    }

    #[rstest::rstest]
    fn test_window_slides_forward() {
        let text = "x".repeat(MIN_CACHE_SIZE * 3);
        let mut reader = FlexReader::with_cache_size(text.as_bytes(), UTF_8, MIN_CACHE_SIZE);
        for _ in 0..MIN_CACHE_SIZE {
            reader.read_char().expect("read");
        }
        assert!(reader.cache_len() - reader.cache_position() >= CHAR_MARGIN - 1);
        assert!(reader.cache_len() <= reader.cache_capacity());
        assert_eq!(read_all(&mut reader).len(), MIN_CACHE_SIZE * 2);
    }

    #[rstest::rstest]
    fn test_malformed_bytes_become_replacement() {
        let mut reader = FlexReader::new(&[b'a', 0xFF, b'b'][..], UTF_8);
        assert_eq!(read_all(&mut reader), "a\u{FFFD}b");
    }

    #[rstest::rstest]
    fn test_truncated_sequence_at_end() {
        let mut reader = FlexReader::new(&[b'a', 0xD0][..], UTF_8);
        assert_eq!(read_all(&mut reader), "a\u{FFFD}");
    }

    #[rstest::rstest]
    fn test_bom_is_removed() {
        let mut reader = FlexReader::new(&[0xEF, 0xBB, 0xBF, b'a'][..], UTF_8);
        assert_eq!(read_all(&mut reader), "a");
    }

    #[rstest::rstest]
    fn test_swap_encoding_mid_stream() {
        let mut bytes = b"ab:".to_vec();
        bytes.extend_from_slice(&[0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2]);
        let mut reader = FlexReader::new(&bytes[..], UTF_8);
        assert_eq!(reader.read_char().expect("read"), Some('a'));
        assert_eq!(reader.read_char().expect("read"), Some('b'));
        assert_eq!(reader.read_char().expect("read"), Some(':'));
        reader.set_encoding(WINDOWS_1251);
        assert_eq!(reader.encoding(), WINDOWS_1251);
        assert_eq!(read_all(&mut reader), "Привет");
    }
}

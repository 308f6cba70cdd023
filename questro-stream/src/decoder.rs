//! Streaming UTF-8 decoding that survives chunk boundaries.

use encoding_rs::{CoderResult, Decoder, UTF_8};

/// Incremental UTF-8 decoder.
///
/// A multi-byte character split across two chunks is held back until the
/// rest arrives. Invalid sequences become U+FFFD instead of failing, so one
/// bad byte cannot abort an otherwise good stream.
pub struct Utf8StreamDecoder {
    decoder: Decoder,
    finished: bool,
}

impl Utf8StreamDecoder {
    /// Create a decoder. A leading UTF-8 byte order mark is dropped; a
    /// UTF-16 mark is not sniffed and decodes as invalid bytes.
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_with_bom_removal(),
            finished: false,
        }
    }

    /// Decode `bytes`, appending the text that is complete so far to `out`.
    ///
    /// Returns `true` if any replacement character was produced.
    pub fn decode(&mut self, bytes: &[u8], out: &mut String) -> bool {
        self.decode_inner(bytes, out, false)
    }

    /// Flush held-back bytes at end of stream.
    ///
    /// An incomplete trailing sequence is emitted as U+FFFD. Calls after the
    /// first are no-ops.
    pub fn finish(&mut self, out: &mut String) -> bool {
        self.decode_inner(&[], out, true)
    }

    fn decode_inner(&mut self, mut bytes: &[u8], out: &mut String, last: bool) -> bool {
        if self.finished {
            return false;
        }
        let mut replaced = false;
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(bytes.len())
                .unwrap_or(bytes.len().saturating_mul(3).saturating_add(4));
            out.reserve(needed);
            let (result, read, had_replacements) =
                self.decoder.decode_to_string(bytes, out, last);
            replaced |= had_replacements;
            bytes = &bytes[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
        if last {
            self.finished = true;
        }
        replaced
    }
}

impl Default for Utf8StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ascii() {
        let mut dec = Utf8StreamDecoder::new();
        let mut out = String::new();
        assert!(!dec.decode(b"hello", &mut out));
        assert_eq!(out, "hello");
    }

    #[test]
    fn holds_split_multibyte_character() {
        let bytes = "héllo".as_bytes();
        // 'é' is 0xC3 0xA9; split between them.
        let mut dec = Utf8StreamDecoder::new();
        let mut out = String::new();
        dec.decode(&bytes[..2], &mut out);
        assert_eq!(out, "h");
        dec.decode(&bytes[2..], &mut out);
        assert_eq!(out, "héllo");
    }

    #[test]
    fn four_byte_character_across_three_chunks() {
        let bytes = "a🎉b".as_bytes();
        let mut dec = Utf8StreamDecoder::new();
        let mut out = String::new();
        dec.decode(&bytes[..2], &mut out);
        dec.decode(&bytes[2..4], &mut out);
        assert_eq!(out, "a");
        dec.decode(&bytes[4..], &mut out);
        assert_eq!(out, "a🎉b");
    }

    #[test]
    fn invalid_byte_becomes_replacement() {
        let mut dec = Utf8StreamDecoder::new();
        let mut out = String::new();
        assert!(dec.decode(b"a\xFFb", &mut out));
        assert_eq!(out, "a\u{FFFD}b");
    }

    #[test]
    fn finish_flushes_incomplete_tail() {
        let mut dec = Utf8StreamDecoder::new();
        let mut out = String::new();
        dec.decode(b"ok\xE2\x82", &mut out);
        assert_eq!(out, "ok");
        assert!(dec.finish(&mut out));
        assert_eq!(out, "ok\u{FFFD}");
        assert!(!dec.finish(&mut out));
        assert_eq!(out, "ok\u{FFFD}");
    }

    #[test]
    fn leading_bom_is_dropped() {
        let mut dec = Utf8StreamDecoder::new();
        let mut out = String::new();
        dec.decode(b"\xEF\xBB\xBFdata", &mut out);
        assert_eq!(out, "data");
    }

    #[test]
    fn utf16_marks_do_not_switch_encoding() {
        for mark in [&b"\xFF\xFE"[..], &b"\xFE\xFF"[..]] {
            let mut dec = Utf8StreamDecoder::new();
            let mut out = String::new();
            let mut bytes = mark.to_vec();
            bytes.extend_from_slice(b"\ndata: ok\n");
            assert!(dec.decode(&bytes, &mut out));
            assert_eq!(out, "\u{FFFD}\u{FFFD}\ndata: ok\n");
        }
    }

    #[test]
    fn large_input_decodes_fully() {
        let text = "ü".repeat(10_000);
        let mut dec = Utf8StreamDecoder::new();
        let mut out = String::new();
        dec.decode(text.as_bytes(), &mut out);
        dec.finish(&mut out);
        assert_eq!(out, text);
    }
}

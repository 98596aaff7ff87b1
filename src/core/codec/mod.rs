//! Line codec for the bridge's text protocol
//!
//! Inbound, the raw byte stream is split on `\n` into text lines. Reads may
//! cut a line anywhere, so an undelimited tail stays buffered until the rest
//! of it arrives. Decoding is lenient: invalid UTF-8 is replaced with U+FFFD
//! and never fails the stream. Outbound, commands are written verbatim.

use crate::core::sequencer::Command;
use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

/// Newline-delimited text codec
#[derive(Debug, Clone, Default)]
pub struct LineCodec {
    // Bytes already scanned for a delimiter
    next_index: usize,
    lossy_lines: u64,
}

impl LineCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines that needed replacement characters so far
    pub fn lossy_lines(&self) -> u64 {
        self.lossy_lines
    }

    fn line_text(&mut self, raw: &[u8]) -> String {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        match std::str::from_utf8(raw) {
            Ok(text) => text.to_string(),
            Err(_) => {
                self.lossy_lines += 1;
                tracing::warn!(raw = %hex::encode(raw), "invalid UTF-8 in telemetry line, substituting");
                String::from_utf8_lossy(raw).into_owned()
            }
        }
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
            self.next_index = src.len();
            return Ok(None);
        };

        let end = self.next_index + offset;
        self.next_index = 0;
        let line = src.split_to(end + 1);
        Ok(Some(self.line_text(&line[..end])))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        self.next_index = 0;
        let rest = src.split_to(src.len());
        Ok(Some(self.line_text(&rest)))
    }
}

impl Encoder<Command> for LineCodec {
    type Error = std::io::Error;

    fn encode(&mut self, command: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(command.as_bytes());
        Ok(())
    }
}

/// Drain every complete line currently in `src`
pub fn drain_lines(codec: &mut LineCodec, src: &mut BytesMut) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(Some(line)) = codec.decode(src) {
        lines.push(line);
    }
    lines
}

/// Discard `src` entirely, returning how many bytes were dropped
pub fn discard(src: &mut BytesMut) -> usize {
    let dropped = src.len();
    src.clear();
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(codec: &mut LineCodec, buf: &mut BytesMut, chunk: &[u8]) -> Vec<String> {
        buf.extend_from_slice(chunk);
        drain_lines(codec, buf)
    }

    #[test]
    fn test_split_across_reads() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        assert!(feed(&mut codec, &mut buf, b"R:1.00 P:").is_empty());
        assert_eq!(feed(&mut codec, &mut buf, b"2.00 Y:0\nR:"), ["R:1.00 P:2.00 Y:0"]);
        assert_eq!(feed(&mut codec, &mut buf, b"3\nhello\n\n"), ["R:3", "hello", ""]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        let mut lines = Vec::new();
        for byte in b"R:0\r\nR:1\n" {
            lines.extend(feed(&mut codec, &mut buf, &[*byte]));
        }
        assert_eq!(lines, ["R:0", "R:1"]);
    }

    #[test]
    fn test_lenient_decoding() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"R:\xff\xfe1\nR:2\n"[..]);
        let lines = drain_lines(&mut codec, &mut buf);
        assert_eq!(lines, ["R:\u{fffd}\u{fffd}1", "R:2"]);
        assert_eq!(codec.lossy_lines(), 1);
    }

    #[test]
    fn test_multibyte_char_split_across_reads() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        let text = "R:5° P:0\n".as_bytes();
        let (a, b) = text.split_at(4);
        assert!(feed(&mut codec, &mut buf, a).is_empty());
        assert_eq!(feed(&mut codec, &mut buf, b), ["R:5° P:0"]);
        assert_eq!(codec.lossy_lines(), 0);
    }

    #[test]
    fn test_eof_flushes_fragment() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"R:1\nR:2"[..]);
        assert_eq!(codec.decode_eof(&mut buf).unwrap().as_deref(), Some("R:1"));
        assert_eq!(codec.decode_eof(&mut buf).unwrap().as_deref(), Some("R:2"));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_encode_command_verbatim() {
        let mut codec = LineCodec::new();
        let mut dst = BytesMut::new();
        codec.encode(Command::new("MODE:9"), &mut dst).unwrap();
        assert_eq!(&dst[..], b"MODE:9\n");
    }

    #[test]
    fn test_discard() {
        let mut buf = BytesMut::from(&b"partial"[..]);
        assert_eq!(discard(&mut buf), 7);
        assert!(buf.is_empty());
    }
}

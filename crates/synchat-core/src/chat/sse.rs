//! SSE-style line framing over a raw byte stream
//!
//! Network chunk boundaries align with neither UTF-8 sequence boundaries
//! nor line boundaries, so the decoder carries two buffers across calls:
//! the tail bytes of an incomplete multi-byte sequence, and the text of an
//! unterminated line.

use tracing::trace;

/// One logical line of the response stream, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A `data:`-prefixed event line; payload has the prefix stripped and
    /// is trimmed.
    Data(String),
    /// Empty (or whitespace-only) line.
    Blank,
    /// Any other line; not part of the event protocol.
    Other(String),
}

/// Incremental decoder: bytes in, complete classified lines out.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence from the last chunk.
    utf8_carry: Vec<u8>,
    /// Unterminated tail of the last chunk, waiting for its line break.
    pending: String,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of raw bytes; returns the complete frames it closed.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<Frame> {
        let text = self.decode_utf8(chunk);
        if text.is_empty() {
            return Vec::new();
        }
        self.pending.push_str(&text);

        let mut frames = Vec::new();
        while let Some(newline) = self.pending.find('\n') {
            let rest = self.pending.split_off(newline + 1);
            let mut line = std::mem::replace(&mut self.pending, rest);
            line.truncate(line.len() - 1); // drop '\n'
            if line.ends_with('\r') {
                line.truncate(line.len() - 1);
            }
            frames.push(classify(&line));
        }
        trace!("chunk closed {} frame(s)", frames.len());
        frames
    }

    /// Flush the unterminated tail at stream end, if any.
    pub fn finish(&mut self) -> Option<Frame> {
        self.utf8_carry.clear();
        if self.pending.is_empty() {
            return None;
        }
        let mut line = std::mem::take(&mut self.pending);
        if line.ends_with('\r') {
            line.truncate(line.len() - 1);
        }
        Some(classify(&line))
    }

    /// Streaming UTF-8 decode. A trailing incomplete sequence is held back
    /// and prepended to the next chunk; invalid bytes are replaced.
    fn decode_utf8(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.utf8_carry);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    out.push_str(std::str::from_utf8(&rest[..valid_up_to]).unwrap_or(""));
                    match e.error_len() {
                        // Incomplete sequence at the very end: carry it over.
                        None => {
                            self.utf8_carry = rest[valid_up_to..].to_vec();
                            break;
                        }
                        // Genuinely invalid bytes: replace and continue.
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &rest[valid_up_to + len..];
                        }
                    }
                }
            }
        }
        out
    }
}

/// Classify a complete line. Both `data:` and `data: ` prefixes occur in
/// the wild, so the space is optional; the payload is trimmed either way.
fn classify(line: &str) -> Frame {
    if line.trim().is_empty() {
        return Frame::Blank;
    }
    if let Some(payload) = line.strip_prefix("data:") {
        return Frame::Data(payload.trim().to_string());
    }
    Frame::Other(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(decoder: &mut SseLineDecoder, chunks: &[&[u8]]) -> Vec<Frame> {
        let mut frames = Vec::new();
        for chunk in chunks {
            frames.extend(decoder.push_chunk(chunk));
        }
        frames.extend(decoder.finish());
        frames
    }

    #[test]
    fn single_chunk_single_line() {
        let mut decoder = SseLineDecoder::new();
        let frames = decoder.push_chunk(b"data: {\"content\":\"hi\"}\n");
        assert_eq!(frames, vec![Frame::Data("{\"content\":\"hi\"}".into())]);
    }

    #[test]
    fn prefix_without_space_is_accepted() {
        let mut decoder = SseLineDecoder::new();
        let frames = decoder.push_chunk(b"data:[DONE]\n");
        assert_eq!(frames, vec![Frame::Data("[DONE]".into())]);
    }

    #[test]
    fn chunk_boundary_independence() {
        let bytes: &[u8] = b"data: {\"content\":\"hello\"}\n\ndata: {\"done\": true}\n";
        let whole = collect(&mut SseLineDecoder::new(), &[bytes]);

        // Every possible split point yields the same frame sequence.
        for split in 0..bytes.len() {
            let (a, b) = bytes.split_at(split);
            let frames = collect(&mut SseLineDecoder::new(), &[a, b]);
            assert_eq!(frames, whole, "split at byte {}", split);
        }
    }

    #[test]
    fn multibyte_char_split_across_chunks() {
        // "데이터" is three 3-byte characters; split inside the second one.
        let bytes = "data: 데이터\n".as_bytes();
        for split in 0..bytes.len() {
            let (a, b) = bytes.split_at(split);
            let mut decoder = SseLineDecoder::new();
            let mut frames = decoder.push_chunk(a);
            frames.extend(decoder.push_chunk(b));
            assert_eq!(frames, vec![Frame::Data("데이터".into())], "split at {}", split);
        }
    }

    #[test]
    fn partial_line_carries_to_next_chunk() {
        let mut decoder = SseLineDecoder::new();
        assert!(decoder.push_chunk(b"data: par").is_empty());
        let frames = decoder.push_chunk(b"tial\n");
        assert_eq!(frames, vec![Frame::Data("partial".into())]);
    }

    #[test]
    fn crlf_is_tolerated() {
        let mut decoder = SseLineDecoder::new();
        let frames = decoder.push_chunk(b"data: x\r\n\r\n");
        assert_eq!(frames, vec![Frame::Data("x".into()), Frame::Blank]);
    }

    #[test]
    fn blank_and_foreign_lines_classified() {
        let mut decoder = SseLineDecoder::new();
        let frames = decoder.push_chunk(b"\nevent: ping\n: comment\n");
        assert_eq!(
            frames,
            vec![
                Frame::Blank,
                Frame::Other("event: ping".into()),
                Frame::Other(": comment".into()),
            ]
        );
    }

    #[test]
    fn finish_flushes_unterminated_tail() {
        let mut decoder = SseLineDecoder::new();
        assert!(decoder.push_chunk(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), Some(Frame::Data("tail".into())));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn invalid_bytes_are_replaced_not_fatal() {
        let mut decoder = SseLineDecoder::new();
        let frames = decoder.push_chunk(b"data: a\xFFb\n");
        match &frames[0] {
            Frame::Data(payload) => assert!(payload.contains('\u{FFFD}')),
            other => panic!("unexpected frame {:?}", other),
        }
    }
}

//! Incremental byte-to-line decoding
//!
//! Transport chunks arrive at arbitrary byte boundaries. The decoder keeps
//! two pieces of state between calls: UTF-8 bytes that do not yet form a
//! complete character, and decoded text not yet terminated by `\n`.

/// Stateful UTF-8 line splitter for one stream.
#[derive(Debug, Default)]
pub struct LineDecoder {
    /// Trailing bytes of an incomplete multi-byte sequence
    pending: Vec<u8>,
    /// Decoded text after the last newline
    remainder: String,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning every line it completes.
    ///
    /// Lines are returned without their `\n` terminator; a trailing `\r` is
    /// stripped as well. Invalid byte sequences decode to U+FFFD.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<String> {
        if chunk.is_empty() {
            return Vec::new();
        }

        self.pending.extend_from_slice(chunk);
        self.decode_pending();
        self.drain_lines()
    }

    /// Text received after the last complete line.
    pub fn remainder(&self) -> &str {
        &self.remainder
    }

    /// Flush state at end of stream.
    ///
    /// Returns the unterminated last line, if any. Bytes of an incomplete
    /// character left at the end decode to U+FFFD.
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending.is_empty() {
            let tail = std::mem::take(&mut self.pending);
            self.remainder.push_str(&String::from_utf8_lossy(&tail));
        }

        let rest = std::mem::take(&mut self.remainder);
        let rest = rest.strip_suffix('\r').unwrap_or(&rest);
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    }

    /// Reset to an empty state, discarding buffered input.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.remainder.clear();
    }

    fn decode_pending(&mut self) {
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(text) => {
                    self.remainder.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(err) => {
                    let valid = start + err.valid_up_to();
                    // valid_up_to guarantees this slice is UTF-8
                    if let Ok(text) = std::str::from_utf8(&self.pending[start..valid]) {
                        self.remainder.push_str(text);
                    }
                    match err.error_len() {
                        Some(len) => {
                            self.remainder.push(char::REPLACEMENT_CHARACTER);
                            start = valid + len;
                        }
                        None => {
                            // Incomplete sequence at the end: wait for more bytes
                            self.pending.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }

    fn drain_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.remainder.rfind('\n') else {
            return Vec::new();
        };

        let rest = self.remainder.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.remainder, rest);
        complete[..last_newline]
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect()
    }
}

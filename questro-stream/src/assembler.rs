//! The push-style reassembly state machine.

use questro_types::AssemblyOutcome;

use crate::decoder::Utf8StreamDecoder;
use crate::frame::{Frame, MalformedFrame, classify_line, decode_delta};

/// Assembler lifecycle. No transition leaves [`AssemblerState::Done`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// Accepting chunks.
    Streaming,
    /// Sentinel seen or stream ended. Further input is ignored.
    Done,
}

/// Turns raw body chunks into a growing reply text.
///
/// Chunks may split anywhere: inside a multi-byte character, inside the
/// `data: ` prefix, between `\r` and `\n`. Complete lines are classified and
/// decoded as soon as their `\n` arrives; the sink receives the cumulative
/// text after every non-empty delta.
///
/// Malformed payloads are dropped and counted, never re-buffered.
pub struct StreamAssembler {
    decoder: Utf8StreamDecoder,
    /// Decoded text not yet terminated by `\n`.
    pending: String,
    assembled: String,
    state: AssemblerState,
    saw_sentinel: bool,
    deltas: usize,
    malformed: usize,
}

impl StreamAssembler {
    /// A fresh assembler in [`AssemblerState::Streaming`].
    pub fn new() -> Self {
        Self {
            decoder: Utf8StreamDecoder::new(),
            pending: String::new(),
            assembled: String::new(),
            state: AssemblerState::Streaming,
            saw_sentinel: false,
            deltas: 0,
            malformed: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Whether the assembler reached [`AssemblerState::Done`].
    pub fn is_done(&self) -> bool {
        self.state == AssemblerState::Done
    }

    /// Whether the `[DONE]` sentinel was seen.
    pub fn saw_sentinel(&self) -> bool {
        self.saw_sentinel
    }

    /// The reply text assembled so far.
    pub fn assembled(&self) -> &str {
        &self.assembled
    }

    /// Feed one chunk of the response body.
    pub fn feed<F>(&mut self, chunk: &[u8], on_delta: &mut F) -> AssemblerState
    where
        F: FnMut(&str) + ?Sized,
    {
        if self.is_done() {
            return self.state;
        }
        if self.decoder.decode(chunk, &mut self.pending) {
            tracing::debug!("replaced undecodable bytes in stream chunk");
        }
        self.drain_lines(on_delta);
        self.state
    }

    /// Signal end of the byte stream.
    ///
    /// Flushes the decoder, processes complete lines and then any final
    /// unterminated line, and moves to [`AssemblerState::Done`].
    pub fn finish<F>(&mut self, on_delta: &mut F) -> AssemblerState
    where
        F: FnMut(&str) + ?Sized,
    {
        if self.is_done() {
            return self.state;
        }
        self.decoder.finish(&mut self.pending);
        self.drain_lines(on_delta);
        if !self.is_done() && !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.process_line(&line, on_delta);
        }
        self.enter_done();
        self.state
    }

    /// Consume the assembler and summarize the reply.
    pub fn into_outcome(self) -> AssemblyOutcome {
        AssemblyOutcome {
            text: self.assembled,
            deltas: self.deltas,
            malformed_frames: self.malformed,
            saw_sentinel: self.saw_sentinel,
        }
    }

    fn drain_lines<F>(&mut self, on_delta: &mut F)
    where
        F: FnMut(&str) + ?Sized,
    {
        let pending = std::mem::take(&mut self.pending);
        let mut start = 0;
        while let Some(offset) = pending[start..].find('\n') {
            let end = start + offset;
            self.process_line(&pending[start..end], on_delta);
            start = end + 1;
            if self.is_done() {
                return;
            }
        }
        self.pending = pending;
        self.pending.drain(..start);
    }

    fn process_line<F>(&mut self, line: &str, on_delta: &mut F)
    where
        F: FnMut(&str) + ?Sized,
    {
        match classify_line(line) {
            Frame::Ignored => {}
            Frame::Done => {
                self.saw_sentinel = true;
                self.enter_done();
            }
            Frame::Data(payload) => match decode_delta(payload) {
                Ok(Some(delta)) => {
                    self.assembled.push_str(&delta);
                    self.deltas += 1;
                    on_delta(&self.assembled);
                }
                Ok(None) => {}
                Err(MalformedFrame::Vendor(message)) => {
                    self.malformed += 1;
                    tracing::warn!(%message, "vendor error frame in stream, dropped");
                }
                Err(err) => {
                    self.malformed += 1;
                    tracing::warn!(error = %err, "malformed stream frame dropped");
                }
            },
        }
    }

    fn enter_done(&mut self) {
        self.state = AssemblerState::Done;
        self.pending.clear();
    }
}

impl Default for StreamAssembler {
    fn default() -> Self {
        Self::new()
    }
}

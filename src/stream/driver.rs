//! Read loop for one event stream
//!
//! Pulls chunks from the transport, feeds them through the [`LineDecoder`]
//! and dispatches every complete line before the next chunk is pulled. The
//! driver owns the completion callback and fires it at most once.

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, StreamError, INVALID_RESPONSE_DATA};
use crate::sse::{Dispatch, Dispatcher, EventSink, LineDecoder};
use crate::traits::{ByteStream, HttpError};

/// Lifecycle of a [`StreamDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Not started
    Idle,
    /// Waiting for the next chunk
    Reading,
    /// Delivering the lines of a chunk
    Dispatching,
    /// Transport reported end of stream; completion fired without error
    Completed,
    /// Stopped on an error; completion fired with `has_error = true`
    Erroring,
    /// Stopped by the caller; completion never fired
    Cancelled,
}

impl DriverState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DriverState::Completed | DriverState::Erroring | DriverState::Cancelled
        )
    }
}

/// How a stream ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    Completed,
    Failed(StreamError),
    Cancelled,
}

/// Drives decode, parse and dispatch for one response body.
#[derive(Debug)]
pub struct StreamDriver {
    decoder: LineDecoder,
    dispatcher: Dispatcher,
    state: DriverState,
    cancel: CancellationToken,
}

impl Default for StreamDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDriver {
    pub fn new() -> Self {
        Self::with_cancellation(CancellationToken::new())
    }

    /// Create a driver that stops as soon as `cancel` fires.
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            decoder: LineDecoder::new(),
            dispatcher: Dispatcher::new(),
            state: DriverState::Idle,
            cancel,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Consume `body` until it ends, fails, or is cancelled.
    ///
    /// A driver serves a single stream; create a new one per response.
    pub async fn run<S: EventSink + ?Sized>(
        &mut self,
        mut body: ByteStream,
        sink: &mut S,
    ) -> StreamOutcome {
        loop {
            self.state = DriverState::Reading;

            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                next = body.next() => Some(next),
            };
            let Some(next) = next else {
                return self.cancelled(sink);
            };

            match next {
                Some(Ok(chunk)) => {
                    if let Some(outcome) = self.feed(&chunk, sink) {
                        return outcome;
                    }
                }
                Some(Err(HttpError::Cancelled)) => return self.cancelled(sink),
                Some(Err(e)) => return self.transport_failed(e, sink),
                None => return self.finish(sink),
            }
        }
    }

    /// Decode one chunk and dispatch its complete lines.
    ///
    /// Returns the terminal outcome if a line ended the stream. Chunks fed
    /// after the driver reached a terminal state are dropped.
    pub fn feed<S: EventSink + ?Sized>(
        &mut self,
        chunk: &[u8],
        sink: &mut S,
    ) -> Option<StreamOutcome> {
        if self.state.is_terminal() {
            tracing::debug!("Dropping chunk fed to a finished stream");
            return None;
        }

        let lines = self.decoder.decode(chunk);
        if lines.is_empty() {
            return None;
        }

        self.state = DriverState::Dispatching;
        for line in lines {
            if self.cancel.is_cancelled() {
                return Some(self.cancelled(sink));
            }
            if let Some(outcome) = self.dispatch(&line, sink) {
                return Some(outcome);
            }
        }
        None
    }

    fn dispatch<S: EventSink + ?Sized>(&mut self, line: &str, sink: &mut S) -> Option<StreamOutcome> {
        match self.dispatcher.dispatch_line(line, sink) {
            Dispatch::Continue => None,
            Dispatch::Terminate(error) => Some(self.errored(error, sink)),
        }
    }

    fn finish<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> StreamOutcome {
        if let Some(line) = self.decoder.finish() {
            if let Some(outcome) = self.dispatch(&line, sink) {
                return outcome;
            }
        }

        tracing::debug!("Stream completed");
        self.state = DriverState::Completed;
        sink.on_completed(false, None);
        StreamOutcome::Completed
    }

    fn errored<S: EventSink + ?Sized>(&mut self, error: StreamError, sink: &mut S) -> StreamOutcome {
        let message = match &error {
            StreamError::InvalidData => Some(INVALID_RESPONSE_DATA.to_string()),
            StreamError::Backend { message, .. } if !message.is_empty() => Some(message.clone()),
            StreamError::Backend { .. } | StreamError::Cancelled => None,
            StreamError::Transport(e) => Some(e.to_string()),
        };

        self.state = DriverState::Erroring;
        self.decoder.reset();
        sink.on_completed(true, message.as_deref());
        StreamOutcome::Failed(error)
    }

    fn transport_failed<S: EventSink + ?Sized>(&mut self, error: HttpError, sink: &mut S) -> StreamOutcome {
        tracing::warn!("Stream transport failed: {}", error);
        sink.on_error(&ClientError::Transport(error.clone()));
        self.errored(StreamError::Transport(error), sink)
    }

    fn cancelled<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> StreamOutcome {
        tracing::debug!("Stream cancelled");
        self.state = DriverState::Cancelled;
        self.decoder.reset();
        sink.on_error(&ClientError::Cancelled);
        StreamOutcome::Cancelled
    }
}

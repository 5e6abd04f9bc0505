//! Generic SSE-to-canonical event pump
//!
//! Both drivers speak server-sent events; they differ only in how one wire
//! message maps to canonical events. [`SseEventStream`] owns the poll loop,
//! the pending-event queue (one wire message can expand into several
//! canonical events), and transport error classification; the per-driver
//! [`SseNormalizer`] owns the protocol state machine.

use crate::base;
use futures_core::Stream;
use marketchat_core::{Result, StreamEvent};
use reqwest_eventsource::{Error as EsError, Event, EventSource};
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Per-driver protocol state machine
pub(crate) trait SseNormalizer: Send {
    /// Provider name used for error classification
    fn provider(&self) -> &'static str;

    /// Normalize one wire message into zero or more canonical events.
    /// Returning `Err` terminates the stream after that error is yielded.
    fn handle_message(&mut self, event: &str, data: &str) -> Result<Vec<StreamEvent>>;

    /// Called exactly once when the transport ends; may flush trailing
    /// events (e.g. a deferred `MessageEnd`).
    fn handle_end(&mut self) -> Vec<StreamEvent>;
}

/// Canonical event stream over an SSE connection
///
/// Pull-based: the upstream socket is only read when the caller polls, so a
/// slow consumer delays the vendor rather than buffering unboundedly.
/// Dropping the stream drops the `EventSource`, aborting the connection.
pub(crate) struct SseEventStream<N> {
    inner: EventSource,
    normalizer: N,
    pending: VecDeque<StreamEvent>,
    done: bool,
}

impl<N: SseNormalizer> SseEventStream<N> {
    pub(crate) fn new(inner: EventSource, normalizer: N) -> Self {
        Self {
            inner,
            normalizer,
            pending: VecDeque::new(),
            done: false,
        }
    }
}

impl<N: SseNormalizer + Unpin> Stream for SseEventStream<N> {
    type Item = Result<StreamEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if this.done {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(Event::Open))) => continue,
                Poll::Ready(Some(Ok(Event::Message(msg)))) => {
                    match this.normalizer.handle_message(&msg.event, &msg.data) {
                        Ok(events) => this.pending.extend(events),
                        Err(e) => {
                            this.done = true;
                            this.inner.close();
                            return Poll::Ready(Some(Err(e)));
                        }
                    }
                }
                // The default EventSource policy would reconnect after the
                // server closes; one chat request is one connection.
                Poll::Ready(Some(Err(EsError::StreamEnded))) | Poll::Ready(None) => {
                    this.done = true;
                    this.inner.close();
                    this.pending.extend(this.normalizer.handle_end());
                }
                Poll::Ready(Some(Err(e))) => {
                    this.done = true;
                    this.inner.close();
                    return Poll::Ready(Some(Err(base::classify_transport(
                        this.normalizer.provider(),
                        e,
                    ))));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

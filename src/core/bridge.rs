//! Request/response message broker.
//!
//! A broker is constructed and handed to whoever needs it; there is no
//! process-wide instance. Each request gets a correlation ID and a deadline.
//! Responses are matched back by ID, requests past their deadline are
//! reported as timed out, and late or unknown responses are dropped.
//! The number of requests in flight is bounded.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Correlation ID of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

/// A message tagged with the request it belongs to.
#[derive(Debug)]
pub struct Envelope<T> {
    pub id: RequestId,
    pub body: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("too many requests in flight (limit {limit})")]
    TooManyPending { limit: usize },

    #[error("the other end of the channel has shut down")]
    Disconnected,
}

/// Outcome of a request, reported by [`MessageBroker::poll`].
#[derive(Debug, PartialEq)]
pub enum Completion<T> {
    Resolved { id: RequestId, response: T },
    TimedOut { id: RequestId },
}

/// Requesting side of a broker channel.
pub struct MessageBroker<Req, Resp> {
    outbound: Sender<Envelope<Req>>,
    inbound: Receiver<Envelope<Resp>>,
    /// Deadline of each request still awaiting a response
    pending: HashMap<RequestId, Instant>,
    next_id: u64,
    max_pending: usize,
    timeout: Duration,
}

/// Serving side of a broker channel.
pub struct Endpoint<Req, Resp> {
    requests: Receiver<Envelope<Req>>,
    responses: Sender<Envelope<Resp>>,
}

/// Create a connected broker and endpoint.
pub fn channel<Req, Resp>(
    max_pending: usize,
    timeout: Duration,
) -> (MessageBroker<Req, Resp>, Endpoint<Req, Resp>) {
    let (request_tx, request_rx) = mpsc::channel();
    let (response_tx, response_rx) = mpsc::channel();

    let broker = MessageBroker {
        outbound: request_tx,
        inbound: response_rx,
        pending: HashMap::new(),
        next_id: 0,
        max_pending,
        timeout,
    };
    let endpoint = Endpoint {
        requests: request_rx,
        responses: response_tx,
    };
    (broker, endpoint)
}

impl<Req, Resp> MessageBroker<Req, Resp> {
    /// Send a request; it times out `timeout` after `now`.
    pub fn send(&mut self, body: Req, now: Instant) -> Result<RequestId, BrokerError> {
        if self.pending.len() >= self.max_pending {
            return Err(BrokerError::TooManyPending {
                limit: self.max_pending,
            });
        }

        let id = RequestId(self.next_id);
        self.outbound
            .send(Envelope { id, body })
            .map_err(|_| BrokerError::Disconnected)?;

        self.next_id += 1;
        self.pending.insert(id, now + self.timeout);
        Ok(id)
    }

    /// Stop waiting for a request. Its response, if any, will be dropped.
    pub fn cancel(&mut self, id: RequestId) -> bool {
        self.pending.remove(&id).is_some()
    }

    pub fn is_pending(&self, id: RequestId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Collect responses that have arrived and requests that have expired.
    ///
    /// Resolved requests are reported in arrival order, followed by timeouts
    /// in request order.
    pub fn poll(&mut self, now: Instant) -> Vec<Completion<Resp>> {
        let mut completions = Vec::new();

        for Envelope { id, body } in self.inbound.try_iter() {
            if self.pending.remove(&id).is_some() {
                completions.push(Completion::Resolved { id, response: body });
            } else {
                log::debug!("dropping response for {:?}: no longer pending", id);
            }
        }

        let mut expired: Vec<RequestId> = self
            .pending
            .iter()
            .filter(|&(_, &deadline)| deadline <= now)
            .map(|(&id, _)| id)
            .collect();
        expired.sort_unstable();

        for id in expired {
            self.pending.remove(&id);
            completions.push(Completion::TimedOut { id });
        }

        completions
    }
}

impl<Req, Resp> Endpoint<Req, Resp> {
    /// Block until the next request arrives; `None` once the broker is gone.
    pub fn recv(&self) -> Option<Envelope<Req>> {
        self.requests.recv().ok()
    }

    /// Answer a request.
    pub fn respond(&self, id: RequestId, body: Resp) -> Result<(), BrokerError> {
        self.responses
            .send(Envelope { id, body })
            .map_err(|_| BrokerError::Disconnected)
    }
}

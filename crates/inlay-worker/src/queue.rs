//! Execution queue
//!
//! Serialized FIFO admission over one runtime handle. The queue is an
//! explicit structure — a pending deque plus an observable in-flight
//! slot — rather than an implicit chain of awaited completions, which
//! makes the serialization invariant directly testable: no request is
//! admitted while another is in flight, and requests are admitted in
//! strict arrival order.
//!
//! Settling is unconditional: success and failure both release the slot,
//! so a failed cell can never deadlock the queue.

use inlay_protocol::{CellId, WorkerRequest};
use std::collections::VecDeque;

/// FIFO admission gate for worker requests.
#[derive(Default)]
pub struct ExecutionQueue {
    pending: VecDeque<WorkerRequest>,
    in_flight: Option<CellId>,
}

impl ExecutionQueue {
    /// An empty queue with nothing in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request behind everything already pending.
    pub fn push(&mut self, request: WorkerRequest) {
        self.pending.push_back(request);
    }

    /// Admit the next request, if any, and only when nothing is in
    /// flight. The admitted request occupies the in-flight slot until
    /// [`settle`](Self::settle) is called.
    pub fn admit(&mut self) -> Option<WorkerRequest> {
        if self.in_flight.is_some() {
            return None;
        }
        let request = self.pending.pop_front()?;
        self.in_flight = Some(request.id().clone());
        Some(request)
    }

    /// Release the in-flight slot, regardless of how execution ended.
    pub fn settle(&mut self) {
        self.in_flight = None;
    }

    /// The cell currently holding the in-flight slot.
    pub fn in_flight(&self) -> Option<&CellId> {
        self.in_flight.as_ref()
    }

    /// Whether a request is currently executing.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Number of requests awaiting admission.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

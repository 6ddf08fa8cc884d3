use log::{debug, warn};

use crate::{
    backends::Timer,
    connection::connection_config::ConnectionConfig,
    messages::SyncMessage,
    sequence_buffer::{SequenceBuffer, SequenceError},
    types::{HostType, MessageSeq},
    wrapping_number::sequence_less_than,
};

/// Connection state common to both peers: sequence cursors for ordered
/// delivery, the reorder buffer, liveness and heartbeat timers, and the
/// consecutive-protocol-error counter. Embedded by the server's per-client
/// session and by the client's server connection.
pub struct BaseConnection {
    host_type: HostType,
    next_outgoing_seq: MessageSeq,
    next_expected_seq: MessageSeq,
    pending: SequenceBuffer<Vec<SyncMessage>>,
    liveness_timer: Timer,
    heartbeat_timer: Timer,
    consecutive_protocol_errors: u32,
    protocol_error_limit: u32,
    reorder_buffer_limit: usize,
}

impl BaseConnection {
    pub fn new(config: &ConnectionConfig, host_type: HostType) -> Self {
        Self {
            host_type,
            next_outgoing_seq: 0,
            next_expected_seq: 0,
            pending: SequenceBuffer::new(),
            liveness_timer: Timer::new(config.liveness_timeout),
            heartbeat_timer: Timer::new(config.heartbeat_interval),
            consecutive_protocol_errors: 0,
            protocol_error_limit: config.protocol_error_limit,
            reorder_buffer_limit: config.reorder_buffer_limit,
        }
    }

    // Liveness & heartbeats

    /// Record that any packet arrived from the peer, pushing out the
    /// liveness deadline
    pub fn mark_heard(&mut self) {
        self.liveness_timer.reset();
    }

    /// Record that a packet was sent (to prevent needing to send a
    /// heartbeat)
    pub fn mark_sent(&mut self) {
        self.heartbeat_timer.reset();
    }

    /// Returns whether a heartbeat packet should be sent
    pub fn should_send_heartbeat(&self) -> bool {
        self.heartbeat_timer.ringing()
    }

    /// Returns whether the peer has been silent past the liveness deadline
    pub fn timed_out(&self) -> bool {
        self.liveness_timer.ringing()
    }

    // Ordered delivery

    /// The sequence number to stamp on the next outgoing data packet
    pub fn next_outgoing_seq(&mut self) -> MessageSeq {
        let seq = self.next_outgoing_seq;
        self.next_outgoing_seq = self.next_outgoing_seq.wrapping_add(1);
        seq
    }

    /// Accepts one received data packet and returns the message batches now
    /// ready to apply, in sequence order.
    ///
    /// Stale or duplicate packets are dropped. Early packets are buffered
    /// until the gap fills; if the buffer outgrows its bound the gap is
    /// declared lost and reception skips forward (missed updates are
    /// superseded by the next received state, never reordered backward).
    pub fn receive_data(
        &mut self,
        seq: MessageSeq,
        messages: Vec<SyncMessage>,
    ) -> Vec<Vec<SyncMessage>> {
        let mut ready = Vec::new();

        if sequence_less_than(seq, self.next_expected_seq) {
            debug!(
                "{}: dropping stale data packet {} (expecting {})",
                self.host_type.label(),
                seq,
                self.next_expected_seq
            );
            return ready;
        }

        if seq == self.next_expected_seq {
            ready.push(messages);
            self.next_expected_seq = self.next_expected_seq.wrapping_add(1);
        } else {
            match self.pending.insert(seq, messages) {
                Ok(()) => {}
                Err(SequenceError::Duplicate { seq }) => {
                    debug!(
                        "{}: dropping duplicate data packet {}",
                        self.host_type.label(),
                        seq
                    );
                    return ready;
                }
            }
            if self.pending.len() > self.reorder_buffer_limit {
                if let Some(front) = self.pending.front_seq() {
                    warn!(
                        "{}: sequence gap at {} outlived {} buffered packets, skipping ahead to {}",
                        self.host_type.label(),
                        self.next_expected_seq,
                        self.reorder_buffer_limit,
                        front
                    );
                    self.next_expected_seq = front;
                }
            }
        }

        // drain the contiguous run now unblocked
        while self.pending.front_seq() == Some(self.next_expected_seq) {
            if let Some((_, batch)) = self.pending.pop_front() {
                ready.push(batch);
            }
            self.next_expected_seq = self.next_expected_seq.wrapping_add(1);
        }

        ready
    }

    // Protocol error accounting

    /// Counts one protocol violation; returns true once the configured limit
    /// is exceeded and the connection should be torn down.
    pub fn record_protocol_error(&mut self) -> bool {
        self.consecutive_protocol_errors += 1;
        self.consecutive_protocol_errors > self.protocol_error_limit
    }

    /// Any well-formed packet resets the consecutive-violation count
    pub fn clear_protocol_errors(&mut self) {
        self.consecutive_protocol_errors = 0;
    }
}

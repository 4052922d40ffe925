//! # Action Queue
//!
//! Inbound actions arrive from transport callbacks at any time; they are
//! parked in an unbounded inbox and only drained by the runtime's "apply
//! incoming actions" phase. Outgoing actions accumulate until the transport
//! flushes them.

use log::debug;
use netsync_shared::ActionEnvelope;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Cloneable handle transport callbacks use to hand actions to a runtime
pub type ActionSender = UnboundedSender<ActionEnvelope>;

/// Inbox and outbox of one peer
#[derive(Debug)]
pub struct ActionQueue {
    inbox_tx: ActionSender,
    inbox_rx: UnboundedReceiver<ActionEnvelope>,
    outgoing: Vec<ActionEnvelope>,
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionQueue {
    pub fn new() -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            inbox_tx,
            inbox_rx,
            outgoing: Vec::new(),
        }
    }

    /// A sender feeding this queue's inbox
    pub fn sender(&self) -> ActionSender {
        self.inbox_tx.clone()
    }

    /// Park an action for the next apply phase
    pub fn enqueue_incoming(&self, envelope: ActionEnvelope) {
        // The receiver lives as long as `self`, so the send cannot fail.
        let _ = self.inbox_tx.send(envelope);
    }

    /// Everything received since the last drain, in arrival order
    pub fn drain_incoming(&mut self) -> Vec<ActionEnvelope> {
        let mut drained = Vec::new();
        loop {
            match self.inbox_rx.try_recv() {
                Ok(envelope) => drained.push(envelope),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if !drained.is_empty() {
            debug!("Drained {} incoming actions", drained.len());
        }
        drained
    }

    pub fn push_outgoing(&mut self, envelope: ActionEnvelope) {
        self.outgoing.push(envelope);
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// Take the outgoing batch, leaving the outbox empty
    pub fn take_outgoing(&mut self) -> Vec<ActionEnvelope> {
        std::mem::take(&mut self.outgoing)
    }
}

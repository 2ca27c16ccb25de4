//! Two-way interface to the pathway diagram collaborator.
//!
//! The diagram side sends events (pathway changed, genes added to the query,
//! show message) through a cloned sender. Overlay data flows the other way
//! through an explicit subscribe/publish pair: subscribers receive every
//! published merged alteration list on their own channel instead of handing
//! the view-model a setter function to call.

use crate::alteration::AlterationRecord;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

#[derive(Debug, Clone, PartialEq)]
pub enum DiagramEvent {
    /// The user picked a pathway; the diagram reports its gene set.
    PathwayChanged { genes: Vec<String> },
    /// The user asked the diagram to add genes to the running query.
    GenesAddedToQuery { genes: Vec<String> },
    /// The diagram wants a message shown in the tab's message box.
    ShowMessage { text: String },
}

pub struct DiagramBridge {
    events_tx: Sender<DiagramEvent>,
    events_rx: Receiver<DiagramEvent>,
    subscribers: Vec<Sender<Vec<AlterationRecord>>>,
}

impl Default for DiagramBridge {
    fn default() -> Self {
        let (events_tx, events_rx) = channel();
        Self {
            events_tx,
            events_rx,
            subscribers: Vec::new(),
        }
    }
}

impl DiagramBridge {
    /// Sender handed to the diagram side (cloneable).
    pub fn event_sender(&self) -> Sender<DiagramEvent> {
        self.events_tx.clone()
    }

    /// Drain all queued diagram events, in arrival order.
    pub fn drain_events(&mut self) -> Vec<DiagramEvent> {
        let mut events = Vec::new();
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }

    /// Register an overlay-data consumer.
    pub fn subscribe(&mut self) -> Receiver<Vec<AlterationRecord>> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Push the merged list to every live subscriber; dead ones are pruned.
    pub fn publish(&mut self, records: &[AlterationRecord]) {
        self.subscribers
            .retain(|tx| tx.send(records.to_vec()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

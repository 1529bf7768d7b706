//! The reconciliation engine: one ordered timeline, three producers.
//!
//! All producers enqueue [`EngineCommand`]s onto a single mpsc queue and a
//! single consumer task applies them in arrival order, so cross-producer
//! ordering is wall-clock arrival order at the queue. No global sequence
//! numbers or causal ordering; this is a best-effort chat view, not a
//! ledger.

use shared::{
    domain::{Identity, Message, Origin},
    protocol::ChatRecord,
};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::ClientEvent;

pub(crate) enum EngineCommand {
    /// History resolution. Sent exactly once, with an empty batch when the
    /// fetch failed.
    HistoryLoaded(Vec<ChatRecord>),
    LiveBatch(Vec<ChatRecord>),
    Local(String),
    Snapshot(oneshot::Sender<Vec<Message>>),
}

enum Pending {
    Live(Vec<ChatRecord>),
    Local(String),
}

/// Ordered, append-only message sequence. Entries are never reordered or
/// removed once accepted; the only rejection points are the self-echo filter
/// on the live path and the empty-after-trim rule on every path.
pub struct Timeline {
    local: Identity,
    entries: Vec<Message>,
    history_applied: bool,
    pending: Vec<Pending>,
}

impl Timeline {
    pub fn new(local: Identity) -> Self {
        Self {
            local,
            entries: Vec::new(),
            history_applied: false,
            pending: Vec::new(),
        }
    }

    /// Apply the one-shot history batch and flush every arrival that was
    /// deferred behind it, preserving each arrival's queue order. History
    /// resolves once; a later resolution is ignored.
    pub fn apply_history(&mut self, records: Vec<ChatRecord>) {
        if self.history_applied {
            return;
        }

        for record in records {
            self.accept(record.into_message(Origin::History));
        }
        self.history_applied = true;

        for deferred in std::mem::take(&mut self.pending) {
            match deferred {
                Pending::Live(records) => {
                    self.apply_live(records);
                }
                Pending::Local(text) => {
                    self.apply_local(text);
                }
            }
        }
    }

    /// Apply one live push batch. Candidates whose sender equals the local
    /// identity are dropped before insertion: the originating client already
    /// displayed them optimistically at send time, and this filter is the
    /// sole dedup mechanism between the optimistic and live origins.
    pub fn apply_live(&mut self, records: Vec<ChatRecord>) -> bool {
        if !self.history_applied {
            self.pending.push(Pending::Live(records));
            return false;
        }

        let before = self.entries.len();
        for record in records {
            if record.sender == self.local.0 {
                continue;
            }
            self.accept(record.into_message(Origin::Live));
        }
        self.entries.len() != before
    }

    /// Append a locally-originated send. Never rolled back, even when the
    /// backend request later fails.
    pub fn apply_local(&mut self, text: String) -> bool {
        if !self.history_applied {
            self.pending.push(Pending::Local(text));
            return false;
        }

        self.accept(Message {
            text,
            sender: self.local.0.clone(),
            origin: Origin::Optimistic,
        })
    }

    fn accept(&mut self, message: Message) -> bool {
        if message.text.trim().is_empty() {
            return false;
        }
        self.entries.push(message);
        true
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Single consumer over the engine queue. Emits a timeline snapshot after
/// every accepted mutation, and once when history resolves even if it
/// resolved empty, so the presentation layer always gets an initial render.
pub(crate) async fn run_engine(
    mut timeline: Timeline,
    mut commands: mpsc::UnboundedReceiver<EngineCommand>,
    events: broadcast::Sender<ClientEvent>,
) {
    while let Some(command) = commands.recv().await {
        let changed = match command {
            EngineCommand::HistoryLoaded(records) => {
                timeline.apply_history(records);
                true
            }
            EngineCommand::LiveBatch(records) => timeline.apply_live(records),
            EngineCommand::Local(text) => timeline.apply_local(text),
            EngineCommand::Snapshot(reply) => {
                let _ = reply.send(timeline.snapshot());
                false
            }
        };

        if changed {
            let _ = events.send(ClientEvent::TimelineUpdated(timeline.snapshot()));
        }
    }
}

#[cfg(test)]
#[path = "tests/timeline_tests.rs"]
mod tests;

//! Asynchronous credit submission.
//!
//! A producer hands credit intents to the relay and returns immediately; a
//! [`CreditWorker`] consumes them and applies each through the ledger.
//!
//! Delivery is at-least-once from the ledger's point of view: an intent that
//! arrives twice is credited twice. Deduplication, if needed, belongs to
//! whoever submits.

use crate::amount::Amount;
use crate::error::RelayError;
use crate::ledger::WalletLedger;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Kind of operation carried by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Credit,
}

/// A credit waiting to be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditIntent {
    pub kind: OperationKind,
    pub amount: Amount,
}

impl CreditIntent {
    pub fn credit(amount: Amount) -> Self {
        CreditIntent {
            kind: OperationKind::Credit,
            amount,
        }
    }
}

/// Producer side of the relay. Cloneable; the worker stops once every
/// clone is dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct CreditRelay {
    sender: mpsc::Sender<CreditIntent>,
}

impl CreditRelay {
    /// Queues a credit. Waits only while the channel is full.
    pub async fn submit(&self, amount: Amount) -> Result<(), RelayError> {
        self.sender
            .send(CreditIntent::credit(amount))
            .await
            .map_err(|_| RelayError::Closed)?;
        debug!("Queued credit of {}", amount);
        Ok(())
    }
}

/// Consumer side of the relay, handed to [`CreditWorker::new`].
#[derive(Debug)]
pub struct CreditInbox {
    receiver: mpsc::Receiver<CreditIntent>,
}

/// Creates a bounded relay holding at most `capacity` pending credits.
pub fn credit_channel(capacity: usize) -> (CreditRelay, CreditInbox) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (CreditRelay { sender }, CreditInbox { receiver })
}

/// Counts reported by a worker when it stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub applied: usize,
    pub failed: usize,
}

/// Applies relayed credits through the ledger.
pub struct CreditWorker {
    ledger: Arc<WalletLedger>,
    inbox: CreditInbox,
}

impl CreditWorker {
    pub fn new(ledger: Arc<WalletLedger>, inbox: CreditInbox) -> Self {
        CreditWorker { ledger, inbox }
    }

    /// Consumes intents until the relay closes.
    ///
    /// A credit that fails is logged and dropped; the worker keeps going.
    pub async fn run(mut self) -> WorkerStats {
        let mut stats = WorkerStats::default();

        while let Some(intent) = self.inbox.receiver.recv().await {
            match intent.kind {
                OperationKind::Credit => match self.ledger.credit(intent.amount).await {
                    Ok(_) => stats.applied += 1,
                    Err(e) => {
                        error!("Relayed credit of {} failed: {}", intent.amount, e);
                        stats.failed += 1;
                    }
                },
            }
        }

        info!(
            "Credit worker stopped: {} applied, {} failed",
            stats.applied, stats.failed
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_intent_wire_format() {
        let intent = CreditIntent::credit(Amount::from_str("10.30").unwrap());
        let json = serde_json::to_string(&intent).unwrap();
        assert_eq!(json, r#"{"kind":"credit","amount":"10.30"}"#);

        let back: CreditIntent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, intent);
    }

    #[tokio::test]
    async fn test_submit_after_consumer_dropped_fails() {
        let (relay, inbox) = credit_channel(4);
        drop(inbox);

        let err = relay.submit(Amount::whole(1)).await.unwrap_err();
        assert_eq!(err, RelayError::Closed);
    }

    #[tokio::test]
    async fn test_pending_intents_are_buffered() {
        let (relay, mut inbox) = credit_channel(2);
        relay.submit(Amount::whole(1)).await.unwrap();
        relay.submit(Amount::whole(2)).await.unwrap();
        drop(relay);

        let mut seen = Vec::new();
        while let Some(intent) = inbox.receiver.recv().await {
            seen.push(intent.amount);
        }
        assert_eq!(seen, vec![Amount::whole(1), Amount::whole(2)]);
    }
}

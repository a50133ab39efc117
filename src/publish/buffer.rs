//! Ordered retry queue for undelivered messages

use std::collections::VecDeque;
use std::future::Future;

use super::PendingItem;

/// Summary of one drain pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Delivery attempts made
    pub attempted: usize,
    /// Items delivered and dropped from the buffer
    pub delivered: usize,
    /// Items that failed again and were kept
    pub retained: usize,
}

/// FIFO buffer of messages awaiting delivery
///
/// Unbounded and without deduplication. Insertion order is delivery order.
#[derive(Debug, Default)]
pub struct PendingBuffer {
    items: VecDeque<PendingItem>,
}

impl PendingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item to the tail
    pub fn enqueue(&mut self, item: PendingItem) {
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in delivery order
    pub fn iter(&self) -> impl Iterator<Item = &PendingItem> {
        self.items.iter()
    }

    /// Attempt delivery of every buffered item once, head to tail
    ///
    /// `deliver` takes ownership of each item and hands it back on failure.
    /// Returned items form the new buffer in their original relative order.
    /// An empty buffer makes no attempts.
    pub async fn drain<F, Fut>(&mut self, mut deliver: F) -> DrainReport
    where
        F: FnMut(PendingItem) -> Fut,
        Fut: Future<Output = Result<(), PendingItem>>,
    {
        let mut report = DrainReport::default();
        if self.items.is_empty() {
            return report;
        }

        let current = std::mem::take(&mut self.items);
        let mut retained = VecDeque::with_capacity(current.len());

        for item in current {
            report.attempted += 1;
            match deliver(item).await {
                Ok(()) => report.delivered += 1,
                Err(item) => retained.push_back(item),
            }
        }

        report.retained = retained.len();
        self.items = retained;

        report
    }
}

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use dashmap::DashMap;
use uuid::Uuid;

use crate::{
    entities::export::{DownloadTicket, SavedFile},
    errors::SaveError,
};

/// Where finished exports are handed over to the browser.
pub trait SaveTarget: Send + Sync {
    fn save(&self, file: SavedFile) -> Result<DownloadTicket, SaveError>;

    /// Hands the file out once and releases it.
    fn take(&self, ticket: &DownloadTicket) -> Option<SavedFile>;
}

#[derive(Debug)]
struct PendingDownload {
    file: SavedFile,
    created_at: Instant,
}

/// One-shot in-memory download slots, the server-side stand-in for a
/// browser object URL.
#[derive(Debug, Clone)]
pub struct DownloadSlots {
    slots: Arc<DashMap<Uuid, PendingDownload>>,
    // Reserved before insert, so concurrent saves cannot overshoot capacity.
    reserved: Arc<AtomicUsize>,
    capacity: usize,
}

impl DownloadSlots {
    pub fn new(capacity: usize) -> Self {
        DownloadSlots {
            slots: Arc::new(DashMap::new()),
            reserved: Arc::new(AtomicUsize::new(0)),
            capacity,
        }
    }

    pub fn pending(&self) -> usize {
        self.slots.len()
    }

    /// Drops slots nobody claimed within `max_age`.
    pub fn purge_expired(&self, max_age: Duration) -> usize {
        let mut purged = 0;
        self.slots.retain(|_, pending| {
            let keep = pending.created_at.elapsed() < max_age;
            if !keep {
                purged += 1;
            }
            keep
        });
        self.release(purged);
        purged
    }

    fn try_reserve(&self) -> bool {
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < self.capacity).then_some(n + 1))
            .is_ok()
    }

    fn release(&self, count: usize) {
        if count > 0 {
            self.reserved.fetch_sub(count, Ordering::AcqRel);
        }
    }
}

impl SaveTarget for DownloadSlots {
    fn save(&self, file: SavedFile) -> Result<DownloadTicket, SaveError> {
        if file.bytes.is_empty() {
            return Err(SaveError::EmptyPayload(file.file_name));
        }
        if !self.try_reserve() {
            return Err(SaveError::CapacityExceeded(self.capacity));
        }

        let ticket = DownloadTicket::new();
        self.slots.insert(
            ticket.0,
            PendingDownload {
                file,
                created_at: Instant::now(),
            },
        );

        Ok(ticket)
    }

    fn take(&self, ticket: &DownloadTicket) -> Option<SavedFile> {
        let (_, pending) = self.slots.remove(&ticket.0)?;
        self.release(1);
        Some(pending.file)
    }
}

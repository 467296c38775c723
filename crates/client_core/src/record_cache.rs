#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Dirty,
    Syncing,
    Synced,
    Error(String),
}

/// Snapshot handed out by [`RecordCache::begin_save`].
#[derive(Debug, Clone)]
pub struct SaveTicket<T> {
    revision: u64,
    pub value: T,
}

/// Local copy of one record plus where it stands relative to the store.
#[derive(Debug, Clone)]
pub struct RecordCache<T> {
    value: T,
    status: SyncStatus,
    revision: u64,
    saved_revision: u64,
}

impl<T: Clone> RecordCache<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            status: SyncStatus::Synced,
            revision: 0,
            saved_revision: 0,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// Local edits not yet confirmed by a save.
    pub fn has_unsaved_edits(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub fn edit(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.value);
        self.revision += 1;
        self.status = SyncStatus::Dirty;
    }

    /// Applies a fetched value unless local edits or a save are pending.
    /// Returns whether the value was taken.
    pub fn apply_fetched(&mut self, value: T) -> bool {
        if self.has_unsaved_edits() || self.status == SyncStatus::Syncing {
            return false;
        }
        self.value = value;
        self.status = SyncStatus::Synced;
        true
    }

    pub fn fetch_failed(&mut self, message: impl Into<String>) {
        if !self.has_unsaved_edits() && self.status != SyncStatus::Syncing {
            self.status = SyncStatus::Error(message.into());
        }
    }

    pub fn begin_save(&mut self) -> SaveTicket<T> {
        self.status = SyncStatus::Syncing;
        SaveTicket {
            revision: self.revision,
            value: self.value.clone(),
        }
    }

    /// Confirms a save. Edits made after `ticket` was taken leave the cache dirty.
    pub fn finish_save(&mut self, ticket: SaveTicket<T>, stored: Option<T>) {
        self.saved_revision = ticket.revision;
        if self.revision == ticket.revision {
            if let Some(stored) = stored {
                self.value = stored;
            }
            self.status = SyncStatus::Synced;
        } else {
            self.status = SyncStatus::Dirty;
        }
    }

    /// Records a failed save. The local value is kept for a retry.
    pub fn save_failed(&mut self, message: impl Into<String>) {
        self.status = SyncStatus::Error(message.into());
    }
}

#[cfg(test)]
#[path = "tests/record_cache_tests.rs"]
mod tests;

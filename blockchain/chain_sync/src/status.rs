// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use blocks::TipsetKeys;
use parking_lot::RwLock;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Snapshot of the progress of the current (or last) sync.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncStatus {
    /// Unix time at which the sync started, from the syncer's clock.
    pub syncing_started: u64,
    /// Head declared by the peer being synced toward.
    pub syncing_head: TipsetKeys,
    /// Claimed height of the declared head.
    pub syncing_height: u64,
    /// Whether the declared head was trusted.
    pub syncing_trusted: bool,
    /// False while a sync is in progress.
    pub syncing_complete: bool,
    /// False while the fetch phase is in progress.
    pub syncing_fetch_complete: bool,
    /// Key of the most recently fetched tipset.
    pub fetched_head: TipsetKeys,
    /// Height of the most recently fetched tipset.
    pub fetched_height: u64,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            syncing_started: 0,
            syncing_head: TipsetKeys::default(),
            syncing_height: 0,
            syncing_trusted: false,
            syncing_complete: true,
            syncing_fetch_complete: true,
            fetched_head: TipsetKeys::default(),
            fetched_height: 0,
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "syncing {} height {} complete {} fetched {} height {}",
            self.syncing_head,
            self.syncing_height,
            self.syncing_complete,
            self.fetched_head,
            self.fetched_height
        )
    }
}

/// A single monotone update to the sync status.
#[derive(Clone, Debug)]
pub enum StatusUpdate {
    Started(u64),
    SyncHead(TipsetKeys),
    SyncHeight(u64),
    Trusted(bool),
    Complete(bool),
    FetchComplete(bool),
    FetchHead(TipsetKeys),
    FetchHeight(u64),
}

/// Receives status updates from the syncer and serves the latest snapshot.
pub trait Reporter: Send + Sync {
    /// Applies the given updates to the tracked status.
    fn update_status(&self, updates: &[StatusUpdate]);
    /// Returns the latest status snapshot.
    fn status(&self) -> SyncStatus;
}

/// Default reporter keeping the status in process memory.
#[derive(Debug, Default)]
pub struct SyncStatusReporter {
    status: RwLock<SyncStatus>,
}

impl Reporter for SyncStatusReporter {
    fn update_status(&self, updates: &[StatusUpdate]) {
        let mut status = self.status.write();
        for update in updates {
            match update {
                StatusUpdate::Started(t) => status.syncing_started = *t,
                StatusUpdate::SyncHead(key) => status.syncing_head = key.clone(),
                StatusUpdate::SyncHeight(h) => status.syncing_height = *h,
                StatusUpdate::Trusted(t) => status.syncing_trusted = *t,
                StatusUpdate::Complete(c) => status.syncing_complete = *c,
                StatusUpdate::FetchComplete(c) => status.syncing_fetch_complete = *c,
                StatusUpdate::FetchHead(key) => status.fetched_head = key.clone(),
                StatusUpdate::FetchHeight(h) => status.fetched_height = *h,
            }
        }
    }

    fn status(&self) -> SyncStatus {
        self.status.read().clone()
    }
}

/// Source of wall-clock time for status reporting.
pub trait Clock: Send + Sync {
    /// Returns the current time in seconds since the Unix epoch.
    fn now_unix(&self) -> u64;
}

/// System time backed clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Retrieved system time before UNIX epoch")
            .as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_updates_in_order() {
        let reporter = SyncStatusReporter::default();
        assert!(reporter.status().syncing_complete);

        reporter.update_status(&[
            StatusUpdate::Started(77),
            StatusUpdate::SyncHeight(5),
            StatusUpdate::Trusted(true),
            StatusUpdate::Complete(false),
        ]);
        let status = reporter.status();
        assert_eq!(status.syncing_started, 77);
        assert_eq!(status.syncing_height, 5);
        assert!(status.syncing_trusted);
        assert!(!status.syncing_complete);

        reporter.update_status(&[StatusUpdate::Complete(true)]);
        assert!(reporter.status().syncing_complete);
    }

    #[test]
    fn tracks_fetch_progress() {
        let reporter = SyncStatusReporter::default();
        reporter.update_status(&[
            StatusUpdate::FetchComplete(false),
            StatusUpdate::FetchHeight(9),
        ]);
        let status = reporter.status();
        assert!(!status.syncing_fetch_complete);
        assert_eq!(status.fetched_height, 9);
    }
}

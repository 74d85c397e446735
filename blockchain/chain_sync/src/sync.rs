// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::bad_tipset_cache::BadTipsetCache;
use super::status::{Clock, Reporter, StatusUpdate, SyncStatus};
use super::Error;
use async_std::sync::Mutex;
use blocks::{Block, ChainInfo, Tipset};
use chain::{
    find_common_ancestor, get_recent_ancestors, is_reorg, iter_ancestors, reorg_diff,
    ChainSelector, ChainStore, Fetcher, MessageProvider, StateEvaluator, TipsetMetadata,
};
use cid::Cid;
use db::Store;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Maximum number of blocks ahead of the current chain height to accept when
/// syncing a head declared by an untrusted peer.
pub const UNTRUSTED_CHAIN_HEIGHT_LIMIT: u64 = 600;

/// Number of rounds of ancestors the state evaluator needs to process a
/// tipset: the proving period plus the challenge window.
pub const ANCESTOR_ROUNDS_NEEDED: u64 = 450;

/// Returns true if the delta between `cur_height` and `new_height` exceeds
/// the maximum number of blocks to accept when syncing without trust.
pub fn exceeds_untrusted_chain_length(cur_height: u64, new_height: u64) -> bool {
    new_height > cur_height + UNTRUSTED_CHAIN_HEIGHT_LIMIT
}

/// Counters observed by the syncer, injected rather than process-global.
#[derive(Debug, Default)]
pub struct SyncMetrics {
    reorg_count: AtomicU64,
}

impl SyncMetrics {
    /// Number of reorgs the syncer has performed.
    pub fn reorg_count(&self) -> u64 {
        self.reorg_count.load(Ordering::Relaxed)
    }

    fn inc_reorg_count(&self) {
        self.reorg_count.fetch_add(1, Ordering::Relaxed);
    }
}

/// Syncs the chain store toward heads declared by peers.
///
/// The syncer fetches the chain segment between a declared head and the
/// first known ancestor, validates each tipset in height order against the
/// state evaluator, records every valid tipset with its post-state in the
/// chain store, and advances the head whenever the chain selector finds a
/// validated tipset heavier than the current head. Invalid tipsets and the
/// descendants observed with them are remembered in a bounded cache so
/// repeated offers of a bad chain are rejected cheaply.
pub struct ChainSyncer<DB, E, S, M, F, R, C> {
    // Serializes calls to `handle_new_tipset` for the full duration of the
    // sync, fetch included. `sync_one` assumes the head is stable between
    // the weight comparison and the head update, and `widen` assumes no
    // concurrent sibling discovery.
    lock: Mutex<()>,

    // Caches invalid tipsets and their observed descendants.
    bad_tipsets: BadTipsetCache,

    // Evaluates tipset messages to produce post-states.
    evaluator: E,

    // Selects the heavier of two chains.
    selector: S,

    // Provides and stores validated tipsets and their state roots.
    chain_store: Arc<ChainStore<DB>>,

    // Provides message collections given their list cids.
    message_provider: M,

    // Networked block fetching service.
    fetcher: F,

    // Receives progress updates for the current sync.
    reporter: R,

    clock: C,

    metrics: SyncMetrics,
}

impl<DB, E, S, M, F, R, C> ChainSyncer<DB, E, S, M, F, R, C>
where
    DB: Store + Send + Sync,
    E: StateEvaluator,
    S: ChainSelector,
    M: MessageProvider,
    F: Fetcher,
    R: Reporter,
    C: Clock,
{
    /// Constructs a syncer ready for use.
    pub fn new(
        evaluator: E,
        selector: S,
        chain_store: Arc<ChainStore<DB>>,
        message_provider: M,
        fetcher: F,
        reporter: R,
        clock: C,
    ) -> Self {
        Self {
            lock: Mutex::new(()),
            bad_tipsets: BadTipsetCache::default(),
            evaluator,
            selector,
            chain_store,
            message_provider,
            fetcher,
            reporter,
            clock,
            metrics: SyncMetrics::default(),
        }
    }

    /// Returns the latest sync status snapshot.
    pub fn status(&self) -> SyncStatus {
        self.reporter.status()
    }

    /// Returns the syncer's counters.
    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    /// Returns the cache of tipsets known to be invalid.
    pub fn bad_tipsets(&self) -> &BadTipsetCache {
        &self.bad_tipsets
    }

    /// Extends the chain store with the declared head if it represents a
    /// valid extension, advancing the head when a heavier tipset is found.
    ///
    /// Completes once the head is either integrated or rejected. At most one
    /// call executes at a time; the serializing lock is held across the
    /// whole fetch and validation.
    pub async fn handle_new_tipset(&self, ci: &ChainInfo, trusted: bool) -> Result<(), Error> {
        debug!("begin fetch and sync of chain with head {}", ci.head);
        let _guard = self.lock.lock().await;

        // If the store already has this tipset the sync is finished.
        if self.chain_store.has_tipset_and_state(&ci.head) {
            return Ok(());
        }
        if self.bad_tipsets.has(&ci.head) {
            return Err(Error::BadTipset);
        }

        let cur_head = self.chain_store.head_tipset()?;

        self.reporter.update_status(&[
            StatusUpdate::Started(self.clock.now_unix()),
            StatusUpdate::SyncHead(ci.head.clone()),
            StatusUpdate::SyncHeight(ci.height),
            StatusUpdate::Trusted(trusted),
            StatusUpdate::Complete(false),
        ]);
        let result = self.fetch_and_sync(ci, trusted, &cur_head).await;
        self.reporter.update_status(&[StatusUpdate::Complete(true)]);
        result
    }

    async fn fetch_and_sync(
        &self,
        ci: &ChainInfo,
        trusted: bool,
        cur_head: &Tipset,
    ) -> Result<(), Error> {
        // If the peer head is not trusted, check finality.
        if !trusted && exceeds_untrusted_chain_length(cur_head.height(), ci.height) {
            return Err(Error::ChainTooLong);
        }

        self.reporter
            .update_status(&[StatusUpdate::FetchComplete(false)]);
        let fetched = self
            .fetcher
            .fetch_tipsets(&ci.head, &ci.peer, &|ts: &Tipset| {
                self.reporter.update_status(&[
                    StatusUpdate::FetchHead(ts.key().clone()),
                    StatusUpdate::FetchHeight(ts.height()),
                ]);
                Ok(self.chain_store.has_tipset_and_state(ts.parents()))
            })
            .await;
        self.reporter
            .update_status(&[StatusUpdate::FetchComplete(true)]);

        // The fetcher returns the chain in traversal order, reverse it to
        // height order.
        let mut chain = fetched?;
        chain.reverse();

        let first = chain
            .first()
            .ok_or_else(|| Error::Other("fetcher returned an empty chain".to_string()))?;
        let (mut parent, mut grand_parent) = self.ancestors_from_store(first)?;

        // Try adding the tipsets of the chain to the store, checking for new
        // heaviest tipsets.
        for i in 0..chain.len() {
            let ts = &chain[i];
            if self.bad_tipsets.has(ts.key()) {
                // Everything after a bad tipset descends from it.
                self.bad_tipsets.add_chain(&chain[i..]);
                return Err(Error::BadTipset);
            }

            let mut widened = None;
            if i == 0 {
                widened = self.widen(ts)?;
                if let Some(wts) = &widened {
                    debug!("attempt to sync after widen");
                    if let Err(e) = self.sync_one(grand_parent.as_ref(), &parent, wts) {
                        self.bad_tipsets.add_chain(&chain[i..]);
                        return Err(e);
                    }
                }
            }
            // If the chain is longer than one tipset each of its tipsets
            // must be synced to process the chain fully, including the
            // non-widened first tipset. A chain of exactly one tipset can
            // skip the non-widened tipset when widening succeeded, because
            // it cannot be heavier than its widened superset.
            if widened.is_none() || chain.len() > 1 {
                if let Err(e) = self.sync_one(grand_parent.as_ref(), &parent, ts) {
                    // `sync_one` can fail for reasons other than consensus,
                    // but poisoning the remainder here keeps the cache
                    // simple while the chain is at hand.
                    self.bad_tipsets.add_chain(&chain[i..]);
                    return Err(e);
                }
            }
            if i % 500 == 0 {
                info!(
                    "processing tipset {} of {} for chain with head at {}",
                    i,
                    chain.len(),
                    ci.head
                );
            }
            grand_parent = Some(parent);
            parent = ts.clone();
        }
        Ok(())
    }

    /// Syncs a single tipset with the chain store: computes the parent state
    /// of the tipset, runs the state transition to validate it, records the
    /// result, and moves the head if the tipset is the heaviest seen.
    ///
    /// The caller must hold the syncer lock so the head is not moved by
    /// anyone else between the weight comparison and the update.
    fn sync_one(
        &self,
        grand_parent: Option<&Tipset>,
        parent: &Tipset,
        next: &Tipset,
    ) -> Result<(), Error> {
        let prior_head_key = self.chain_store.get_head();

        // If the tipset is already the head, we've been here before.
        if prior_head_key == *next.key() {
            return Ok(());
        }

        // Lookup the parent state root; the syncer guarantees the parent is
        // in the store.
        let parent_state_root = self.chain_store.get_tipset_state_root(parent.key())?;

        // Gather the ancestor chain needed to process the state transition.
        let ancestor_height = next.height().saturating_sub(ANCESTOR_ROUNDS_NEEDED);
        let ancestors = get_recent_ancestors(
            parent.clone(),
            self.chain_store.as_ref(),
            ancestor_height,
        )?;

        // Gather tipset messages, one list per block in canonical order.
        let mut next_messages = Vec::with_capacity(next.len());
        let mut next_receipts = Vec::with_capacity(next.len());
        for blk in next.blocks() {
            let msgs = self.message_provider.load_messages(blk.messages())?;
            let receipts = self.message_provider.load_receipts(blk.message_receipts())?;
            next_messages.push(msgs);
            next_receipts.push(receipts);
        }

        let parent_weight = self.calculate_parent_weight(parent, grand_parent)?;

        // Run a state transition to validate the tipset and compute a new
        // state to add to the store.
        let root = self.evaluator.run_state_transition(
            next,
            &next_messages,
            &next_receipts,
            &ancestors,
            parent_weight,
            &parent_state_root,
        )?;
        self.chain_store.put_tipset_and_state(TipsetMetadata {
            tipset: next.clone(),
            tipset_state_root: root,
        })?;
        debug!("successfully updated store with {}", next.key());

        // The tipset is validated and recorded, now check if it is the
        // heaviest.
        let next_parent_state = self.chain_store.get_tipset_state_root(parent.key())?;
        let head_tipset = self.chain_store.get_tipset(&prior_head_key)?;
        let head_parent_state = if head_tipset.parents().is_empty() {
            // head is genesis
            None
        } else {
            Some(
                self.chain_store
                    .get_tipset_state_root(head_tipset.parents())?,
            )
        };

        let heavier = self.selector.is_heavier(
            next,
            &head_tipset,
            Some(&next_parent_state),
            head_parent_state.as_ref(),
        )?;

        if heavier {
            self.chain_store.set_head(next)?;
            self.log_reorg(&head_tipset, next);
        }

        Ok(())
    }

    fn calculate_parent_weight(
        &self,
        parent: &Tipset,
        grand_parent: Option<&Tipset>,
    ) -> Result<u64, Error> {
        let weight = match grand_parent {
            None => self.selector.new_weight(parent, None)?,
            Some(gp) => {
                let gp_state_root = self.chain_store.get_tipset_state_root(gp.key())?;
                self.selector.new_weight(parent, Some(&gp_state_root))?
            }
        };
        Ok(weight)
    }

    // Returns the parent and grandparent tipsets of `ts` from the store. The
    // grandparent is `None` when the parent is genesis.
    fn ancestors_from_store(&self, ts: &Tipset) -> Result<(Tipset, Option<Tipset>), Error> {
        let parent = self.chain_store.get_tipset(ts.parents())?;
        if parent.parents().is_empty() {
            return Ok((parent, None));
        }
        let grand_parent = self.chain_store.get_tipset(parent.parents())?;
        Ok((parent, Some(grand_parent)))
    }

    fn log_reorg(&self, cur_head: &Tipset, new_head: &Tipset) {
        let cur_head_iter = iter_ancestors(self.chain_store.as_ref(), cur_head.clone());
        let new_head_iter = iter_ancestors(self.chain_store.as_ref(), new_head.clone());
        let common_ancestor = match find_common_ancestor(cur_head_iter, new_head_iter) {
            Ok(common) => common,
            Err(e) => {
                // Reorgs should always have a common ancestor given a shared
                // genesis.
                warn!(
                    "unexpected error finding common ancestor for reorg log: {}",
                    e
                );
                return;
            }
        };

        if is_reorg(cur_head, &common_ancestor) {
            self.metrics.inc_reorg_count();
            match reorg_diff(cur_head, new_head, &common_ancestor) {
                Ok((dropped, added)) => info!(
                    "reorg dropping {} height and adding {} height from {} to {}",
                    dropped,
                    added,
                    cur_head.key(),
                    new_head.key()
                ),
                Err(e) => {
                    info!("reorg from {} to {}", cur_head.key(), new_head.key());
                    error!("unexpected error from reorg diff during log: {}", e);
                }
            }
        }
    }

    /// Computes a tipset implied by `ts` and the store that could be heavier
    /// than `ts` itself: the union of `ts` with the biggest recorded tipset
    /// sharing its parents and height. Returns `None` when the store holds
    /// no sibling blocks beyond those already in `ts`.
    fn widen(&self, ts: &Tipset) -> Result<Option<Tipset>, Error> {
        // Lookup tipsets with the same parents and height from the store.
        if !self
            .chain_store
            .has_tipsets_with_parents_and_height(ts.parents(), ts.height())
        {
            return Ok(None);
        }
        let candidates = self
            .chain_store
            .get_tipsets_by_parents_and_height(ts.parents(), ts.height());
        let mut candidates = candidates.iter().map(|meta| &meta.tipset);
        let mut max = match candidates.next() {
            Some(ts) => ts,
            None => return Ok(None),
        };
        // Take the candidate with the most blocks, ties broken toward the
        // lowest block CID.
        for candidate in candidates {
            if candidate.len() > max.len()
                || (candidate.len() == max.len() && candidate.cids() < max.cids())
            {
                max = candidate;
            }
        }

        // Form a new tipset from the union of `ts` and the largest sibling,
        // de-duplicated by block CID.
        let mut union: Vec<Block> = ts.blocks().to_vec();
        let mut seen: HashSet<Cid> = union.iter().map(|blk| *blk.cid()).collect();
        for blk in max.blocks() {
            if seen.insert(*blk.cid()) {
                union.push(blk.clone());
            }
        }
        let widened = Tipset::new(union)?;

        // The union carries new information only if it is distinct from both
        // inputs.
        if widened.key() == ts.key() || widened.key() == max.key() {
            return Ok(None);
        }
        Ok(Some(widened))
    }
}

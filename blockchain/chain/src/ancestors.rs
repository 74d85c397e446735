// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::{Error, TipsetProvider};
use blocks::Tipset;
use std::cmp::Ordering;

/// A lazy finite walk from a tipset back through its ancestors, ending after
/// genesis (whose parent is undefined). Each step fetches the parent tipset
/// from the provider.
pub struct AncestorIterator<'a, P> {
    provider: &'a P,
    value: Option<Tipset>,
}

/// Starts an ancestor walk at `start`.
pub fn iter_ancestors<P: TipsetProvider>(provider: &P, start: Tipset) -> AncestorIterator<'_, P> {
    AncestorIterator {
        provider,
        value: Some(start),
    }
}

impl<'a, P> AncestorIterator<'a, P>
where
    P: TipsetProvider,
{
    /// Returns the tipset the iterator currently rests on, or `None` once
    /// the walk has moved past genesis.
    pub fn value(&self) -> Option<&Tipset> {
        self.value.as_ref()
    }

    /// Returns true once the walk has moved past genesis.
    pub fn complete(&self) -> bool {
        self.value.is_none()
    }

    /// Moves the iterator to the parent of the current tipset. Advancing a
    /// completed iterator is a no-op.
    pub fn advance(&mut self) -> Result<(), Error> {
        let next = match &self.value {
            Some(ts) if !ts.parents().is_empty() => Some(self.provider.get_tipset(ts.parents())?),
            _ => None,
        };
        self.value = next;
        Ok(())
    }
}

/// Finds the common ancestor of the chains ending in the tipsets the two
/// iterators start on. The higher iterator is advanced until the heights
/// match, then both advance in lockstep until their keys agree. Fails with
/// [`Error::NoCommonAncestor`] if either chain is exhausted first.
pub fn find_common_ancestor<PA, PB>(
    mut old_head: AncestorIterator<'_, PA>,
    mut new_head: AncestorIterator<'_, PB>,
) -> Result<Tipset, Error>
where
    PA: TipsetProvider,
    PB: TipsetProvider,
{
    loop {
        let (old_height, new_height, keys_match) = match (old_head.value(), new_head.value()) {
            (Some(old), Some(new)) => (old.height(), new.height(), old.key() == new.key()),
            _ => return Err(Error::NoCommonAncestor),
        };

        match old_height.cmp(&new_height) {
            Ordering::Greater => old_head.advance()?,
            Ordering::Less => new_head.advance()?,
            Ordering::Equal => {
                if keys_match {
                    return old_head.value().cloned().ok_or(Error::NoCommonAncestor);
                }
                old_head.advance()?;
                new_head.advance()?;
            }
        }
    }
}

/// Returns true if moving the head from `old_head` to a new head whose
/// common ancestor with `old_head` is `common_ancestor` abandons part of the
/// old chain, i.e. the new head does not simply extend the old one.
pub fn is_reorg(old_head: &Tipset, common_ancestor: &Tipset) -> bool {
    old_head.key() != common_ancestor.key()
}

/// Returns the number of heights dropped from the old chain and added by the
/// new chain relative to their common ancestor.
pub fn reorg_diff(
    old_head: &Tipset,
    new_head: &Tipset,
    common_ancestor: &Tipset,
) -> Result<(u64, u64), Error> {
    let dropped = old_head
        .height()
        .checked_sub(common_ancestor.height())
        .ok_or_else(|| {
            Error::UnexpectedState("common ancestor is above the old head".to_string())
        })?;
    let added = new_head
        .height()
        .checked_sub(common_ancestor.height())
        .ok_or_else(|| {
            Error::UnexpectedState("common ancestor is above the new head".to_string())
        })?;
    Ok((dropped, added))
}

/// Collects `base` and its ancestors down to the first tipset whose height
/// is below `min_height`. Used to gather the recent rounds the state
/// evaluator needs.
pub fn get_recent_ancestors<P>(
    base: Tipset,
    provider: &P,
    min_height: u64,
) -> Result<Vec<Tipset>, Error>
where
    P: TipsetProvider,
{
    let mut ancestors = Vec::new();
    let mut it = iter_ancestors(provider, base);
    while let Some(ts) = it.value() {
        if ts.height() < min_height {
            break;
        }
        ancestors.push(ts.clone());
        it.advance()?;
    }
    Ok(ancestors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use address::Address;
    use blocks::{Block, Ticket, TipsetKeys};
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapProvider {
        tipsets: HashMap<TipsetKeys, Tipset>,
        seq: u64,
    }

    impl TipsetProvider for MapProvider {
        fn get_tipset(&self, key: &TipsetKeys) -> Result<Tipset, Error> {
            self.tipsets
                .get(key)
                .cloned()
                .ok_or_else(|| Error::UndefinedKey(key.to_string()))
        }
    }

    impl MapProvider {
        fn append(&mut self, parent: Option<&Tipset>, height_gap: u64) -> Tipset {
            let seq = self.seq;
            self.seq += 1;
            let (parents, height, weight) = match parent {
                Some(p) => (
                    p.key().clone(),
                    p.height() + height_gap,
                    p.parent_weight() + p.len() as u64,
                ),
                None => (TipsetKeys::default(), 0, 0),
            };
            let blk = Block::builder()
                .miner(Address::new_id(0))
                .ticket(Ticket::new(seq.to_be_bytes().to_vec()))
                .parents(parents)
                .parent_weight(weight)
                .height(height)
                .build_and_validate()
                .unwrap();
            let ts = Tipset::new(vec![blk]).unwrap();
            self.tipsets.insert(ts.key().clone(), ts.clone());
            ts
        }
    }

    #[test]
    fn iterates_to_genesis() {
        let mut provider = MapProvider::default();
        let genesis = provider.append(None, 0);
        let a = provider.append(Some(&genesis), 1);
        let b = provider.append(Some(&a), 1);

        let mut it = iter_ancestors(&provider, b.clone());
        assert_eq!(it.value(), Some(&b));
        it.advance().unwrap();
        assert_eq!(it.value(), Some(&a));
        it.advance().unwrap();
        assert_eq!(it.value(), Some(&genesis));
        it.advance().unwrap();
        assert!(it.complete());
        // advancing a complete iterator stays complete
        it.advance().unwrap();
        assert!(it.complete());
    }

    #[test]
    fn common_ancestor_of_fork_is_fork_point() {
        let mut provider = MapProvider::default();
        let genesis = provider.append(None, 0);
        let base = provider.append(Some(&genesis), 1);
        let left = provider.append(Some(&base), 1);
        let left_head = provider.append(Some(&left), 1);
        let right_head = provider.append(Some(&base), 1);

        let common = find_common_ancestor(
            iter_ancestors(&provider, left_head.clone()),
            iter_ancestors(&provider, right_head.clone()),
        )
        .unwrap();
        assert_eq!(common, base);
        assert!(is_reorg(&left_head, &common));
        assert_eq!(reorg_diff(&left_head, &right_head, &common).unwrap(), (2, 1));
    }

    #[test]
    fn extension_is_not_a_reorg() {
        let mut provider = MapProvider::default();
        let genesis = provider.append(None, 0);
        let a = provider.append(Some(&genesis), 1);
        let b = provider.append(Some(&a), 1);

        let common = find_common_ancestor(
            iter_ancestors(&provider, a.clone()),
            iter_ancestors(&provider, b.clone()),
        )
        .unwrap();
        assert_eq!(common, a);
        assert!(!is_reorg(&a, &common));
        assert_eq!(reorg_diff(&a, &b, &common).unwrap(), (0, 1));
    }

    #[test]
    fn skips_null_rounds_when_aligning_heights() {
        let mut provider = MapProvider::default();
        let genesis = provider.append(None, 0);
        let base = provider.append(Some(&genesis), 1);
        // left chain jumps several heights in one step
        let left_head = provider.append(Some(&base), 5);
        let right = provider.append(Some(&base), 1);
        let right_head = provider.append(Some(&right), 1);

        let common = find_common_ancestor(
            iter_ancestors(&provider, left_head),
            iter_ancestors(&provider, right_head),
        )
        .unwrap();
        assert_eq!(common, base);
    }

    #[test]
    fn disjoint_chains_have_no_common_ancestor() {
        let mut provider = MapProvider::default();
        let genesis_a = provider.append(None, 0);
        let head_a = provider.append(Some(&genesis_a), 1);
        let genesis_b = provider.append(None, 0);
        let head_b = provider.append(Some(&genesis_b), 1);

        let err = find_common_ancestor(
            iter_ancestors(&provider, head_a),
            iter_ancestors(&provider, head_b),
        )
        .unwrap_err();
        assert_eq!(err, Error::NoCommonAncestor);
    }

    #[test]
    fn recent_ancestors_bounded_by_height() {
        let mut provider = MapProvider::default();
        let genesis = provider.append(None, 0);
        let mut tipsets = vec![genesis.clone()];
        for _ in 0..5 {
            let next = provider.append(Some(tipsets.last().unwrap()), 1);
            tipsets.push(next);
        }

        let ancestors = get_recent_ancestors(tipsets[5].clone(), &provider, 3).unwrap();
        assert_eq!(ancestors.len(), 3);
        assert_eq!(ancestors[0], tipsets[5]);
        assert_eq!(ancestors[2], tipsets[3]);

        // a bound of zero walks all the way to genesis
        let all = get_recent_ancestors(tipsets[5].clone(), &provider, 0).unwrap();
        assert_eq!(all.len(), 6);
    }
}

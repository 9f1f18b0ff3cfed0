//! Which engine bodies are live monsters and which are walls
//!
//! Iteration is ordered by handle so anything walking the registry stays
//! deterministic.

use std::collections::{BTreeMap, BTreeSet};

use super::tiers::Tier;
use super::world::BodyHandle;

/// How a live piece entered the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Dropped by the player
    Dropped,
    /// Produced by a merge
    Merged,
}

/// Registry record of a live piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceEntry {
    pub tier: Tier,
    pub origin: Origin,
}

/// Live pieces and static boundary bodies, keyed by engine handle
#[derive(Debug, Clone, Default)]
pub struct BodyRegistry {
    pieces: BTreeMap<BodyHandle, PieceEntry>,
    statics: BTreeSet<BodyHandle>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_static(&mut self, handle: BodyHandle) {
        debug_assert!(!self.pieces.contains_key(&handle));
        self.statics.insert(handle);
    }

    pub fn register_piece(&mut self, handle: BodyHandle, tier: Tier, origin: Origin) {
        debug_assert!(!self.statics.contains(&handle));
        self.pieces.insert(handle, PieceEntry { tier, origin });
    }

    /// Tier of a live piece; `None` for walls and unknown handles
    pub fn tier_of(&self, handle: BodyHandle) -> Option<Tier> {
        self.pieces.get(&handle).map(|p| p.tier)
    }

    pub fn entry(&self, handle: BodyHandle) -> Option<&PieceEntry> {
        self.pieces.get(&handle)
    }

    pub fn is_static(&self, handle: BodyHandle) -> bool {
        self.statics.contains(&handle)
    }

    pub fn is_live(&self, handle: BodyHandle) -> bool {
        self.pieces.contains_key(&handle)
    }

    /// Swap two merged-away pieces for their product in one step
    ///
    /// Returns false (and changes nothing) unless both sources are live.
    pub fn replace_pair(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
        merged: BodyHandle,
        tier: Tier,
    ) -> bool {
        if a == b || !self.is_live(a) || !self.is_live(b) {
            return false;
        }
        self.pieces.remove(&a);
        self.pieces.remove(&b);
        self.pieces.insert(
            merged,
            PieceEntry {
                tier,
                origin: Origin::Merged,
            },
        );
        true
    }

    /// Drop every piece record, returning the handles that were live
    pub fn clear_pieces(&mut self) -> Vec<BodyHandle> {
        let handles = self.pieces.keys().copied().collect();
        self.pieces.clear();
        handles
    }

    /// Live pieces, ordered by handle
    pub fn pieces(&self) -> impl Iterator<Item = (BodyHandle, &PieceEntry)> {
        self.pieces.iter().map(|(h, p)| (*h, p))
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    pub fn static_count(&self) -> usize {
        self.statics.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(rank: u8) -> Tier {
        Tier::new(rank).unwrap()
    }

    #[test]
    fn test_static_vs_piece() {
        let mut reg = BodyRegistry::new();
        reg.register_static(BodyHandle(1));
        reg.register_piece(BodyHandle(2), t(3), Origin::Dropped);

        assert!(reg.is_static(BodyHandle(1)));
        assert!(!reg.is_live(BodyHandle(1)));
        assert_eq!(reg.tier_of(BodyHandle(1)), None);
        assert_eq!(reg.tier_of(BodyHandle(2)), Some(t(3)));
        assert_eq!(reg.tier_of(BodyHandle(9)), None);
    }

    #[test]
    fn test_replace_pair() {
        let mut reg = BodyRegistry::new();
        reg.register_piece(BodyHandle(1), t(1), Origin::Dropped);
        reg.register_piece(BodyHandle(2), t(1), Origin::Dropped);

        assert!(reg.replace_pair(BodyHandle(1), BodyHandle(2), BodyHandle(3), t(2)));
        assert_eq!(reg.piece_count(), 1);
        assert_eq!(
            reg.entry(BodyHandle(3)),
            Some(&PieceEntry {
                tier: t(2),
                origin: Origin::Merged
            })
        );

        // Sources already gone: nothing changes
        assert!(!reg.replace_pair(BodyHandle(1), BodyHandle(3), BodyHandle(4), t(3)));
        assert_eq!(reg.piece_count(), 1);
        assert!(!reg.is_live(BodyHandle(4)));
    }

    #[test]
    fn test_replace_pair_same_handle() {
        let mut reg = BodyRegistry::new();
        reg.register_piece(BodyHandle(1), t(1), Origin::Dropped);
        assert!(!reg.replace_pair(BodyHandle(1), BodyHandle(1), BodyHandle(2), t(2)));
        assert!(reg.is_live(BodyHandle(1)));
    }

    #[test]
    fn test_clear_pieces_keeps_walls() {
        let mut reg = BodyRegistry::new();
        reg.register_static(BodyHandle(1));
        reg.register_piece(BodyHandle(2), t(1), Origin::Dropped);
        reg.register_piece(BodyHandle(3), t(1), Origin::Merged);
        assert!(reg.pieces().all(|(_, entry)| entry.tier == t(1)));

        let cleared = reg.clear_pieces();
        assert_eq!(cleared, vec![BodyHandle(2), BodyHandle(3)]);
        assert_eq!(reg.piece_count(), 0);
        assert_eq!(reg.static_count(), 1);
    }
}

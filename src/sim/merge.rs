//! Collision/merge resolver
//!
//! Consumes one collision-start batch at a time. Pairs are handled in the
//! order the engine reported them; a body consumed by an earlier merge in the
//! same batch is skipped for the rest of it, so chained pairs resolve
//! deterministically with the first pair winning.

use std::collections::HashSet;

use glam::Vec2;

use super::registry::BodyRegistry;
use super::tiers::Tier;
use super::world::{BodyHandle, CollisionPair, PhysicsWorld, PieceSpawn};

/// One resolved merge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeEvent {
    /// The two pieces that fused
    pub consumed: [BodyHandle; 2],
    /// The new piece
    pub spawned: BodyHandle,
    /// Tier of the new piece
    pub tier: Tier,
    /// Midpoint of the sources, where the new piece appears
    pub position: Vec2,
    /// Score award (the new tier's value)
    pub points: u64,
}

/// Why a pair did not merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    SameBody,
    Wall,
    /// Handle the registry does not know
    NotAPiece,
    /// Already fused earlier in this batch
    Consumed,
    TierMismatch,
    /// Top tier has nowhere to go
    TopTier,
}

/// Decide whether a pair qualifies, returning the shared tier
fn qualify(
    pair: &CollisionPair,
    registry: &BodyRegistry,
    consumed: &HashSet<BodyHandle>,
) -> Result<Tier, Skip> {
    if pair.a == pair.b {
        return Err(Skip::SameBody);
    }
    if registry.is_static(pair.a) || registry.is_static(pair.b) {
        return Err(Skip::Wall);
    }
    if consumed.contains(&pair.a) || consumed.contains(&pair.b) {
        return Err(Skip::Consumed);
    }
    let (Some(tier_a), Some(tier_b)) = (registry.tier_of(pair.a), registry.tier_of(pair.b)) else {
        return Err(Skip::NotAPiece);
    };
    if tier_a != tier_b {
        return Err(Skip::TierMismatch);
    }
    if tier_a.is_top() {
        return Err(Skip::TopTier);
    }
    Ok(tier_a)
}

/// Resolve a collision batch
///
/// Every qualifying pair is replaced by exactly one body of the next tier at
/// the midpoint. World and registry are updated pair by pair, so the two
/// sources and their product never coexist in the registry.
pub fn resolve_collisions<W: PhysicsWorld + ?Sized>(
    pairs: &[CollisionPair],
    world: &mut W,
    registry: &mut BodyRegistry,
) -> Vec<MergeEvent> {
    let mut consumed = HashSet::new();
    let mut events = Vec::new();

    for pair in pairs {
        let tier = match qualify(pair, registry, &consumed) {
            Ok(tier) => tier,
            Err(skip) => {
                log::trace!("Pair {:?}/{:?} skipped: {:?}", pair.a, pair.b, skip);
                continue;
            }
        };

        let bodies = (world.body(pair.a), world.body(pair.b));
        debug_assert!(
            bodies.0.is_some() && bodies.1.is_some(),
            "registry holds bodies the world does not"
        );
        let (Some(body_a), Some(body_b)) = bodies else {
            log::error!(
                "Live pieces {:?}/{:?} missing from the world, pair skipped",
                pair.a,
                pair.b
            );
            continue;
        };

        let Some(next) = tier.successor() else {
            continue;
        };
        let spec = next.spec();
        let position = (body_a.position + body_b.position) / 2.0;

        world.remove_bodies(&[pair.a, pair.b]);
        let spawned = world.add_piece(PieceSpawn {
            position,
            radius: spec.radius,
            tier: next,
            material: None,
        });
        let replaced = registry.replace_pair(pair.a, pair.b, spawned, next);
        debug_assert!(replaced, "qualified pair was not live in the registry");
        consumed.insert(pair.a);
        consumed.insert(pair.b);

        log::debug!(
            "Merged {:?}+{:?} into {} at ({:.1}, {:.1})",
            pair.a,
            pair.b,
            next,
            position.x,
            position.y
        );
        events.push(MergeEvent {
            consumed: [pair.a, pair.b],
            spawned,
            tier: next,
            position,
            points: spec.score,
        });
    }

    events
}

//! Drop controller
//!
//! Decides when a new piece may enter the world and where. The in-flight flag
//! in [`GameState`] is the only gate: it is set by [`DropController::drop`]
//! and cleared by [`DropController::prepare_next`], which always runs from a
//! timer scheduled by that same drop. Between the two no second drop can pass.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::registry::{BodyRegistry, Origin};
use super::settle;
use super::state::{GameState, PendingDrop};
use super::tiers::{TIER_COUNT, Tier};
use super::timers::{Scheduler, TimerId, TimerTask};
use super::world::{BodyHandle, Material, PhysicsWorld, PieceSpawn};
use crate::clamp_to_container;
use crate::consts::{DROP_FRICTION, DROP_RESTITUTION};
use crate::platform::ContainerRect;
use crate::tuning::Tuning;

/// Uniform pick among the first `pool` tiers
pub fn choose_initial_tier<R: Rng>(rng: &mut R, pool: u8) -> Tier {
    let pool = pool.clamp(1, TIER_COUNT as u8);
    Tier::new(rng.random_range(1..=pool)).unwrap_or(Tier::FIRST)
}

/// A piece that just entered the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DroppedPiece {
    pub handle: BodyHandle,
    pub tier: Tier,
    pub position: Vec2,
}

/// Pending-piece queue, aiming and the hold-to-drop timer slot
#[derive(Debug)]
pub struct DropController {
    container: ContainerRect,
    rng: Pcg32,
    /// Where the hanging piece is held, container-local
    aim_x: f32,
    /// The one outstanding continuous-drop timer
    continuous_timer: Option<TimerId>,
}

impl DropController {
    pub fn new(seed: u64, container: ContainerRect) -> Self {
        Self {
            container,
            rng: Pcg32::seed_from_u64(seed),
            aim_x: container.width / 2.0,
            continuous_timer: None,
        }
    }

    pub fn container(&self) -> &ContainerRect {
        &self.container
    }

    /// Next tier from the session RNG
    pub fn draw_tier(&mut self, tuning: &Tuning) -> Tier {
        choose_initial_tier(&mut self.rng, tuning.initial_tier_pool)
    }

    /// Promote the queued tier to the hanging piece and queue a fresh one
    ///
    /// Does nothing after game over. Clears the in-flight flag.
    pub fn prepare_next(&mut self, state: &mut GameState, tuning: &Tuning) -> Option<PendingDrop> {
        if state.game_over {
            return None;
        }

        let tier = state.next_tier;
        state.next_tier = self.draw_tier(tuning);

        // The hanging spot stays put, nudged inward if the new piece is wider
        self.aim_x = clamp_to_container(self.aim_x, tier.spec().radius, self.container.width);
        let pending = PendingDrop {
            tier,
            target_x: self.aim_x,
        };
        state.pending = Some(pending);
        state.drop_in_flight = false;
        Some(pending)
    }

    /// Aim the hanging piece at a client x
    ///
    /// Returns the clamped container-local x, or `None` when aiming is not
    /// allowed (in flight, nothing hanging, game over).
    pub fn set_target_x(&mut self, state: &mut GameState, client_x: f32) -> Option<f32> {
        if state.drop_in_flight || state.game_over {
            return None;
        }
        let pending = state.pending.as_mut()?;

        let local_x = self.container.to_local_x(client_x);
        let x = clamp_to_container(local_x, pending.spec().radius, self.container.width);
        pending.target_x = x;
        self.aim_x = x;
        Some(x)
    }

    /// Commit the hanging piece to the world
    ///
    /// Silently refused while a drop is in flight, with nothing hanging, or
    /// after game over. On success the piece is registered, the next piece is
    /// scheduled and the settle check is armed.
    pub fn drop<W: PhysicsWorld + ?Sized>(
        &mut self,
        state: &mut GameState,
        world: &mut W,
        registry: &mut BodyRegistry,
        scheduler: &mut Scheduler,
        tuning: &Tuning,
    ) -> Option<DroppedPiece> {
        if !state.can_drop() {
            return None;
        }
        let pending = state.pending.take()?;
        state.drop_in_flight = true;

        let spec = pending.spec();
        let position = Vec2::new(pending.target_x, tuning.drop_y);
        let handle = world.add_piece(PieceSpawn {
            position,
            radius: spec.radius,
            tier: pending.tier,
            material: Some(Material {
                restitution: DROP_RESTITUTION,
                friction: DROP_FRICTION,
            }),
        });
        registry.register_piece(handle, pending.tier, Origin::Dropped);
        state.drops += 1;

        scheduler.schedule(
            tuning.next_drop_delay(state.continuous_mode),
            TimerTask::PrepareNext,
        );
        settle::arm(scheduler, handle, tuning);

        log::debug!(
            "Dropped {} at x={:.1} ({:?})",
            pending.tier,
            pending.target_x,
            handle
        );
        Some(DroppedPiece {
            handle,
            tier: pending.tier,
            position,
        })
    }

    // === Continuous drop timer ===

    /// A hold-to-drop cycle is armed
    pub fn is_continuous_active(&self) -> bool {
        self.continuous_timer.is_some()
    }

    /// Arm the next hold-to-drop cycle, cancelling any outstanding one first
    pub fn arm_continuous(&mut self, scheduler: &mut Scheduler, tuning: &Tuning) -> TimerId {
        self.stop_continuous(scheduler);
        let id = scheduler.schedule(tuning.continuous_interval_ms, TimerTask::ContinuousDrop);
        self.continuous_timer = Some(id);
        id
    }

    /// Tear down the hold-to-drop timer; safe to call when none is armed
    pub fn stop_continuous(&mut self, scheduler: &mut Scheduler) {
        if let Some(id) = self.continuous_timer.take() {
            scheduler.cancel(id);
        }
    }

    /// Claim a fired continuous timer
    ///
    /// Returns false for any id that is not the current slot, so a stale
    /// firing can never run a cycle.
    pub fn take_continuous_fire(&mut self, id: TimerId) -> bool {
        if self.continuous_timer == Some(id) {
            self.continuous_timer = None;
            true
        } else {
            false
        }
    }

    /// Forget the timer slot without touching the scheduler (after a full clear)
    pub fn reset_timer_slot(&mut self) {
        self.continuous_timer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::MemoryWorld;
    use proptest::prelude::*;

    fn setup(width: f32) -> (DropController, GameState, Tuning) {
        let tuning = Tuning::default();
        let mut drops = DropController::new(42, ContainerRect::new(0.0, width, 600.0));
        let next = drops.draw_tier(&tuning);
        (drops, GameState::new(42, next, 0), tuning)
    }

    #[test]
    fn test_prepare_next_promotes_queued_tier() {
        let (mut drops, mut state, tuning) = setup(400.0);
        let queued = state.next_tier;
        state.drop_in_flight = true;

        let pending = drops.prepare_next(&mut state, &tuning).unwrap();
        assert_eq!(pending.tier, queued);
        assert_eq!(state.pending, Some(pending));
        assert!(!state.drop_in_flight);
        assert_eq!(pending.target_x, 200.0);
    }

    #[test]
    fn test_prepare_next_after_game_over() {
        let (mut drops, mut state, tuning) = setup(400.0);
        state.game_over = true;
        let queued = state.next_tier;
        assert!(drops.prepare_next(&mut state, &tuning).is_none());
        assert!(state.pending.is_none());
        assert_eq!(state.next_tier, queued);
    }

    #[test]
    fn test_set_target_x_clamps() {
        let (mut drops, mut state, _) = setup(400.0);
        state.pending = Some(PendingDrop {
            tier: Tier::new(5).unwrap(),
            target_x: 200.0,
        });

        assert_eq!(drops.set_target_x(&mut state, 390.0), Some(345.0));
        assert_eq!(state.pending.unwrap().target_x, 345.0);
        assert_eq!(drops.set_target_x(&mut state, -40.0), Some(55.0));
    }

    #[test]
    fn test_set_target_x_uses_container_offset() {
        let tuning = Tuning::default();
        let mut drops = DropController::new(1, ContainerRect::new(100.0, 400.0, 600.0));
        let mut state = GameState::new(1, drops.draw_tier(&tuning), 0);
        state.pending = Some(PendingDrop {
            tier: Tier::FIRST,
            target_x: 200.0,
        });
        assert_eq!(drops.set_target_x(&mut state, 250.0), Some(150.0));
    }

    #[test]
    fn test_set_target_x_ignored_while_in_flight() {
        let (mut drops, mut state, _) = setup(400.0);
        state.pending = Some(PendingDrop {
            tier: Tier::FIRST,
            target_x: 200.0,
        });
        state.drop_in_flight = true;
        assert_eq!(drops.set_target_x(&mut state, 50.0), None);
        assert_eq!(state.pending.unwrap().target_x, 200.0);
    }

    #[test]
    fn test_double_drop_spawns_once() {
        let (mut drops, mut state, tuning) = setup(400.0);
        let mut world = MemoryWorld::new();
        let mut registry = BodyRegistry::new();
        let mut scheduler = Scheduler::new();
        drops.prepare_next(&mut state, &tuning);

        let first = drops.drop(&mut state, &mut world, &mut registry, &mut scheduler, &tuning);
        let second = drops.drop(&mut state, &mut world, &mut registry, &mut scheduler, &tuning);
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(world.piece_count(), 1);
        assert_eq!(registry.piece_count(), 1);
        assert!(state.pending.is_none());
        assert!(state.drop_in_flight);

        // Next piece and settle check queued
        let tasks: Vec<_> = scheduler.pending().map(|(id, t)| (id.due_ms(), t)).collect();
        let handle = first.unwrap().handle;
        assert_eq!(
            tasks,
            vec![
                (1000, TimerTask::PrepareNext),
                (2000, TimerTask::SettleCheck(handle))
            ]
        );
    }

    #[test]
    fn test_drop_spawns_at_target() {
        let (mut drops, mut state, tuning) = setup(400.0);
        let mut world = MemoryWorld::new();
        let mut registry = BodyRegistry::new();
        let mut scheduler = Scheduler::new();
        drops.prepare_next(&mut state, &tuning);
        drops.set_target_x(&mut state, 120.0);

        let piece = drops
            .drop(&mut state, &mut world, &mut registry, &mut scheduler, &tuning)
            .unwrap();
        assert_eq!(piece.position, Vec2::new(120.0, 0.0));
        let body = world.get(piece.handle).unwrap();
        assert_eq!(body.tier, Some(piece.tier));
        assert_eq!(body.material.map(|m| m.restitution), Some(0.4));
    }

    #[test]
    fn test_continuous_delay_is_shorter() {
        let (mut drops, mut state, tuning) = setup(400.0);
        let mut world = MemoryWorld::new();
        let mut registry = BodyRegistry::new();
        let mut scheduler = Scheduler::new();
        state.continuous_mode = true;
        drops.prepare_next(&mut state, &tuning);
        drops.drop(&mut state, &mut world, &mut registry, &mut scheduler, &tuning);
        let (id, task) = scheduler.pending().next().unwrap();
        assert_eq!(task, TimerTask::PrepareNext);
        assert_eq!(id.due_ms(), 500);
    }

    #[test]
    fn test_continuous_slot_single_timer() {
        let (mut drops, _, tuning) = setup(400.0);
        let mut scheduler = Scheduler::new();

        let first = drops.arm_continuous(&mut scheduler, &tuning);
        let second = drops.arm_continuous(&mut scheduler, &tuning);
        assert!(!scheduler.is_pending(first));
        assert!(scheduler.is_pending(second));
        assert_eq!(scheduler.pending_count(), 1);

        // Stale ids are refused
        assert!(!drops.take_continuous_fire(first));
        assert!(drops.take_continuous_fire(second));
        assert!(!drops.is_continuous_active());

        drops.arm_continuous(&mut scheduler, &tuning);
        drops.stop_continuous(&mut scheduler);
        assert_eq!(scheduler.pending_count(), 1);
        drops.stop_continuous(&mut scheduler);
    }

    proptest! {
        #[test]
        fn prop_initial_tier_in_pool(seed in any::<u64>(), pool in 1u8..=10) {
            let mut rng = Pcg32::seed_from_u64(seed);
            for _ in 0..32 {
                let tier = choose_initial_tier(&mut rng, pool);
                prop_assert!(tier.rank() >= 1 && tier.rank() <= pool);
            }
        }

        #[test]
        fn prop_target_stays_inside(client_x in -1000.0f32..1000.0, rank in 1u8..=5) {
            let (mut drops, mut state, _) = setup(400.0);
            let tier = Tier::new(rank).unwrap();
            state.pending = Some(PendingDrop { tier, target_x: 200.0 });
            let x = drops.set_target_x(&mut state, client_x).unwrap();
            let r = tier.spec().radius;
            prop_assert!(x >= r && x <= 400.0 - r);
        }
    }

    #[test]
    fn test_same_seed_same_tiers() {
        let tuning = Tuning::default();
        let mut a = DropController::new(9, ContainerRect::default());
        let mut b = DropController::new(9, ContainerRect::default());
        let seq_a: Vec<_> = (0..20).map(|_| a.draw_tier(&tuning)).collect();
        let seq_b: Vec<_> = (0..20).map(|_| b.draw_tier(&tuning)).collect();
        assert_eq!(seq_a, seq_b);
        assert!(seq_a.iter().all(|t| t.rank() <= 5));
    }
}

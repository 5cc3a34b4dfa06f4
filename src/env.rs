use glam::Vec2;

use crate::action::AgentAction;
use crate::episode::{EpisodeClock, TerminalKind};
use crate::input::JumpInput;
use crate::obs;
use crate::physics::{ActorState, ContactEvent, KinematicController, MotionConfig};
use crate::reward::{ProgressTracker, RewardConfig};
use crate::session::{GameSession, PowerUpKind};
use crate::world::{BoundsProvider, TileWorld, WorldQuery};
use crate::Observation;

// =============================================================================
// Environment Constants
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct EnvConfig {
    /// Fixed physics timestep. Authoritative for all integration.
    pub physics_dt: f32,
    /// Physics ticks advanced per decision step; intents persist across all
    /// of them.
    pub ticks_per_decision: u32,
    pub max_episode_time: f32,
    pub starpower_duration: f32,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            physics_dt: 1.0 / 60.0,
            ticks_per_decision: 1,
            max_episode_time: 900.0,
            starpower_duration: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RewardBreakdown {
    pub progress: f64,
    pub pickups: f64,
    /// Non-terminal penalties (shrink).
    pub penalties: f64,
    /// Penalties awarded alongside an episode-ending event.
    pub terminal: f64,
}

pub struct StepResult {
    pub obs: Observation,
    pub reward: f32,
    pub done: bool,
    pub terminal: Option<TerminalKind>,
    pub total_reward: f64,
    pub elapsed: f32,
}

// =============================================================================
// Platformer Environment
// =============================================================================

/// Ties the kinematic controller, jump edge detector, progress tracker and
/// episode clock together behind the step/reset/reward-sink surface the host
/// (policy or manual driver) talks to. The world geometry is an injected
/// collaborator, never discovered at runtime.
pub struct PlatformerEnv<W> {
    world: W,
    controller: KinematicController,
    jump: JumpInput,
    tracker: ProgressTracker,
    clock: EpisodeClock,
    pub session: GameSession,
    pub env_config: EnvConfig,
    pub reward_config: RewardConfig,
    spawn: Vec2,
    pending: AgentAction,
    /// External reward deltas accrued since the last decision step.
    pending_reward: f64,
    total_reward: f64,
    steps: u64,
    done: bool,
    terminal: Option<TerminalKind>,
    debug_state: bool,
    reward_debug: bool,
    breakdown: RewardBreakdown,
}

impl<W: WorldQuery + BoundsProvider> PlatformerEnv<W> {
    pub fn new(
        world: W,
        spawn: Vec2,
        goal: Vec2,
        motion_config: MotionConfig,
        env_config: EnvConfig,
        reward_config: RewardConfig,
    ) -> Self {
        let mut controller = KinematicController::new(motion_config);
        controller.reset(spawn);
        let tracker = ProgressTracker::new(&reward_config, goal, spawn);
        Self {
            world,
            controller,
            jump: JumpInput::default(),
            tracker,
            clock: EpisodeClock::new(env_config.max_episode_time),
            session: GameSession::default(),
            env_config,
            reward_config,
            spawn,
            pending: AgentAction::default(),
            pending_reward: 0.0,
            total_reward: 0.0,
            steps: 0,
            done: false,
            terminal: None,
            debug_state: debug_flag("PRL_DEBUG_STATE"),
            reward_debug: debug_flag("PRL_DEBUG_REWARD"),
            breakdown: RewardBreakdown::default(),
        }
    }

    pub fn actor(&self) -> &ActorState {
        &self.controller.state
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn progress(&self) -> f32 {
        self.tracker.distance_progress(self.controller.state.position)
    }

    /// Special-intent flag of the buffered action, exposed for world glue.
    pub fn special_intent(&self) -> bool {
        self.pending.special
    }

    pub fn reward_breakdown(&self) -> RewardBreakdown {
        self.breakdown
    }

    // -------------------------------------------------------------------------
    // Episode control
    // -------------------------------------------------------------------------

    /// Begin a new episode. Waypoints are deliberately left alone: the host
    /// rebuilds them when the level layout changes.
    pub fn reset(&mut self) -> Observation {
        self.controller.reset(self.spawn);
        self.controller.state.grounded = self.world.is_grounded(self.spawn);
        self.jump.clear();
        self.clock.reset();
        self.pending = AgentAction::default();
        self.pending_reward = 0.0;
        self.total_reward = 0.0;
        self.steps = 0;
        self.done = false;
        self.terminal = None;
        self.breakdown = RewardBreakdown::default();
        self.observe()
    }

    /// End the episode and leave the actor reset-ready. Terminal rewards are
    /// awarded by the caller through `add_reward` beforehand. Transient
    /// powerups drop here; lives and coins persist. The clock keeps its
    /// elapsed value so the terminal step can still report it.
    pub fn end_episode(&mut self, kind: TerminalKind) {
        if self.done {
            return;
        }
        self.done = true;
        self.terminal = Some(kind);
        self.controller.reset(self.spawn);
        self.jump.clear();
        self.session.reset_powerups();
    }

    // -------------------------------------------------------------------------
    // Decision step
    // -------------------------------------------------------------------------

    pub fn step(&mut self, action: AgentAction) -> StepResult {
        self.steps += 1;
        let mut reward = std::mem::take(&mut self.pending_reward);

        if !self.done {
            // Intents are buffered across the decision boundary and consumed
            // by the fixed-timestep ticks below; never applied mid-integration.
            self.pending = action;
            self.controller
                .set_horizontal_intent(action.motion.axis());

            for _ in 0..self.env_config.ticks_per_decision {
                let dt = self.env_config.physics_dt;
                self.jump.update(action.jump_held);
                self.controller.step(dt, &self.jump, &self.world, &self.world);
                self.session.tick(dt);

                let normalized = self.tracker.distance_progress(self.controller.state.position);
                let claimed = self.tracker.claim(normalized).total() as f64;
                reward += claimed;
                self.breakdown.progress += claimed;

                if self.clock.advance(dt) {
                    // Timeout is a neutral terminal: no penalty.
                    self.end_episode(TerminalKind::Timeout);
                    break;
                }
            }
        }

        // Penalties routed through add_reward during this step.
        reward += std::mem::take(&mut self.pending_reward);
        self.total_reward += reward;

        if self.debug_state {
            self.log_state();
        }
        if self.reward_debug && reward != 0.0 {
            let b = self.breakdown;
            eprintln!(
                "[reward] step={} delta={:.2} progress={:.2} pickups={:.2} penalties={:.2} terminal={:.2}",
                self.steps, reward, b.progress, b.pickups, b.penalties, b.terminal,
            );
        }

        StepResult {
            obs: self.observe(),
            reward: reward as f32,
            done: self.done,
            terminal: self.terminal,
            total_reward: self.total_reward,
            elapsed: self.clock.elapsed,
        }
    }

    pub fn observe(&self) -> Observation {
        obs::encode(&self.controller, &self.jump, &self.tracker, &self.world)
    }

    // -------------------------------------------------------------------------
    // Reward sink and event glue
    // -------------------------------------------------------------------------

    pub fn add_reward(&mut self, delta: f32) {
        self.pending_reward += delta as f64;
    }

    /// Contact-begin callback from the external collision layer; applied
    /// before the next integration tick reads velocity.
    pub fn on_contact(&mut self, contact: &ContactEvent) {
        self.controller.apply_contact(contact);
    }

    pub fn collect(&mut self, kind: PowerUpKind) {
        let mut gained = self.reward_config.pickup_reward as f64;
        match kind {
            PowerUpKind::Coin => {
                gained += self.reward_config.coin_reward as f64;
                if self.session.add_coin() {
                    gained += self.grant_life() as f64;
                }
            }
            PowerUpKind::ExtraLife => {
                gained += self.grant_life() as f64;
            }
            PowerUpKind::MagicMushroom => {
                self.session.big = true;
            }
            PowerUpKind::Starpower => {
                self.session.starpower(self.env_config.starpower_duration);
            }
        }
        self.pending_reward += gained;
        self.breakdown.pickups += gained;
    }

    fn grant_life(&mut self) -> f32 {
        self.session.add_life();
        self.reward_config.life_reward
    }

    /// Hazard/enemy hit. Ignored under starpower; shrinks first when big.
    pub fn hit(&mut self) {
        if self.done || self.session.starpower_active() {
            return;
        }
        if self.session.big {
            self.session.big = false;
            self.penalize(self.reward_config.shrink_penalty);
        } else {
            self.penalize_terminal(self.reward_config.death_penalty);
            self.kill(TerminalKind::Death);
        }
    }

    /// Death-barrier trigger below the play area.
    pub fn death_barrier(&mut self) {
        if self.done {
            return;
        }
        self.penalize_terminal(self.reward_config.death_penalty);
        self.kill(TerminalKind::FellOff);
    }

    /// Final goal reached; neutral terminal, the progress claims already
    /// paid out.
    pub fn level_cleared(&mut self) {
        if self.done {
            return;
        }
        self.session.next_stage();
        self.end_episode(TerminalKind::Cleared);
    }

    fn penalize(&mut self, delta: f32) {
        self.pending_reward += delta as f64;
        self.breakdown.penalties += delta as f64;
    }

    fn penalize_terminal(&mut self, delta: f32) {
        self.pending_reward += delta as f64;
        self.breakdown.terminal += delta as f64;
    }

    fn kill(&mut self, kind: TerminalKind) {
        if self.session.lose_life() {
            self.session.new_game();
        }
        self.end_episode(kind);
    }

    // -------------------------------------------------------------------------
    // Waypoints
    // -------------------------------------------------------------------------

    /// The world exposed a new sub-goal; baseline is the actor's position
    /// right now.
    pub fn push_waypoint(&mut self, target: Vec2) {
        self.tracker
            .push_waypoint(target, self.controller.state.position);
    }

    pub fn pop_waypoint(&mut self) -> bool {
        self.tracker.pop_waypoint()
    }

    fn log_state(&self) {
        let s = &self.controller.state;
        eprintln!(
            "[state] step={step} pos=({px:.2},{py:.2}) vel=({vx:.2},{vy:.2}) grounded={grounded} jumping={jumping} waypoints={wps} progress={progress:.3} lives={lives} coins={coins} total={total:.2}",
            step = self.steps,
            px = s.position.x,
            py = s.position.y,
            vx = s.velocity.x,
            vy = s.velocity.y,
            grounded = s.grounded,
            jumping = s.jumping,
            wps = self.tracker.waypoint_count(),
            progress = self.progress(),
            lives = self.session.lives,
            coins = self.session.coins,
            total = self.total_reward,
        );
    }
}

impl PlatformerEnv<TileWorld> {
    /// Build from a tile level: spawn/goal from the layout, listed sub-goals
    /// stacked so the earliest one is active first.
    pub fn from_tile_world(
        world: TileWorld,
        env_config: EnvConfig,
        reward_config: RewardConfig,
    ) -> Self {
        let spawn = world.spawn;
        let goal = world.goal;
        let subgoals: Vec<Vec2> = world.subgoals.iter().rev().copied().collect();
        let mut env = Self::new(
            world,
            spawn,
            goal,
            MotionConfig::default(),
            env_config,
            reward_config,
        );
        for target in subgoals {
            env.push_waypoint(target);
        }
        env
    }
}

fn debug_flag(name: &str) -> bool {
    match std::env::var(name) {
        Ok(val) => matches!(val.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Motion;
    use crate::world::{Layer, LayerMask};

    /// Infinite flat floor directly under the spawn height.
    struct FloorWorld;

    impl WorldQuery for FloorWorld {
        fn raycast(&self, origin: Vec2, dir: Vec2, max_dist: f32, mask: LayerMask) -> f32 {
            if mask.contains(Layer::Ground) && dir.y < 0.0 && origin.y >= 0.0 {
                (origin.y / -dir.y).min(max_dist)
            } else {
                max_dist
            }
        }

        fn is_grounded(&self, origin: Vec2) -> bool {
            origin.y <= 0.625
        }
    }

    impl BoundsProvider for FloorWorld {
        fn left_edge(&self) -> f32 {
            -1_000.0
        }

        fn right_edge(&self) -> f32 {
            1_000.0
        }
    }

    fn env() -> PlatformerEnv<FloorWorld> {
        PlatformerEnv::new(
            FloorWorld,
            Vec2::new(0.0, 0.5),
            Vec2::new(100.0, 0.5),
            MotionConfig::default(),
            EnvConfig::default(),
            RewardConfig::default(),
        )
    }

    fn run_right(env: &mut PlatformerEnv<FloorWorld>, decisions: u32) -> f64 {
        let action = AgentAction {
            motion: Motion::Right,
            jump_held: false,
            special: false,
        };
        let mut reward = 0.0;
        for _ in 0..decisions {
            reward += env.step(action).reward as f64;
        }
        reward
    }

    #[test]
    fn moving_toward_goal_accrues_progress_reward() {
        let mut e = env();
        e.reset();
        let reward = run_right(&mut e, 600);
        assert!(reward > 0.0, "progress claims must pay out, got {}", reward);
        assert!(e.progress() > 0.5);
    }

    #[test]
    fn idle_actor_claims_nothing() {
        let mut e = env();
        e.reset();
        let result = e.step(AgentAction::default());
        assert_eq!(result.reward, 0.0);
        assert!(!result.done);
    }

    #[test]
    fn timeout_is_neutral_terminal() {
        let mut e = env();
        e.env_config.max_episode_time = 0.05;
        e.clock = EpisodeClock::new(0.05);
        e.reset();
        let mut last = e.step(AgentAction::default());
        for _ in 0..10 {
            if last.done {
                break;
            }
            last = e.step(AgentAction::default());
        }
        assert!(last.done);
        assert_eq!(last.terminal, Some(TerminalKind::Timeout));
        assert_eq!(last.total_reward, 0.0);
    }

    #[test]
    fn death_barrier_penalizes_and_ends_episode() {
        let mut e = env();
        e.reset();
        e.death_barrier();
        let result = e.step(AgentAction::default());
        assert!(result.done);
        assert_eq!(result.terminal, Some(TerminalKind::FellOff));
        assert_eq!(result.reward, -5.0);
        assert_eq!(e.session.lives, 2);
    }

    #[test]
    fn powerups_do_not_survive_episode_boundary() {
        let mut e = env();
        e.reset();
        e.collect(PowerUpKind::Coin);
        e.collect(PowerUpKind::MagicMushroom);
        e.collect(PowerUpKind::Starpower);
        assert!(e.session.big && e.session.starpower_active());

        e.death_barrier();
        e.step(AgentAction::default());
        e.reset();

        assert!(!e.session.big, "size must not carry into the next episode");
        assert!(!e.session.starpower_active());
        // Lives and coins are the persistent part of the session.
        assert_eq!(e.session.lives, 2);
        assert_eq!(e.session.coins, 1);
    }

    #[test]
    fn terminal_step_reports_elapsed_time() {
        let mut e = env();
        e.env_config.max_episode_time = 0.05;
        e.clock = EpisodeClock::new(0.05);
        e.reset();
        let mut last = e.step(AgentAction::default());
        for _ in 0..10 {
            if last.done {
                break;
            }
            last = e.step(AgentAction::default());
        }
        assert_eq!(last.terminal, Some(TerminalKind::Timeout));
        assert!(last.elapsed >= 0.05, "elapsed was {}", last.elapsed);
    }

    #[test]
    fn reward_breakdown_separates_terminal_penalties() {
        let mut e = env();
        e.reset();
        e.collect(PowerUpKind::MagicMushroom);
        e.hit();
        e.hit();
        e.step(AgentAction::default());
        let b = e.reward_breakdown();
        assert_eq!(b.pickups, 0.5);
        assert_eq!(b.penalties, -1.0);
        assert_eq!(b.terminal, -5.0);
    }

    #[test]
    fn hit_shrinks_before_killing() {
        let mut e = env();
        e.reset();
        e.collect(PowerUpKind::MagicMushroom);
        assert!(e.session.big);

        e.hit();
        assert!(!e.session.big);
        let after_shrink = e.step(AgentAction::default());
        assert!(!after_shrink.done);

        e.hit();
        let after_death = e.step(AgentAction::default());
        assert!(after_death.done);
        assert_eq!(after_death.terminal, Some(TerminalKind::Death));
    }

    #[test]
    fn starpower_grants_immunity_window() {
        let mut e = env();
        e.reset();
        e.collect(PowerUpKind::Starpower);
        e.hit();
        let result = e.step(AgentAction::default());
        assert!(!result.done, "hit under starpower must be ignored");
    }

    #[test]
    fn hundredth_coin_grants_life_and_reward() {
        let mut e = env();
        e.reset();
        let lives = e.session.lives;
        for _ in 0..99 {
            e.collect(PowerUpKind::Coin);
        }
        let before = e.step(AgentAction::default()).total_reward;
        e.collect(PowerUpKind::Coin);
        let after = e.step(AgentAction::default()).total_reward;
        assert_eq!(e.session.lives, lives + 1);
        // pickup 0.5 + coin 1.0 + life 2.0
        assert!((after - before - 3.5).abs() < 1e-6);
    }

    #[test]
    fn end_episode_resets_actor_but_keeps_waypoints() {
        let mut e = env();
        e.reset();
        e.push_waypoint(Vec2::new(40.0, 0.0));
        run_right(&mut e, 120);
        assert!(e.actor().position.x > 0.0);

        e.end_episode(TerminalKind::Death);
        assert_eq!(e.actor().position, Vec2::new(0.0, 0.5));
        assert_eq!(e.actor().velocity, Vec2::ZERO);
        assert_eq!(e.tracker().waypoint_count(), 2);
    }

    #[test]
    fn game_over_restores_starting_lives() {
        let mut e = env();
        for _ in 0..3 {
            e.reset();
            e.hit();
            e.step(AgentAction::default());
        }
        // Third death emptied the life pool and triggered a fresh game.
        assert_eq!(e.session.lives, 3);
    }

    #[test]
    fn special_intent_is_exposed_not_consumed() {
        let mut e = env();
        e.reset();
        let pos_before = e.actor().position;
        e.step(AgentAction {
            motion: Motion::Stay,
            jump_held: false,
            special: true,
        });
        assert!(e.special_intent());
        assert_eq!(e.actor().position.x, pos_before.x);
    }

    #[test]
    fn tile_world_constructor_stacks_subgoals() {
        let e = PlatformerEnv::from_tile_world(
            TileWorld::default_level(),
            EnvConfig::default(),
            RewardConfig::default(),
        );
        assert_eq!(e.tracker().waypoint_count(), 2);
        // The listed sub-goal, not the final goal, is active first.
        assert_eq!(e.tracker().active().target, Vec2::new(15.0, 3.5));
    }
}

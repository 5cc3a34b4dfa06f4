use glam::Vec2;

// =============================================================================
// Reward Tuning Knobs
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct RewardConfig {
    /// Normalized-progress width of one reward bucket.
    pub progress_step: f32,
    /// Per-bucket payout while sub-goal waypoints remain stacked.
    pub waypoint_reward: f32,
    /// Per-bucket payout toward the final (terminal) goal.
    pub goal_reward: f32,
    pub pickup_reward: f32,
    pub coin_reward: f32,
    pub life_reward: f32,
    pub shrink_penalty: f32,
    pub death_penalty: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            progress_step: 0.01,
            waypoint_reward: 0.1,
            goal_reward: 2.0,
            pickup_reward: 0.5,
            coin_reward: 1.0,
            life_reward: 2.0,
            shrink_penalty: -1.0,
            death_penalty: -5.0,
        }
    }
}

// =============================================================================
// Progress Reward Tracker
// =============================================================================

/// One spatial sub-goal. The cursor is an integer bucket index (first
/// unclaimed bucket, starting at 1); the normalized claim threshold is
/// `cursor * progress_step`. Integer buckets keep cursor advancement exact
/// under repeated claims — no float accumulation drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub target: Vec2,
    /// Actor position at the moment this waypoint became active.
    pub baseline: Vec2,
    /// Baseline-to-target distance; the progress normalization constant.
    pub max_baseline_dist: f32,
    pub cursor: u32,
}

impl Waypoint {
    fn new(target: Vec2, baseline: Vec2) -> Self {
        Self {
            target,
            baseline,
            max_baseline_dist: baseline.distance(target),
            cursor: 1,
        }
    }
}

/// Rewards claimed by one `claim` call: `count` independent events of the
/// same magnitude. Multiple buckets can be claimed in a single tick when the
/// actor covers more than one step of normalized distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Claims {
    pub count: u32,
    pub magnitude: f32,
}

impl Claims {
    pub fn total(&self) -> f32 {
        self.count as f32 * self.magnitude
    }
}

/// Ordered waypoint sequence; only the last (top of the stack) entry is
/// active for reward computation. The base of the stack is the terminal goal
/// and is never removed.
pub struct ProgressTracker {
    active: Waypoint,
    suspended: Vec<Waypoint>,
    step: f32,
    waypoint_reward: f32,
    goal_reward: f32,
}

impl ProgressTracker {
    pub fn new(config: &RewardConfig, goal: Vec2, baseline: Vec2) -> Self {
        Self {
            active: Waypoint::new(goal, baseline),
            suspended: Vec::new(),
            step: config.progress_step,
            waypoint_reward: config.waypoint_reward,
            goal_reward: config.goal_reward,
        }
    }

    pub fn active(&self) -> &Waypoint {
        &self.active
    }

    pub fn waypoint_count(&self) -> usize {
        self.suspended.len() + 1
    }

    /// Normalized claim threshold of the active waypoint's cursor.
    pub fn cursor_threshold(&self) -> f32 {
        self.active.cursor as f32 * self.step
    }

    /// Fraction of the baseline distance covered. Exceeds 1 transiently on
    /// overshoot past the target and is deliberately not clamped: overshoot
    /// is rewarded once, not repeatedly. A degenerate zero baseline reports
    /// full progress rather than dividing by zero.
    pub fn distance_progress(&self, position: Vec2) -> f32 {
        let wp = &self.active;
        if wp.max_baseline_dist <= f32::EPSILON {
            return 1.0;
        }
        (wp.max_baseline_dist - position.distance(wp.target)) / wp.max_baseline_dist
    }

    /// Claim every bucket whose threshold lies below `normalized`. Strictly
    /// monotone and idempotent: replaying a non-increasing value claims
    /// nothing.
    pub fn claim(&mut self, normalized: f32) -> Claims {
        let magnitude = if self.suspended.is_empty() {
            self.goal_reward
        } else {
            self.waypoint_reward
        };
        let mut count = 0;
        while normalized > self.active.cursor as f32 * self.step {
            self.active.cursor += 1;
            count += 1;
        }
        Claims { count, magnitude }
    }

    /// Push a new active waypoint (e.g. the world exposed a pipe entrance).
    pub fn push_waypoint(&mut self, target: Vec2, baseline: Vec2) {
        let prev = std::mem::replace(&mut self.active, Waypoint::new(target, baseline));
        self.suspended.push(prev);
    }

    /// Pop the active waypoint, restoring the previous one exactly as it was
    /// suspended. No-op when only the terminal goal remains.
    pub fn pop_waypoint(&mut self) -> bool {
        match self.suspended.pop() {
            Some(prev) => {
                self.active = prev;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(goal: Vec2, baseline: Vec2) -> ProgressTracker {
        ProgressTracker::new(&RewardConfig::default(), goal, baseline)
    }

    #[test]
    fn progress_normalization() {
        let t = tracker(Vec2::new(100.0, 0.0), Vec2::ZERO);
        assert_eq!(t.distance_progress(Vec2::ZERO), 0.0);
        assert!((t.distance_progress(Vec2::new(50.0, 0.0)) - 0.5).abs() < 1e-6);
        // Overshoot past the target is not clamped.
        assert!(t.distance_progress(Vec2::new(110.0, 0.0)) > 1.0 - 0.2);
    }

    #[test]
    fn ninety_nine_buckets_claimed_in_one_tick() {
        let mut t = tracker(Vec2::new(100.0, 0.0), Vec2::ZERO);
        let normalized = t.distance_progress(Vec2::new(99.0, 0.0));
        assert!((normalized - 0.99).abs() < 1e-6);
        let claims = t.claim(normalized);
        assert_eq!(claims.count, 99);
        assert_eq!(claims.magnitude, 2.0);
        // Next claim requires normalized >= 1.00.
        assert!((t.cursor_threshold() - 1.0).abs() < 1e-4);
        assert_eq!(t.claim(normalized).count, 0);
    }

    #[test]
    fn claim_is_idempotent_and_cursor_monotone() {
        let mut t = tracker(Vec2::new(10.0, 0.0), Vec2::ZERO);
        let normalized = t.distance_progress(Vec2::new(3.7, 0.0));
        let first = t.claim(normalized);
        assert!(first.count > 0);
        let cursor = t.active().cursor;
        let second = t.claim(normalized);
        assert_eq!(second.count, 0);
        assert_eq!(t.active().cursor, cursor);
        // Regressing the actor never rewinds the cursor.
        let third = t.claim(t.distance_progress(Vec2::new(0.5, 0.0)));
        assert_eq!(third.count, 0);
        assert_eq!(t.active().cursor, cursor);
    }

    #[test]
    fn subgoal_claims_pay_less_than_goal_claims() {
        let mut t = tracker(Vec2::new(100.0, 0.0), Vec2::ZERO);
        t.push_waypoint(Vec2::new(20.0, 0.0), Vec2::ZERO);

        // Two waypoints stacked: the active (non-final) one pays 0.1.
        let near_subgoal = t.distance_progress(Vec2::new(10.0, 0.0));
        let sub = t.claim(near_subgoal);
        assert!(sub.count > 0);
        assert_eq!(sub.magnitude, 0.1);

        // Back to the terminal goal alone: claims pay 2.0.
        assert!(t.pop_waypoint());
        let toward_goal = t.distance_progress(Vec2::new(60.0, 0.0));
        let fin = t.claim(toward_goal);
        assert!(fin.count > 0);
        assert_eq!(fin.magnitude, 2.0);
    }

    #[test]
    fn push_then_pop_restores_prior_waypoint_exactly() {
        let mut t = tracker(Vec2::new(100.0, 0.0), Vec2::ZERO);
        t.claim(t.distance_progress(Vec2::new(42.0, 0.0)));
        let before = *t.active();

        t.push_waypoint(Vec2::new(20.0, 10.0), Vec2::new(42.0, 0.0));
        t.claim(0.5);
        assert!(t.pop_waypoint());

        assert_eq!(*t.active(), before);
    }

    #[test]
    fn pop_below_one_waypoint_is_a_noop() {
        let mut t = tracker(Vec2::new(100.0, 0.0), Vec2::ZERO);
        assert!(!t.pop_waypoint());
        assert_eq!(t.waypoint_count(), 1);
    }

    #[test]
    fn zero_baseline_distance_reports_full_progress() {
        let t = tracker(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));
        assert_eq!(t.distance_progress(Vec2::new(9.0, 9.0)), 1.0);
    }

    #[test]
    fn fractional_progress_claims_expected_buckets() {
        let mut t = tracker(Vec2::new(10.0, 0.0), Vec2::ZERO);
        // Progress between buckets 36 and 37 claims 0.01 through 0.36.
        let claims = t.claim(0.365);
        assert_eq!(claims.count, 36);
        let more = t.claim(0.372);
        assert_eq!(more.count, 1);
    }
}

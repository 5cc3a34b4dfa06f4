use crate::input::JumpInput;
use crate::physics::KinematicController;
use crate::reward::ProgressTracker;
use crate::world::{Layer, WorldQuery, PROBE_DIRS};
use crate::{Observation, OBS_DIM};

// =============================================================================
// Observation Encoder
// =============================================================================

/// Human-readable name per observation index, in encoding order.
pub const LABELS: [&str; OBS_DIM] = [
    "position.x",
    "position.y",
    "velocity.x",
    "velocity.y",
    "grounded",
    "jumping",
    "running",
    "sliding",
    "falling",
    "jump_pressed",
    "jump_just_pressed",
    "gravity_multiplier",
    "waypoint_target.x",
    "waypoint_target.y",
    "waypoint_baseline.x",
    "waypoint_baseline.y",
    "target_minus_baseline.x",
    "target_minus_baseline.y",
    "progress_cursor",
    "ray_geometry.right",
    "ray_geometry.left",
    "ray_geometry.down",
    "ray_geometry.up",
    "ray_geometry.down_right",
    "ray_geometry.down_left",
    "ray_geometry.up_right",
    "ray_geometry.up_left",
    "ray_hazard.right",
    "ray_hazard.left",
    "ray_hazard.down",
    "ray_hazard.up",
    "ray_hazard.down_right",
    "ray_hazard.down_left",
    "ray_hazard.up_right",
    "ray_hazard.up_left",
];

/// Pack the simulation state into the fixed-order vector the policy reads.
/// The ordering never changes within an episode; distances are raw probe
/// lengths capped at the probe range, never unbounded.
pub fn encode<W: WorldQuery>(
    ctrl: &KinematicController,
    jump: &JumpInput,
    tracker: &ProgressTracker,
    world: &W,
) -> Observation {
    let mut f = [0f32; OBS_DIM];
    let mut idx = 0;

    let state = &ctrl.state;
    let axis = ctrl.input_axis();

    f[idx] = state.position.x;
    idx += 1;
    f[idx] = state.position.y;
    idx += 1;
    f[idx] = state.velocity.x;
    idx += 1;
    f[idx] = state.velocity.y;
    idx += 1;

    for flag in [
        state.grounded,
        state.jumping,
        state.running(axis),
        state.sliding(axis),
        state.falling(),
    ] {
        f[idx] = if flag { 1.0 } else { 0.0 };
        idx += 1;
    }

    f[idx] = if jump.pressed { 1.0 } else { 0.0 };
    idx += 1;
    f[idx] = if jump.just_pressed { 1.0 } else { 0.0 };
    idx += 1;
    f[idx] = ctrl.gravity_multiplier(jump.held);
    idx += 1;

    let wp = tracker.active();
    f[idx] = wp.target.x;
    idx += 1;
    f[idx] = wp.target.y;
    idx += 1;
    f[idx] = wp.baseline.x;
    idx += 1;
    f[idx] = wp.baseline.y;
    idx += 1;
    let delta = wp.target - wp.baseline;
    f[idx] = delta.x;
    idx += 1;
    f[idx] = delta.y;
    idx += 1;
    f[idx] = tracker.cursor_threshold();
    idx += 1;

    let range = ctrl.config.probe_range;
    for dir in PROBE_DIRS {
        f[idx] = world.raycast(state.position, dir, range, Layer::Ground.mask());
        idx += 1;
    }
    for dir in PROBE_DIRS {
        f[idx] = world.raycast(state.position, dir, range, Layer::Hazard.mask());
        idx += 1;
    }

    debug_assert_eq!(
        idx, OBS_DIM,
        "Observation index mismatch: got {}, expected {}",
        idx, OBS_DIM
    );

    f
}

use glam::Vec2;

use crate::input::JumpInput;
use crate::world::{BoundsProvider, Layer, WorldQuery};

// =============================================================================
// Motion Tuning Knobs
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct MotionConfig {
    pub move_speed: f32,
    pub max_jump_height: f32,
    /// Full up-and-down airtime of a max-height jump, in seconds.
    pub max_jump_time: f32,
    /// Near-zero threshold for wall/ceiling contact probes.
    pub contact_probe: f32,
    /// Cap for the observation probes.
    pub probe_range: f32,
    /// Margin kept inside the play-area edges when clamping.
    pub edge_margin: f32,
    /// Rest height of the actor origin above a ground surface.
    pub ground_offset: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            move_speed: 8.0,
            max_jump_height: 5.0,
            max_jump_time: 1.0,
            contact_probe: 0.375,
            probe_range: 2.0,
            edge_margin: 0.5,
            ground_offset: 0.5,
        }
    }
}

impl MotionConfig {
    /// Launch velocity that peaks at `max_jump_height` after half of
    /// `max_jump_time` under base gravity.
    pub fn jump_force(&self) -> f32 {
        2.0 * self.max_jump_height / (self.max_jump_time / 2.0)
    }

    pub fn gravity(&self) -> f32 {
        -2.0 * self.max_jump_height / (self.max_jump_time / 2.0).powi(2)
    }

    /// Terminal velocity floor: gravity integration never drives the
    /// vertical velocity below this.
    pub fn terminal_velocity(&self) -> f32 {
        self.gravity() / 2.0
    }
}

// =============================================================================
// Actor State
// =============================================================================

/// Position/velocity plus the two stored flags. `running`, `sliding` and
/// `falling` are derived on query so they can never go stale.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActorState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub grounded: bool,
    pub jumping: bool,
    /// Visual orientation only; carries no simulation semantics.
    pub facing_right: bool,
}

impl ActorState {
    pub fn running(&self, input_axis: f32) -> bool {
        self.velocity.x.abs() > 0.25 || input_axis.abs() > 0.25
    }

    pub fn sliding(&self, input_axis: f32) -> bool {
        (input_axis > 0.0 && self.velocity.x < 0.0) || (input_axis < 0.0 && self.velocity.x > 0.0)
    }

    pub fn falling(&self) -> bool {
        self.velocity.y < 0.0 && !self.grounded
    }
}

// =============================================================================
// Collision Events
// =============================================================================

/// Delivered synchronously by the external collision layer on contact begin.
/// `normal` is the unit direction from the actor toward the contacted body.
#[derive(Debug, Clone, Copy)]
pub struct ContactEvent {
    pub layer: Layer,
    pub normal: Vec2,
}

const CONTACT_DOT_THRESHOLD: f32 = 0.25;

// =============================================================================
// Kinematic Controller
// =============================================================================

fn move_towards(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_step {
        target
    } else {
        current + max_step.copysign(delta)
    }
}

pub struct KinematicController {
    pub config: MotionConfig,
    pub state: ActorState,
    input_axis: f32,
}

impl KinematicController {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            state: ActorState {
                facing_right: true,
                ..ActorState::default()
            },
            input_axis: 0.0,
        }
    }

    /// Restore a well-defined pre-episode state at `spawn`.
    pub fn reset(&mut self, spawn: Vec2) {
        self.state = ActorState {
            position: spawn,
            facing_right: true,
            ..ActorState::default()
        };
        self.input_axis = 0.0;
    }

    pub fn set_horizontal_intent(&mut self, axis: f32) {
        debug_assert!((-1.0..=1.0).contains(&axis), "axis out of range: {}", axis);
        self.input_axis = axis;
    }

    pub fn input_axis(&self) -> f32 {
        self.input_axis
    }

    /// 2 while falling or with the jump button released, 1 while rising with
    /// the button held. This is what makes jump height release-controlled.
    pub fn gravity_multiplier(&self, jump_held: bool) -> f32 {
        if self.state.velocity.y < 0.0 || !jump_held {
            2.0
        } else {
            1.0
        }
    }

    /// One fixed simulation tick.
    pub fn step<W: WorldQuery>(
        &mut self,
        dt: f32,
        jump: &JumpInput,
        world: &W,
        bounds: &impl BoundsProvider,
    ) {
        self.horizontal_movement(dt, world);

        if self.state.grounded {
            self.grounded_movement(jump);
        }

        self.apply_gravity(dt, jump);

        self.state.position += self.state.velocity * dt;
        let left = bounds.left_edge() + self.config.edge_margin;
        let right = bounds.right_edge() - self.config.edge_margin;
        self.state.position.x = self.state.position.x.clamp(left, right);

        self.state.grounded = world.is_grounded(self.state.position);

        // No rigid-body contact resolution here, so rest on the surface
        // explicitly instead of tunneling into it.
        if self.state.grounded {
            if self.state.velocity.y < 0.0 {
                self.state.velocity.y = 0.0;
            }
            let down = world.raycast(
                self.state.position,
                Vec2::new(0.0, -1.0),
                self.config.ground_offset,
                Layer::Ground.mask(),
            );
            if down < self.config.ground_offset {
                self.state.position.y += self.config.ground_offset - down;
            }
        }

        // Ceiling contact kills any remaining upward motion.
        if self.state.velocity.y > 0.0 {
            let up = world.raycast(
                self.state.position,
                Vec2::new(0.0, 1.0),
                self.config.contact_probe,
                Layer::Ground.mask(),
            );
            if up < self.config.contact_probe {
                self.state.velocity.y = 0.0;
            }
        }
    }

    fn horizontal_movement<W: WorldQuery>(&mut self, dt: f32, world: &W) {
        let target = self.input_axis * self.config.move_speed;
        self.state.velocity.x = move_towards(
            self.state.velocity.x,
            target,
            self.config.move_speed * dt,
        );

        // Wall stop: a hit within the contact threshold along the direction
        // of motion zeroes horizontal velocity outright.
        if self.state.velocity.x != 0.0 {
            let dir = Vec2::new(self.state.velocity.x.signum(), 0.0);
            let hit = world.raycast(
                self.state.position,
                dir,
                self.config.contact_probe,
                Layer::Ground.mask(),
            );
            if hit < self.config.contact_probe {
                self.state.velocity.x = 0.0;
            }
        }

        if self.state.velocity.x > 0.0 {
            self.state.facing_right = true;
        } else if self.state.velocity.x < 0.0 {
            self.state.facing_right = false;
        }
    }

    fn grounded_movement(&mut self, jump: &JumpInput) {
        // Keep gravity from accumulating through the floor.
        self.state.velocity.y = self.state.velocity.y.max(0.0);
        self.state.jumping = self.state.velocity.y > 0.0;

        if jump.just_pressed {
            self.state.velocity.y = self.config.jump_force();
            self.state.jumping = true;
        }
    }

    fn apply_gravity(&mut self, dt: f32, jump: &JumpInput) {
        let multiplier = self.gravity_multiplier(jump.held);
        self.state.velocity.y += self.config.gravity() * multiplier * dt;
        self.state.velocity.y = self.state.velocity.y.max(self.config.terminal_velocity());
    }

    /// Edge-triggered reaction to a contact-begin event. Applied before the
    /// next integration step reads velocity.
    pub fn apply_contact(&mut self, contact: &ContactEvent) {
        if contact.layer == Layer::Enemy {
            // Bounce off an enemy head.
            if contact.normal.y < -CONTACT_DOT_THRESHOLD {
                self.state.velocity.y = self.config.jump_force() / 2.0;
                self.state.jumping = true;
            }
        } else if contact.layer != Layer::PowerUp {
            // Head bonk.
            if contact.normal.y > CONTACT_DOT_THRESHOLD {
                self.state.velocity.y = 0.0;
            }
        }
    }
}

// =============================================================================
// Discrete Action Space
// =============================================================================

/// Horizontal movement slot of the discrete action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Motion {
    #[default]
    Stay = 0,
    Left = 1,
    Right = 2,
}

impl Motion {
    pub const COUNT: usize = 3;

    pub fn from_index(i: usize) -> Self {
        assert!(i < Self::COUNT, "motion slot out of range: {}", i);
        match i {
            0 => Motion::Stay,
            1 => Motion::Left,
            _ => Motion::Right,
        }
    }

    pub fn axis(self) -> f32 {
        match self {
            Motion::Stay => 0.0,
            Motion::Left => -1.0,
            Motion::Right => 1.0,
        }
    }
}

pub const ACTION_SLOTS: usize = 3;

/// One decision-tick action: movement, raw jump-held signal, and a special
/// intent flag the world-collision glue may act on (the simulation itself
/// never consumes it).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentAction {
    pub motion: Motion,
    pub jump_held: bool,
    pub special: bool,
}

impl AgentAction {
    /// Decode the 3-slot discrete action. Slot values outside their
    /// enumerated ranges are caller contract violations and fail fast.
    pub fn from_slots(slots: [usize; ACTION_SLOTS]) -> Self {
        let motion = Motion::from_index(slots[0]);
        assert!(slots[1] < 2, "jump slot out of range: {}", slots[1]);
        assert!(slots[2] < 2, "special slot out of range: {}", slots[2]);
        Self {
            motion,
            jump_held: slots[1] == 1,
            special: slots[2] == 1,
        }
    }

    /// Manual override: map raw key state onto the same action space.
    pub fn from_keys(keys: KeyState) -> Self {
        let motion = match (keys.left, keys.right) {
            (true, false) => Motion::Left,
            (false, true) => Motion::Right,
            _ => Motion::Stay,
        };
        Self {
            motion,
            jump_held: keys.jump,
            special: keys.special,
        }
    }
}

/// Raw key state for interactive testing.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyState {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub special: bool,
}

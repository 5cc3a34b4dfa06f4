// =============================================================================
// Jump Edge Detection
// =============================================================================

/// Press/held/released semantics derived from the raw jump-button stream.
///
/// `just_pressed` is true for exactly one tick per rising edge of `held`, so a
/// single button-down can launch at most one jump and jump height stays
/// controllable by release timing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JumpInput {
    /// Raw button state this tick.
    pub held: bool,
    /// Latched from the first held tick until release.
    pub pressed: bool,
    /// True only on the tick `held` transitions from false to true.
    pub just_pressed: bool,
}

impl JumpInput {
    /// Advance the state machine by one tick of raw button input.
    pub fn update(&mut self, raw_held: bool) {
        if raw_held {
            self.just_pressed = !self.pressed;
            self.pressed = true;
        } else {
            self.pressed = false;
            self.just_pressed = false;
        }
        self.held = raw_held;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

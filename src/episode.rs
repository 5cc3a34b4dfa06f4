// =============================================================================
// Episode Lifecycle
// =============================================================================

/// Elapsed simulation time; terminal once it reaches the configured maximum.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeClock {
    pub elapsed: f32,
    pub max: f32,
}

impl EpisodeClock {
    pub fn new(max: f32) -> Self {
        Self { elapsed: 0.0, max }
    }

    /// Advance by one tick; true once the ceiling is reached.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        self.expired()
    }

    pub fn expired(&self) -> bool {
        self.elapsed >= self.max
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

/// Why an episode ended. Timeout and level completion are neutral terminal
/// states; death and falling off carry the external penalty that was awarded
/// before the episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Cleared,
    Death,
    FellOff,
    Timeout,
}

impl TerminalKind {
    pub fn is_neutral(self) -> bool {
        matches!(self, TerminalKind::Cleared | TerminalKind::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_expires_at_ceiling() {
        let mut clock = EpisodeClock::new(1.0);
        let dt = 0.25;
        assert!(!clock.advance(dt));
        assert!(!clock.advance(dt));
        assert!(!clock.advance(dt));
        assert!(clock.advance(dt));
        assert!(clock.expired());
        clock.reset();
        assert!(!clock.expired());
        assert_eq!(clock.elapsed, 0.0);
    }

    #[test]
    fn neutral_terminals() {
        assert!(TerminalKind::Timeout.is_neutral());
        assert!(TerminalKind::Cleared.is_neutral());
        assert!(!TerminalKind::Death.is_neutral());
        assert!(!TerminalKind::FellOff.is_neutral());
    }
}

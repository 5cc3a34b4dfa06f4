// =============================================================================
// Session Bookkeeping
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpKind {
    Coin,
    ExtraLife,
    MagicMushroom,
    Starpower,
}

const COINS_PER_LIFE: u32 = 100;
const STARTING_LIVES: u32 = 3;

/// Lives/coins/powerup state carried across episodes. Starpower is a plain
/// elapsed-time window ticked by the environment, not a suspendable timer.
#[derive(Debug, Clone, Copy)]
pub struct GameSession {
    pub world: u32,
    pub stage: u32,
    pub lives: u32,
    pub coins: u32,
    pub big: bool,
    pub starpower_remaining: f32,
}

impl Default for GameSession {
    fn default() -> Self {
        Self {
            world: 1,
            stage: 2,
            lives: STARTING_LIVES,
            coins: 0,
            big: false,
            starpower_remaining: 0.0,
        }
    }
}

impl GameSession {
    pub fn new_game(&mut self) {
        self.lives = STARTING_LIVES;
        self.coins = 0;
        self.reset_powerups();
    }

    /// Drop transient powerup state at an episode boundary. Lives and coins
    /// persist; size and starpower do not.
    pub fn reset_powerups(&mut self) {
        self.big = false;
        self.starpower_remaining = 0.0;
    }

    pub fn tick(&mut self, dt: f32) {
        self.starpower_remaining = (self.starpower_remaining - dt).max(0.0);
    }

    pub fn starpower_active(&self) -> bool {
        self.starpower_remaining > 0.0
    }

    pub fn starpower(&mut self, duration: f32) {
        self.starpower_remaining = duration;
    }

    /// True when this coin rolled the counter over and earned a life.
    pub fn add_coin(&mut self) -> bool {
        self.coins += 1;
        if self.coins == COINS_PER_LIFE {
            self.coins = 0;
            true
        } else {
            false
        }
    }

    pub fn add_life(&mut self) {
        self.lives += 1;
    }

    /// True when no lives remain and a fresh game should begin.
    pub fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.lives == 0
    }

    pub fn next_stage(&mut self) {
        self.stage += 1;
    }
}

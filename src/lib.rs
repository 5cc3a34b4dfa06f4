pub const OBS_DIM: usize = 35;
pub type Observation = [f32; OBS_DIM];

pub mod action;
pub mod env;
pub mod episode;
pub mod input;
pub mod obs;
pub mod physics;
pub mod reward;
pub mod session;
pub mod world;

pub use action::{AgentAction, KeyState, Motion};
pub use env::{EnvConfig, PlatformerEnv, RewardBreakdown, StepResult};
pub use episode::{EpisodeClock, TerminalKind};
pub use input::JumpInput;
pub use physics::{ActorState, ContactEvent, KinematicController, MotionConfig};
pub use reward::{Claims, ProgressTracker, RewardConfig, Waypoint};
pub use session::{GameSession, PowerUpKind};
pub use world::{BoundsProvider, Layer, LayerMask, TileWorld, WorldQuery, PROBE_DIRS};

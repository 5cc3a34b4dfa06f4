// =============================================================================
// Platformer RL Environment — headless rollout driver
// =============================================================================
// Build & Run:
//   cargo build --release
//   cargo run --release -- rollout --steps 20000 --policy forward
//   cargo run --release -- rollout --level levels/1-2.json --policy random
//   cargo run --release -- obs-layout

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

use platformer_rl::{
    AgentAction, EnvConfig, Motion, MotionConfig, PlatformerEnv, RewardConfig, TerminalKind,
    TileWorld,
};

#[derive(Parser)]
#[command(name = "platformer-rl", about = "2D platformer physics + RL interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run headless episodes with a built-in policy and print stats.
    Rollout(RolloutArgs),
    /// Print the observation vector layout.
    ObsLayout,
}

#[derive(Parser)]
struct RolloutArgs {
    /// Level JSON; the built-in course when omitted.
    #[arg(long)]
    level: Option<PathBuf>,
    #[arg(long, default_value = "20000")]
    steps: u64,
    #[arg(long, default_value = "0")]
    seed: u64,
    #[arg(long, value_enum, default_value = "forward")]
    policy: Policy,
    /// Physics ticks per decision.
    #[arg(long, default_value = "1")]
    decision_period: u32,
    /// Episode time ceiling in seconds.
    #[arg(long, default_value = "900")]
    max_time: f32,
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    /// Uniform random motion and jump slots.
    Random,
    /// Head right, jumping when geometry closes in ahead.
    Forward,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Rollout(args) => rollout(args),
        Commands::ObsLayout => obs_layout(),
    }
}

fn obs_layout() -> Result<()> {
    for (i, label) in platformer_rl::obs::LABELS.iter().enumerate() {
        println!("{:2}  {}", i, label);
    }
    Ok(())
}

// Index of the rightward geometry ray in the observation vector.
const OBS_RAY_RIGHT: usize = 19;

fn rollout(args: RolloutArgs) -> Result<()> {
    let world = match &args.level {
        Some(path) => TileWorld::from_file(path)?,
        None => TileWorld::default_level(),
    };
    let env_config = EnvConfig {
        ticks_per_decision: args.decision_period.max(1),
        max_episode_time: args.max_time,
        ..EnvConfig::default()
    };
    let mut env = PlatformerEnv::from_tile_world(world, env_config, RewardConfig::default());
    let mut rng = SmallRng::seed_from_u64(args.seed);

    let mut obs = env.reset();
    let mut episodes = 0u64;
    let mut ep_steps = 0u64;
    let mut ep_reward = 0.0f64;
    let mut total_reward = 0.0f64;
    let probe_range = MotionConfig::default().probe_range;

    for _ in 0..args.steps {
        let action = match args.policy {
            Policy::Random => AgentAction::from_slots([
                rng.random_range(0..Motion::COUNT),
                rng.random_range(0..2),
                0,
            ]),
            Policy::Forward => AgentAction {
                motion: Motion::Right,
                jump_held: obs[OBS_RAY_RIGHT] < probe_range * 0.75 || rng.random::<f64>() < 0.05,
                special: false,
            },
        };

        let result = env.step(action);
        obs = result.obs;
        ep_steps += 1;
        ep_reward += result.reward as f64;

        // External trigger glue: death barrier below the level, sub-goal
        // hand-off, level completion.
        if !result.done {
            if env.actor().position.y < env.world().kill_y {
                env.death_barrier();
            } else if env.progress() >= 1.0 {
                if !env.pop_waypoint() {
                    env.level_cleared();
                }
            }
        }

        if result.done {
            episodes += 1;
            total_reward += ep_reward;
            let kind = result.terminal.map_or("?", terminal_name);
            println!(
                "episode {episodes}: steps={ep_steps} reward={ep_reward:.2} terminal={kind} lives={lives}",
                lives = env.session.lives,
            );
            ep_steps = 0;
            ep_reward = 0.0;
            obs = env.reset();
        }
    }

    if episodes > 0 {
        println!(
            "finished: episodes={} avg_reward={:.2}",
            episodes,
            total_reward / episodes as f64
        );
    } else {
        println!("finished: no episode terminated in {} steps", args.steps);
    }
    Ok(())
}

fn terminal_name(kind: TerminalKind) -> &'static str {
    match kind {
        TerminalKind::Cleared => "cleared",
        TerminalKind::Death => "death",
        TerminalKind::FellOff => "fell-off",
        TerminalKind::Timeout => "timeout",
    }
}

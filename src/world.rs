use anyhow::{bail, Context, Result};
use glam::Vec2;
use serde::Deserialize;
use std::f32::consts::FRAC_1_SQRT_2;
use std::path::Path;

// =============================================================================
// Collision Layers
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Layer {
    Ground = 0,
    Enemy = 1,
    PowerUp = 2,
    Hazard = 3,
}

impl Layer {
    pub const fn mask(self) -> LayerMask {
        LayerMask(1 << self as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerMask(pub u8);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(0x0F);

    pub const fn union(self, other: LayerMask) -> LayerMask {
        LayerMask(self.0 | other.0)
    }

    pub const fn contains(self, layer: Layer) -> bool {
        self.0 & layer.mask().0 != 0
    }
}

// =============================================================================
// World Query Interfaces
// =============================================================================

/// Fixed probe directions used by the observation encoder: the four axes
/// then the four diagonals. Ordering is part of the observation contract.
pub const PROBE_DIRS: [Vec2; 8] = [
    Vec2::new(1.0, 0.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(0.0, -1.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    Vec2::new(-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    Vec2::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    Vec2::new(-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
];

/// Synchronous, pure queries against externally owned world geometry.
pub trait WorldQuery {
    /// Distance to the nearest body on `mask` along `dir`, capped at
    /// `max_dist` when nothing is hit. Never unbounded.
    fn raycast(&self, origin: Vec2, dir: Vec2, max_dist: f32, mask: LayerMask) -> f32;

    /// Short downward probe.
    fn is_grounded(&self, origin: Vec2) -> bool;
}

/// Current visible play-area edges, used for horizontal clamping.
pub trait BoundsProvider {
    fn left_edge(&self) -> f32;
    fn right_edge(&self) -> f32;
}

// =============================================================================
// Tile World
// =============================================================================

/// Marching increment for grid raycasts. Coarser than a DDA traversal but
/// well inside the controller's contact threshold.
const RAY_STEP: f32 = 0.05;
/// Reach of the grounded probe: the actor's rest height above the surface
/// plus the near-zero contact threshold.
const GROUND_PROBE: f32 = 0.625;

/// Level layout on disk. Rows are listed top-down; each character is one
/// world-unit cell: `#` ground, `E` enemy, `P` powerup, `^` hazard,
/// `.` or space empty.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelFile {
    pub rows: Vec<String>,
    pub spawn: [f32; 2],
    pub goal: [f32; 2],
    #[serde(default)]
    pub subgoals: Vec<[f32; 2]>,
    #[serde(default = "default_kill_y")]
    pub kill_y: f32,
    /// Left/right play-area edges; defaults to the grid extents.
    #[serde(default)]
    pub edges: Option<[f32; 2]>,
}

fn default_kill_y() -> f32 {
    -4.0
}

/// Grid-backed world geometry implementing the query interfaces. This is the
/// external collaborator the simulation core is tested and demoed against.
pub struct TileWorld {
    cells: Vec<Option<Layer>>,
    width: usize,
    height: usize,
    pub spawn: Vec2,
    pub goal: Vec2,
    pub subgoals: Vec<Vec2>,
    pub kill_y: f32,
    left: f32,
    right: f32,
}

impl TileWorld {
    pub fn from_level(level: &LevelFile) -> Result<Self> {
        let height = level.rows.len();
        if height == 0 {
            bail!("level has no rows");
        }
        let width = level.rows[0].chars().count();
        let mut cells = vec![None; width * height];
        for (row_idx, row) in level.rows.iter().enumerate() {
            if row.chars().count() != width {
                bail!("row {} has width {}, expected {}", row_idx, row.chars().count(), width);
            }
            // Row 0 is the top of the layout; world y grows upward.
            let y = height - 1 - row_idx;
            for (x, ch) in row.chars().enumerate() {
                cells[y * width + x] = match ch {
                    '#' => Some(Layer::Ground),
                    'E' => Some(Layer::Enemy),
                    'P' => Some(Layer::PowerUp),
                    '^' => Some(Layer::Hazard),
                    '.' | ' ' => None,
                    other => bail!("unknown tile {:?} at row {}, col {}", other, row_idx, x),
                };
            }
        }
        let (left, right) = match level.edges {
            Some([l, r]) => (l, r),
            None => (0.0, width as f32),
        };
        Ok(Self {
            cells,
            width,
            height,
            spawn: Vec2::from(level.spawn),
            goal: Vec2::from(level.goal),
            subgoals: level.subgoals.iter().map(|&p| Vec2::from(p)).collect(),
            kill_y: level.kill_y,
            left,
            right,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read level: {}", path.display()))?;
        let level: LevelFile = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse level: {}", path.display()))?;
        Self::from_level(&level)
    }

    /// Short flat course with one gap, a hazard pit, and a raised goal.
    pub fn default_level() -> Self {
        let level = LevelFile {
            rows: vec![
                "............................".to_string(),
                "............................".to_string(),
                "......................####..".to_string(),
                "..............##............".to_string(),
                "............................".to_string(),
                "########..####^^####..######".to_string(),
            ],
            spawn: [2.5, 1.5],
            goal: [25.0, 4.5],
            subgoals: vec![[15.0, 3.5]],
            kill_y: -4.0,
            edges: None,
        };
        match Self::from_level(&level) {
            Ok(world) => world,
            Err(_) => unreachable!("built-in level is well formed"),
        }
    }

    fn layer_at(&self, pos: Vec2) -> Option<Layer> {
        if pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let x = pos.x as usize;
        let y = pos.y as usize;
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells[y * self.width + x]
    }
}

impl WorldQuery for TileWorld {
    fn raycast(&self, origin: Vec2, dir: Vec2, max_dist: f32, mask: LayerMask) -> f32 {
        let dir = dir.normalize_or_zero();
        if dir == Vec2::ZERO {
            return max_dist;
        }
        let mut t = RAY_STEP;
        while t <= max_dist {
            if let Some(layer) = self.layer_at(origin + dir * t) {
                if mask.contains(layer) {
                    return t;
                }
            }
            t += RAY_STEP;
        }
        max_dist
    }

    fn is_grounded(&self, origin: Vec2) -> bool {
        self.raycast(origin, Vec2::new(0.0, -1.0), GROUND_PROBE, Layer::Ground.mask())
            < GROUND_PROBE
    }
}

impl BoundsProvider for TileWorld {
    fn left_edge(&self) -> f32 {
        self.left
    }

    fn right_edge(&self) -> f32 {
        self.right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_world() -> TileWorld {
        TileWorld::from_level(&LevelFile {
            rows: vec![
                "........".to_string(),
                "......#.".to_string(),
                "^.......".to_string(),
                "########".to_string(),
            ],
            spawn: [1.5, 1.5],
            goal: [7.0, 1.5],
            subgoals: vec![],
            kill_y: -4.0,
            edges: None,
        })
        .unwrap()
    }

    #[test]
    fn raycast_hits_ground_below() {
        let world = flat_world();
        let d = world.raycast(
            Vec2::new(3.5, 1.5),
            Vec2::new(0.0, -1.0),
            2.0,
            Layer::Ground.mask(),
        );
        // Ground row occupies y in [0, 1); the ray enters it 0.5 below origin.
        assert!((d - 0.5).abs() < 0.1, "distance was {}", d);
    }

    #[test]
    fn raycast_miss_reports_cap_not_infinity() {
        let world = flat_world();
        let d = world.raycast(
            Vec2::new(3.5, 1.5),
            Vec2::new(0.0, 1.0),
            2.0,
            Layer::Ground.mask(),
        );
        assert_eq!(d, 2.0);
    }

    #[test]
    fn raycast_respects_layer_mask() {
        let world = flat_world();
        // Hazard cell at x in [0,1), y in [1,2).
        let origin = Vec2::new(2.5, 1.5);
        let toward_hazard = Vec2::new(-1.0, 0.0);
        let hit = world.raycast(origin, toward_hazard, 3.0, Layer::Hazard.mask());
        assert!(hit < 3.0);
        let filtered = world.raycast(origin, toward_hazard, 3.0, Layer::Ground.mask());
        assert_eq!(filtered, 3.0);
    }

    #[test]
    fn grounded_only_near_surface() {
        let world = flat_world();
        assert!(world.is_grounded(Vec2::new(3.5, 1.2)));
        assert!(!world.is_grounded(Vec2::new(3.5, 2.5)));
    }

    #[test]
    fn level_json_round_trip() {
        // Five hashes: the tile rows themselves contain `"####`.
        let json = r#####"{
            "rows": ["....", "####"],
            "spawn": [1.0, 1.5],
            "goal": [3.0, 1.5],
            "subgoals": [[2.0, 1.5]],
            "kill_y": -2.0
        }"#####;
        let level: LevelFile = serde_json::from_str(json).unwrap();
        let world = TileWorld::from_level(&level).unwrap();
        assert_eq!(world.subgoals.len(), 1);
        assert_eq!(world.kill_y, -2.0);
        assert_eq!(world.left_edge(), 0.0);
        assert_eq!(world.right_edge(), 4.0);
    }

    #[test]
    fn ragged_rows_rejected() {
        let level = LevelFile {
            rows: vec!["....".to_string(), "##".to_string()],
            spawn: [0.0, 0.0],
            goal: [1.0, 1.0],
            subgoals: vec![],
            kill_y: -4.0,
            edges: None,
        };
        assert!(TileWorld::from_level(&level).is_err());
    }

    #[test]
    fn default_level_is_well_formed() {
        let world = TileWorld::default_level();
        assert!(world.is_grounded(world.spawn));
        assert!(world.goal.x > world.spawn.x);
    }
}

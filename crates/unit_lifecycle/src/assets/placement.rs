//! Category-dependent placement of new unit instances
//!
//! World categories march each new instance along an axis so co-located
//! units never overlap. UI units either share one canvas or get a dedicated
//! canvas with an increasing sort order. Everything here is a pure function
//! of the category and a per-category counter.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{direction, vec3_from_array, Vec3};
use crate::unit::UnitCategory;

/// Where a newly created unit should live
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Position in 3D world space
    World3D {
        /// World position
        position: Vec3,
    },
    /// Position in 2D world space (z carries the configured axis component)
    World2D {
        /// World position
        position: Vec3,
    },
    /// Presentation on a UI canvas
    Canvas(CanvasPlacement),
}

/// Canvas assignment for UI units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasPlacement {
    /// Attach to the shared canvas
    Shared,
    /// Create a dedicated canvas drawn at `sort_order`
    Dedicated {
        /// Draw priority of the dedicated canvas
        sort_order: i32,
    },
}

/// # Axis Spacing
///
/// Offsets successive world instances by `distance` along `axis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSpacing {
    /// Direction to march along; normalized on use
    pub axis: [f32; 3],
    /// Gap between consecutive instances
    pub distance: f32,
}

impl AxisSpacing {
    /// Create a spacing rule
    pub fn new(axis: [f32; 3], distance: f32) -> Self {
        Self { axis, distance }
    }

    /// Position of the `index`th instance
    pub fn position(&self, index: u32) -> Vec3 {
        let axis = direction(vec3_from_array(self.axis)).unwrap_or_else(|| {
            log::warn!("Placement axis {:?} has no direction, falling back to +X", self.axis);
            Vec3::x()
        });
        axis * (self.distance * index as f32)
    }

    fn validate(&self, label: &str) -> Result<(), String> {
        if !self.distance.is_finite() || self.distance < 0.0 {
            return Err(format!("{} spacing distance must be finite and non-negative, got {}", label, self.distance));
        }
        if self.axis.iter().any(|c| !c.is_finite()) {
            return Err(format!("{} spacing axis must be finite, got {:?}", label, self.axis));
        }
        Ok(())
    }
}

/// # Canvas Strategy
///
/// How UI units are presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum CanvasStrategy {
    /// All UI units share one canvas
    Shared,
    /// Each UI unit gets its own canvas
    Dedicated {
        /// Sort order of the first dedicated canvas
        base_sort_order: i32,
        /// Sort order increment per additional canvas
        sort_order_step: i32,
    },
}

/// # Placement Configuration
///
/// Per-category spacing and canvas rules used by the factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Spacing for 3D world units
    pub world_3d: AxisSpacing,
    /// Spacing for 2D world units
    pub world_2d: AxisSpacing,
    /// Canvas strategy for UI units
    pub ui: CanvasStrategy,
}

impl PlacementConfig {
    /// Set the 3D spacing
    pub fn with_world_3d(mut self, spacing: AxisSpacing) -> Self {
        self.world_3d = spacing;
        self
    }

    /// Set the 2D spacing
    pub fn with_world_2d(mut self, spacing: AxisSpacing) -> Self {
        self.world_2d = spacing;
        self
    }

    /// Set the UI canvas strategy
    pub fn with_ui(mut self, strategy: CanvasStrategy) -> Self {
        self.ui = strategy;
        self
    }

    /// Placement of the `index`th instance in `category`
    pub fn placement_for(&self, category: UnitCategory, index: u32) -> Placement {
        match category {
            UnitCategory::World3D => Placement::World3D {
                position: self.world_3d.position(index),
            },
            UnitCategory::World2D => Placement::World2D {
                position: self.world_2d.position(index),
            },
            UnitCategory::Ui => Placement::Canvas(match self.ui {
                CanvasStrategy::Shared => CanvasPlacement::Shared,
                CanvasStrategy::Dedicated {
                    base_sort_order,
                    sort_order_step,
                } => {
                    let index = i32::try_from(index).unwrap_or(i32::MAX);
                    CanvasPlacement::Dedicated {
                        sort_order: base_sort_order.saturating_add(sort_order_step.saturating_mul(index)),
                    }
                }
            }),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.world_3d.validate("World3D")?;
        self.world_2d.validate("World2D")?;
        Ok(())
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            world_3d: AxisSpacing::new([1.0, 0.0, 0.0], 100.0),
            world_2d: AxisSpacing::new([1.0, 0.0, 0.0], 50.0),
            ui: CanvasStrategy::Dedicated {
                base_sort_order: 100,
                sort_order_step: 1,
            },
        }
    }
}

/// Monotonic per-category instance counters
#[derive(Debug, Default, Clone)]
pub(crate) struct PlacementCounters {
    world_3d: u32,
    world_2d: u32,
    ui: u32,
}

impl PlacementCounters {
    /// Current index for `category`, then advance it
    pub(crate) fn next(&mut self, category: UnitCategory) -> u32 {
        let counter = match category {
            UnitCategory::World3D => &mut self.world_3d,
            UnitCategory::World2D => &mut self.world_2d,
            UnitCategory::Ui => &mut self.ui,
        };
        let index = *counter;
        *counter = counter.wrapping_add(1);
        index
    }
}

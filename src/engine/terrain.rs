// Seabed height queries.
//
// The simulation only ever asks "how high is the ground under (x, z)?" when a
// vehicle probes ahead of itself. Anything that can answer that implements
// `Terrain`: a flat floor, a closure, or a sampled height field.

use glam::{UVec2, Vec2};

use crate::error::SimError;

pub trait Terrain {
    /// Ground height (world Y) under the given horizontal position.
    fn sample_height(&self, x: f32, z: f32) -> f32;
}

impl<F> Terrain for F
where
    F: Fn(f32, f32) -> f32,
{
    fn sample_height(&self, x: f32, z: f32) -> f32 {
        self(x, z)
    }
}

// ============================================================================
// FLAT FLOOR
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrain {
    pub height: f32,
}

impl FlatTerrain {
    pub fn new(height: f32) -> Self {
        Self { height }
    }
}

impl Terrain for FlatTerrain {
    fn sample_height(&self, _x: f32, _z: f32) -> f32 {
        self.height
    }
}

// ============================================================================
// HEIGHT FIELD
// ============================================================================

/// Regular grid of height samples on the XZ plane, bilinearly interpolated.
///
/// Sample (cx, cz) sits at `origin + (cx, cz) * cell_size`. Queries outside the
/// grid clamp to the nearest edge sample. Always at least 1x1 with a
/// positive cell size.
pub struct HeightField {
    heights: Vec<f32>,
    width: u32,
    height: u32,
    cell_size: f32,
    /// World XZ position of sample (0, 0).
    origin: Vec2,
}

impl HeightField {
    /// Build a grid by evaluating `f(x, z)` at every sample point.
    pub fn from_fn(
        width: u32,
        height: u32,
        cell_size: f32,
        origin: Vec2,
        f: impl Fn(f32, f32) -> f32,
    ) -> Result<Self, SimError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(SimError::InvalidConfig { field: "terrain.cell_size", value: cell_size });
        }
        let width = width.max(1);
        let height = height.max(1);
        let mut heights = Vec::with_capacity((width * height) as usize);
        for cz in 0..height {
            for cx in 0..width {
                let x = origin.x + cx as f32 * cell_size;
                let z = origin.y + cz as f32 * cell_size;
                heights.push(f(x, z));
            }
        }
        Ok(Self { heights, width, height, cell_size, origin })
    }

    /// Gently rolling seabed covering `[-half, half]` on both axes.
    pub fn rolling(half: f32, cell_size: f32, base: f32, amplitude: f32) -> Result<Self, SimError> {
        if !half.is_finite() || half < 0.0 {
            return Err(SimError::InvalidConfig { field: "terrain.half_extent", value: half });
        }
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(SimError::InvalidConfig { field: "terrain.cell_size", value: cell_size });
        }
        let cells = ((2.0 * half) / cell_size).ceil() as u32 + 1;
        Self::from_fn(cells, cells, cell_size, Vec2::splat(-half), |x, z| {
            base + amplitude * (x * 0.05).sin() * (z * 0.05).cos()
        })
    }

    /// Grid cell containing a world XZ position, clamped to the grid.
    pub fn world_to_cell_clamped(&self, pos: Vec2) -> UVec2 {
        let local = (pos - self.origin) / self.cell_size;
        let cx = local.x.max(0.0) as u32;
        let cz = local.y.max(0.0) as u32;
        UVec2::new(cx.min(self.width - 1), cz.min(self.height - 1))
    }

    #[inline]
    fn at(&self, cx: u32, cz: u32) -> f32 {
        let cx = cx.min(self.width - 1);
        let cz = cz.min(self.height - 1);
        self.heights
            .get((cz * self.width + cx) as usize)
            .copied()
            .unwrap_or(0.0)
    }
}

impl Terrain for HeightField {
    fn sample_height(&self, x: f32, z: f32) -> f32 {
        let pos = Vec2::new(x, z);
        let cell = self.world_to_cell_clamped(pos);

        let local = (pos - self.origin) / self.cell_size;
        let tx = (local.x - cell.x as f32).clamp(0.0, 1.0);
        let tz = (local.y - cell.y as f32).clamp(0.0, 1.0);

        let h00 = self.at(cell.x, cell.y);
        let h10 = self.at(cell.x + 1, cell.y);
        let h01 = self.at(cell.x, cell.y + 1);
        let h11 = self.at(cell.x + 1, cell.y + 1);

        let near = h00 + (h10 - h00) * tx;
        let far = h01 + (h11 - h01) * tx;
        near + (far - near) * tz
    }
}

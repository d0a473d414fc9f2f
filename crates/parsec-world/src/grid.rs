//! Broadphase: a uniform grid over the map for candidate-pair pruning.
//!
//! [`CollisionMap`] hashes every live ship into the cell containing its
//! center. A query appends every id whose home cell overlaps the query disk;
//! because the configured cell width is at least the query diameter, a disk
//! overlaps at most two cells per axis, so the lookup only ever examines the
//! owning cell plus up to three neighbors (one per spilled axis plus the
//! shared diagonal).
//!
//! Planets are not hashed: there are few of them and their radii may exceed
//! the cell width, so the detector scans them linearly.
//!
//! The grid is rebuilt from scratch at the top of each event-detection pass
//! and never mutated during event resolution.

use crate::entity::EntityId;
use crate::geom::Location;
use crate::map::GameMap;

// ---------------------------------------------------------------------------
// CollisionMap
// ---------------------------------------------------------------------------

/// Uniform broadphase grid of `cell_size`-wide square cells covering the map.
#[derive(Debug)]
pub struct CollisionMap {
    cell_size: f64,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<EntityId>>,
}

impl CollisionMap {
    /// An empty grid covering `width × height`.
    pub fn new(width: f64, height: f64, cell_size: f64) -> Self {
        assert!(
            cell_size > 0.0 && cell_size.is_finite(),
            "cell_size must be positive and finite, got {cell_size}"
        );
        let cols = (width / cell_size).ceil().max(1.0) as usize;
        let rows = (height / cell_size).ceil().max(1.0) as usize;
        Self {
            cell_size,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    /// Rebuild the grid from every live ship in `map`. O(ships).
    pub fn rebuild(&mut self, map: &GameMap) {
        for cell in &mut self.cells {
            cell.clear();
        }
        for (player, ship, s) in map.each_ship() {
            let cell = self.cell_index(s.location);
            self.cells[cell].push(EntityId::Ship { player, ship });
        }
    }

    /// Append every ship whose home cell overlaps the disk `(location,
    /// radius)` to `out`. Conservative: callers re-test candidates exactly.
    pub fn test(&self, location: Location, radius: f64, out: &mut Vec<EntityId>) {
        debug_assert!(
            2.0 * radius <= self.cell_size,
            "query diameter {} exceeds cell size {}; the one-cell spill \
             lookup would miss candidates",
            2.0 * radius,
            self.cell_size
        );

        let (cx, cy) = self.cell_coords(location);

        // Which cardinal neighbors does the disk spill into? At most one per
        // axis, by the diameter constraint above.
        let left = location.x - radius < cx as f64 * self.cell_size;
        let right = location.x + radius >= (cx + 1) as f64 * self.cell_size;
        let dx: isize = if left && cx > 0 {
            -1
        } else if right && cx + 1 < self.cols {
            1
        } else {
            0
        };

        let down = location.y - radius < cy as f64 * self.cell_size;
        let up = location.y + radius >= (cy + 1) as f64 * self.cell_size;
        let dy: isize = if down && cy > 0 {
            -1
        } else if up && cy + 1 < self.rows {
            1
        } else {
            0
        };

        self.append_cell(cx, cy, out);
        if dx != 0 {
            self.append_cell((cx as isize + dx) as usize, cy, out);
        }
        if dy != 0 {
            self.append_cell(cx, (cy as isize + dy) as usize, out);
        }
        // The diagonal only matters when both cardinals spill.
        if dx != 0 && dy != 0 {
            self.append_cell((cx as isize + dx) as usize, (cy as isize + dy) as usize, out);
        }
    }

    /// Grid column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Grid row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    // -- internals ----------------------------------------------------------

    fn cell_coords(&self, location: Location) -> (usize, usize) {
        let cx = ((location.x / self.cell_size).floor().max(0.0) as usize).min(self.cols - 1);
        let cy = ((location.y / self.cell_size).floor().max(0.0) as usize).min(self.rows - 1);
        (cx, cy)
    }

    fn cell_index(&self, location: Location) -> usize {
        let (cx, cy) = self.cell_coords(location);
        cy * self.cols + cx
    }

    fn append_cell(&self, cx: usize, cy: usize, out: &mut Vec<EntityId>) {
        out.extend_from_slice(&self.cells[cy * self.cols + cx]);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

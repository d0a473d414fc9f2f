//! Geometry primitives: positions and velocities on the continuous 2D plane.
//!
//! Both types are plain `f64` value pairs. All frame times are expressed in
//! fractions of one turn, so `Location::move_by(v, 1.0)` advances a ship by
//! exactly one turn's worth of motion.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A point on the map plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Location {
    /// Construct a location from coordinates.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another location.
    #[inline]
    pub fn distance_to(&self, other: Location) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Advance this location along `velocity` for `time` turn-fractions.
    #[inline]
    pub fn move_by(&mut self, velocity: Velocity, time: f64) {
        self.x += velocity.vx * time;
        self.y += velocity.vy * time;
    }

    /// The location reached by travelling along `velocity` for `time`
    /// turn-fractions, leaving `self` untouched.
    #[inline]
    pub fn moved_by(self, velocity: Velocity, time: f64) -> Location {
        Location {
            x: self.x + velocity.vx * time,
            y: self.y + velocity.vy * time,
        }
    }
}

// ---------------------------------------------------------------------------
// Velocity
// ---------------------------------------------------------------------------

/// A velocity vector, in map units per turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    /// Horizontal component.
    pub vx: f64,
    /// Vertical component.
    pub vy: f64,
}

impl Velocity {
    /// The zero vector.
    pub const ZERO: Velocity = Velocity { vx: 0.0, vy: 0.0 };

    /// Construct a velocity from components.
    #[inline]
    pub fn new(vx: f64, vy: f64) -> Self {
        Self { vx, vy }
    }

    /// Speed (vector magnitude).
    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.vx.hypot(self.vy)
    }

    /// Heading in radians, `atan2(vy, vx)`.
    #[inline]
    pub fn angle(&self) -> f64 {
        self.vy.atan2(self.vx)
    }

    /// Add a thrust of the given magnitude along `angle_rad`.
    #[inline]
    pub fn accelerate_by(&mut self, thrust: f64, angle_rad: f64) {
        self.vx += thrust * angle_rad.cos();
        self.vy += thrust * angle_rad.sin();
    }

    /// Whether both components are exactly zero.
    ///
    /// Docking legality tests require *exact* zero, not an epsilon band, so
    /// this deliberately compares with `==`.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.vx == 0.0 && self.vy == 0.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

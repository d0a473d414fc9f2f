//! Closed-form time-to-contact between two moving disks.
//!
//! With `d = L1 - L2` and `δ = V1 - V2`, the squared center distance over
//! time is the quadratic `a·t² + b·t + c` with `a = ‖δ‖²`, `b = 2·d·δ`,
//! `c = ‖d‖² - r²`; contact is its earliest admissible root.
//!
//! Every degenerate branch below is load-bearing for determinism and must
//! not be "simplified":
//!
//! - `a = 0, b = 0`: the pair is relatively at rest; contact iff already
//!   overlapping (`c <= 0`), reported at `t = 0`.
//! - `a = 0, b != 0`: linear closure; the single root is reported only when
//!   it is non-negative.
//! - Discriminant zero: the grazing root is reported *even when negative*.
//! - Two real roots: when both are non-negative the smaller is returned,
//!   otherwise the larger -- which may be negative when both are. Callers
//!   filter to the `[0, 1]` frame window, so a negative report is equivalent
//!   to "no contact this frame", but the exact branch structure keeps
//!   floating-point edge cases bit-identical across implementations.

use crate::geom::{Location, Velocity};

// ---------------------------------------------------------------------------
// collision_time
// ---------------------------------------------------------------------------

/// Earliest time `t` at which two disks with combined radius `r` touch, i.e.
/// `‖(L1 + V1·t) - (L2 + V2·t)‖ = r`. `None` means the distance never
/// reaches `r`. A `Some(t)` with negative `t` is possible (see module docs).
pub fn collision_time(
    r: f64,
    loc1: Location,
    loc2: Location,
    vel1: Velocity,
    vel2: Velocity,
) -> Option<f64> {
    let dx = loc1.x - loc2.x;
    let dy = loc1.y - loc2.y;
    let dvx = vel1.vx - vel2.vx;
    let dvy = vel1.vy - vel2.vy;

    let a = dvx * dvx + dvy * dvy;
    let b = 2.0 * (dx * dvx + dy * dvy);
    let c = dx * dx + dy * dy - r * r;

    if a == 0.0 {
        if b == 0.0 {
            // Relatively at rest: touching now or never.
            return (c <= 0.0).then_some(0.0);
        }
        let t = -c / b;
        return (t >= 0.0).then_some(t);
    }

    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    if disc == 0.0 {
        return Some(-b / (2.0 * a));
    }

    let sqrt_disc = disc.sqrt();
    let t1 = -b + sqrt_disc;
    let t2 = -b - sqrt_disc;
    if t1 >= 0.0 && t2 >= 0.0 {
        Some(t1.min(t2) / (2.0 * a))
    } else {
        Some(t1.max(t2) / (2.0 * a))
    }
}

/// [`collision_time`] against a stationary body (planets never move).
pub fn collision_time_fixed(r: f64, loc1: Location, loc2: Location, vel1: Velocity) -> Option<f64> {
    collision_time(r, loc1, loc2, vel1, Velocity::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

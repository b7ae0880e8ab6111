//! Utility maths functions
//!
//! Angles handled here are compass-style degrees: headings live in `[0, 360)` and signed
//! differences in `[-180, 180]`. Naive subtraction of headings is never correct across the
//! 0/360 seam, so every comparison goes through [`ang_diff_deg`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// `num_traits::Float` is missing `rem_euclid`, so this mirrors the std implementation.
///
/// Due to floating point round-off the result can equal `rhs.abs()` when `lhs` is a tiny
/// negative number. [`norm_angle_deg`] folds that case back to zero.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Reduce an angle in degrees to the canonical range `[0, 360)`.
///
/// Non-finite input is mapped to zero so that a single bad sample cannot poison a heading.
pub fn norm_angle_deg<T>(angle_deg: T) -> T
where
    T: Float
{
    if !angle_deg.is_finite() {
        return T::zero();
    }

    let full = deg_const::<T>(360.0);
    let r = rem_euclid(angle_deg, full);

    if r >= full { T::zero() } else { r }
}

/// Get the shortest signed angular distance from `from_deg` to `to_deg`, in degrees.
///
/// The result lies in `[-180, 180]`. A positive result means `to_deg` lies clockwise of
/// `from_deg` (i.e. the heading has to increase to reach it).
pub fn ang_diff_deg<T>(from_deg: T, to_deg: T) -> T
where
    T: Float
{
    let half = deg_const::<T>(180.0);
    let full = deg_const::<T>(360.0);

    let d = rem_euclid(to_deg - from_deg + half, full) - half;

    // Round-off at the seam can leave d just outside the range
    if d < -half {
        d + full
    }
    else if d > half {
        d - full
    }
    else {
        d
    }
}

/// Blend `from_deg` towards `to_deg` along the shortest arc.
///
/// `weight` is the fraction of the arc to travel, 0 keeps `from_deg` and 1 returns `to_deg`.
/// The result is normalised to `[0, 360)`.
pub fn blend_angle_deg<T>(from_deg: T, to_deg: T, weight: T) -> T
where
    T: Float
{
    norm_angle_deg(from_deg + weight * ang_diff_deg(from_deg, to_deg))
}

fn deg_const<T: Float>(value: f64) -> T {
    T::from(value).unwrap_or_else(T::zero)
}

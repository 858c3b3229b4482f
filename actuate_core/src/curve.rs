//! Piecewise-linear lookup curves.
//!
//! Every table the controller consults (gas/brake maps, decel profiles, rate
//! factors, lockout thresholds) is a `Curve`. Construction validates the shape
//! once so that evaluation in the control loop can never fail.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CurveError {
    #[error("curve has no breakpoints")]
    Empty,
    #[error("breakpoint/value length mismatch ({bp} vs {v})")]
    LengthMismatch { bp: usize, v: usize },
    #[error("curve contains non-finite values")]
    NonFinite,
    #[error("breakpoints must be strictly increasing")]
    Unsorted,
    #[error("values must be monotonic")]
    NonMonotonic,
}

/// Linear interpolation over `(bp, v)` clamping to the end values outside the
/// breakpoint range. Tolerates repeated breakpoints (the later value wins) so it
/// can be used on tables whose breakpoints are themselves computed at runtime.
///
/// `bp` and `v` must be non-empty and of equal length; NaN input maps to the first value.
#[inline]
pub fn interp(x: f32, bp: &[f32], v: &[f32]) -> f32 {
    debug_assert!(!bp.is_empty() && bp.len() == v.len());
    let n = bp.len().min(v.len());
    if n == 0 {
        return 0.0;
    }
    if x.is_nan() || x <= bp[0] {
        return v[0];
    }
    if x >= bp[n - 1] {
        return v[n - 1];
    }
    // Find the first segment whose right breakpoint reaches x
    let mut i = 1;
    while i < n && bp[i] < x {
        i += 1;
    }
    let (x0, x1) = (bp[i - 1], bp[i]);
    let (y0, y1) = (v[i - 1], v[i]);
    if x1 <= x0 {
        return y1;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    bp: Vec<f32>,
    v: Vec<f32>,
}

impl Curve {
    /// Curve with strictly increasing breakpoints and arbitrary values.
    pub fn new(bp: impl Into<Vec<f32>>, v: impl Into<Vec<f32>>) -> Result<Self, CurveError> {
        let bp = bp.into();
        let v = v.into();
        if bp.is_empty() {
            return Err(CurveError::Empty);
        }
        if bp.len() != v.len() {
            return Err(CurveError::LengthMismatch {
                bp: bp.len(),
                v: v.len(),
            });
        }
        if bp.iter().chain(v.iter()).any(|x| !x.is_finite()) {
            return Err(CurveError::NonFinite);
        }
        if bp.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CurveError::Unsorted);
        }
        Ok(Self { bp, v })
    }

    /// Like `new`, additionally requiring monotonic values. Used for device
    /// lookup maps where a non-monotonic table would invert the command.
    pub fn monotonic(bp: impl Into<Vec<f32>>, v: impl Into<Vec<f32>>) -> Result<Self, CurveError> {
        let c = Self::new(bp, v)?;
        let rising = c.v.windows(2).all(|w| w[1] >= w[0]);
        let falling = c.v.windows(2).all(|w| w[1] <= w[0]);
        if rising || falling {
            Ok(c)
        } else {
            Err(CurveError::NonMonotonic)
        }
    }

    /// Build from tables known to be valid at compile time (defaults).
    pub(crate) fn from_static(bp: &[f32], v: &[f32]) -> Self {
        debug_assert!(Self::new(bp.to_vec(), v.to_vec()).is_ok());
        Self {
            bp: bp.to_vec(),
            v: v.to_vec(),
        }
    }

    /// Single-point curve evaluating to `value` everywhere.
    pub fn constant(value: f32) -> Self {
        Self {
            bp: vec![0.0],
            v: vec![value],
        }
    }

    #[inline]
    pub fn eval(&self, x: f32) -> f32 {
        interp(x, &self.bp, &self.v)
    }

    pub fn breakpoints(&self) -> &[f32] {
        &self.bp
    }

    pub fn values(&self) -> &[f32] {
        &self.v
    }

    /// Outermost (largest) breakpoint; inputs below it are inside the curve's active range.
    #[inline]
    pub fn last_bp(&self) -> f32 {
        self.bp[self.bp.len() - 1]
    }

    pub fn min_value(&self) -> f32 {
        self.v.iter().copied().fold(f32::INFINITY, f32::min)
    }

    pub fn max_value(&self) -> f32 {
        self.v.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Scale every value by `k`.
    pub fn scaled(&self, k: f32) -> Self {
        Self {
            bp: self.bp.clone(),
            v: self.v.iter().map(|v| v * k).collect(),
        }
    }
}

use std::f64::consts::LN_2;

use crate::complex::*;

pub const BAILOUT_RADIUS: f64 = 2.0;
const BAILOUT_SQUARED: f64 = BAILOUT_RADIUS * BAILOUT_RADIUS;

/// Outcome of iterating one point: the 0-based iteration at which `z` left
/// the bailout disc (or `max_iter` if it never did) and the last `z`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Escape {
    pub count: u32,
    pub z: C<f64>,
    escaped: bool,
}

impl Escape {
    pub fn escaped(&self) -> bool {
        self.escaped
    }

    /// Continuous escape value `count - log2(ln |z|)`, or `None` for interior
    /// points where the double logarithm is undefined.
    pub fn smooth(&self, max_iter: u32) -> Option<f64> {
        if !self.escaped {
            return None;
        }
        let mu = self.count as f64 - self.z.norm().ln().ln() / LN_2;
        let mu = if mu.is_finite() {
            mu.max(0.0)
        } else {
            self.count as f64
        };
        // |z| > 2 bounds mu by count + 0.53.
        debug_assert!(mu < max_iter as f64);
        Some(mu)
    }

    /// Scalar stored in an escape field. Interior points are `max_iter`.
    pub fn value(&self, mode: EscapeMode, max_iter: u32) -> f64 {
        match (mode, self.smooth(max_iter)) {
            (_, None) => max_iter as f64,
            (EscapeMode::Count, Some(_)) => self.count as f64,
            (EscapeMode::Smooth, Some(mu)) => mu,
        }
    }
}

/// Iterate `z <- z^2 + c` from zero, at most `max_iter` times.
pub fn evaluate(c: C<f64>, max_iter: u32) -> Escape {
    let (cx, cy) = (c.re, c.im);
    let (mut x, mut y) = (0.0f64, 0.0f64);
    for n in 0..max_iter {
        let xx = x * x;
        let yy = y * y;
        let xy = x * y;
        x = xx - yy + cx;
        y = xy + xy + cy;
        if x * x + y * y > BAILOUT_SQUARED {
            return Escape {
                count: n,
                z: C::new(x, y),
                escaped: true,
            };
        }
    }
    Escape {
        count: max_iter,
        z: C::new(x, y),
        escaped: false,
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EscapeMode {
    Count,
    Smooth,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_outside_radius_escapes_immediately() {
        assert_eq!(evaluate(cr(3.0), 200).count, 0);
        assert!(evaluate(cr(3.0), 200).escaped());
        for c in [c(2.1, 0.0), c(0.0, -2.5), c(1.5, 1.5), c(-10.0, 4.0)] {
            assert_eq!(evaluate(c, 50).count, 0, "{}", c);
        }
    }

    #[test]
    fn test_origin_is_interior() {
        for max_iter in [1, 2, 17, 200, 1000] {
            let e = evaluate(cr(0.0), max_iter);
            assert_eq!(e.count, max_iter);
            assert!(!e.escaped());
        }
    }

    #[test]
    fn test_period_two_point_never_escapes() {
        for max_iter in [1, 10, 999, 1000] {
            let e = evaluate(cr(-1.0), max_iter);
            assert_eq!(e.count, max_iter);
            assert!(!e.escaped());
        }
    }

    #[test]
    fn test_escape_count_matches_hand_iteration() {
        // 1 -> 2 -> 5: |2| is not > 2, |5| is.
        let e = evaluate(cr(1.0), 100);
        assert_eq!(e.count, 2);
        assert_eq!(e.z, cr(5.0));
    }

    #[test]
    fn test_smooth_interior_is_none() {
        assert_eq!(evaluate(cr(-1.0), 100).smooth(100), None);
        assert_eq!(evaluate(cr(0.0), 100).value(EscapeMode::Smooth, 100), 100.0);
    }

    #[test]
    fn test_smooth_stays_in_range() {
        for re in [-2.0, -1.9, 0.26, 0.3, 0.5, 1.0, 5.0, 100.0] {
            let e = evaluate(c(re, 0.01), 64);
            if let Some(mu) = e.smooth(64) {
                assert!(mu.is_finite());
                assert!((0.0..64.0).contains(&mu), "{} -> {}", re, mu);
            }
        }
    }

    #[test]
    fn test_smooth_uses_final_z() {
        let e = evaluate(cr(1.0), 100);
        let expected = 2.0 - 5.0f64.ln().ln() / LN_2;
        assert!((e.smooth(100).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_count_mode_value() {
        assert_eq!(evaluate(cr(1.0), 100).value(EscapeMode::Count, 100), 2.0);
        assert_eq!(evaluate(cr(-1.0), 100).value(EscapeMode::Count, 100), 100.0);
    }
}

// Factorial

pub const fn factorial(x: u64) -> u64 {
    let mut result: u64 = 1;
    let mut i: u64 = 1;
    while i <= x {
        result *= i;
        i += 1;
    }
    result
}

pub const fn factorial_reciprocal(x: u64) -> f64 {
    1.0 / (factorial(x) as f64)
}

fn _sin(x: f64) -> f64 {
    // Maclaurin series
    let x2 = x * x;
    let x3 = x2 * x;
    let x5 = x3 * x2;
    let x7 = x5 * x2;
    let x9 = x7 * x2;

    x - factorial_reciprocal(3) * x3 + factorial_reciprocal(5) * x5 - factorial_reciprocal(7) * x7
        + factorial_reciprocal(9) * x9
}

// Sin

/// Computes sin(x), where x is in radians
pub fn sin(mut x: f64) -> f64 {
    let pi = core::f64::consts::PI;
    // Tau is 2π
    let tau = core::f64::consts::TAU;
    // Need to split the input so it's between 0 & π/2 (so approximation is valid)
    while x >= tau {
        x -= tau;
    }
    while x < 0.0 {
        x += tau;
    }
    // Now 0 <= x < 2π
    // This switches the sign if π < x < 2π
    let sign = if x > pi {
        x -= pi;
        -1.0
    } else {
        1.0
    };
    sign * if x <= core::f64::consts::FRAC_PI_2 {
        _sin(x)
    } else {
        // If π/2 < x <= π
        _sin(pi - x)
    }
}

// Breathing

/// Brightness of a sinusoidal breathing cycle at `now_ms`, mapped from the sine's [-1, 1]
/// into [`floor`, 1.0]
pub fn breathe(now_ms: u64, period_ms: u64, floor: f32) -> f32 {
    let t = (now_ms % period_ms) as f64 / period_ms as f64;
    let wave = ((sin(t * core::f64::consts::TAU) + 1.0) / 2.0) as f32;
    (floor + wave * (1.0 - floor)).clamp(floor, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_sin_quadrants() {
        use core::f64::consts::{FRAC_PI_2, PI};
        assert!(close(sin(0.0), 0.0));
        assert!(close(sin(FRAC_PI_2), 1.0));
        assert!(close(sin(PI), 0.0));
        assert!(close(sin(3.0 * FRAC_PI_2), -1.0));
        assert!(close(sin(-FRAC_PI_2), -1.0));
        assert!(close(sin(5.0 * PI + FRAC_PI_2), -1.0));
    }

    #[test]
    fn test_breathe_range() {
        for ms in (0..1200).step_by(7) {
            let b = breathe(ms, 1200, 0.15);
            assert!((0.15 - 1e-4..=1.0 + 1e-4).contains(&b), "{b} at {ms}");
        }
        // Quarter period is the peak, three quarters the trough
        assert!((breathe(300, 1200, 0.15) - 1.0).abs() < 1e-3);
        assert!((breathe(900, 1200, 0.15) - 0.15).abs() < 1e-3);
        assert!((breathe(500, 2000, 0.3) - 1.0).abs() < 1e-3);
    }
}

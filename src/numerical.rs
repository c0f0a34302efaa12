//! Pure rating primitives shared by the competitor implementations.

/// Glicko's scaling constant `q = ln(10) / 400`.
pub const GLICKO_Q: f64 = std::f64::consts::LN_10 / 400.0;

/// Logistic expected score of the left side: `1 / (1 + 10^((r_other - r_self) / scale))`.
///
/// Elo uses this with `scale` equal to its base rating (400 by default),
/// DWZ with a fixed scale of 400. Draws count as half a win, so the value
/// is a probability only up to the usual Elo caveat.
pub fn logistic_expectation(r_self: f64, r_other: f64, scale: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((r_other - r_self) / scale))
}

/// Glicko's g-function, attenuating an update by the opponent's rating deviation.
///
/// `g(rd) = 1 / sqrt(1 + 3 q^2 rd^2 / pi^2)`; equals 1 at `rd = 0` and
/// decreases monotonically as the opponent's rating becomes less certain.
pub fn glicko_g(rd: f64) -> f64 {
    1.0 / (1.0 + 3.0 * GLICKO_Q * GLICKO_Q * rd * rd / (std::f64::consts::PI.powi(2))).sqrt()
}

/// ECF's linear expected score: `0.5 + (r_self - r_other) / scale`, clamped to `[0, 1]`.
///
/// The clamp keeps complementarity: once one side saturates at 1 the other
/// saturates at 0, so the two expectations still sum to 1.
pub fn ecf_linear_expectation(r_self: f64, r_other: f64, scale: f64) -> f64 {
    (0.5 + (r_self - r_other) / scale).clamp(0.0, 1.0)
}

/// DWZ development coefficient per the German Chess Federation schedule.
///
/// `E0 = (r/1000)^4 + j` scaled by the experience factor
/// `a = clamp(r/2000, 0.5, 1)`, plus the acceleration term
/// `B = exp((1300 - r)/150) - 1` for ratings under 1300. The result is
/// truncated and bounded to `[5, min(30, 5 * match_count)]` in the normal
/// regime, or `[5, 150]` while the acceleration term is active.
pub fn dwz_development_coefficient(rating: f64, match_count: u32, j: f64) -> f64 {
    let e0 = (rating / 1000.0).powi(4) + j;
    let a = (rating / 2000.0).clamp(0.5, 1.0);
    let b = if rating < 1300.0 {
        ((1300.0 - rating) / 150.0).exp() - 1.0
    } else {
        0.0
    };

    let e = (a * e0 + b).trunc();
    if b == 0.0 {
        e.min(30f64.min(5.0 * f64::from(match_count))).max(5.0)
    } else {
        e.clamp(5.0, 150.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_logistic_expectation_known_values() {
        assert!((logistic_expectation(400.0, 400.0, 400.0) - 0.5).abs() < 1e-12);
        // 100 points of deficit on a 400 scale
        assert!((logistic_expectation(400.0, 500.0, 400.0) - 0.359935).abs() < 1e-6);
        assert!((logistic_expectation(500.0, 400.0, 400.0) - 0.640065).abs() < 1e-6);
    }

    #[test]
    fn test_logistic_expectation_is_complementary() {
        for (a, b) in [(1500.0, 1700.0), (100.0, 2900.0), (1234.5, 1235.5)] {
            let sum = logistic_expectation(a, b, 400.0) + logistic_expectation(b, a, 400.0);
            assert!((sum - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_glicko_g_decreases_with_deviation() {
        assert!((glicko_g(0.0) - 1.0).abs() < 1e-12);
        let g30 = glicko_g(30.0);
        let g100 = glicko_g(100.0);
        let g350 = glicko_g(350.0);
        assert!(g30 > g100 && g100 > g350);
        assert!(g350 > 0.0);
    }

    #[test]
    fn test_ecf_linear_expectation_clamps() {
        assert!((ecf_linear_expectation(160.0, 120.0, 120.0) - (0.5 + 40.0 / 120.0)).abs() < 1e-12);
        assert_eq!(ecf_linear_expectation(300.0, 100.0, 120.0), 1.0);
        assert_eq!(ecf_linear_expectation(100.0, 300.0, 120.0), 0.0);
        // complementarity survives the clamp
        let sum = ecf_linear_expectation(300.0, 100.0, 120.0) + ecf_linear_expectation(100.0, 300.0, 120.0);
        assert_eq!(sum, 1.0);
    }

    #[test]
    fn test_dwz_development_coefficient_schedule() {
        // A newcomer is pinned to the lower bound regardless of rating.
        assert_eq!(dwz_development_coefficient(1500.0, 0, 10.0), 5.0);
        // The acceleration term dominates for low ratings.
        assert_eq!(dwz_development_coefficient(1100.0, 0, 10.0), 9.0);
        // Experienced players are capped at 30.
        assert!(dwz_development_coefficient(2000.0, 100, 10.0) <= 30.0);
        assert!(dwz_development_coefficient(2000.0, 100, 10.0) >= 5.0);
    }
}

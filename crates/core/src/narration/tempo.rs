/// Bounds of a single atempo-style operation.
const TEMPO_MIN: f64 = 0.5;
const TEMPO_MAX: f64 = 2.0;

/// Decompose a playback-rate target into a chain of operations, each within
/// [0.5, 2.0], whose product equals the target.
///
/// Audio filters clamp single operations to that range; rates outside it
/// must be applied as a chain.
pub fn tempo_chain(target: f64) -> Vec<f64> {
    if !target.is_finite() || target <= 0.0 {
        return vec![1.0];
    }

    let mut chain = Vec::new();
    let mut remaining = target;
    while remaining > TEMPO_MAX {
        chain.push(TEMPO_MAX);
        remaining /= TEMPO_MAX;
    }
    while remaining < TEMPO_MIN {
        chain.push(TEMPO_MIN);
        remaining /= TEMPO_MIN;
    }
    chain.push(remaining);
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(chain: &[f64]) -> f64 {
        chain.iter().product()
    }

    #[test]
    fn test_in_range_target_is_single_op() {
        assert_eq!(tempo_chain(1.35), vec![1.35]);
    }

    #[test]
    fn test_fast_target_splits() {
        assert_eq!(tempo_chain(3.0), vec![2.0, 1.5]);
    }

    #[test]
    fn test_slow_target_splits() {
        assert_eq!(tempo_chain(0.25), vec![0.5, 0.5]);
    }

    #[test]
    fn test_every_factor_in_bounds_and_product_exact() {
        for target in [0.1, 0.4, 0.5, 0.75, 1.0, 1.35, 2.0, 2.5, 3.7, 6.0] {
            let chain = tempo_chain(target);
            for factor in &chain {
                assert!((TEMPO_MIN..=TEMPO_MAX).contains(factor), "target {target}");
            }
            assert!((product(&chain) - target).abs() < 1e-9, "target {target}");
        }
    }

    #[test]
    fn test_degenerate_targets_are_identity() {
        assert_eq!(tempo_chain(0.0), vec![1.0]);
        assert_eq!(tempo_chain(-1.0), vec![1.0]);
        assert_eq!(tempo_chain(f64::NAN), vec![1.0]);
    }
}

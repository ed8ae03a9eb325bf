//! Candidate value generation for the one-parameter-at-a-time search.

use rand::seq::index;
use rand::Rng;

use crate::catalog::ParameterDef;

/// Round to the given number of decimal digits.
pub fn round_to_precision(value: f64, precision: u8) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Enumerate the full discrete domain `[min, max]` at the precision's step,
/// inclusive of both bounds. Endpoint handling is float-tolerant so the max
/// is always present.
pub fn discrete_domain(def: &ParameterDef) -> Vec<f64> {
    let step = def.step();
    let mut values = Vec::new();
    let mut i = 0u64;
    loop {
        let v = def.min + i as f64 * step;
        if v > def.max + step * 1e-6 {
            break;
        }
        values.push(round_to_precision(v.min(def.max), def.precision));
        i += 1;
    }
    values.dedup_by(|a, b| (*a - *b).abs() < step * 1e-6);
    values
}

/// Generate the candidate set for one parameter: the current value first,
/// then `count` alternatives drawn uniformly without replacement from the
/// rest of the domain. When the whole domain is no larger than `count + 1`,
/// the entire domain is returned instead (current value first, no repeats).
///
/// Deterministic given a seeded `rng`; every value is within `[min, max]`.
pub fn generate_values<R: Rng + ?Sized>(
    def: &ParameterDef,
    current: f64,
    count: usize,
    rng: &mut R,
) -> Vec<f64> {
    let current = round_to_precision(current.clamp(def.min, def.max), def.precision);
    let domain = discrete_domain(def);
    let step = def.step();

    let remaining: Vec<f64> = domain
        .iter()
        .copied()
        .filter(|v| (v - current).abs() > step * 1e-6)
        .collect();

    let mut values = Vec::with_capacity(count + 1);
    values.push(current);

    if remaining.len() <= count {
        // Domain too small to sample: return it whole.
        values.extend(remaining);
        return values;
    }

    for idx in index::sample(rng, remaining.len(), count) {
        values.push(remaining[idx]);
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn rng(seed: u64) -> Pcg64 {
        Pcg64::seed_from_u64(seed)
    }

    #[test]
    fn test_integer_domain_inclusive() {
        let def = ParameterDef::new(1.0, 5.0, 0);
        assert_eq!(discrete_domain(&def), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_fractional_domain_hits_max() {
        let def = ParameterDef::new(0.0, 0.3, 2);
        let domain = discrete_domain(&def);
        assert_eq!(domain.len(), 31);
        assert_eq!(domain[0], 0.0);
        assert!((domain[30] - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_generate_count_and_bounds() {
        let def = ParameterDef::new(50.0, 200.0, 0);
        let values = generate_values(&def, 100.0, 5, &mut rng(7));
        assert_eq!(values.len(), 6);
        assert_eq!(values[0], 100.0);
        for v in &values {
            assert!(*v >= 50.0 && *v <= 200.0);
            assert_eq!(*v, v.round());
        }
        // No duplicates.
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        sorted.dedup();
        assert_eq!(sorted.len(), 6);
    }

    #[test]
    fn test_small_domain_returns_whole_domain() {
        let def = ParameterDef::new(1.0, 3.0, 0);
        let values = generate_values(&def, 2.0, 5, &mut rng(1));
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], 2.0);
        assert!(values.contains(&1.0));
        assert!(values.contains(&3.0));
    }

    #[test]
    fn test_exact_fit_domain() {
        // |domain| == count + 1: whole domain, current first.
        let def = ParameterDef::new(1.0, 4.0, 0);
        let values = generate_values(&def, 1.0, 3, &mut rng(9));
        assert_eq!(values.len(), 4);
        assert_eq!(values[0], 1.0);
    }

    #[test]
    fn test_seeds_vary_selection() {
        let def = ParameterDef::new(50.0, 200.0, 0);
        let a = generate_values(&def, 100.0, 2, &mut rng(1));
        let b = generate_values(&def, 100.0, 2, &mut rng(2));
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 3);
        assert_eq!(a[0], 100.0);
        assert_eq!(b[0], 100.0);
        // Different seeds should explore different alternatives (the domain
        // has 150 values, a collision across both picks is astronomically
        // unlikely for these seeds).
        assert_ne!(a[1..], b[1..]);
        // Same seed reproduces exactly.
        let c = generate_values(&def, 100.0, 2, &mut rng(1));
        assert_eq!(a, c);
    }

    #[test]
    fn test_current_outside_bounds_is_clamped() {
        let def = ParameterDef::new(0.0, 1.0, 1);
        let values = generate_values(&def, 4.2, 3, &mut rng(3));
        assert_eq!(values[0], 1.0);
        for v in &values {
            assert!(*v >= 0.0 && *v <= 1.0);
        }
    }

    #[test]
    fn test_fractional_precision_values_on_grid() {
        let def = ParameterDef::new(0.50, 7.00, 2);
        let values = generate_values(&def, 2.5, 10, &mut rng(11));
        for v in &values {
            let scaled = v * 100.0;
            assert!((scaled - scaled.round()).abs() < 1e-6, "{v} off grid");
        }
    }
}

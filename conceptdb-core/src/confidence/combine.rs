//! Combination rules shared by local confidence and graph propagation.
//!
//! The probabilistic rules treat every factor as independent. That is an
//! approximation: two reasons derived from the same source are correlated,
//! and the product/complement formulas will overstate agreement between them.

/// Hamacher product of a sequence of values in [0, 1].
///
/// Unlike a plain product it scales roughly linearly with its inputs, so
/// combining many moderately strong factors does not collapse toward zero.
/// Inputs are clamped to [0, 1]; any zero input yields zero. The empty
/// product is 1.
pub fn hamacher<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut result = 1.0;
    for value in values {
        let value = value.clamp(0.0, 1.0);
        let denominator = result + value - result * value;
        if denominator <= 0.0 {
            return 0.0;
        }
        result = (result * value) / denominator;
    }
    result
}

/// Parallel combination `1 / (1/a + 1/b + …)`, as for resistors in parallel.
///
/// Dominated by the smallest input. Any non-positive input yields zero.
/// The empty combination is zero.
pub fn parallel<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut inverse_sum = 0.0;
    let mut any = false;
    for value in values {
        if value <= 0.0 {
            return 0.0;
        }
        inverse_sum += 1.0 / value;
        any = true;
    }
    if !any || inverse_sum == 0.0 {
        return 0.0;
    }
    1.0 / inverse_sum
}

/// Probability that a conjunction holds: Π clamp(confidence) · clamp(weight).
pub fn conjunction_probability<I>(factors: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    factors
        .into_iter()
        .map(|(confidence, weight)| clamp_unit(confidence) * clamp_unit(weight))
        .product()
}

/// Probability that at least one conjunction holds: 1 - Π(1 - P(conj)).
///
/// An empty disjunction has confidence 0.
pub fn disjunction_confidence<I>(conjunction_probabilities: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let none_hold: f64 = conjunction_probabilities
        .into_iter()
        .map(|p| 1.0 - clamp_unit(p))
        .product();
    clamp_unit(1.0 - none_hold)
}

/// "Support is right and opposition is not": C(support) · (1 - C(oppose)).
pub fn support_against_oppose(support: f64, oppose: f64) -> f64 {
    clamp_unit(clamp_unit(support) * (1.0 - clamp_unit(oppose)))
}

/// Weighted average of votes around a prior:
/// `(prior · prior_weight + Σ vote·w) / (prior_weight + Σ w)`.
///
/// Non-positive total weight falls back to the prior.
pub fn weighted_vote<I>(prior: f64, prior_weight: f64, votes: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut numerator = prior * prior_weight;
    let mut total_weight = prior_weight;
    for (vote, weight) in votes {
        numerator += vote * weight;
        total_weight += weight;
    }
    if total_weight <= 0.0 || !total_weight.is_finite() {
        return clamp_unit(prior);
    }
    clamp_unit(numerator / total_weight)
}

/// Clamp to [0, 1], mapping NaN to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_vote_matches_unit_weight_average() {
        // Two supports and one opposition at weight 1: (0.5 + 2) / (1 + 3).
        let c = weighted_vote(0.5, 1.0, [(1.0, 1.0), (1.0, 1.0), (0.0, 1.0)]);
        assert!((c - 0.625).abs() < 1e-12);
        assert_eq!(weighted_vote(0.5, 1.0, std::iter::empty()), 0.5);
        assert_eq!(weighted_vote(0.5, 0.0, std::iter::empty()), 0.5);
    }

    #[test]
    fn hamacher_identity_and_zero() {
        assert_eq!(hamacher(std::iter::empty()), 1.0);
        assert_eq!(hamacher([1.0, 1.0, 1.0]), 1.0);
        assert_eq!(hamacher([0.7, 0.0, 0.9]), 0.0);
        assert_eq!(hamacher([0.0, 0.0]), 0.0);
    }

    #[test]
    fn hamacher_of_two_halves_is_one_third() {
        assert!((hamacher([0.5, 0.5]) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn hamacher_decays_slower_than_product() {
        let values = [0.6; 6];
        let product: f64 = values.iter().product();
        assert!(hamacher(values) > product);
    }

    #[test]
    fn parallel_is_dominated_by_weakest() {
        assert!((parallel([1.0, 1.0]) - 0.5).abs() < 1e-12);
        assert!(parallel([0.01, 100.0]) < 0.01);
        assert_eq!(parallel([0.5, 0.0]), 0.0);
        assert_eq!(parallel(std::iter::empty()), 0.0);
    }

    #[test]
    fn disjunction_of_nothing_is_zero() {
        assert_eq!(disjunction_confidence(std::iter::empty()), 0.0);
    }

    #[test]
    fn weights_are_clamped_not_rejected() {
        assert_eq!(conjunction_probability([(1.0, 3.0)]), 1.0);
        assert_eq!(conjunction_probability([(1.0, -2.0)]), 0.0);
    }
}

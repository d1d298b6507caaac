use std::collections::HashMap;

use ndarray::Array1;

use crate::{model::TokenId, session::parameter::Penalties};

/// Repetition, frequency and presence penalties over the tail of `history`.
pub fn apply_penalties(
    logits: &mut Array1<f32>,
    history: &[TokenId],
    penalties: &Penalties,
) {
    if penalties.is_disabled() {
        return;
    }

    let window_start = history.len().saturating_sub(penalties.repeat_last_n);
    let mut counts: HashMap<TokenId, usize> = HashMap::new();
    for &token in &history[window_start..] {
        *counts.entry(token).or_insert(0) += 1;
    }

    for (&token, &count) in &counts {
        let index = token as usize;
        if index >= logits.len() {
            continue;
        }
        let mut score = logits[index];
        if score <= 0.0 {
            score *= penalties.repetition_penalty;
        } else {
            score /= penalties.repetition_penalty;
        }
        score -= count as f32 * penalties.frequency_penalty
            + penalties.presence_penalty;
        logits[index] = score;
    }
}

pub fn apply_temperature(
    logits: &mut Array1<f32>,
    temperature: f32,
) {
    // Guard against div by zero
    if temperature > 1e-5 && temperature != 1.0 {
        *logits /= temperature;
    }
}

/// Keeps the `k` largest logits. Ties keep the lower token id.
pub fn top_k_filtering(
    logits: &mut Array1<f32>,
    k: usize,
) {
    if k == 0 || k >= logits.len() {
        return;
    }
    let indices = sorted_indices(logits);
    for &index in &indices[k..] {
        logits[index] = f32::NEG_INFINITY;
    }
}

/// Keeps the smallest prefix of most likely tokens whose probability mass
/// reaches `p`. At least one token always survives.
pub fn top_p_filtering(
    logits: &mut Array1<f32>,
    p: f32,
) {
    if p >= 1.0 {
        return;
    }
    let indices = sorted_indices(logits);
    let probs = softmax(logits);

    let mut cumulative = 0.0;
    for (rank, &index) in indices.iter().enumerate() {
        cumulative += probs[index];
        if cumulative >= p {
            for &dropped in &indices[rank + 1..] {
                logits[dropped] = f32::NEG_INFINITY;
            }
            break;
        }
    }
}

/// Drops tokens less likely than `min_p` times the most likely one.
pub fn min_p_filtering(
    logits: &mut Array1<f32>,
    min_p: f32,
) {
    let probs = softmax(logits);
    let max_prob = probs.fold(0.0f32, |a, &b| a.max(b));
    let cutoff = max_prob * min_p;

    for (index, &prob) in probs.iter().enumerate() {
        if prob < cutoff {
            logits[index] = f32::NEG_INFINITY;
        }
    }
}

pub fn softmax(logits: &Array1<f32>) -> Array1<f32> {
    let max_logit = logits.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let mut probs = logits.mapv(|logit| (logit - max_logit).exp());
    let sum = probs.sum();
    if sum > 0.0 {
        probs /= sum;
    }
    probs
}

/// Index of the first maximal logit.
pub fn argmax(logits: &Array1<f32>) -> TokenId {
    let mut best_index = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (index, &value) in logits.iter().enumerate() {
        if value > best_value {
            best_index = index;
            best_value = value;
        }
    }
    best_index as TokenId
}

/// Inverse CDF lookup of `uniform` (in `[0, 1)`) over `probs`.
pub fn sample_from_probs(
    probs: &Array1<f32>,
    uniform: f32,
) -> TokenId {
    let mut cumulative = 0.0;
    let mut last_nonzero = 0;
    for (index, &prob) in probs.iter().enumerate() {
        if prob <= 0.0 {
            continue;
        }
        cumulative += prob;
        last_nonzero = index;
        if cumulative > uniform {
            return index as TokenId;
        }
    }
    last_nonzero as TokenId
}

fn sorted_indices(logits: &Array1<f32>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..logits.len()).collect();
    indices.sort_by(|&a, &b| logits[b].total_cmp(&logits[a]));
    indices
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn test_top_k_filtering_basic() {
        let mut logits = array![1.0, 4.0, 3.0, 2.0];
        top_k_filtering(&mut logits, 2);
        assert_eq!(logits[1], 4.0);
        assert_eq!(logits[2], 3.0);
        assert_eq!(logits[0], f32::NEG_INFINITY);
        assert_eq!(logits[3], f32::NEG_INFINITY);
    }

    #[test]
    fn test_top_k_filtering_k_is_len() {
        let mut logits = array![1.0, 2.0, 3.0];
        top_k_filtering(&mut logits, 3);
        assert_eq!(logits, array![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_top_p_keeps_at_least_one() {
        let mut logits = array![10.0, 0.0, 0.0];
        top_p_filtering(&mut logits, 0.5);
        assert_eq!(logits[0], 10.0);
        assert_eq!(logits[1], f32::NEG_INFINITY);
        assert_eq!(logits[2], f32::NEG_INFINITY);
    }

    #[test]
    fn test_top_p_accumulates_mass() {
        // probabilities 0.5, 0.25, 0.25
        let mut logits = array![2.0f32.ln(), 0.0, 0.0];
        top_p_filtering(&mut logits, 0.7);
        assert!(logits[0].is_finite());
        assert!(logits[1].is_finite());
        assert_eq!(logits[2], f32::NEG_INFINITY);
    }

    #[test]
    fn test_min_p_filtering() {
        // probabilities 0.5, 0.25, 0.25 -> cutoff 0.3
        let mut logits = array![2.0f32.ln(), 0.0, 0.0];
        min_p_filtering(&mut logits, 0.6);
        assert!(logits[0].is_finite());
        assert_eq!(logits[1], f32::NEG_INFINITY);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&array![1.0, 2.0, f32::NEG_INFINITY]);
        assert!(is_close!(probs.sum(), 1.0f32));
        assert_eq!(probs[2], 0.0);
    }

    #[test]
    fn test_argmax_first_maximum() {
        assert_eq!(argmax(&array![1.0, 3.0, 3.0, 2.0]), 1);
    }

    #[test]
    fn test_sample_from_probs_inverse_cdf() {
        let probs = array![0.25, 0.0, 0.75];
        assert_eq!(sample_from_probs(&probs, 0.1), 0);
        assert_eq!(sample_from_probs(&probs, 0.3), 2);
        assert_eq!(sample_from_probs(&probs, 0.999), 2);
    }

    #[test]
    fn test_repetition_penalty_signs() {
        let mut logits = array![2.0, -2.0, 1.0];
        let penalties = Penalties {
            repeat_last_n: 8,
            repetition_penalty: 2.0,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        };
        apply_penalties(&mut logits, &[0, 1], &penalties);
        assert_eq!(logits, array![1.0, -4.0, 1.0]);
    }

    #[test]
    fn test_frequency_and_presence_penalties() {
        let mut logits = array![1.0, 1.0, 1.0];
        let penalties = Penalties {
            repeat_last_n: 8,
            repetition_penalty: 1.0,
            presence_penalty: 0.5,
            frequency_penalty: 0.25,
        };
        apply_penalties(&mut logits, &[2, 2, 0], &penalties);
        assert!(is_close!(logits[0], 0.25f32));
        assert!(is_close!(logits[1], 1.0f32));
        assert!(is_close!(logits[2], 0.0f32));
    }

    #[test]
    fn test_penalty_window() {
        let mut logits = array![2.0, 2.0];
        let penalties = Penalties {
            repeat_last_n: 1,
            repetition_penalty: 2.0,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        };
        apply_penalties(&mut logits, &[0, 1], &penalties);
        assert_eq!(logits, array![2.0, 1.0]);
    }
}

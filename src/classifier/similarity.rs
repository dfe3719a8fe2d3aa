use std::collections::HashMap;

fn frequencies<S: AsRef<str>>(words: &[S]) -> HashMap<&str, u64> {
    let mut freq = HashMap::with_capacity(words.len());
    for word in words {
        *freq.entry(word.as_ref()).or_insert(0) += 1;
    }
    freq
}

/// Normalized cosine overlap between `observed` words and a `reference`
/// (gold) list, in `[0, 1]`.
///
/// The observed-side magnitude only counts words that also appear in the
/// reference, so scores run higher than a textbook cosine. Every threshold in
/// the cascade is tuned against this definition.
pub fn similarity<A: AsRef<str>, B: AsRef<str>>(observed: &[A], reference: &[B]) -> f64 {
    let observed = frequencies(observed);
    let reference = frequencies(reference);

    let mut dot: u64 = 0;
    let mut observed_squares: u64 = 0;
    let mut reference_squares: u64 = 0;

    for (word, &gold_count) in &reference {
        reference_squares += gold_count * gold_count;
        if let Some(&count) = observed.get(word) {
            dot += gold_count * count;
            observed_squares += count * count;
        }
    }

    if observed_squares == 0 || reference_squares == 0 {
        return 0.0;
    }
    dot as f64 / ((observed_squares as f64).sqrt() * (reference_squares as f64).sqrt())
}

//! Evenly spaced sample selection over a tag population.

/// Step between sampled indices: `population / sample_count`, at least 1.
///
/// A zero `sample_count` has no meaningful step and yields 1.
#[inline]
pub fn sample_step(population: usize, sample_count: usize) -> usize {
    population.checked_div(sample_count).unwrap_or(0).max(1)
}

/// Indices `0, step, 2·step, ...` until `sample_count` are chosen or the next
/// one would fall outside the population.
///
/// Small populations therefore yield fewer than `sample_count` indices, and
/// no returned index is ever `>= population`.
///
/// # Example
///
/// ```rust
/// use voltage_crosscheck::sample_indices;
///
/// assert_eq!(sample_indices(10, 5), vec![0, 2, 4, 6, 8]);
/// assert_eq!(sample_indices(3, 20), vec![0, 1, 2]);
/// ```
pub fn sample_indices(population: usize, sample_count: usize) -> Vec<usize> {
    let step = sample_step(population, sample_count);
    (0..population)
        .step_by(step)
        .take(sample_count)
        .collect()
}

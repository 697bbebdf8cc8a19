//! # Peak Picking Module
//!
//! Small numeric helpers used on the cepstrum before a pitch is read off:
//! a non-causal mean filter for smoothing, and quadratic interpolation of a
//! peak location to sub-sample accuracy.

/// Non-causal mean filter of odd length `F`, replacing each sample `N` with
/// the mean of samples `[N - F/2 ..= N + F/2]` that exist in the input.
#[derive(Debug, Clone, Copy)]
pub struct MeanFilter {
    length: usize,
}

impl MeanFilter {
    /// Creates a filter of the given length. Only odd lengths are
    /// meaningful; an even length behaves like the next odd one up.
    pub fn new(length: usize) -> Self {
        MeanFilter {
            length: length.max(1),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Filters the `out.len()` samples of `input` starting at `offset`.
    ///
    /// Neighbours outside `input` are skipped rather than zero-padded, so
    /// the edges are averaged over fewer samples.
    pub fn filter_subsequence(&self, input: &[f64], out: &mut [f64], offset: usize) {
        let half = (self.length / 2) as isize;
        for (i, value) in out.iter_mut().enumerate() {
            let centre = (i + offset) as isize;
            let from = (centre - half).max(0) as usize;
            let to = ((centre + half + 1).max(0) as usize).min(input.len());
            *value = if from < to {
                input[from..to].iter().sum::<f64>() / (to - from) as f64
            } else {
                0.0
            };
        }
    }
}

/// Returns the interpolated location of the highest peak in `data`.
///
/// If several samples share the maximum value, the one with the lowest
/// index is used, even if a later peak would be higher after
/// interpolation. Returns 0 for empty input.
pub fn find_peak_location(data: &[f64]) -> f64 {
    let mut max_index = 0;
    for (i, value) in data.iter().enumerate() {
        if *value > data[max_index] {
            max_index = i;
        }
    }
    find_peak_location_at(data, max_index)
}

/// Returns the interpolated location of the peak whose nearest sample is
/// at `peak_index`.
///
/// Fits a parabola through the peak sample and its two neighbours, after
/// <https://ccrma.stanford.edu/~jos/sasp/Quadratic_Interpolation_Spectral_Peaks.html>.
/// At either end of the data, or on a flat top, the index is returned as is.
pub fn find_peak_location_at(data: &[f64], peak_index: usize) -> f64 {
    if peak_index < 1 || peak_index + 2 > data.len() {
        return peak_index as f64;
    }

    let alpha = data[peak_index - 1];
    let beta = data[peak_index];
    let gamma = data[peak_index + 1];

    let denominator = alpha - 2.0 * beta + gamma;
    if denominator == 0.0 {
        return peak_index as f64;
    }

    let shift = ((alpha - gamma) / denominator) / 2.0;
    peak_index as f64 + shift
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_at_sample_n3() {
        let data = [0.0, 10.0, 0.0];
        assert_eq!(find_peak_location_at(&data, 1), 1.0);
        assert_eq!(find_peak_location(&data), 1.0);
    }

    #[test]
    fn peak_at_sample_n5() {
        let data = [0.0, 10.0, 20.0, 10.0, 0.0];
        assert_eq!(find_peak_location_at(&data, 2), 2.0);
        assert_eq!(find_peak_location(&data), 2.0);
    }

    #[test]
    fn flat() {
        let data = [1.0; 5];
        // No superior neighbours: the index itself
        assert_eq!(find_peak_location_at(&data, 2), 2.0);
        // First value as good as any
        assert_eq!(find_peak_location(&data), 0.0);
    }

    #[test]
    fn multi_peak() {
        let data = [1.0, 2.0, 1.0, 2.0, 1.0];
        assert_eq!(find_peak_location_at(&data, 3), 3.0);
        assert_eq!(find_peak_location(&data), 1.0);
    }

    #[test]
    fn edges_are_not_interpolated() {
        let data = [1.0, 1.0, 0.0, 0.0];
        assert_eq!(find_peak_location_at(&data, 0), 0.0);

        let data = [0.0, 0.0, 1.0, 1.0];
        assert_eq!(find_peak_location_at(&data, 3), 3.0);
        // The first maximum is index 2, which can be interpolated
        let location = find_peak_location(&data);
        assert!(location > 2.0 && location < 3.0);
    }

    #[test]
    fn halfway() {
        let data = [1.0, 1.0, 1.0, 2.0, 2.0, 1.0, 1.0, 1.0];
        assert_eq!(find_peak_location_at(&data, 3), 3.5);
        assert_eq!(find_peak_location_at(&data, 4), 3.5);
        assert_eq!(find_peak_location(&data), 3.5);

        let data = [1.0, 2.0, 2.0, 1.0];
        assert_eq!(find_peak_location_at(&data, 1), 1.5);
        assert_eq!(find_peak_location(&data), 1.5);
    }

    #[test]
    fn off_centre() {
        let data = [1.0, 1.5, 2.0, 1.0];
        let location = find_peak_location(&data);
        assert!(location > 1.5 && location < 2.0);

        let data = [1.0, 2.0, 1.5, 1.0];
        let location = find_peak_location(&data);
        assert!(location > 1.0 && location < 1.5);
    }

    #[test]
    fn empty_input() {
        assert_eq!(find_peak_location(&[]), 0.0);
    }

    #[test]
    fn unit_filter_is_identity() {
        let input = [1.0, 5.0, 2.0, 8.0];
        let mut out = [0.0; 4];
        MeanFilter::new(1).filter_subsequence(&input, &mut out, 0);
        assert_eq!(out, input);
    }

    #[test]
    fn filter_averages_available_neighbours() {
        let input = [3.0, 6.0, 9.0, 12.0];
        let mut out = [0.0; 4];
        MeanFilter::new(3).filter_subsequence(&input, &mut out, 0);
        assert_eq!(out, [4.5, 6.0, 9.0, 10.5]);
    }

    #[test]
    fn filter_subsequence_reads_around_offset() {
        let input = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let mut out = [0.0; 2];
        MeanFilter::new(3).filter_subsequence(&input, &mut out, 2);
        assert_eq!(out, [2.0, 3.0]);
    }
}

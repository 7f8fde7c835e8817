/// Useful enumerations for particle identification and the observables tracked by histograms.
pub mod enums;
/// Three- and four-vectors with the kinematic quantities common in collider analyses.
pub mod vectors;

/// A helper method to get histogram edges from evenly-spaced `bins` over a given `range`
///
/// The result has `bins + 1` entries, the first and last of which are exactly the limits of
/// `range`.
///
/// # See Also
/// [`Histogram`](crate::histograms::Histogram)
/// [`get_bin_index`]
pub fn get_bin_edges(bins: usize, range: (f64, f64)) -> Vec<f64> {
    let bin_width = (range.1 - range.0) / (bins as f64);
    (0..=bins)
        .map(|i| {
            if i == bins {
                range.1
            } else {
                range.0 + (i as f64 * bin_width)
            }
        })
        .collect()
}

/// A helper method to obtain the index of the bin where a value should go in a histogram with
/// the given (monotonically increasing) `bin_edges`
///
/// Bins are half-open, $`[e_i, e_{i+1})`$, so a value on an interior edge belongs to the bin
/// above it and a value equal to the last edge is out of range. Values outside the edges
/// (and `NaN`) yield [`None`].
///
/// # See Also
/// [`Histogram`](crate::histograms::Histogram)
/// [`get_bin_edges`]
pub fn get_bin_index(value: f64, bin_edges: &[f64]) -> Option<usize> {
    let (first, last) = (bin_edges.first()?, bin_edges.last()?);
    if value >= *first && value < *last {
        // number of edges <= value, minus one
        Some(bin_edges.partition_point(|edge| *edge <= value) - 1)
    } else {
        None
    }
}

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    ops::Index,
    path::{Path, PathBuf},
};

use indexmap::{IndexMap, IndexSet};
use plotters::prelude::{ChartBuilder, IntoDrawingArea, LineSeries, SVGBackend, BLACK, BLUE, WHITE};
use serde::{Deserialize, Serialize};

use crate::{
    data::NOMINAL_WEIGHT,
    utils::{enums::Observable, get_bin_edges, get_bin_index},
    HepdistError, HepdistResult,
};

/// A simple struct which represents a histogram with fixed bin edges and weighted counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// The edges of each bin (length is one greater than `counts`)
    pub bin_edges: Vec<f64>,
    /// The number of counts in each bin (`f64`s since these are weighted counts)
    pub counts: Vec<f64>,
}

impl Histogram {
    /// Create an empty histogram with the given bin edges.
    ///
    /// # Panics
    ///
    /// Panics if there are fewer than two edges or the edges are not strictly increasing.
    pub fn new(bin_edges: Vec<f64>) -> Self {
        assert!(
            bin_edges.len() >= 2,
            "A histogram needs at least two bin edges!"
        );
        assert!(
            bin_edges.windows(2).all(|w| w[0] < w[1]),
            "Bin edges must be strictly increasing!"
        );
        let counts = vec![0.0; bin_edges.len() - 1];
        Self { bin_edges, counts }
    }
    /// Create an empty histogram with evenly spaced `bins` over the given `range`.
    pub fn uniform(bins: usize, range: (f64, f64)) -> Self {
        Self::new(get_bin_edges(bins, range))
    }
    /// The number of bins.
    pub fn bins(&self) -> usize {
        self.counts.len()
    }
    /// The lower and upper edges of the histogram.
    pub fn range(&self) -> (f64, f64) {
        (self.bin_edges[0], self.bin_edges[self.bin_edges.len() - 1])
    }
    /// The index of the bin containing `value`, following [`get_bin_index`].
    pub fn find_bin(&self, value: f64) -> Option<usize> {
        get_bin_index(value, &self.bin_edges)
    }
    /// Add `weight` to the bin containing `value`.
    ///
    /// Values outside the bin edges are silently dropped; the return value reports whether the
    /// value was counted.
    pub fn fill(&mut self, value: f64, weight: f64) -> bool {
        match self.find_bin(value) {
            Some(index) => {
                self.counts[index] += weight;
                true
            }
            None => false,
        }
    }
    /// The sum of the counts in all bins.
    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }
    /// The midpoint of each bin.
    pub fn bin_centers(&self) -> Vec<f64> {
        self.bin_edges
            .windows(2)
            .map(|w| 0.5 * (w[0] + w[1]))
            .collect()
    }
}

/// The configuration of one histogram: which quantity it tracks, which event weight it is
/// filled with, and its binning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSpec {
    /// The name of the histogram (also the name of its exported file)
    pub name: String,
    /// The quantity filled into the histogram
    pub observable: Observable,
    /// The name of the event weight used for every fill
    pub weight: String,
    /// The number of evenly spaced bins
    pub bins: usize,
    /// The lower and upper edges of the histogram
    pub range: (f64, f64),
}

impl HistogramSpec {
    /// Create a new [`HistogramSpec`].
    pub fn new<N: Into<String>, W: Into<String>>(
        name: N,
        observable: Observable,
        weight: W,
        bins: usize,
        range: (f64, f64),
    ) -> Self {
        Self {
            name: name.into(),
            observable,
            weight: weight.into(),
            bins,
            range,
        }
    }
    /// The bin edges described by this spec.
    pub fn bin_edges(&self) -> Vec<f64> {
        get_bin_edges(self.bins, self.range)
    }
    fn validate(&self) -> HepdistResult<()> {
        let reason = if self.bins == 0 {
            "the number of bins must be greater than zero"
        } else if !(self.range.0.is_finite() && self.range.1.is_finite()) {
            "the range must be finite"
        } else if self.range.0 >= self.range.1 {
            "the lower edge of the range must be smaller than the upper edge"
        } else {
            return Ok(());
        };
        Err(HepdistError::BinningError {
            name: self.name.clone(),
            reason: reason.to_string(),
        })
    }
}

/// A [`Histogram`] together with the [`HistogramSpec`] it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accumulator {
    /// The configuration of the histogram
    pub spec: HistogramSpec,
    /// The accumulated counts
    pub histogram: Histogram,
}

impl Accumulator {
    fn new(spec: HistogramSpec) -> Self {
        let histogram = Histogram::new(spec.bin_edges());
        Self { spec, histogram }
    }
}

#[derive(Serialize)]
struct HistogramRecord<'a> {
    name: &'a str,
    observable: String,
    weight: &'a str,
    bin_edges: &'a [f64],
    counts: &'a [f64],
}

/// The set of named histograms filled by the [`Engine`](crate::engine::Engine).
///
/// The names are fixed when the set is built by a [`Registry`] and keep their declaration
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Histograms {
    accumulators: IndexMap<String, Accumulator>,
}

impl Histograms {
    /// Get a histogram by name.
    pub fn get(&self, name: &str) -> Option<&Histogram> {
        self.accumulators.get(name).map(|acc| &acc.histogram)
    }
    /// Get a histogram and its configuration by name.
    pub fn accumulator(&self, name: &str) -> Option<&Accumulator> {
        self.accumulators.get(name)
    }
    /// Iterate over `(name, accumulator)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Accumulator)> + '_ {
        self.accumulators
            .iter()
            .map(|(name, acc)| (name.as_str(), acc))
    }
    pub(crate) fn accumulators_mut(&mut self) -> impl Iterator<Item = &mut Accumulator> + '_ {
        self.accumulators.values_mut()
    }
    /// The names of all histograms in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.accumulators.keys().map(String::as_str).collect()
    }
    /// The distinct event-weight names the histograms are filled with.
    pub fn weight_keys(&self) -> IndexSet<&str> {
        self.accumulators
            .values()
            .map(|acc| acc.spec.weight.as_str())
            .collect()
    }
    /// The number of histograms.
    pub fn len(&self) -> usize {
        self.accumulators.len()
    }
    /// Whether the set holds no histograms.
    pub fn is_empty(&self) -> bool {
        self.accumulators.is_empty()
    }

    /// Write every histogram to `<dir>/<name>.pkl` as a Python pickle of a dictionary with the
    /// keys `name`, `observable`, `weight`, `bin_edges`, and `counts`.
    ///
    /// The directory (and its parents) is created if it does not exist. `~` and environment
    /// variables in the path are expanded. Returns the paths of the written files.
    pub fn write_pickles(&self, dir: &str) -> HepdistResult<Vec<PathBuf>> {
        let dir = PathBuf::from(&*shellexpand::full(dir)?);
        fs::create_dir_all(&dir)?;
        let mut paths = Vec::with_capacity(self.len());
        for (name, acc) in &self.accumulators {
            let path = dir.join(format!("{name}.pkl"));
            write_record(acc, &path)?;
            tracing::debug!(path = %path.display(), "wrote histogram");
            paths.push(path);
        }
        tracing::info!(
            histograms = paths.len(),
            dir = %dir.display(),
            "exported histograms"
        );
        Ok(paths)
    }

    /// Draw every histogram as a step outline to `<dir>/<name>.svg`.
    ///
    /// The figures carry no text, so drawing them does not depend on any installed fonts.
    /// The directory is created if it does not exist. Returns the paths of the written files.
    pub fn write_plots(&self, dir: &str) -> HepdistResult<Vec<PathBuf>> {
        let dir = PathBuf::from(&*shellexpand::full(dir)?);
        fs::create_dir_all(&dir)?;
        let mut paths = Vec::with_capacity(self.len());
        for (name, acc) in &self.accumulators {
            let path = dir.join(format!("{name}.svg"));
            draw_histogram(&acc.histogram, &path).map_err(|err| HepdistError::PlotError {
                name: name.clone(),
                reason: err.to_string(),
            })?;
            tracing::debug!(path = %path.display(), "drew histogram");
            paths.push(path);
        }
        tracing::info!(histograms = paths.len(), dir = %dir.display(), "drew histograms");
        Ok(paths)
    }
}

/// The outline of a histogram drawn as steps, closed down to zero at both ends.
fn step_outline(histogram: &Histogram) -> Vec<(f64, f64)> {
    let (lo, hi) = histogram.range();
    let mut points = Vec::with_capacity(2 * histogram.bins() + 2);
    points.push((lo, 0.0));
    for (edges, &count) in histogram.bin_edges.windows(2).zip(&histogram.counts) {
        points.push((edges[0], count));
        points.push((edges[1], count));
    }
    points.push((hi, 0.0));
    points
}

fn draw_histogram(histogram: &Histogram, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (lo, hi) = histogram.range();
    let y_min = histogram.counts.iter().copied().fold(0.0, f64::min);
    let y_max = histogram.counts.iter().copied().fold(0.0, f64::max);
    let (y_min, y_max) = if y_max > y_min {
        (1.1 * y_min, 1.1 * y_max)
    } else {
        (0.0, 1.0)
    };

    let root = SVGBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(lo..hi, y_min..y_max)?;
    chart.draw_series(LineSeries::new([(lo, 0.0), (hi, 0.0)], &BLACK))?;
    chart.draw_series(LineSeries::new(step_outline(histogram), &BLUE))?;
    root.present()?;
    Ok(())
}

fn write_record(acc: &Accumulator, path: &Path) -> HepdistResult<()> {
    let record = HistogramRecord {
        name: &acc.spec.name,
        observable: acc.spec.observable.to_string(),
        weight: &acc.spec.weight,
        bin_edges: &acc.histogram.bin_edges,
        counts: &acc.histogram.counts,
    };
    let mut writer = BufWriter::new(File::create(path)?);
    serde_pickle::to_writer(&mut writer, &record, serde_pickle::SerOptions::new())?;
    writer.flush()?;
    Ok(())
}

impl Index<&str> for Histograms {
    type Output = Histogram;

    fn index(&self, name: &str) -> &Self::Output {
        self.get(name)
            .unwrap_or_else(|| panic!("No histogram named \"{name}\""))
    }
}

impl<'a> IntoIterator for &'a Histograms {
    type Item = (&'a String, &'a Accumulator);
    type IntoIter = indexmap::map::Iter<'a, String, Accumulator>;

    fn into_iter(self) -> Self::IntoIter {
        self.accumulators.iter()
    }
}

/// The declaration of which histograms to fill.
///
/// [`Registry::default`] holds the standard dilepton analysis: the dilepton invariant mass
/// under the nominal weight and two coupling hypotheses, the per-lepton pseudorapidity and
/// transverse momentum, and the dilepton transverse momentum. Another reweighting scenario is
/// one more [`HistogramSpec`]:
///
/// ```
/// use hepdist::{HistogramSpec, Observable, Registry};
///
/// let histograms = Registry::default()
///     .with(HistogramSpec::new(
///         "dilep_minv_rwgt_0p5",
///         Observable::DileptonMass,
///         "Coup-0p5",
///         49,
///         (500.0, 1500.0),
///     ))
///     .build()
///     .unwrap();
/// assert_eq!(histograms.len(), 7);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    specs: Vec<HistogramSpec>,
}

impl Default for Registry {
    fn default() -> Self {
        let mass_range = (500.0, 1500.0);
        Self::new()
            .with(HistogramSpec::new(
                "dilep_minv",
                Observable::DileptonMass,
                NOMINAL_WEIGHT,
                49,
                mass_range,
            ))
            .with(HistogramSpec::new(
                "dilep_minv_rwgt_1p0",
                Observable::DileptonMass,
                "Coup-1p0",
                49,
                mass_range,
            ))
            .with(HistogramSpec::new(
                "dilep_minv_rwgt_0p1",
                Observable::DileptonMass,
                "Coup-0p1",
                49,
                mass_range,
            ))
            .with(HistogramSpec::new(
                "lep_eta",
                Observable::LeptonEta,
                NOMINAL_WEIGHT,
                49,
                (-5.0, 5.0),
            ))
            .with(HistogramSpec::new(
                "lep_pt",
                Observable::LeptonPt,
                NOMINAL_WEIGHT,
                49,
                (0.0, 1000.0),
            ))
            .with(HistogramSpec::new(
                "dilep_pt",
                Observable::DileptonPt,
                NOMINAL_WEIGHT,
                49,
                (0.0, 1000.0),
            ))
    }
}

impl Registry {
    /// An empty [`Registry`].
    pub fn new() -> Self {
        Self { specs: Vec::new() }
    }
    /// Declare another histogram.
    pub fn with(mut self, spec: HistogramSpec) -> Self {
        self.specs.push(spec);
        self
    }
    /// The declared histograms, in order.
    pub fn specs(&self) -> &[HistogramSpec] {
        &self.specs
    }
    /// Build the empty [`Histograms`] set.
    ///
    /// # Errors
    ///
    /// Returns [`HepdistError::RegistrationError`] if two histograms share a name, and
    /// [`HepdistError::BinningError`] if a histogram has no bins or an empty or non-finite
    /// range.
    pub fn build(&self) -> HepdistResult<Histograms> {
        let mut seen = IndexSet::new();
        for spec in &self.specs {
            spec.validate()?;
            if !seen.insert(spec.name.as_str()) {
                return Err(HepdistError::RegistrationError {
                    name: spec.name.clone(),
                });
            }
        }
        Ok(self.assemble())
    }
    fn assemble(&self) -> Histograms {
        Histograms {
            accumulators: self
                .specs
                .iter()
                .map(|spec| (spec.name.clone(), Accumulator::new(spec.clone())))
                .collect(),
        }
    }
}

/// Build the empty [`Histograms`] of the standard dilepton analysis ([`Registry::default`]).
pub fn build_registry() -> Histograms {
    Registry::default().assemble()
}

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{data::Event, histograms::Histograms, HepdistResult};

/// Counters describing a pass over an event sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// The number of events processed
    pub events: usize,
    /// The total number of charged leptons selected across all events
    pub leptons: usize,
    /// The number of events without any charged lepton, for which the combined (dilepton)
    /// observables were not filled
    pub events_without_leptons: usize,
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} events, {} leptons, {} events without leptons",
            self.events, self.leptons, self.events_without_leptons
        )
    }
}

/// The event loop: owns a [`Histograms`] set while events are fed to it one at a time.
///
/// For every event, the charged leptons are selected in generator order. Each lepton fills the
/// per-lepton histograms, and the sum of their four-momenta fills the combined histograms
/// once. Every histogram is filled with the event weight named in its
/// [`HistogramSpec`](crate::histograms::HistogramSpec).
///
/// Events without charged leptons have no combined four-momentum; they are counted in
/// [`RunSummary::events_without_leptons`] and contribute to no histogram.
pub struct Engine {
    histograms: Histograms,
    summary: RunSummary,
}

impl Engine {
    /// Take ownership of an (usually empty) [`Histograms`] set to fill.
    pub fn new(histograms: Histograms) -> Self {
        tracing::debug!(histograms = histograms.len(), "starting event loop");
        Self {
            histograms,
            summary: RunSummary::default(),
        }
    }

    /// Fill the histograms with a single event.
    ///
    /// # Errors
    ///
    /// Returns [`HepdistError::MissingWeightKey`](crate::HepdistError::MissingWeightKey) if
    /// the event lacks any weight the histograms are configured with. Weights are resolved
    /// before any histogram is touched, so a failing event leaves the histograms unchanged.
    pub fn process(&mut self, event: &Event) -> HepdistResult<()> {
        let index = self.summary.events;
        let weights = self
            .histograms
            .iter()
            .map(|(_, acc)| event.require_weight(&acc.spec.weight, index))
            .collect::<HepdistResult<Vec<f64>>>()?;

        let mut n_leptons = 0;
        for lepton in event.leptons() {
            for (acc, &weight) in self.histograms.accumulators_mut().zip(&weights) {
                if acc.spec.observable.is_per_lepton() {
                    acc.histogram
                        .fill(acc.spec.observable.value(&lepton.p4), weight);
                }
            }
            n_leptons += 1;
        }

        match event.dilepton_p4() {
            Some(combined) => {
                for (acc, &weight) in self.histograms.accumulators_mut().zip(&weights) {
                    if !acc.spec.observable.is_per_lepton() {
                        acc.histogram
                            .fill(acc.spec.observable.value(&combined), weight);
                    }
                }
            }
            None => {
                tracing::debug!(event = index, "no charged leptons, skipping combined observables");
                self.summary.events_without_leptons += 1;
            }
        }

        self.summary.events += 1;
        self.summary.leptons += n_leptons;
        Ok(())
    }

    /// The counters accumulated so far.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// The histograms as filled so far.
    pub fn histograms(&self) -> &Histograms {
        &self.histograms
    }

    /// Give back the filled histograms.
    pub fn finish(self) -> Histograms {
        tracing::info!(
            events = self.summary.events,
            leptons = self.summary.leptons,
            events_without_leptons = self.summary.events_without_leptons,
            "finished event loop"
        );
        self.histograms
    }
}

/// Fill `histograms` from `events` in a single pass and return them.
///
/// Any error aborts the run and the partially filled histograms are discarded.
///
/// # Examples
///
/// ```
/// use hepdist::{build_registry, data::test_event, run};
///
/// let histograms = run([test_event()], build_registry()).unwrap();
/// assert_eq!(histograms["dilep_minv_rwgt_1p0"].total(), 2.0);
/// ```
pub fn run<I>(events: I, histograms: Histograms) -> HepdistResult<Histograms>
where
    I: IntoIterator<Item = Event>,
{
    let mut engine = Engine::new(histograms);
    for event in events {
        engine.process(&event)?;
    }
    Ok(engine.finish())
}

/// Like [`run`], but for fallible event sources such as
/// [`LheReader`](crate::data::io::LheReader). The first error from the source aborts the run.
pub fn try_run<I>(events: I, histograms: Histograms) -> HepdistResult<Histograms>
where
    I: IntoIterator<Item = HepdistResult<Event>>,
{
    let mut engine = Engine::new(histograms);
    for event in events {
        engine.process(&event?)?;
    }
    Ok(engine.finish())
}

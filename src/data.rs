use std::fmt::Display;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    utils::{enums::LeptonFlavor, vectors::Vec4},
    HepdistError, HepdistResult,
};

/// Streaming readers which produce [`Event`]s from files.
pub mod io;

/// The name of the nominal event weight.
pub const NOMINAL_WEIGHT: &str = "1";

/// A single particle in an [`Event`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// The PDG Monte Carlo code identifying the particle species (negative for antiparticles).
    pub pdgid: i32,
    /// The generator status code (`-1` incoming, `1` outgoing, `2` intermediate resonance).
    pub status: i32,
    /// The four-momentum of the particle.
    pub p4: Vec4,
}

impl Particle {
    /// Create a new outgoing [`Particle`].
    pub fn new(pdgid: i32, p4: Vec4) -> Self {
        Self {
            pdgid,
            status: 1,
            p4,
        }
    }
    /// The charged-lepton flavor of this particle, if it is a charged lepton.
    pub fn lepton_flavor(&self) -> Option<LeptonFlavor> {
        LeptonFlavor::from_pdgid(self.pdgid)
    }
    /// Whether this particle is an electron, muon, or tau (of either charge).
    pub fn is_charged_lepton(&self) -> bool {
        self.lepton_flavor().is_some()
    }
}

/// A single collision event: its particles and a set of named weights.
///
/// Each weight corresponds to a physics-model hypothesis; the nominal one is stored under
/// [`NOMINAL_WEIGHT`]. Weights keep the order in which they were inserted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The particles in the event, in generator order.
    pub particles: Vec<Particle>,
    /// The event weights, keyed by name.
    pub weights: IndexMap<String, f64>,
}

impl Event {
    /// Create a new [`Event`] from its particles and named weights.
    pub fn new<I, S>(particles: Vec<Particle>, weights: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            particles,
            weights: weights.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
    /// Look up a weight by name.
    pub fn weight(&self, key: &str) -> Option<f64> {
        self.weights.get(key).copied()
    }
    /// Look up a weight by name, treating its absence as an error.
    ///
    /// # Errors
    ///
    /// Returns [`HepdistError::MissingWeightKey`] if the event carries no weight named `key`.
    /// `index` is the position of this event in its input sequence and is only used to report
    /// the error.
    pub fn require_weight(&self, key: &str, index: usize) -> HepdistResult<f64> {
        self.weight(key).ok_or_else(|| HepdistError::MissingWeightKey {
            key: key.to_string(),
            event: index,
        })
    }
    /// The nominal weight of the event.
    pub fn nominal_weight(&self) -> Option<f64> {
        self.weight(NOMINAL_WEIGHT)
    }
    /// Iterate over the charged leptons (electrons, muons, and taus) in generator order.
    pub fn leptons(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.particles.iter().filter(|p| p.is_charged_lepton())
    }
    /// The sum of the four-momenta of all charged leptons, or [`None`] if there are none.
    pub fn dilepton_p4(&self) -> Option<Vec4> {
        let mut leptons = self.leptons().peekable();
        leptons.peek()?;
        Some(leptons.map(|p| p.p4).sum())
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Event:")?;
        writeln!(f, "  particles:")?;
        for particle in &self.particles {
            writeln!(
                f,
                "    {:>6} ({:>2}): {}",
                particle.pdgid,
                particle.status,
                particle.p4.to_p4_string()
            )?;
        }
        writeln!(f, "  weights:")?;
        for (name, value) in &self.weights {
            writeln!(f, "    {name}: {value}")?;
        }
        Ok(())
    }
}

/// An event that can be used to test the event loop. It contains a Drell-Yan-like
/// $`q\bar{q} \to \mu^+\mu^-`$ final state whose muon pair has an invariant mass of exactly
/// 750 GeV, and the nominal weight plus two reweighting scenarios.
pub fn test_event() -> Event {
    let m: f64 = 750.0;
    let (e, pz) = (m / 2.0, 120.0);
    let px = (e * e - pz * pz).sqrt();
    Event::new(
        vec![
            Particle {
                pdgid: 2,
                status: -1,
                p4: Vec4::new(0.0, 0.0, 500.0, 500.0),
            },
            Particle {
                pdgid: -2,
                status: -1,
                p4: Vec4::new(0.0, 0.0, -500.0, 500.0),
            },
            Particle::new(13, Vec4::new(px, 0.0, pz, e)),
            Particle::new(-13, Vec4::new(-px, 0.0, -pz, e)),
        ],
        [("1", 1.0), ("Coup-1p0", 2.0), ("Coup-0p1", 0.5)],
    )
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_event_creation() {
        let event = test_event();
        assert_eq!(event.particles.len(), 4);
        assert_eq!(event.weights.len(), 3);
        assert_relative_eq!(event.nominal_weight().unwrap(), 1.0);
        assert_relative_eq!(event.weight("Coup-0p1").unwrap(), 0.5);
        // insertion order is kept
        let names: Vec<&str> = event.weights.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["1", "Coup-1p0", "Coup-0p1"]);
    }

    #[test]
    fn test_missing_weight() {
        let event = test_event();
        assert_eq!(event.weight("Coup-5p0"), None);
        let err = event.require_weight("Coup-5p0", 7).unwrap_err();
        assert!(matches!(
            err,
            HepdistError::MissingWeightKey { ref key, event: 7 } if key == "Coup-5p0"
        ));
        assert_eq!(event.require_weight("Coup-1p0", 7).unwrap(), 2.0);
    }

    #[test]
    fn test_lepton_selection_keeps_order() {
        let mut event = test_event();
        event.particles.insert(2, Particle::new(21, Vec4::new(1.0, 0.0, 0.0, 1.0)));
        event.particles.push(Particle::new(-11, Vec4::new(0.0, 1.0, 0.0, 1.0)));
        event.particles.push(Particle::new(12, Vec4::new(0.0, 0.0, 1.0, 1.0)));
        let pdgids: Vec<i32> = event.leptons().map(|p| p.pdgid).collect();
        assert_eq!(pdgids, vec![13, -13, -11]);
    }

    #[test]
    fn test_dilepton_p4() {
        let event = test_event();
        let p4 = event.dilepton_p4().unwrap();
        assert_relative_eq!(p4.m(), 750.0, epsilon = 1e-9);
        assert_relative_eq!(p4.pt(), 0.0);
        let no_leptons = Event::new(
            vec![Particle::new(21, Vec4::new(10.0, 0.0, 0.0, 10.0))],
            [("1", 1.0)],
        );
        assert_eq!(no_leptons.dilepton_p4(), None);
    }

    #[test]
    fn test_event_display() {
        let text = test_event().to_string();
        assert!(text.starts_with("Event:"));
        assert!(text.contains("Coup-1p0: 2"));
    }
}

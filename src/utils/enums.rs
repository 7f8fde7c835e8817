use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{utils::vectors::Vec4, HepdistError};

/// The charged leptons, identified by the magnitude of their PDG Monte Carlo particle code.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeptonFlavor {
    /// $`e^\pm`$ (PDG code 11)
    Electron,
    /// $`\mu^\pm`$ (PDG code 13)
    Muon,
    /// $`\tau^\pm`$ (PDG code 15)
    Tau,
}

impl LeptonFlavor {
    /// Identify the charged-lepton flavor of a PDG particle code, ignoring its sign (so
    /// particles and antiparticles map to the same flavor). Any other code yields [`None`].
    pub fn from_pdgid(pdgid: i32) -> Option<Self> {
        match pdgid.unsigned_abs() {
            11 => Some(Self::Electron),
            13 => Some(Self::Muon),
            15 => Some(Self::Tau),
            _ => None,
        }
    }
}

impl Display for LeptonFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeptonFlavor::Electron => write!(f, "e"),
            LeptonFlavor::Muon => write!(f, "mu"),
            LeptonFlavor::Tau => write!(f, "tau"),
        }
    }
}

impl FromStr for LeptonFlavor {
    type Err = HepdistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "e" | "electron" | "11" => Ok(Self::Electron),
            "mu" | "muon" | "13" => Ok(Self::Muon),
            "tau" | "15" => Ok(Self::Tau),
            _ => Err(HepdistError::ParseError {
                name: s.to_string(),
                object: "LeptonFlavor".to_string(),
            }),
        }
    }
}

/// The kinematic quantity a histogram is filled with.
///
/// Per-lepton observables are filled once for every selected lepton in an event, while the
/// combined observables are filled once per event from the sum of all selected lepton
/// four-momenta.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Observable {
    /// Pseudorapidity of each lepton.
    LeptonEta,
    /// Transverse momentum of each lepton.
    LeptonPt,
    /// Invariant mass of the summed lepton four-momentum.
    DileptonMass,
    /// Transverse momentum of the summed lepton four-momentum.
    DileptonPt,
}

impl Observable {
    /// Whether this quantity is evaluated on every lepton rather than once on their sum.
    pub fn is_per_lepton(&self) -> bool {
        matches!(self, Self::LeptonEta | Self::LeptonPt)
    }
    /// Evaluate the quantity on a four-momentum (a single lepton's or the combined one).
    pub fn value(&self, p4: &Vec4) -> f64 {
        match self {
            Self::LeptonEta => p4.eta(),
            Self::LeptonPt | Self::DileptonPt => p4.pt(),
            Self::DileptonMass => p4.m(),
        }
    }
}

impl Display for Observable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Observable::LeptonEta => write!(f, "lepton eta"),
            Observable::LeptonPt => write!(f, "lepton pT"),
            Observable::DileptonMass => write!(f, "dilepton mass"),
            Observable::DileptonPt => write!(f, "dilepton pT"),
        }
    }
}

impl FromStr for Observable {
    type Err = HepdistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lep_eta" | "lepton eta" | "leptoneta" => Ok(Self::LeptonEta),
            "lep_pt" | "lepton pt" | "leptonpt" => Ok(Self::LeptonPt),
            "dilep_minv" | "dilep_m" | "dilepton mass" | "dileptonmass" => Ok(Self::DileptonMass),
            "dilep_pt" | "dilepton pt" | "dileptonpt" => Ok(Self::DileptonPt),
            _ => Err(HepdistError::ParseError {
                name: s.to_string(),
                object: "Observable".to_string(),
            }),
        }
    }
}

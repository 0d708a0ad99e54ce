//! Named options parsed from strings.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Filter threshold preset, from most to least sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPreset {
    /// Every filter off; the final algorithm sees every window.
    Max,
    Mid,
    #[default]
    Default,
    Fast,
}

impl FromStr for FilterPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "max" => Ok(FilterPreset::Max),
            "mid" => Ok(FilterPreset::Mid),
            "default" => Ok(FilterPreset::Default),
            "fast" | "rfam" => Ok(FilterPreset::Fast),
            _ => Err(ConfigError::Parse {
                kind: "filter preset",
                value: s.to_string(),
            }),
        }
    }
}

/// Which truncation passes run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TruncationMode {
    /// Standard pass only.
    Off,
    /// Truncated passes at the target's termini.
    #[default]
    Termini,
    /// A truncated alignment may start and end anywhere.
    Anywhere,
}

impl FromStr for TruncationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "notrunc" | "none" => Ok(TruncationMode::Off),
            "termini" | "default" => Ok(TruncationMode::Termini),
            "anywhere" | "anytrunc" | "any" => Ok(TruncationMode::Anywhere),
            _ => Err(ConfigError::Parse {
                kind: "truncation mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Curated bit score cutoff stored in a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelCutoff {
    Ga,
    Tc,
    Nc,
}

impl ModelCutoff {
    pub fn label(self) -> &'static str {
        match self {
            ModelCutoff::Ga => "GA",
            ModelCutoff::Tc => "TC",
            ModelCutoff::Nc => "NC",
        }
    }
}

impl FromStr for ModelCutoff {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ga" | "cut_ga" | "gathering" => Ok(ModelCutoff::Ga),
            "tc" | "cut_tc" | "trusted" => Ok(ModelCutoff::Tc),
            "nc" | "cut_nc" | "noise" => Ok(ModelCutoff::Nc),
            _ => Err(ConfigError::Parse {
                kind: "model cutoff",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ModelCutoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Preferred band source for a stage; cheaper sources follow as fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandStrategy {
    Posterior,
    QueryDependent,
    Unbanded,
}

impl FromStr for BandStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "posterior" | "hmm" | "hmmb" => Ok(BandStrategy::Posterior),
            "qdb" | "query-dependent" => Ok(BandStrategy::QueryDependent),
            "nonbanded" | "unbanded" | "nb" => Ok(BandStrategy::Unbanded),
            _ => Err(ConfigError::Parse {
                kind: "band strategy",
                value: s.to_string(),
            }),
        }
    }
}

/// Pipeline stage, for `stop_after`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Ungapped,
    Viterbi,
    Forward,
    Envelope,
    Cyk,
}

impl FromStr for Stage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ungapped" | "msv" | "f1" => Ok(Stage::Ungapped),
            "viterbi" | "vit" | "f2" => Ok(Stage::Viterbi),
            "forward" | "fwd" | "f3" => Ok(Stage::Forward),
            "envelope" | "ddef" | "df3" => Ok(Stage::Envelope),
            "cyk" | "f4" => Ok(Stage::Cyk),
            _ => Err(ConfigError::Parse {
                kind: "stage",
                value: s.to_string(),
            }),
        }
    }
}

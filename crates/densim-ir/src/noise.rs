//! Single-qubit noise channel descriptors.
//!
//! A run applies an ordered set of channels after every gate, to every qubit
//! the gate touched. All channels share one error probability `p`, which the
//! simulator configuration carries. The set is written in a compact letter
//! form: `A` (amplitude damping), `P` (phase flip), `D` (depolarization), so
//! `"APD"` applies all three in that order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IrError;

/// A single-qubit decoherence channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoiseChannel {
    /// Applies Z with probability `p`.
    PhaseFlip,
    /// Energy relaxation with decay rate `γ = 2p`.
    AmplitudeDamping,
    /// Replaces the state with the maximally mixed state with probability `p`.
    Depolarization,
}

impl NoiseChannel {
    /// Get a human-readable name for this channel.
    pub fn name(&self) -> &'static str {
        match self {
            NoiseChannel::PhaseFlip => "phase_flip",
            NoiseChannel::AmplitudeDamping => "amplitude_damping",
            NoiseChannel::Depolarization => "depolarization",
        }
    }

    /// The letter used in the compact channel-set form.
    pub fn letter(&self) -> char {
        match self {
            NoiseChannel::PhaseFlip => 'P',
            NoiseChannel::AmplitudeDamping => 'A',
            NoiseChannel::Depolarization => 'D',
        }
    }

    /// Parse a channel from its letter.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'P' => Some(NoiseChannel::PhaseFlip),
            'A' => Some(NoiseChannel::AmplitudeDamping),
            'D' => Some(NoiseChannel::Depolarization),
            _ => None,
        }
    }
}

impl fmt::Display for NoiseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An ordered set of channels, serialized in the compact letter form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NoiseChannels(Vec<NoiseChannel>);

impl NoiseChannels {
    /// Create a channel set from an explicit list.
    pub fn new(channels: Vec<NoiseChannel>) -> Self {
        Self(channels)
    }

    /// A set without channels.
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Channels in application order.
    pub fn as_slice(&self) -> &[NoiseChannel] {
        &self.0
    }

    /// Iterate over channels in application order.
    pub fn iter(&self) -> impl Iterator<Item = &NoiseChannel> {
        self.0.iter()
    }

    /// Check if no channel is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if a channel is part of this set.
    pub fn contains(&self, channel: NoiseChannel) -> bool {
        self.0.contains(&channel)
    }
}

impl Default for NoiseChannels {
    fn default() -> Self {
        Self(vec![
            NoiseChannel::AmplitudeDamping,
            NoiseChannel::PhaseFlip,
            NoiseChannel::Depolarization,
        ])
    }
}

impl FromStr for NoiseChannels {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .chars()
            .map(|ch| NoiseChannel::from_letter(ch).ok_or(IrError::InvalidNoiseChannel(ch)))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl TryFrom<String> for NoiseChannels {
    type Error = IrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NoiseChannels> for String {
    fn from(channels: NoiseChannels) -> Self {
        channels.to_string()
    }
}

impl fmt::Display for NoiseChannels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for channel in &self.0 {
            write!(f, "{}", channel.letter())?;
        }
        Ok(())
    }
}

//! Shared primitive types used across the entire pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A run identifier, `<regime>_run_<replicate>`.
pub type RunId = String;

/// Seconds since ignition.
pub type Seconds = f64;

/// Number of telemetry channels carried by every run.
pub const CHANNEL_COUNT: usize = 7;

/// Telemetry channels in persisted column order.
/// NEVER reorder: the index doubles as the noise stream slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "Pc")]
    ChamberPressure = 0,
    #[serde(rename = "N_pump")]
    PumpSpeed = 1,
    #[serde(rename = "T_in")]
    InletTemp = 2,
    #[serde(rename = "Vib")]
    Vibration = 3,
    #[serde(rename = "fuel_flow")]
    FuelFlow = 4,
    #[serde(rename = "bearing_temp")]
    BearingTemp = 5,
    #[serde(rename = "thrust")]
    Thrust = 6,
}

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::ChamberPressure,
        Channel::PumpSpeed,
        Channel::InletTemp,
        Channel::Vibration,
        Channel::FuelFlow,
        Channel::BearingTemp,
        Channel::Thrust,
    ];

    /// Column name used in persisted tables.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChamberPressure => "Pc",
            Self::PumpSpeed       => "N_pump",
            Self::InletTemp       => "T_in",
            Self::Vibration       => "Vib",
            Self::FuelFlow        => "fuel_flow",
            Self::BearingTemp     => "bearing_temp",
            Self::Thrust          => "thrust",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Derived channels are computed from other channels, never sampled.
    pub fn is_derived(&self) -> bool {
        matches!(self, Self::Thrust)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

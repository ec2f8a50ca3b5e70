//! Fault regimes and their deterministic distortions.
//!
//! RULE: one variant per regime, one dispatch function (`apply`).
//! A distortion touches only the channels its regime names and never
//! touches thrust directly; thrust is re-derived after every injection.

use crate::{
    error::{TelemetryError, TelemetryResult},
    types::{Channel, Seconds},
    waveform::WaveformSet,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Fraction of the run after which fault ramps are considered settled.
pub const SETTLED_FRACTION: f64 = 0.75;

/// First sample of the settled interval for a run of `n` samples.
pub fn settled_index(n: usize) -> usize {
    (n as f64 * SETTLED_FRACTION).floor() as usize
}

/// Ground-truth operating condition of a whole run.
/// NEVER reorder: the discriminant is the regime's seed slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Normal = 0,
    PressureDecay = 1,
    TurbopumpOverspeed = 2,
    TempRise = 3,
    VibrationIncrease = 4,
    FuelLeak = 5,
    BearingOverheat = 6,
}

impl Regime {
    pub const ALL: [Regime; 7] = [
        Regime::Normal,
        Regime::PressureDecay,
        Regime::TurbopumpOverspeed,
        Regime::TempRise,
        Regime::VibrationIncrease,
        Regime::FuelLeak,
        Regime::BearingOverheat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal             => "normal",
            Self::PressureDecay      => "pressure_decay",
            Self::TurbopumpOverspeed => "turbopump_overspeed",
            Self::TempRise           => "temp_rise",
            Self::VibrationIncrease  => "vibration_increase",
            Self::FuelLeak           => "fuel_leak",
            Self::BearingOverheat    => "bearing_overheat",
        }
    }

    pub fn slot(&self) -> u64 {
        *self as u64
    }

    pub fn is_fault(&self) -> bool {
        !matches!(self, Self::Normal)
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Regime {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| TelemetryError::invalid("regime", format!("unknown regime tag '{s}'")))
    }
}

/// A regime together with the shape parameters of its distortion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "regime", rename_all = "snake_case")]
pub enum FaultSignature {
    Normal,
    /// Pc -= depth * (1 - exp(-(t - t0) / time_constant_s))
    PressureDecay { onset_fraction: f64, depth: f64, time_constant_s: f64 },
    /// N_pump += overspeed_rpm * tanh((t - t0) / ramp_width_s)
    TurbopumpOverspeed { onset_fraction: f64, overspeed_rpm: f64, ramp_width_s: f64 },
    /// T_in += rise * tanh((t - t0) / ramp_width_s)
    TempRise { onset_fraction: f64, rise: f64, ramp_width_s: f64 },
    /// Vib = gain * Vib + offset, whole run.
    VibrationIncrease { gain: f64, offset: f64 },
    /// fuel_flow += leak; Pc -= pc_coupling * leak
    FuelLeak { onset_fraction: f64, leak: f64, pc_coupling: f64, ramp_width_s: f64 },
    /// bearing_temp and Vib rise together on one ramp.
    BearingOverheat { onset_fraction: f64, temp_rise: f64, vibration_rise: f64, ramp_width_s: f64 },
}

impl FaultSignature {
    /// Default shape parameters for a regime.
    pub fn for_regime(regime: Regime) -> Self {
        match regime {
            Regime::Normal => Self::Normal,
            Regime::PressureDecay => Self::PressureDecay {
                onset_fraction:  0.5,
                depth:           30.0,
                time_constant_s: 30.0,
            },
            Regime::TurbopumpOverspeed => Self::TurbopumpOverspeed {
                onset_fraction: 0.5,
                overspeed_rpm:  2000.0,
                ramp_width_s:   10.0,
            },
            Regime::TempRise => Self::TempRise {
                onset_fraction: 0.667,
                rise:           100.0,
                ramp_width_s:   10.0,
            },
            Regime::VibrationIncrease => Self::VibrationIncrease { gain: 1.5, offset: 0.6 },
            Regime::FuelLeak => Self::FuelLeak {
                onset_fraction: 0.533,
                leak:           10.0,
                pc_coupling:    0.4,
                ramp_width_s:   15.0,
            },
            Regime::BearingOverheat => Self::BearingOverheat {
                onset_fraction: 0.567,
                temp_rise:      40.0,
                vibration_rise: 0.5,
                ramp_width_s:   10.0,
            },
        }
    }

    pub fn regime(&self) -> Regime {
        match self {
            Self::Normal                   => Regime::Normal,
            Self::PressureDecay { .. }      => Regime::PressureDecay,
            Self::TurbopumpOverspeed { .. } => Regime::TurbopumpOverspeed,
            Self::TempRise { .. }           => Regime::TempRise,
            Self::VibrationIncrease { .. }  => Regime::VibrationIncrease,
            Self::FuelLeak { .. }           => Regime::FuelLeak,
            Self::BearingOverheat { .. }    => Regime::BearingOverheat,
        }
    }

    fn onset_fraction(&self) -> f64 {
        match *self {
            Self::Normal | Self::VibrationIncrease { .. } => 0.0,
            Self::PressureDecay { onset_fraction, .. }
            | Self::TurbopumpOverspeed { onset_fraction, .. }
            | Self::TempRise { onset_fraction, .. }
            | Self::FuelLeak { onset_fraction, .. }
            | Self::BearingOverheat { onset_fraction, .. } => onset_fraction,
        }
    }

    /// First distorted sample for a run of `n` samples.
    pub fn onset_index(&self, n: usize) -> usize {
        ((self.onset_fraction() * n as f64).round() as usize).min(n)
    }

    /// Reject parameters that would break the separability guarantee.
    pub fn validate(&self) -> TelemetryResult<()> {
        let onset = self.onset_fraction();
        if !(0.0..SETTLED_FRACTION).contains(&onset) {
            return Err(TelemetryError::invalid(
                "onset_fraction",
                format!("{}: must lie in [0, {SETTLED_FRACTION}), got {onset}", self.regime()),
            ));
        }
        let widths = match *self {
            Self::Normal | Self::VibrationIncrease { .. } => None,
            Self::PressureDecay { time_constant_s, .. } => Some(time_constant_s),
            Self::TurbopumpOverspeed { ramp_width_s, .. }
            | Self::TempRise { ramp_width_s, .. }
            | Self::FuelLeak { ramp_width_s, .. }
            | Self::BearingOverheat { ramp_width_s, .. } => Some(ramp_width_s),
        };
        if let Some(w) = widths {
            if !(w.is_finite() && w > 0.0) {
                return Err(TelemetryError::invalid(
                    "ramp_width_s",
                    format!("{}: must be positive, got {w}", self.regime()),
                ));
            }
        }
        Ok(())
    }

    /// Channels this regime distorts directly.
    pub fn affected_channels(&self) -> Vec<Channel> {
        self.separations_at(1.0).into_iter().map(|(c, _)| c).collect()
    }

    /// Minimum absolute shift each affected channel carries over the
    /// settled interval of a run sampled at `time`. Vibration bounds
    /// assume the undistorted vibration level is non-negative.
    pub fn separations(&self, time: &[Seconds]) -> Vec<(Channel, f64)> {
        let n = time.len();
        let settled = settled_index(n);
        let onset = self.onset_index(n);
        if settled >= n || onset > settled {
            return self.separations_at(0.0);
        }
        let elapsed = time[settled] - time[onset];
        let progress = match *self {
            Self::PressureDecay { time_constant_s, .. } => 1.0 - (-elapsed / time_constant_s).exp(),
            Self::TurbopumpOverspeed { ramp_width_s, .. }
            | Self::TempRise { ramp_width_s, .. }
            | Self::FuelLeak { ramp_width_s, .. }
            | Self::BearingOverheat { ramp_width_s, .. } => (elapsed / ramp_width_s).tanh(),
            Self::Normal | Self::VibrationIncrease { .. } => 1.0,
        };
        self.separations_at(progress)
    }

    /// Shift magnitudes at a given ramp progress in [0, 1].
    fn separations_at(&self, progress: f64) -> Vec<(Channel, f64)> {
        match *self {
            Self::Normal => vec![],
            Self::PressureDecay { depth, .. } => vec![(Channel::ChamberPressure, depth * progress)],
            Self::TurbopumpOverspeed { overspeed_rpm, .. } => {
                vec![(Channel::PumpSpeed, overspeed_rpm * progress)]
            }
            Self::TempRise { rise, .. } => vec![(Channel::InletTemp, rise * progress)],
            Self::VibrationIncrease { offset, .. } => vec![(Channel::Vibration, offset)],
            Self::FuelLeak { leak, pc_coupling, .. } => vec![
                (Channel::ChamberPressure, pc_coupling * leak * progress),
                (Channel::FuelFlow, leak * progress),
            ],
            Self::BearingOverheat { temp_rise, vibration_rise, .. } => vec![
                (Channel::Vibration, vibration_rise * progress),
                (Channel::BearingTemp, temp_rise * progress),
            ],
        }
    }

    /// Return a distorted copy of `base`. Thrust is re-derived afterwards.
    pub fn apply(&self, base: &WaveformSet) -> WaveformSet {
        let mut out = base.clone();
        let onset = self.onset_index(base.len());

        match *self {
            Self::Normal => return out,
            Self::PressureDecay { depth, time_constant_s, .. } => {
                let decay = ramp(&base.time, onset, |dt| 1.0 - (-dt / time_constant_s).exp());
                add_scaled(out.channel_mut(Channel::ChamberPressure), &decay, -depth);
            }
            Self::TurbopumpOverspeed { overspeed_rpm, ramp_width_s, .. } => {
                let r = ramp(&base.time, onset, |dt| (dt / ramp_width_s).tanh());
                add_scaled(out.channel_mut(Channel::PumpSpeed), &r, overspeed_rpm);
            }
            Self::TempRise { rise, ramp_width_s, .. } => {
                let r = ramp(&base.time, onset, |dt| (dt / ramp_width_s).tanh());
                add_scaled(out.channel_mut(Channel::InletTemp), &r, rise);
            }
            Self::VibrationIncrease { gain, offset } => {
                for v in out.channel_mut(Channel::Vibration) {
                    *v = gain * *v + offset;
                }
            }
            Self::FuelLeak { leak, pc_coupling, ramp_width_s, .. } => {
                let r = ramp(&base.time, onset, |dt| (dt / ramp_width_s).tanh());
                add_scaled(out.channel_mut(Channel::FuelFlow), &r, leak);
                add_scaled(out.channel_mut(Channel::ChamberPressure), &r, -pc_coupling * leak);
            }
            Self::BearingOverheat { temp_rise, vibration_rise, ramp_width_s, .. } => {
                let r = ramp(&base.time, onset, |dt| (dt / ramp_width_s).tanh());
                add_scaled(out.channel_mut(Channel::BearingTemp), &r, temp_rise);
                add_scaled(out.channel_mut(Channel::Vibration), &r, vibration_rise);
            }
        }

        out.derive_thrust();
        out
    }
}

/// Zero before `onset`, `shape(t - t_onset)` from onset to the end.
fn ramp(time: &[Seconds], onset: usize, shape: impl Fn(Seconds) -> f64) -> Vec<f64> {
    let Some(&t0) = time.get(onset) else {
        return vec![0.0; time.len()];
    };
    time.iter()
        .enumerate()
        .map(|(i, &t)| if i < onset { 0.0 } else { shape(t - t0) })
        .collect()
}

fn add_scaled(target: &mut [f64], shape: &[f64], scale: f64) {
    for (v, s) in target.iter_mut().zip(shape) {
        *v += scale * s;
    }
}

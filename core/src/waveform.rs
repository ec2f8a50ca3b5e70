//! Waveform synthesis: nominal baseline shapes plus seeded Gaussian noise.
//!
//! RULE: every sampled channel draws from its own noise stream, derived
//! from the run seed and the channel's stable index. Channels never share
//! a draw, so synthesizing one channel cannot perturb another.

use crate::{
    error::{TelemetryError, TelemetryResult},
    rng::SignalRng,
    types::{Channel, Seconds, CHANNEL_COUNT},
};
use serde::{Deserialize, Serialize};

pub const THRUST_PC_WEIGHT: f64 = 0.8;
pub const THRUST_FUEL_WEIGHT: f64 = 0.2;

/// Simplified thrust proxy: a fixed mix of chamber pressure and fuel flow.
pub fn thrust(pc: f64, fuel_flow: f64) -> f64 {
    THRUST_PC_WEIGHT * pc + THRUST_FUEL_WEIGHT * fuel_flow
}

/// Deterministic part of a channel. Event times are fractions of the
/// run duration so the envelope scales with any run length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum BaselineShape {
    Constant { level: f64 },
    /// Start-up ramp, steady state, shutdown ramp.
    Plateau { base: f64, amplitude: f64, rise_at: f64, fall_at: f64, width_s: f64 },
    /// base + amplitude * sin(t / time_scale_s)
    Sinusoid { base: f64, amplitude: f64, time_scale_s: f64 },
    /// Single smooth step centred at `center_at`.
    Drift { base: f64, amplitude: f64, center_at: f64, width_s: f64 },
}

impl BaselineShape {
    pub fn value(&self, t: Seconds, duration_s: Seconds) -> f64 {
        match *self {
            Self::Constant { level } => level,
            Self::Plateau { base, amplitude, rise_at, fall_at, width_s } => {
                base + amplitude * ((t - rise_at * duration_s) / width_s).tanh()
                    - amplitude * ((t - fall_at * duration_s) / width_s).tanh()
            }
            Self::Sinusoid { base, amplitude, time_scale_s } => {
                base + amplitude * (t / time_scale_s).sin()
            }
            Self::Drift { base, amplitude, center_at, width_s } => {
                base + amplitude * ((t - center_at * duration_s) / width_s).tanh()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelProfile {
    pub channel:   Channel,
    pub baseline:  BaselineShape,
    pub noise_std: f64,
}

impl ChannelProfile {
    /// Nominal profile for a sampled channel. Derived channels have none.
    pub fn nominal(channel: Channel) -> Option<Self> {
        let (baseline, noise_std) = match channel {
            Channel::ChamberPressure => (
                BaselineShape::Plateau { base: 50.0, amplitude: 30.0, rise_at: 0.1, fall_at: 0.9, width_s: 10.0 },
                0.5,
            ),
            Channel::PumpSpeed => (
                BaselineShape::Plateau { base: 3000.0, amplitude: 1500.0, rise_at: 0.1, fall_at: 0.9, width_s: 15.0 },
                20.0,
            ),
            Channel::InletTemp => (
                BaselineShape::Sinusoid { base: 300.0, amplitude: 20.0, time_scale_s: 50.0 },
                1.0,
            ),
            Channel::Vibration => (BaselineShape::Constant { level: 0.3 }, 0.05),
            Channel::FuelFlow => (
                BaselineShape::Drift { base: 100.0, amplitude: 5.0, center_at: 0.1333, width_s: 20.0 },
                0.5,
            ),
            Channel::BearingTemp => (
                BaselineShape::Drift { base: 80.0, amplitude: 5.0, center_at: 0.2, width_s: 40.0 },
                0.5,
            ),
            Channel::Thrust => return None,
        };
        Some(Self { channel, baseline, noise_std })
    }
}

/// Longest time axis a single run may allocate.
pub const MAX_SAMPLES: usize = 100_000_000;

/// Build the time axis `i / fs` for `i in 0..duration*fs`.
pub fn time_axis(duration_s: f64, sample_rate_hz: f64) -> TelemetryResult<Vec<Seconds>> {
    if !duration_s.is_finite() || duration_s <= 0.0 {
        return Err(TelemetryError::invalid(
            "duration_s",
            format!("must be a positive number of seconds, got {duration_s}"),
        ));
    }
    if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
        return Err(TelemetryError::invalid(
            "sample_rate_hz",
            format!("must be positive, got {sample_rate_hz}"),
        ));
    }
    let samples = duration_s * sample_rate_hz;
    if (samples - samples.round()).abs() > 1e-9 {
        return Err(TelemetryError::invalid(
            "duration_s",
            format!("{duration_s} s at {sample_rate_hz} Hz is not a whole number of samples"),
        ));
    }
    if samples > MAX_SAMPLES as f64 {
        return Err(TelemetryError::invalid(
            "duration_s",
            format!("{duration_s} s at {sample_rate_hz} Hz exceeds {MAX_SAMPLES} samples"),
        ));
    }
    let n = samples.round() as usize;
    Ok((0..n).map(|i| i as f64 / sample_rate_hz).collect())
}

/// Baseline plus noise for one channel over the given time axis.
pub fn synthesize(
    profile: &ChannelProfile,
    time: &[Seconds],
    duration_s: Seconds,
    rng: &mut SignalRng,
) -> TelemetryResult<Vec<f64>> {
    let noise = rng.gaussian_noise(profile.noise_std, time.len())?;
    Ok(time
        .iter()
        .zip(noise)
        .map(|(&t, n)| profile.baseline.value(t, duration_s) + n)
        .collect())
}

/// All seven channels of one run over a shared time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformSet {
    pub time:   Vec<Seconds>,
    duration_s: Seconds,
    channels:   [Vec<f64>; CHANNEL_COUNT],
}

impl WaveformSet {
    /// Synthesize every sampled channel with nominal profiles and derive thrust.
    pub fn synthesize(time: Vec<Seconds>, duration_s: Seconds, run_seed: u64) -> TelemetryResult<Self> {
        let mut channels: [Vec<f64>; CHANNEL_COUNT] = Default::default();
        for channel in Channel::ALL {
            let Some(profile) = ChannelProfile::nominal(channel) else {
                continue;
            };
            let mut rng = SignalRng::new(run_seed, channel.index() as u64).with_name(channel.name());
            channels[channel.index()] = synthesize(&profile, &time, duration_s, &mut rng)?;
        }
        let mut set = Self { time, duration_s, channels };
        set.derive_thrust();
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn duration_s(&self) -> Seconds {
        self.duration_s
    }

    pub fn channel(&self, channel: Channel) -> &[f64] {
        &self.channels[channel.index()]
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut [f64] {
        &mut self.channels[channel.index()]
    }

    /// Recompute thrust from the current Pc and fuel_flow.
    pub fn derive_thrust(&mut self) {
        let derived: Vec<f64> = self
            .channel(Channel::ChamberPressure)
            .iter()
            .zip(self.channel(Channel::FuelFlow))
            .map(|(&pc, &fuel)| thrust(pc, fuel))
            .collect();
        self.channels[Channel::Thrust.index()] = derived;
    }
}

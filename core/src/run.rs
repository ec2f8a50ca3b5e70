//! Run generation: synthesize, inject, derive thrust, label.
//!
//! RULE: a run is created whole and never mutated afterwards.
//! Every replicate draws from its own seed, derived from the master
//! seed, the regime's stable slot and the replicate index.

use crate::{
    error::{TelemetryError, TelemetryResult},
    fault::{FaultSignature, Regime},
    rng::SeedBank,
    types::{Channel, RunId, Seconds},
    waveform::{time_axis, WaveformSet},
};

/// One simulated engine firing with a constant regime label.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub run_id:         RunId,
    pub regime:         Regime,
    pub replicate:      usize,
    pub seed:           u64,
    pub sample_rate_hz: f64,
    pub waveforms:      WaveformSet,
}

impl Run {
    pub fn run_id_for(regime: Regime, replicate: usize) -> RunId {
        format!("{regime}_run_{replicate}")
    }

    pub fn len(&self) -> usize {
        self.waveforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waveforms.is_empty()
    }

    pub fn time(&self) -> &[Seconds] {
        &self.waveforms.time
    }

    pub fn channel(&self, channel: Channel) -> &[f64] {
        self.waveforms.channel(channel)
    }
}

pub struct RunGenerator {
    seeds:          SeedBank,
    duration_s:     Seconds,
    sample_rate_hz: f64,
    signatures:     Vec<FaultSignature>,
}

impl RunGenerator {
    /// Validates duration and sample rate up front; nothing is generated
    /// from a malformed configuration.
    pub fn new(master_seed: u64, duration_s: Seconds, sample_rate_hz: f64) -> TelemetryResult<Self> {
        time_axis(duration_s, sample_rate_hz)?;
        Ok(Self {
            seeds: SeedBank::new(master_seed),
            duration_s,
            sample_rate_hz,
            signatures: Regime::ALL.into_iter().map(FaultSignature::for_regime).collect(),
        })
    }

    /// Replace the default shape parameters of one regime.
    pub fn with_signature(mut self, signature: FaultSignature) -> TelemetryResult<Self> {
        signature.validate()?;
        let slot = signature.regime().slot() as usize;
        self.signatures[slot] = signature;
        Ok(self)
    }

    pub fn signature(&self, regime: Regime) -> &FaultSignature {
        &self.signatures[regime.slot() as usize]
    }

    pub fn master_seed(&self) -> u64 {
        self.seeds.master_seed()
    }

    /// Generate one replicate with its bank-derived seed.
    pub fn generate_run(&self, regime: Regime, replicate: usize) -> TelemetryResult<Run> {
        let seed = self.seeds.run_seed(regime.slot(), replicate);
        self.generate_with_seed(regime, replicate, seed)
    }

    /// Generate one replicate from an explicit seed.
    pub fn generate_with_seed(&self, regime: Regime, replicate: usize, seed: u64) -> TelemetryResult<Run> {
        let time = time_axis(self.duration_s, self.sample_rate_hz)?;
        let base = WaveformSet::synthesize(time, self.duration_s, seed)?;
        let waveforms = self.signature(regime).apply(&base);

        log::debug!(
            "generated {} ({} samples, seed={seed:#018x})",
            Run::run_id_for(regime, replicate),
            waveforms.len()
        );

        Ok(Run {
            run_id: Run::run_id_for(regime, replicate),
            regime,
            replicate,
            seed,
            sample_rate_hz: self.sample_rate_hz,
            waveforms,
        })
    }

    /// Generate `replicates` independent runs of one regime.
    pub fn generate_runs(&self, regime: Regime, replicates: usize) -> TelemetryResult<Vec<Run>> {
        if replicates == 0 {
            return Err(TelemetryError::invalid(
                "replicates",
                format!("{regime}: at least one replicate is required"),
            ));
        }
        (0..replicates).map(|i| self.generate_run(regime, i)).collect()
    }

    /// Parse a regime tag and generate its runs.
    pub fn generate_tagged(&self, tag: &str, replicates: usize) -> TelemetryResult<Vec<Run>> {
        let regime: Regime = tag.parse()?;
        self.generate_runs(regime, replicates)
    }
}

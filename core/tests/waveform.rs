//! Baseline synthesis: time axis, nominal envelopes, noise streams, thrust.

use enginehealth_core::{
    error::TelemetryError,
    features::mean_std,
    rng::SignalRng,
    waveform::{synthesize, thrust, time_axis, BaselineShape, ChannelProfile, WaveformSet},
    types::Channel,
};

fn nominal_run(seed: u64) -> WaveformSet {
    let time = time_axis(300.0, 1.0).expect("time axis");
    WaveformSet::synthesize(time, 300.0, seed).expect("synthesize")
}

#[test]
fn time_axis_is_integer_seconds_at_one_hertz() {
    let time = time_axis(300.0, 1.0).unwrap();
    assert_eq!(time.len(), 300);
    assert_eq!(time[0], 0.0);
    assert_eq!(time[299], 299.0);
    assert!(time.windows(2).all(|w| w[1] - w[0] == 1.0));
}

#[test]
fn time_axis_honours_sample_rate() {
    let time = time_axis(10.0, 4.0).unwrap();
    assert_eq!(time.len(), 40);
    assert_eq!(time[1], 0.25);
    assert_eq!(time[39], 9.75);
}

#[test]
fn time_axis_rejects_bad_parameters() {
    for (duration, rate, field) in [
        (0.0, 1.0, "duration_s"),
        (-5.0, 1.0, "duration_s"),
        (f64::NAN, 1.0, "duration_s"),
        (300.0, 0.0, "sample_rate_hz"),
        (300.0, f64::INFINITY, "sample_rate_hz"),
        (2.5, 1.0, "duration_s"),
        (1e20, 1.0, "duration_s"),
        (1e6, 1e6, "duration_s"),
    ] {
        match time_axis(duration, rate) {
            Err(TelemetryError::InvalidParameter { name, .. }) => assert_eq!(name, field),
            other => panic!("({duration}, {rate}) should be rejected, got {other:?}"),
        }
    }
}

#[test]
fn negative_noise_std_fails_synthesis() {
    let time = time_axis(10.0, 1.0).unwrap();
    let mut profile = ChannelProfile::nominal(Channel::ChamberPressure).unwrap();
    profile.noise_std = -0.5;
    let mut rng = SignalRng::new(1, 0);
    match synthesize(&profile, &time, 10.0, &mut rng) {
        Err(TelemetryError::InvalidParameter { name, .. }) => assert_eq!(name, "noise_std"),
        other => panic!("negative noise sigma should be rejected, got {other:?}"),
    }
}

#[test]
fn every_channel_spans_the_time_axis() {
    let set = nominal_run(7);
    assert_eq!(set.len(), 300);
    for channel in Channel::ALL {
        assert_eq!(set.channel(channel).len(), 300, "{channel} length");
        assert!(set.channel(channel).iter().all(|v| v.is_finite()), "{channel} finite");
    }
}

#[test]
fn chamber_pressure_follows_startup_plateau_and_shutdown() {
    let set = nominal_run(11);
    let pc = set.channel(Channel::ChamberPressure);

    let (plateau, _) = mean_std(&pc[100..200]);
    assert!((plateau - 110.0).abs() < 1.0, "plateau mean {plateau}");

    let (ignition, _) = mean_std(&pc[0..5]);
    assert!((ignition - 50.0).abs() < 2.0, "ignition mean {ignition}");

    let (tail, _) = mean_std(&pc[295..300]);
    assert!(tail < 60.0, "shutdown tail {tail}");
}

#[test]
fn noise_level_matches_profile() {
    let set = nominal_run(3);
    let vib = set.channel(Channel::Vibration);
    let (mean, std) = mean_std(vib);
    assert!((mean - 0.3).abs() < 0.02, "Vib mean {mean}");
    assert!((std - 0.05).abs() < 0.015, "Vib std {std}");
}

#[test]
fn thrust_is_exactly_derived() {
    let set = nominal_run(5);
    let pc = set.channel(Channel::ChamberPressure);
    let fuel = set.channel(Channel::FuelFlow);
    for (i, &t) in set.channel(Channel::Thrust).iter().enumerate() {
        assert_eq!(t, 0.8 * pc[i] + 0.2 * fuel[i], "thrust at row {i}");
        assert_eq!(t, thrust(pc[i], fuel[i]));
    }
}

#[test]
fn same_seed_same_waveforms() {
    assert_eq!(nominal_run(1234), nominal_run(1234));
}

#[test]
fn channels_draw_from_independent_streams() {
    let set = nominal_run(99);
    // Same noise would leave the residuals of two channels identical.
    let residual = |channel: Channel| -> Vec<f64> {
        let profile = ChannelProfile::nominal(channel).unwrap();
        set.channel(channel)
            .iter()
            .zip(&set.time)
            .map(|(v, &t)| (v - profile.baseline.value(t, 300.0)) / profile.noise_std)
            .collect()
    };
    assert_ne!(residual(Channel::ChamberPressure), residual(Channel::FuelFlow));
    assert_ne!(residual(Channel::InletTemp), residual(Channel::BearingTemp));
}

#[test]
fn derived_channel_has_no_profile() {
    assert!(ChannelProfile::nominal(Channel::Thrust).is_none());
    for channel in Channel::ALL.into_iter().filter(|c| !c.is_derived()) {
        assert!(ChannelProfile::nominal(channel).is_some(), "{channel}");
    }
}

#[test]
fn baseline_events_scale_with_duration() {
    let shape = BaselineShape::Plateau { base: 50.0, amplitude: 30.0, rise_at: 0.1, fall_at: 0.9, width_s: 10.0 };
    // Midpoint of the run sits on the plateau for any reasonable duration.
    for duration in [300.0, 600.0, 1200.0] {
        let mid = shape.value(duration / 2.0, duration);
        assert!((mid - 110.0).abs() < 1e-6, "duration {duration}: {mid}");
    }
    // Rise centre is at 10 % of the run, halfway up the ramp.
    assert!((shape.value(60.0, 600.0) - 80.0).abs() < 1e-6);
}

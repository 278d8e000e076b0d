//! Procedurally synthesized cue clips and the bank they are looked up from.

use fnv::FnvHashMap;
use rand::prelude::*;
use std::f32::consts::TAU;
use std::sync::Arc;

pub const WIND_UP_CLIP: &str = "wind-up";
pub const CLANK_CLIP: &str = "clank";

pub const WIND_UP_SECONDS: f32 = 2.0;
pub const CLANK_SECONDS: f32 = 0.45;

/// Mono sample buffers keyed by clip name.
#[derive(Default)]
pub struct ClipBank {
    sample_rate: f32,
    clips: FnvHashMap<String, Arc<[f32]>>,
}

impl ClipBank {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            clips: FnvHashMap::default(),
        }
    }

    /// Bank holding the wind-up and clank clips rendered at `sample_rate`.
    pub fn synthesized(sample_rate: f32) -> Self {
        let mut bank = Self::new(sample_rate);
        bank.insert(WIND_UP_CLIP, synth_wind_up(sample_rate, WIND_UP_SECONDS));
        bank.insert(CLANK_CLIP, synth_clank(sample_rate, CLANK_SECONDS));
        bank
    }

    pub fn insert(&mut self, name: &str, samples: Vec<f32>) {
        self.clips.insert(name.to_string(), samples.into());
    }

    pub fn get(&self, name: &str) -> Option<Arc<[f32]>> {
        self.clips.get(name).cloned()
    }

    pub fn length_sec(&self, name: &str) -> Option<f32> {
        self.clips
            .get(name)
            .map(|c| c.len() as f32 / self.sample_rate.max(1.0))
    }
}

/// Ratcheting crank: clicks that speed up over the clip with a rising hum
/// underneath, so scrubbing through it reads as "winding faster".
pub fn synth_wind_up(sample_rate: f32, seconds: f32) -> Vec<f32> {
    let len = (sample_rate * seconds).max(1.0) as usize;
    let mut out = vec![0.0_f32; len];
    let mut rng = StdRng::seed_from_u64(0x00C0_FFEE);

    // hum: 70 Hz -> 190 Hz with a soft saw
    let mut phase = 0.0_f32;
    for (i, s) in out.iter_mut().enumerate() {
        let t = i as f32 / len as f32;
        let freq = 70.0 + 120.0 * t;
        phase = (phase + freq / sample_rate).fract();
        let saw = 2.0 * phase - 1.0;
        *s = 0.12 * saw * (0.6 + 0.4 * t);
    }

    // ratchet clicks: 6 Hz -> 18 Hz
    let click_len = (0.012 * sample_rate) as usize;
    let mut t_sec = 0.0_f32;
    while t_sec < seconds {
        let start = (t_sec * sample_rate) as usize;
        let pitch = 1800.0 + rng.gen::<f32>() * 600.0;
        for n in 0..click_len {
            let Some(s) = out.get_mut(start + n) else {
                break;
            };
            let env = (-(n as f32) / (0.0025 * sample_rate)).exp();
            let noise = rng.gen::<f32>() * 2.0 - 1.0;
            let tone = (TAU * pitch * n as f32 / sample_rate).sin();
            *s += 0.55 * env * (0.6 * noise + 0.4 * tone);
        }
        let rate = 6.0 + 12.0 * (t_sec / seconds);
        t_sec += 1.0 / rate;
    }

    normalize(&mut out, 0.8);
    out
}

/// Metallic hit: a few inharmonic partials with staggered decays over a
/// short noise transient.
pub fn synth_clank(sample_rate: f32, seconds: f32) -> Vec<f32> {
    const PARTIALS: [(f32, f32, f32); 4] = [
        // (ratio, amplitude, decay seconds)
        (1.0, 1.0, 0.22),
        (2.76, 0.6, 0.12),
        (5.40, 0.4, 0.07),
        (8.93, 0.25, 0.04),
    ];
    let base_hz = 320.0;
    let len = (sample_rate * seconds).max(1.0) as usize;
    let mut rng = StdRng::seed_from_u64(0x0C1A_4C);
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let t = i as f32 / sample_rate;
        let mut v = 0.0;
        for (ratio, amp, decay) in PARTIALS {
            v += amp * (-t / decay).exp() * (TAU * base_hz * ratio * t).sin();
        }
        let transient = (-t / 0.004).exp() * (rng.gen::<f32>() * 2.0 - 1.0);
        out.push(v + 0.8 * transient);
    }
    normalize(&mut out, 0.9);
    out
}

fn normalize(buf: &mut [f32], peak: f32) {
    let max = buf.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
    if max > 0.0 {
        let g = peak / max;
        for s in buf.iter_mut() {
            *s *= g;
        }
    }
}

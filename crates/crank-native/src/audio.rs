// ---------------- Native cue playback (cpal) ----------------
//
// Two voices share one output stream: slot 0 carries the wind-up, slot 1 the
// clank. The flashlight talks to each through a `CuePort`, which only flips
// flags and cursors under the mixer lock; the stream callback does the rest.

use crate::clips::{ClipBank, CLANK_CLIP, WIND_UP_CLIP};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crank_core::{AudioPort, Clip};
use parking_lot::Mutex;
use std::sync::Arc;

pub const WIND_UP_SLOT: usize = 0;
pub const CLANK_SLOT: usize = 1;

const WIND_UP_GAIN: f32 = 0.7;
const CLANK_GAIN: f32 = 0.9;

#[derive(Default)]
struct CueVoice {
    clip: Option<Arc<[f32]>>,
    cursor: usize,
    playing: bool,
    looping: bool,
    gain: f32,
}

impl CueVoice {
    fn next_sample(&mut self) -> f32 {
        if !self.playing {
            return 0.0;
        }
        let Some(clip) = self.clip.as_ref() else {
            self.playing = false;
            return 0.0;
        };
        if self.cursor >= clip.len() {
            if self.looping && !clip.is_empty() {
                self.cursor = 0;
            } else {
                self.playing = false;
                self.cursor = 0;
                return 0.0;
            }
        }
        let s = clip[self.cursor] * self.gain;
        self.cursor += 1;
        s
    }
}

pub struct MixerState {
    sample_rate: f32,
    voices: [CueVoice; 2],
}

impl MixerState {
    pub fn new(sample_rate: f32) -> Self {
        let mut voices: [CueVoice; 2] = Default::default();
        voices[WIND_UP_SLOT].gain = WIND_UP_GAIN;
        voices[CLANK_SLOT].gain = CLANK_GAIN;
        Self {
            sample_rate,
            voices,
        }
    }

    /// Mix one mono sample from both voices.
    pub fn render_sample(&mut self) -> f32 {
        let mut mix = 0.0_f32;
        for v in self.voices.iter_mut() {
            mix += v.next_sample();
        }
        mix.tanh()
    }
}

/// `AudioPort` backed by one mixer voice.
#[derive(Clone)]
pub struct CuePort {
    mixer: Arc<Mutex<MixerState>>,
    bank: Arc<ClipBank>,
    slot: usize,
}

impl CuePort {
    pub fn new(mixer: Arc<Mutex<MixerState>>, bank: Arc<ClipBank>, slot: usize) -> Self {
        Self { mixer, bank, slot }
    }
}

impl AudioPort for CuePort {
    fn set_clip(&mut self, clip: &Clip) {
        let samples = self.bank.get(&clip.name);
        if samples.is_none() {
            log::warn!("[audio] clip '{}' not in bank", clip.name);
        }
        let mut m = self.mixer.lock();
        let v = &mut m.voices[self.slot];
        v.clip = samples;
        v.cursor = 0;
        v.playing = false;
    }

    fn play(&mut self) {
        let mut m = self.mixer.lock();
        let v = &mut m.voices[self.slot];
        v.playing = v.clip.is_some();
    }

    fn stop(&mut self) {
        self.mixer.lock().voices[self.slot].playing = false;
    }

    fn seek(&mut self, position_sec: f32) {
        let mut m = self.mixer.lock();
        let sr = m.sample_rate;
        let v = &mut m.voices[self.slot];
        let len = v.clip.as_ref().map_or(0, |c| c.len());
        v.cursor = ((position_sec.max(0.0) * sr) as usize).min(len);
    }

    fn position(&self) -> f32 {
        let m = self.mixer.lock();
        m.voices[self.slot].cursor as f32 / m.sample_rate
    }

    fn is_playing(&self) -> bool {
        self.mixer.lock().voices[self.slot].playing
    }

    fn clip_length(&self) -> Option<f32> {
        let m = self.mixer.lock();
        m.voices[self.slot]
            .clip
            .as_ref()
            .map(|c| c.len() as f32 / m.sample_rate)
    }

    fn set_looping(&mut self, looping: bool) {
        self.mixer.lock().voices[self.slot].looping = looping;
    }
}

/// Live output stream plus the two ports driving it.
pub struct CueOutput {
    _stream: cpal::Stream,
    pub wind_up: CuePort,
    pub clank: CuePort,
    pub clank_clip: Clip,
}

/// Build the clip bank, the mixer and its ports without touching a device.
pub fn build_cues(sample_rate: f32) -> (Arc<Mutex<MixerState>>, CuePort, CuePort, Clip) {
    let bank = Arc::new(ClipBank::synthesized(sample_rate));
    let mixer = Arc::new(Mutex::new(MixerState::new(sample_rate)));
    let mut wind_up = CuePort::new(Arc::clone(&mixer), Arc::clone(&bank), WIND_UP_SLOT);
    let clank = CuePort::new(Arc::clone(&mixer), Arc::clone(&bank), CLANK_SLOT);
    let clank_len = bank.length_sec(CLANK_CLIP).unwrap_or(0.0);
    if let Some(len) = bank.length_sec(WIND_UP_CLIP) {
        wind_up.set_clip(&Clip::new(WIND_UP_CLIP, len));
    }
    (mixer, wind_up, clank, Clip::new(CLANK_CLIP, clank_len))
}

/// Open the default output device. `None` means no usable device; the
/// flashlight then runs with silent cues.
pub fn start_cue_output() -> Option<CueOutput> {
    let host = cpal::default_host();
    let device = host.default_output_device()?;
    let config = device.default_output_config().ok()?;
    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;

    let (mixer, wind_up, clank, clank_clip) = build_cues(sample_rate);

    let err_fn = |err| log::error!("audio stream error: {err}");
    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => {
            build_stream::<f32>(&device, &config.into(), channels, mixer, err_fn)
        }
        cpal::SampleFormat::I16 => {
            build_stream::<i16>(&device, &config.into(), channels, mixer, err_fn)
        }
        cpal::SampleFormat::U16 => {
            build_stream::<u16>(&device, &config.into(), channels, mixer, err_fn)
        }
        other => {
            log::warn!("[audio] unsupported sample format {other:?}");
            return None;
        }
    }
    .map_err(|e| log::warn!("[audio] build_output_stream failed: {e}"))
    .ok()?;

    stream
        .play()
        .map_err(|e| log::warn!("[audio] stream play failed: {e}"))
        .ok()?;
    log::info!("[audio] output at {sample_rate} Hz, {channels} ch");
    Some(CueOutput {
        _stream: stream,
        wind_up,
        clank,
        clank_clip,
    })
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    mixer: Arc<Mutex<MixerState>>,
    err_fn: impl Fn(cpal::StreamError) + Send + 'static,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    device.build_output_stream(
        config,
        move |data: &mut [T], _| {
            let mut guard = mixer.lock();
            for frame in data.chunks_mut(channels.max(1)) {
                let value = T::from_sample(guard.render_sample());
                for s in frame.iter_mut() {
                    *s = value;
                }
            }
        },
        err_fn,
        None,
    )
}

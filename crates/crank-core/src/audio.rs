//! Audio feedback for charging.
//!
//! Two cues are driven from the state machine: a long wind-up clip whose
//! playback position is scrubbed to match progress through the current
//! chunk, and a short clank fired when a chunk completes. Both sit behind
//! [`AudioPort`] and either may be absent, in which case its commands are
//! dropped and the simulation carries on unaffected.

use crate::config::ScrubTuning;
use crate::motion::approximately;
use std::cell::RefCell;
use std::rc::Rc;

/// Handle to a clip asset known to the audio backend.
#[derive(Clone, Debug, PartialEq)]
pub struct Clip {
    pub name: String,
    pub length_sec: f32,
}

impl Clip {
    pub fn new(name: impl Into<String>, length_sec: f32) -> Self {
        Self {
            name: name.into(),
            length_sec,
        }
    }
}

/// Minimal playback surface for a single cue.
pub trait AudioPort {
    fn set_clip(&mut self, clip: &Clip);
    fn play(&mut self);
    fn stop(&mut self);
    fn seek(&mut self, position_sec: f32);
    fn position(&self) -> f32;
    fn is_playing(&self) -> bool;
    /// Length of the loaded clip, `None` when nothing is loaded.
    fn clip_length(&self) -> Option<f32>;
    fn set_looping(&mut self, _looping: bool) {}
}

/// Fraction of the current chunk already charged, in `[0, 1]`.
///
/// A chunk whose target equals its start (charging at the cap) reports 0.
pub fn chunk_progress(current: f32, start: f32, target: f32) -> f32 {
    let size = target - start;
    if approximately(size, 0.0) {
        return 0.0;
    }
    ((current - start) / size).clamp(0.0, 1.0)
}

/// Wind-up playback position for a progress fraction.
pub fn scrub_position(progress: f32, clip_length: f32, end_guard: f32) -> f32 {
    let span = (clip_length - end_guard).max(0.0);
    progress.clamp(0.0, 1.0) * span
}

pub struct AudioSyncEngine {
    wind_up: Option<Box<dyn AudioPort>>,
    clank: Option<Box<dyn AudioPort>>,
    clank_clip: Option<Clip>,
    tuning: ScrubTuning,
}

impl AudioSyncEngine {
    pub fn new(tuning: ScrubTuning) -> Self {
        Self {
            wind_up: None,
            clank: None,
            clank_clip: None,
            tuning,
        }
    }

    /// Engine with no cues attached.
    pub fn silent() -> Self {
        Self::new(ScrubTuning::default())
    }

    pub fn with_wind_up(mut self, port: impl AudioPort + 'static) -> Self {
        self.wind_up = Some(Box::new(port));
        self
    }

    pub fn with_clank(mut self, port: impl AudioPort + 'static, clip: Clip) -> Self {
        self.clank = Some(Box::new(port));
        self.clank_clip = Some(clip);
        self
    }

    /// Put both cues into a stopped, one-shot state.
    pub fn prepare(&mut self) {
        match self.wind_up.as_mut() {
            Some(p) => {
                p.set_looping(false);
                p.stop();
            }
            None => log::warn!("[audio] no wind-up cue attached; charging will be silent"),
        }
        match self.clank.as_mut() {
            Some(p) => {
                p.set_looping(false);
                p.stop();
            }
            None => log::warn!("[audio] no clank cue attached"),
        }
    }

    pub fn start_chunk(&mut self) {
        if let Some(p) = self.wind_up.as_mut() {
            p.stop();
            p.seek(0.0);
            p.play();
        }
    }

    pub fn abort_chunk(&mut self) {
        if let Some(p) = self.wind_up.as_mut() {
            if p.is_playing() {
                p.stop();
            }
        }
    }

    /// Scrub the wind-up toward `progress`. Returns the position committed,
    /// or `None` when the drift stayed inside the hysteresis band.
    pub fn sync(&mut self, progress: f32) -> Option<f32> {
        let port = self.wind_up.as_mut()?;
        let length = port.clip_length()?;
        let guard = self.tuning.end_guard_sec;
        // never seek onto the clip end, whatever guard was configured
        let last = (length * (1.0 - f32::EPSILON)).min(length - guard).max(0.0);
        let committed = scrub_position(progress, length, guard).clamp(0.0, last);
        if (port.position() - committed).abs() <= self.tuning.hysteresis_sec.max(0.0) {
            return None;
        }
        log::trace!("[audio] wind-up seek {committed:.3}s (progress {progress:.3})");
        port.seek(committed);
        Some(committed)
    }

    /// Restart the clank from the top. Returns whether a cue was played.
    pub fn complete_chunk(&mut self) -> bool {
        match (self.clank.as_mut(), self.clank_clip.as_ref()) {
            (Some(port), Some(clip)) => {
                port.stop();
                port.set_clip(clip);
                port.play();
                true
            }
            _ => false,
        }
    }
}

impl Default for AudioSyncEngine {
    fn default() -> Self {
        Self::silent()
    }
}

/// Command issued to a [`MemoryPort`].
#[derive(Clone, Debug, PartialEq)]
pub enum AudioCommand {
    SetClip(String),
    Play,
    Stop,
    Seek(f32),
    SetLooping(bool),
}

#[derive(Debug, Default)]
struct MemoryPortState {
    clip: Option<Clip>,
    position: f32,
    playing: bool,
    looping: bool,
    log: Vec<AudioCommand>,
}

/// In-process port that tracks playback state and records every command.
///
/// Clones share state, so a test can keep one handle while the engine owns
/// the other.
#[derive(Clone, Debug, Default)]
pub struct MemoryPort {
    inner: Rc<RefCell<MemoryPortState>>,
}

impl MemoryPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clip(clip: Clip) -> Self {
        let port = Self::default();
        port.inner.borrow_mut().clip = Some(clip);
        port
    }

    /// Let playback run for `dt` seconds, stopping at end-of-clip.
    pub fn advance(&self, dt: f32) {
        let mut s = self.inner.borrow_mut();
        if !s.playing {
            return;
        }
        let Some(length) = s.clip.as_ref().map(|c| c.length_sec) else {
            return;
        };
        s.position += dt.max(0.0);
        if s.position >= length {
            if s.looping && length > 0.0 {
                s.position %= length;
            } else {
                s.position = 0.0;
                s.playing = false;
            }
        }
    }

    pub fn commands(&self) -> Vec<AudioCommand> {
        self.inner.borrow().log.clone()
    }

    pub fn count(&self, cmd: &AudioCommand) -> usize {
        self.inner.borrow().log.iter().filter(|c| *c == cmd).count()
    }

    pub fn seeks(&self) -> Vec<f32> {
        self.inner
            .borrow()
            .log
            .iter()
            .filter_map(|c| match c {
                AudioCommand::Seek(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn clear_log(&self) {
        self.inner.borrow_mut().log.clear();
    }

    pub fn is_looping(&self) -> bool {
        self.inner.borrow().looping
    }
}

impl AudioPort for MemoryPort {
    fn set_clip(&mut self, clip: &Clip) {
        let mut s = self.inner.borrow_mut();
        s.clip = Some(clip.clone());
        s.position = 0.0;
        s.log.push(AudioCommand::SetClip(clip.name.clone()));
    }

    fn play(&mut self) {
        let mut s = self.inner.borrow_mut();
        s.playing = s.clip.is_some();
        s.log.push(AudioCommand::Play);
    }

    fn stop(&mut self) {
        let mut s = self.inner.borrow_mut();
        s.playing = false;
        s.log.push(AudioCommand::Stop);
    }

    fn seek(&mut self, position_sec: f32) {
        let mut s = self.inner.borrow_mut();
        s.position = position_sec.max(0.0);
        s.log.push(AudioCommand::Seek(position_sec));
    }

    fn position(&self) -> f32 {
        self.inner.borrow().position
    }

    fn is_playing(&self) -> bool {
        self.inner.borrow().playing
    }

    fn clip_length(&self) -> Option<f32> {
        self.inner.borrow().clip.as_ref().map(|c| c.length_sec)
    }

    fn set_looping(&mut self, looping: bool) {
        let mut s = self.inner.borrow_mut();
        s.looping = looping;
        s.log.push(AudioCommand::SetLooping(looping));
    }
}

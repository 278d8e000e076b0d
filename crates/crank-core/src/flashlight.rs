//! The crank flashlight: chunked charging, release gate, decay.
//!
//! Holding the control charges the beam toward the end of the current chunk.
//! Letting go early keeps whatever was gained. Finishing a chunk latches
//! until the control is released, so a single long hold never chains chunks.
//! Whenever the beam is not charging it dims toward zero.

use crate::audio::{chunk_progress, AudioSyncEngine};
use crate::config::FlashlightConfig;
use crate::input::{InputSampler, InputSnapshot};
use crate::light::LightOutput;
use crate::motion::{approximately, decay, move_toward};
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChargeState {
    #[default]
    Idle,
    Charging,
    /// Chunk target reached; waiting for the control to be released.
    ChunkFinished,
}

/// Transitions that happened during a frame, in the order they occurred.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChargeEvent {
    ChunkStarted { start: f32, target: f32 },
    ChunkAborted { kept: f32, target: f32 },
    ChunkCompleted { intensity: f32 },
    GateReleased,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutput {
    pub intensity: f32,
    pub state: ChargeState,
    pub events: SmallVec<[ChargeEvent; 4]>,
}

impl FrameOutput {
    pub fn completed(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, ChargeEvent::ChunkCompleted { .. }))
    }
}

pub struct ChargeStateMachine {
    config: FlashlightConfig,
    audio: AudioSyncEngine,
    state: ChargeState,
    current: f32,
    chunk_start: f32,
    target: f32,
}

impl ChargeStateMachine {
    pub fn new(config: FlashlightConfig, audio: AudioSyncEngine) -> Self {
        Self {
            config,
            audio,
            state: ChargeState::Idle,
            current: 0.0,
            chunk_start: 0.0,
            target: 0.0,
        }
    }

    pub fn config(&self) -> &FlashlightConfig {
        &self.config
    }
    pub fn state(&self) -> ChargeState {
        self.state
    }
    pub fn intensity(&self) -> f32 {
        self.current
    }
    pub fn chunk_start(&self) -> f32 {
        self.chunk_start
    }
    pub fn target(&self) -> f32 {
        self.target
    }
    pub fn is_charging(&self) -> bool {
        self.state == ChargeState::Charging
    }
    pub fn chunk_finished(&self) -> bool {
        self.state == ChargeState::ChunkFinished
    }

    /// Progress through the active chunk, 0 outside of one.
    pub fn progress(&self) -> f32 {
        chunk_progress(self.current, self.chunk_start, self.target)
    }

    pub fn audio_mut(&mut self) -> &mut AudioSyncEngine {
        &mut self.audio
    }

    /// Advance one frame. Transitions are resolved first, then decay, and the
    /// resulting intensity is written to `light` every frame.
    pub fn update<L: LightOutput + ?Sized>(
        &mut self,
        dt: f32,
        input: InputSnapshot,
        light: &mut L,
    ) -> FrameOutput {
        let mut events = SmallVec::new();
        self.step_charge(dt, input, &mut events);
        self.step_decay(dt);
        light.set_intensity(self.current);
        FrameOutput {
            intensity: self.current,
            state: self.state,
            events,
        }
    }

    fn step_charge(
        &mut self,
        dt: f32,
        input: InputSnapshot,
        events: &mut SmallVec<[ChargeEvent; 4]>,
    ) {
        if input.pressed && self.state == ChargeState::Idle {
            self.begin_chunk();
            events.push(ChargeEvent::ChunkStarted {
                start: self.chunk_start,
                target: self.target,
            });
        }

        if self.state == ChargeState::Charging {
            if !input.held {
                self.state = ChargeState::Idle;
                self.audio.abort_chunk();
                log::debug!(
                    "[charge] released early at {:.3} (target {:.3})",
                    self.current,
                    self.target
                );
                events.push(ChargeEvent::ChunkAborted {
                    kept: self.current,
                    target: self.target,
                });
                return;
            }

            self.current = move_toward(self.current, self.target, self.config.charge_rate() * dt);
            let progress = self.progress();
            self.audio.sync(progress);

            if approximately(self.current, self.target) {
                self.current = self.target;
                self.state = ChargeState::ChunkFinished;
                self.audio.complete_chunk();
                log::debug!("[charge] chunk complete at {:.3}", self.current);
                events.push(ChargeEvent::ChunkCompleted {
                    intensity: self.current,
                });
            }
        }

        if input.released && self.state == ChargeState::ChunkFinished {
            self.state = ChargeState::Idle;
            events.push(ChargeEvent::GateReleased);
        }
    }

    fn begin_chunk(&mut self) {
        self.state = ChargeState::Charging;
        self.chunk_start = self.current;
        self.target = (self.current + self.config.charge_chunk()).min(self.config.max_intensity());
        self.audio.start_chunk();
        log::debug!(
            "[charge] chunk {:.3} -> {:.3}",
            self.chunk_start,
            self.target
        );
    }

    // Runs during ChunkFinished too, so a latched beam starts dimming before
    // the control is let go.
    fn step_decay(&mut self, dt: f32) {
        if self.state != ChargeState::Charging && self.current > 0.0 {
            self.current = decay(self.current, self.config.decay_rate(), dt);
        }
    }
}

/// A flashlight entity: the state machine plus the devices it reads from and
/// writes to.
pub struct Flashlight<S, L> {
    machine: ChargeStateMachine,
    input: S,
    light: L,
}

impl<S: InputSampler, L: LightOutput> Flashlight<S, L> {
    /// Build the flashlight, silence both cues and push the initial
    /// (dark) intensity to the light.
    pub fn initialize(
        config: FlashlightConfig,
        audio: AudioSyncEngine,
        input: S,
        light: L,
    ) -> Self {
        let mut machine = ChargeStateMachine::new(config, audio);
        machine.audio_mut().prepare();
        let mut light = light;
        light.set_intensity(machine.intensity());
        log::info!(
            "[flashlight] ready: max {:.2}, chunk {:.2}, charge {:.2}/s, decay {:.2}/s, control {}",
            machine.config().max_intensity(),
            machine.config().charge_chunk(),
            machine.config().charge_rate(),
            machine.config().decay_rate(),
            machine.config().control(),
        );
        Self {
            machine,
            input,
            light,
        }
    }

    /// Sample the control and advance one frame of `dt` seconds.
    pub fn update(&mut self, dt: f32) -> FrameOutput {
        let snapshot = self.input.sample();
        self.machine.update(dt, snapshot, &mut self.light)
    }

    pub fn machine(&self) -> &ChargeStateMachine {
        &self.machine
    }
    pub fn input_mut(&mut self) -> &mut S {
        &mut self.input
    }
    pub fn light(&self) -> &L {
        &self.light
    }
}

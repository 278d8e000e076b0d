//! Charge control sampling.

/// Edge and level signals for the charge control during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub pressed: bool,
    pub held: bool,
    pub released: bool,
}

impl InputSnapshot {
    pub const IDLE: Self = Self {
        pressed: false,
        held: false,
        released: false,
    };

    pub fn press() -> Self {
        Self {
            pressed: true,
            held: true,
            released: false,
        }
    }

    pub fn hold() -> Self {
        Self {
            pressed: false,
            held: true,
            released: false,
        }
    }

    pub fn release() -> Self {
        Self {
            pressed: false,
            held: false,
            released: true,
        }
    }
}

/// Source of per-frame control snapshots.
pub trait InputSampler {
    fn sample(&mut self) -> InputSnapshot;
}

/// A missing device reads as a control that is never active.
impl<S: InputSampler> InputSampler for Option<S> {
    fn sample(&mut self) -> InputSnapshot {
        match self {
            Some(s) => s.sample(),
            None => InputSnapshot::IDLE,
        }
    }
}

/// Turns raw down/up notifications into frame snapshots.
///
/// Edges are latched until the next `sample`, so a tap that starts and ends
/// between two frames still reports both `pressed` and `released`. Key
/// repeat (down while already down) is ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct LatchedControl {
    down: bool,
    pressed: bool,
    released: bool,
}

impl LatchedControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self) {
        if !self.down {
            self.down = true;
            self.pressed = true;
        }
    }

    pub fn key_up(&mut self) {
        if self.down {
            self.down = false;
            self.released = true;
        }
    }

    /// Force the control up, e.g. when the window loses focus.
    pub fn reset(&mut self) {
        self.key_up();
    }

    pub fn is_down(&self) -> bool {
        self.down
    }
}

impl InputSampler for LatchedControl {
    fn sample(&mut self) -> InputSnapshot {
        let snap = InputSnapshot {
            pressed: self.pressed,
            held: self.down,
            released: self.released,
        };
        self.pressed = false;
        self.released = false;
        snap
    }
}

/// Replays a fixed list of snapshots, then reports idle frames.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    frames: std::collections::VecDeque<InputSnapshot>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = InputSnapshot>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSampler for ScriptedInput {
    fn sample(&mut self) -> InputSnapshot {
        self.frames.pop_front().unwrap_or(InputSnapshot::IDLE)
    }
}

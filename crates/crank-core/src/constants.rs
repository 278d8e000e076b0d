// Shared tuning constants used by the core and the native front-end.

// Charge defaults (intensity units, seconds)
pub const DEFAULT_MAX_INTENSITY: f32 = 8.0; // brightest the beam can get
pub const DEFAULT_CHARGE_CHUNK: f32 = 2.0; // brightness gained per completed chunk
pub const DEFAULT_CHARGE_RATE: f32 = 1.0; // units per second while cranking
pub const DEFAULT_DECAY_RATE: f32 = 0.5; // units per second while idle

// Control binding used when none is configured
pub const DEFAULT_CONTROL_BINDING: &str = "E";

// Wind-up scrubbing
pub const SCRUB_END_GUARD_SEC: f32 = 0.001; // keeps the seek target short of end-of-clip
pub const SCRUB_HYSTERESIS_SEC: f32 = 0.05; // minimum drift before a seek is committed

// Relative tolerance for "reached target" and degenerate chunk checks
pub const APPROX_EPSILON: f32 = 1e-5;

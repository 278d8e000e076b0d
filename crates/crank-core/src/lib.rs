pub mod audio;
pub mod config;
pub mod constants;
pub mod flashlight;
pub mod input;
pub mod light;
pub mod motion;

pub use audio::*;
pub use config::*;
pub use constants::*;
pub use flashlight::*;
pub use input::*;
pub use light::*;
pub use motion::*;

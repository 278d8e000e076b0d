use anyhow::Context;
use crank_core::FlashlightSettings;
use std::path::Path;
use winit::keyboard::KeyCode;

/// Load settings from a JSON file, or defaults when no path is given.
/// Missing fields fall back to their defaults.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<FlashlightSettings> {
    let Some(path) = path else {
        return Ok(FlashlightSettings::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading settings from {}", path.display()))?;
    let settings = serde_json::from_str(&text)
        .with_context(|| format!("parsing settings in {}", path.display()))?;
    log::info!("[settings] loaded {}", path.display());
    Ok(settings)
}

const LETTERS: [KeyCode; 26] = [
    KeyCode::KeyA,
    KeyCode::KeyB,
    KeyCode::KeyC,
    KeyCode::KeyD,
    KeyCode::KeyE,
    KeyCode::KeyF,
    KeyCode::KeyG,
    KeyCode::KeyH,
    KeyCode::KeyI,
    KeyCode::KeyJ,
    KeyCode::KeyK,
    KeyCode::KeyL,
    KeyCode::KeyM,
    KeyCode::KeyN,
    KeyCode::KeyO,
    KeyCode::KeyP,
    KeyCode::KeyQ,
    KeyCode::KeyR,
    KeyCode::KeyS,
    KeyCode::KeyT,
    KeyCode::KeyU,
    KeyCode::KeyV,
    KeyCode::KeyW,
    KeyCode::KeyX,
    KeyCode::KeyY,
    KeyCode::KeyZ,
];

const DIGITS: [KeyCode; 10] = [
    KeyCode::Digit0,
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

/// Map a control binding identifier ("E", "Space", "7", ...) to a key.
pub fn key_code_for_binding(binding: &str) -> Option<KeyCode> {
    let b = binding.trim();
    let mut chars = b.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        let c = c.to_ascii_uppercase();
        if c.is_ascii_uppercase() {
            return LETTERS.get((c as u8 - b'A') as usize).copied();
        }
        if c.is_ascii_digit() {
            return DIGITS.get((c as u8 - b'0') as usize).copied();
        }
        return None;
    }
    match b.to_ascii_lowercase().as_str() {
        "space" => Some(KeyCode::Space),
        "enter" | "return" => Some(KeyCode::Enter),
        "tab" => Some(KeyCode::Tab),
        "shift" | "lshift" | "shiftleft" => Some(KeyCode::ShiftLeft),
        "rshift" | "shiftright" => Some(KeyCode::ShiftRight),
        "ctrl" | "lctrl" | "controlleft" => Some(KeyCode::ControlLeft),
        "up" | "arrowup" => Some(KeyCode::ArrowUp),
        "down" | "arrowdown" => Some(KeyCode::ArrowDown),
        _ => None,
    }
}

use std::path::PathBuf;
use std::time::Instant;
use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

use crank_core::{
    AudioSyncEngine, ChargeEvent, Flashlight, FlashlightConfig, LatchedControl,
};

mod audio;
mod clips;
mod render;
mod settings;

use render::{BeamLight, BeamView, GpuState};

// Frames longer than this (window drag, breakpoint) are clamped
const MAX_FRAME_DT_SEC: f32 = 0.25;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = settings::load_settings(settings_path.as_deref())?;
    let config = FlashlightConfig::from_settings(&settings)?;
    let key = settings::key_code_for_binding(config.control())
        .ok_or_else(|| anyhow::anyhow!("unknown control binding '{}'", config.control()))?;

    // Keep the stream alive for the whole run; without a device the cues
    // stay detached and the flashlight runs silently.
    let cue_output = audio::start_cue_output();
    let audio = match cue_output.as_ref() {
        Some(out) => AudioSyncEngine::new(config.scrub())
            .with_wind_up(out.wind_up.clone())
            .with_clank(out.clank.clone(), out.clank_clip.clone()),
        None => {
            log::warn!("[audio] no output device; running silent");
            AudioSyncEngine::new(config.scrub())
        }
    };

    let mut flashlight = Flashlight::initialize(
        config,
        audio,
        LatchedControl::new(),
        BeamLight::default(),
    );

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title(format!("Crank flashlight (hold {key:?})"))
        .build(&event_loop)?;

    let mut gpu = pollster::block_on(GpuState::new(&window))?;
    let mut last_frame = Instant::now();

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::Resized(size) => gpu.resize(size),
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::Focused(false) => flashlight.input_mut().reset(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                if code == key {
                    match state {
                        ElementState::Pressed if !repeat => flashlight.input_mut().key_down(),
                        ElementState::Released => flashlight.input_mut().key_up(),
                        _ => {}
                    }
                } else if code == KeyCode::Escape && state == ElementState::Pressed {
                    elwt.exit();
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            let now = Instant::now();
            let dt = (now - last_frame).as_secs_f32().min(MAX_FRAME_DT_SEC);
            last_frame = now;

            let out = flashlight.update(dt);
            for ev in &out.events {
                match ev {
                    ChargeEvent::ChunkStarted { start, target } => {
                        log::info!("[crank] chunk {start:.2} -> {target:.2}")
                    }
                    ChargeEvent::ChunkAborted { kept, .. } => {
                        log::info!("[crank] let go at {kept:.2}")
                    }
                    ChargeEvent::ChunkCompleted { intensity } => {
                        log::info!("[crank] clank! {intensity:.2}")
                    }
                    ChargeEvent::GateReleased => log::debug!("[crank] gate released"),
                }
            }

            let machine = flashlight.machine();
            let beam = BeamView::new(
                flashlight.light().intensity,
                machine.config().max_intensity(),
                machine.progress(),
                machine.is_charging(),
            );
            match gpu.render(beam) {
                Ok(_) => gpu.window.request_redraw(),
                Err(wgpu::SurfaceError::Lost) => gpu.resize(gpu.window.inner_size()),
                Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                Err(_) => {}
            }
        }
        _ => {}
    })?;
    Ok(())
}

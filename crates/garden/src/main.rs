//! Headless garden demo: builds the scene from `scene.ron` (or the path given
//! as the first argument), then flies a short scripted route past the beacons
//! and logs what happens.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use engine_core::Time;
use garden::{GardenScene, SceneConfig, SceneEvent, DEFAULT_CONFIG_FILE};
use input::{ElementState, KeyCode};

const FRAME: Duration = Duration::from_nanos(16_666_667);
const ASPECT: f32 = 16.0 / 9.0;
const RUN_SECONDS: f32 = 7.0;

/// Keys held during a time window (seconds since start).
struct Leg {
    from: f32,
    to: f32,
    keys: &'static [KeyCode],
}

const ROUTE: &[Leg] = &[
    // Toward the postbox.
    Leg { from: 2.5, to: 3.1, keys: &[KeyCode::KeyA, KeyCode::KeyS] },
    // Across the front of the garden to the lounge chair.
    Leg { from: 3.8, to: 5.0, keys: &[KeyCode::KeyD] },
    // Up toward the laptop.
    Leg { from: 5.0, to: 5.8, keys: &[KeyCode::KeyW] },
];

fn keys_at(t: f32) -> &'static [KeyCode] {
    ROUTE
        .iter()
        .find(|leg| t >= leg.from && t < leg.to)
        .map(|leg| leg.keys)
        .unwrap_or(&[])
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = SceneConfig::load(&path).with_context(|| format!("loading {}", path.display()))?;
    let mut scene = GardenScene::build(config).context("building the garden scene")?;
    scene.mount_avatar();

    let mut time = Time::new();
    let mut held: &'static [KeyCode] = &[];
    let mut beacons_visited = 0;

    while time.elapsed_seconds() < RUN_SECONDS {
        time.advance(FRAME);

        let wanted = keys_at(time.elapsed_seconds());
        if !std::ptr::eq(wanted, held) {
            if let Some(input) = scene.input_mut() {
                for key in held {
                    input.process_keyboard(*key, ElementState::Released);
                }
                for key in wanted {
                    input.process_keyboard(*key, ElementState::Pressed);
                }
            }
            held = wanted;
        }

        let events = scene.frame(time.elapsed_seconds(), time.clamped_delta_seconds(1.0 / 30.0), ASPECT);
        for event in events {
            match event {
                SceneEvent::BeaconEntered { title, message, .. } => {
                    beacons_visited += 1;
                    log::info!("[{:.2}s] {}: {}", time.elapsed_seconds(), title, message);
                }
                SceneEvent::BeaconExited { id } => {
                    log::info!("[{:.2}s] closed {}", time.elapsed_seconds(), id);
                }
                SceneEvent::FirstMove => {
                    log::info!("[{:.2}s] avatar is moving", time.elapsed_seconds());
                }
            }
        }
    }

    let shader_len = scene
        .patch_shader("grass1")
        .transpose()
        .context("compiling the grass shader")?
        .map_or(0, |s| s.len());
    let props: usize = scene.instance_buffers().iter().map(|(_, b)| b.len()).sum();
    log::info!(
        "Done after {} frames: {} beacons visited, {} props, camera at {:?}, grass shader {} bytes",
        time.frame_count(),
        beacons_visited,
        props,
        scene.camera.position(),
        shader_len
    );
    log::debug!("Camera uniform: {:?}", scene.camera_uniform());
    if let Some(position) = scene.avatar_position() {
        log::info!("Avatar ended at {:?}", position);
    }
    scene.unmount_avatar();
    Ok(())
}

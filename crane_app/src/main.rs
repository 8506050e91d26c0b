//! Crane yard audio demo
//!
//! Runs the audio service headless for a few simulated seconds: a looping
//! motor hum on the crane hook, container drops around the yard and the odd
//! UI click, then prints what the pools did.
//!
//! Usage: `crane_app [config.toml|config.ron]`

use rand::Rng;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use yard_audio::foundation::logging;
use yard_audio::prelude::*;

const DEFAULT_CONFIG: &str = "config/audio.toml";
const CRANE_HOOK: SlotId = SlotId(1);
const FRAMES_PER_SECOND: u32 = 60;
const RUN_SECONDS: u32 = 10;
const DROP_EVERY_FRAMES: u32 = 20;
const CLICK_EVERY_FRAMES: u32 = 90;

/// Clips the demo plays
struct YardClips {
    motor_hum: AudioClip,
    container_drop: AudioClip,
    click: AudioClip,
}

impl YardClips {
    fn new() -> Self {
        Self {
            motor_hum: AudioClip::silent("motor_hum", Duration::from_secs(2)),
            container_drop: AudioClip::silent("container_drop", Duration::from_millis(1500)),
            click: AudioClip::silent("ui_click", Duration::from_millis(80)),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = AudioConfig::load_or_default(&config_path)?;
    log::info!("Loaded audio config from {config_path}");

    let clock = SharedClock::new();
    let mut audio = AudioService::new(&config, SimulatedFactory::new(clock.clone()))?;
    let clips = YardClips::new();
    let mut step = FixedStep::from_rate(FRAMES_PER_SECOND);
    let mut rng = rand::thread_rng();
    let drops_finished = Rc::new(Cell::new(0u32));

    let motor = audio.play(
        PlaybackRequest::new(clips.motor_hum.clone())
            .attached_to(CRANE_HOOK)
            .looping()
            .with_priority(PlaybackPriority::Critical),
    )?;

    let total_frames = FRAMES_PER_SECOND * RUN_SECONDS;
    for frame in 0..total_frames {
        if frame % DROP_EVERY_FRAMES == 0 {
            let position = Vec3::new(rng.gen_range(-40.0..40.0), 0.0, rng.gen_range(-15.0..15.0));
            let finished = Rc::clone(&drops_finished);
            let request = PlaybackRequest::new(clips.container_drop.clone())
                .at(position)
                .with_priority(PlaybackPriority::Low)
                .with_auto_remove(true)
                .on_end(move || finished.set(finished.get() + 1));

            match audio.play(request) {
                Ok(handle) => drop(handle),
                Err(AudioError::CapacityExceeded { pool, .. }) => {
                    log::warn!("Frame {frame}: '{pool}' pool full, container drop skipped");
                }
                Err(e) => return Err(e.into()),
            }
        }

        if frame % CLICK_EVERY_FRAMES == 0 {
            audio.play_ui(clips.click.clone())?;
        }

        if frame == total_frames / 2 {
            log::info!("Frame {frame}: ducking sound effects");
            audio.set_group_volume(VolumeGroup::Sfx, 0.6);
        }

        step.advance(&clock);
        audio.update();
    }

    audio.release(motor)?;
    report(&audio, drops_finished.get(), step.frame_count());

    match audio.shutdown() {
        Ok(()) => Ok(()),
        Err(AudioError::TeardownWhileActive { active }) => {
            log::warn!("{active} sound(s) were cut off at shutdown");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn report(audio: &AudioService<SimulatedFactory>, drops_finished: u32, frames: u64) {
    println!("Ran {frames} frames, {drops_finished} container drop(s) finished");
    for pool in [audio.global(), audio.local()] {
        let stats = pool.stats();
        println!(
            "  {:<6} size {}/{}  checkouts {}  releases {}  completions {}  rejected {}  stolen {}",
            pool.name(),
            pool.len(),
            pool.max_size(),
            stats.checkouts,
            stats.releases,
            stats.completions,
            stats.rejections,
            stats.steals,
        );
    }
}

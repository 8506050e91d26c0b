//! Rodio audio backend implementation
//!
//! Uses the Rodio library for cross-platform audio playback. Every pooled
//! source owns two sinks on one shared output stream: one for the assigned
//! clip and one for one-shots, so a one-shot never queues behind the clip.
//!
//! # Example
//!
//! ```no_run
//! use yard_audio::audio::backend::rodio_backend::RodioFactory;
//! use yard_audio::prelude::*;
//!
//! let factory = RodioFactory::new().unwrap();
//! let audio = AudioService::new(&AudioConfig::default(), factory).unwrap();
//!
//! let clip = AudioClip::from_file("resources/audio/horn.wav", std::time::Duration::from_secs(2)).unwrap();
//! audio.play_ui(clip).unwrap();
//! ```

use super::{Placement, PlayableSource, SlotId, SourceFactory, SourceSettings};
use crate::audio::clip::AudioClip;
use crate::audio::AudioError;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;
use std::rc::Rc;
use std::sync::Arc;

/// Rodio-backed playback source
pub struct RodioSource {
    stream_handle: OutputStreamHandle,
    main: Sink,
    one_shots: Sink,
    clip: Option<AudioClip>,
    volume: f32,
    looping: bool,
    enabled: bool,
    placement: Placement,
}

impl RodioSource {
    fn new(stream_handle: OutputStreamHandle, settings: &SourceSettings) -> Result<Self, AudioError> {
        let main = new_sink(&stream_handle)?;
        let one_shots = new_sink(&stream_handle)?;
        let mut source = Self {
            stream_handle,
            main,
            one_shots,
            clip: None,
            volume: settings.mix_level,
            looping: false,
            enabled: true,
            placement: Placement::Slot(SlotId::HOLDING),
        };
        source.apply_volume();
        Ok(source)
    }

    /// Current placement (stored only; Rodio sinks are not spatialized)
    pub fn placement(&self) -> Placement {
        self.placement
    }

    fn apply_volume(&self) {
        let volume = if self.enabled { self.volume } else { 0.0 };
        self.main.set_volume(volume);
        self.one_shots.set_volume(volume);
    }

    /// Stopped sinks are replaced so the source can play again
    fn replace_sinks(&mut self) {
        match (new_sink(&self.stream_handle), new_sink(&self.stream_handle)) {
            (Ok(main), Ok(one_shots)) => {
                self.main = main;
                self.one_shots = one_shots;
                self.apply_volume();
            }
            (Err(e), _) | (_, Err(e)) => log::error!("Failed to recreate Rodio sinks: {e}"),
        }
    }
}

fn new_sink(stream_handle: &OutputStreamHandle) -> Result<Sink, AudioError> {
    Sink::try_new(stream_handle).map_err(|e| AudioError::PlaybackFailed(format!("Failed to create sink: {e}")))
}

fn decode(clip: &AudioClip) -> Result<Decoder<Cursor<Arc<[u8]>>>, AudioError> {
    Decoder::new(Cursor::new(clip.shared_data()))
        .map_err(|e| AudioError::PlaybackFailed(format!("Failed to decode '{}': {e}", clip.name())))
}

impl PlayableSource for RodioSource {
    fn play(&mut self, clip: &AudioClip) {
        self.main.stop();
        self.replace_sinks();
        self.clip = Some(clip.clone());

        match decode(clip) {
            Ok(decoded) if self.looping => self.main.append(decoded.repeat_infinite()),
            Ok(decoded) => self.main.append(decoded),
            // Nothing appended: the source reports not playing and its watch ends.
            Err(e) => log::error!("{e}"),
        }
    }

    fn play_one_shot(&mut self, clip: &AudioClip) {
        match decode(clip) {
            Ok(decoded) => self.one_shots.append(decoded),
            Err(e) => log::error!("{e}"),
        }
    }

    fn stop(&mut self) {
        self.main.stop();
        self.one_shots.stop();
        self.replace_sinks();
    }

    fn is_playing(&self) -> bool {
        self.enabled && !(self.main.empty() && self.one_shots.empty())
    }

    fn set_clip(&mut self, clip: Option<AudioClip>) {
        if clip.is_none() {
            self.main.stop();
        }
        self.clip = clip;
    }

    fn clip(&self) -> Option<&AudioClip> {
        self.clip.as_ref()
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.apply_volume();
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled {
            self.main.play();
            self.one_shots.play();
        } else {
            self.main.pause();
            self.one_shots.pause();
        }
        self.apply_volume();
    }

    fn set_placement(&mut self, placement: Placement) {
        self.placement = placement;
    }
}

/// Builds [`RodioSource`]s on the default output device
///
/// Clones share the output stream, which stays open until the last clone
/// (and every source built from it) is gone.
#[derive(Clone)]
pub struct RodioFactory {
    _stream: Rc<OutputStream>,
    stream_handle: OutputStreamHandle,
}

impl RodioFactory {
    /// Open the default output device
    ///
    /// # Errors
    /// `BackendNotInitialized` if no output device is available.
    pub fn new() -> Result<Self, AudioError> {
        let (stream, stream_handle) = OutputStream::try_default().map_err(|e| {
            log::error!("Failed to open audio output: {e}");
            AudioError::BackendNotInitialized
        })?;
        log::info!("Rodio audio backend initialized");

        Ok(Self {
            _stream: Rc::new(stream),
            stream_handle,
        })
    }
}

impl SourceFactory for RodioFactory {
    type Source = RodioSource;

    fn create(&mut self, settings: &SourceSettings) -> Result<RodioSource, AudioError> {
        RodioSource::new(self.stream_handle.clone(), settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mixer::VolumeGroup;
    use std::time::Duration;

    // These tests need an audio device; they pass trivially without one.

    #[test]
    fn test_factory_creates_silent_source() {
        let Ok(mut factory) = RodioFactory::new() else { return };
        let settings = SourceSettings { mix_level: 0.5, group: VolumeGroup::Sfx };
        let source = factory.create(&settings).unwrap();

        assert!(!source.is_playing());
        assert!((source.volume() - 0.5).abs() < f32::EPSILON);
        factory.destroy(source);
    }

    #[test]
    fn test_undecodable_clip_does_not_play() {
        let Ok(mut factory) = RodioFactory::new() else { return };
        let settings = SourceSettings { mix_level: 1.0, group: VolumeGroup::Sfx };
        let mut source = factory.create(&settings).unwrap();

        source.play(&AudioClip::new("garbage", vec![0u8; 16], Duration::from_millis(10)));
        assert!(!source.is_playing());
        assert!(source.clip().is_some());
    }
}

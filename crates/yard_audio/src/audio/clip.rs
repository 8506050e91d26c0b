//! Audio clips
//!
//! A clip is the content reference handed to a playback source. Clips are
//! cheap to clone; the encoded bytes are shared.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Shared, immutable audio content
#[derive(Clone, PartialEq, Eq)]
pub struct AudioClip {
    name: Arc<str>,
    data: Arc<[u8]>,
    duration: Duration,
}

impl AudioClip {
    /// Create a clip from encoded bytes (WAV, OGG Vorbis, ...)
    pub fn new(name: impl Into<Arc<str>>, data: impl Into<Arc<[u8]>>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            duration,
        }
    }

    /// Create a clip with no audio data, only a length
    ///
    /// Useful with the simulated backend, which never decodes anything.
    pub fn silent(name: impl Into<Arc<str>>, duration: Duration) -> Self {
        Self::new(name, Vec::new(), duration)
    }

    /// Read a clip from disk
    pub fn from_file(path: impl AsRef<std::path::Path>, duration: Duration) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let name = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |stem| stem.to_string_lossy().into_owned());
        Ok(Self::new(name, data, duration))
    }

    /// Clip name, used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encoded audio bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Encoded audio bytes, shared with the clip
    pub fn shared_data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    /// Length of a single play-through
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .field("duration", &self.duration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_data() {
        let clip = AudioClip::new("horn", vec![1u8, 2, 3], Duration::from_secs(1));
        let copy = clip.clone();
        assert_eq!(copy, clip);
        assert_eq!(copy.data(), &[1, 2, 3]);
        assert_eq!(copy.name(), "horn");
    }

    #[test]
    fn test_debug_hides_bytes() {
        let clip = AudioClip::silent("beep", Duration::from_millis(80));
        let text = format!("{clip:?}");
        assert!(text.contains("beep"));
        assert!(text.contains("bytes: 0"));
    }

    #[test]
    fn test_from_file_uses_stem() {
        let path = std::env::temp_dir().join(format!("yard_audio_{}_drop.wav", std::process::id()));
        std::fs::write(&path, [0u8; 4]).unwrap();

        let clip = AudioClip::from_file(&path, Duration::from_millis(500)).unwrap();
        assert!(clip.name().ends_with("drop"));
        assert_eq!(clip.data().len(), 4);
        let _ = std::fs::remove_file(&path);
    }
}

//! Sample repository
//!
//! Holds decoded drum samples keyed by instrument and variant. Assets are
//! loaded from disk up front; a variant with no asset falls back to a
//! procedurally rendered sample, cached on first use. Lookups resolve in
//! order: exact variant, the instrument's default, then the fallback.

pub mod fallback;
mod variant;

pub use variant::{snap_detent, DrumParams, Instrument, DETENTS};

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::EngineError;

/// A decoded mono sample
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub data: Vec<f32>,
    pub sample_rate: u32,
}

impl SampleBuffer {
    /// Length in seconds
    pub fn duration_secs(&self) -> f32 {
        self.data.len() as f32 / self.sample_rate as f32
    }
}

/// Repository lookup key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleKey {
    pub instrument: Instrument,
    pub variant: String,
}

impl SampleKey {
    pub fn new(instrument: Instrument, variant: impl Into<String>) -> Self {
        Self {
            instrument,
            variant: variant.into(),
        }
    }
}

/// Drum sample store
pub struct SampleRepository {
    samples: HashMap<SampleKey, Arc<SampleBuffer>>,
    sample_rate: u32,
    /// Bumped whenever the sample set changes
    version: u64,
}

impl SampleRepository {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            samples: HashMap::new(),
            sample_rate,
            version: 0,
        }
    }

    /// Current version tag; changes whenever the sample set does
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of cached samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Load every `.wav` asset in `dir`
    ///
    /// Filenames follow `<instrument>.wav` for the default variant and
    /// `<instrument>-<variant>.wav` otherwise. A file that fails to read or
    /// decode is logged and skipped; the rest still load. Returns the
    /// number of samples loaded.
    pub async fn load_all(&mut self, dir: &Path) -> Result<usize, EngineError> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %dir.display(), %err, "sample directory unavailable");
                return Ok(0);
            }
        };

        let mut loaded = 0;
        while let Some(entry) = entries.next_entry().await.map_err(|source| {
            EngineError::SampleRead {
                path: dir.to_path_buf(),
                source,
            }
        })? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("wav") {
                continue;
            }

            let Some(key) = Self::key_from_path(&path) else {
                debug!(path = %path.display(), "skipping unrecognized sample filename");
                continue;
            };

            match Self::decode(&path).await {
                Ok(buffer) => {
                    debug!(
                        instrument = key.instrument.name(),
                        variant = %key.variant,
                        frames = buffer.data.len(),
                        "loaded sample"
                    );
                    self.samples.insert(key, Arc::new(buffer));
                    loaded += 1;
                }
                Err(err) => {
                    warn!(path = %path.display(), %err, "skipping unreadable sample");
                }
            }
        }

        if loaded > 0 {
            self.version += 1;
        }
        info!(loaded, dir = %dir.display(), "sample load complete");
        Ok(loaded)
    }

    /// Parse `<instrument>[-<variant>].wav` into a key
    fn key_from_path(path: &Path) -> Option<SampleKey> {
        let stem = path.file_stem()?.to_str()?;
        match stem.split_once('-') {
            Some((name, variant)) => {
                Instrument::from_name(name).map(|i| SampleKey::new(i, variant))
            }
            None => Instrument::from_name(stem).map(|i| SampleKey::new(i, "default")),
        }
    }

    /// Read and decode one wav file, mixing down to mono
    async fn decode(path: &Path) -> Result<SampleBuffer, EngineError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| EngineError::SampleRead {
                path: path.to_path_buf(),
                source,
            })?;

        let mut reader =
            hound::WavReader::new(Cursor::new(bytes)).map_err(|source| {
                EngineError::SampleDecode {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
        let spec = reader.spec();

        let mono: Result<Vec<f32>, hound::Error> = match spec.sample_format {
            hound::SampleFormat::Float => {
                let samples: Result<Vec<f32>, _> = reader.samples::<f32>().collect();
                samples.map(|s| mix_down(&s, spec.channels as usize))
            }
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                let samples: Result<Vec<f32>, _> = reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect();
                samples.map(|s| mix_down(&s, spec.channels as usize))
            }
        };

        let data = mono.map_err(|source| EngineError::SampleDecode {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(SampleBuffer {
            data,
            sample_rate: spec.sample_rate,
        })
    }

    /// Whether an exact sample exists for this key
    pub fn has_sample(&self, instrument: Instrument, variant: &str) -> bool {
        self.samples
            .contains_key(&SampleKey::new(instrument, variant))
    }

    /// Fetch an exact sample, if present
    pub fn get_sample(&self, instrument: Instrument, variant: &str) -> Option<Arc<SampleBuffer>> {
        self.samples
            .get(&SampleKey::new(instrument, variant))
            .cloned()
    }

    /// Resolve the sample to play for an instrument at the given knob state
    ///
    /// Order: the exact variant, the instrument's default asset, then a
    /// procedurally rendered fallback. Fallbacks are cached under the exact
    /// variant key so each is rendered once.
    pub fn resolve(&mut self, instrument: Instrument, params: &DrumParams) -> Arc<SampleBuffer> {
        let variant = params.variant_key(instrument);

        if let Some(sample) = self.get_sample(instrument, &variant) {
            return sample;
        }
        if let Some(sample) = self.get_sample(instrument, "default") {
            return sample;
        }

        self.generate_fallback(instrument, params)
    }

    /// Render a procedural sample and cache it under the exact variant key,
    /// so later lookups hit the cache transparently
    pub fn generate_fallback(
        &mut self,
        instrument: Instrument,
        params: &DrumParams,
    ) -> Arc<SampleBuffer> {
        let variant = params.variant_key(instrument);
        debug!(
            instrument = instrument.name(),
            variant = %variant,
            "rendering fallback sample"
        );
        let sample = Arc::new(fallback::generate(instrument, params, self.sample_rate));
        self.samples
            .insert(SampleKey::new(instrument, variant), sample.clone());
        self.version += 1;
        sample
    }
}

/// Average interleaved channels down to mono
fn mix_down(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SR: u32 = 44100;

    fn write_wav(dir: &Path, name: &str, frames: usize) -> PathBuf {
        let path = dir.join(name);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SR,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..frames {
            writer.write_sample((i as f32 / frames as f32) * 0.5).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_all_parses_filenames() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(dir.path(), "kick.wav", 100);
        write_wav(dir.path(), "kick-tune25-decay50.wav", 100);
        write_wav(dir.path(), "snare.wav", 100);
        write_wav(dir.path(), "notes.txt", 0);

        let mut repo = SampleRepository::new(SR);
        let loaded = repo.load_all(dir.path()).await.unwrap();

        assert_eq!(loaded, 3);
        assert!(repo.has_sample(Instrument::Kick, "default"));
        assert!(repo.has_sample(Instrument::Kick, "tune25-decay50"));
        assert!(repo.has_sample(Instrument::Snare, "default"));
    }

    #[tokio::test]
    async fn test_load_all_tolerates_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(dir.path(), "kick.wav", 100);
        std::fs::write(dir.path().join("clap.wav"), b"not a wav file").unwrap();

        let mut repo = SampleRepository::new(SR);
        let loaded = repo.load_all(dir.path()).await.unwrap();

        assert_eq!(loaded, 1);
        assert!(repo.has_sample(Instrument::Kick, "default"));
        assert!(!repo.has_sample(Instrument::Clap, "default"));
    }

    #[tokio::test]
    async fn test_load_all_missing_dir_is_empty_not_error() {
        let mut repo = SampleRepository::new(SR);
        let loaded = repo
            .load_all(Path::new("/nonexistent/samples"))
            .await
            .unwrap();
        assert_eq!(loaded, 0);
    }

    #[tokio::test]
    async fn test_resolve_prefers_exact_variant() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(dir.path(), "kick.wav", 50);
        write_wav(dir.path(), "kick-tune25-decay25.wav", 200);

        let mut repo = SampleRepository::new(SR);
        repo.load_all(dir.path()).await.unwrap();

        let params = DrumParams {
            tune: 0.4,
            decay: 0.4,
            ..DrumParams::default()
        };
        let sample = repo.resolve(Instrument::Kick, &params);
        assert_eq!(sample.data.len(), 200);
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(dir.path(), "kick.wav", 50);

        let mut repo = SampleRepository::new(SR);
        repo.load_all(dir.path()).await.unwrap();

        let params = DrumParams {
            tune: 1.0,
            decay: 1.0,
            ..DrumParams::default()
        };
        let sample = repo.resolve(Instrument::Kick, &params);
        assert_eq!(sample.data.len(), 50);
    }

    #[test]
    fn test_resolve_generates_and_caches_fallback() {
        let mut repo = SampleRepository::new(SR);
        let params = DrumParams::default();

        let v0 = repo.version();
        let first = repo.resolve(Instrument::Snare, &params);
        assert!(!first.data.is_empty());
        assert_eq!(repo.version(), v0 + 1);

        // Second resolve hits the cache
        let second = repo.resolve(Instrument::Snare, &params);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(repo.version(), v0 + 1);
    }

    #[test]
    fn test_generate_fallback_caches_under_variant_key() {
        let mut repo = SampleRepository::new(SR);
        let params = DrumParams {
            tune: 0.25,
            decay: 0.75,
            ..DrumParams::default()
        };

        let sample = repo.generate_fallback(Instrument::Kick, &params);
        assert!(!sample.data.is_empty());
        assert!(repo.has_sample(Instrument::Kick, &params.variant_key(Instrument::Kick)));
    }

    #[test]
    fn test_mix_down_stereo() {
        let stereo = [1.0, 0.0, 0.5, 0.5];
        assert_eq!(mix_down(&stereo, 2), vec![0.5, 0.5]);
    }

    #[tokio::test]
    async fn test_version_bumps_on_load() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(dir.path(), "kick.wav", 10);

        let mut repo = SampleRepository::new(SR);
        let v0 = repo.version();
        repo.load_all(dir.path()).await.unwrap();
        assert_eq!(repo.version(), v0 + 1);
    }
}

//! Model catalog and on-disk lifecycle: download, verify, import, migrate,
//! delete.
//!
//! Every artifact write goes through the same discipline: stream into a
//! `.tmp` file next to the final path, verify the size against the
//! descriptor, then delete-then-rename into place. A crash or cancelled
//! download can therefore never corrupt a previously valid artifact.
//!
//! Two tolerance bands are used on purpose. Routine presence checks use
//! the tight [`PRESENCE_TOLERANCE`] so a truncated file is not mistaken
//! for a model. Download completion uses the loose
//! [`COMPLETION_TOLERANCE`] because upstream size metadata drifts between
//! releases; a body that is a few percent off is still a valid model.
//! Zero bytes is never accepted by either.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use futures_util::StreamExt;

use crate::error::{Result, VoxkeyError};

const HF_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Relative size deviation accepted when checking whether a model is
/// already on disk.
pub const PRESENCE_TOLERANCE: f64 = 0.10;

/// Relative size deviation accepted when a download finishes.
pub const COMPLETION_TOLERANCE: f64 = 0.50;

/// Emit a progress update at most this often...
const PROGRESS_MIN_INTERVAL: Duration = Duration::from_millis(250);
/// ...unless the downloaded fraction moved at least this much.
const PROGRESS_MIN_DELTA: f64 = 0.01;

/// Relative quality of a model variant, for display ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QualityTier {
    Fastest,
    Balanced,
    Accurate,
}

/// The fixed set of supported whisper model variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    TinyEn,
    Tiny,
    BaseEn,
    Base,
    SmallEn,
    Small,
}

impl Model {
    pub const ALL: &'static [Model] = &[
        Model::TinyEn,
        Model::Tiny,
        Model::BaseEn,
        Model::Base,
        Model::SmallEn,
        Model::Small,
    ];

    /// Stable identifier used in config files and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            Model::TinyEn => "tiny.en",
            Model::Tiny => "tiny",
            Model::BaseEn => "base.en",
            Model::Base => "base",
            Model::SmallEn => "small.en",
            Model::Small => "small",
        }
    }

    pub fn from_id(id: &str) -> Result<Model> {
        Model::ALL
            .iter()
            .copied()
            .find(|m| m.id() == id)
            .ok_or_else(|| VoxkeyError::UnknownModel(id.to_string()))
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Model::TinyEn => "Tiny (English)",
            Model::Tiny => "Tiny (Multilingual)",
            Model::BaseEn => "Base (English)",
            Model::Base => "Base (Multilingual)",
            Model::SmallEn => "Small (English)",
            Model::Small => "Small (Multilingual)",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Model::TinyEn => "ggml-tiny.en.bin",
            Model::Tiny => "ggml-tiny.bin",
            Model::BaseEn => "ggml-base.en.bin",
            Model::Base => "ggml-base.bin",
            Model::SmallEn => "ggml-small.en.bin",
            Model::Small => "ggml-small.bin",
        }
    }

    /// Expected artifact size in bytes, used for integrity and
    /// download-completion checks.
    pub fn size_bytes(self) -> u64 {
        match self {
            Model::TinyEn => 77_704_715,
            Model::Tiny => 77_691_713,
            Model::BaseEn => 147_964_211,
            Model::Base => 147_951_465,
            Model::SmallEn => 487_614_201,
            Model::Small => 487_601_967,
        }
    }

    pub fn url(self) -> String {
        format!("{HF_BASE_URL}/{}", self.file_name())
    }

    pub fn tier(self) -> QualityTier {
        match self {
            Model::TinyEn | Model::Tiny => QualityTier::Fastest,
            Model::BaseEn | Model::Base => QualityTier::Balanced,
            Model::SmallEn | Model::Small => QualityTier::Accurate,
        }
    }

    /// The default suggestion for new installs.
    pub fn recommended(self) -> bool {
        matches!(self, Model::BaseEn)
    }

    pub fn english_only(self) -> bool {
        matches!(self, Model::TinyEn | Model::BaseEn | Model::SmallEn)
    }
}

/// Snapshot of an in-flight download, passed to progress callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    /// Completed fraction in [0, 1]; 0 when the total is unknown.
    pub fraction: f64,
    pub bytes_done: u64,
    pub bytes_total: u64,
    /// Cumulative average, not an instantaneous delta, so it does not
    /// jitter on a progress bar.
    pub bytes_per_sec: f64,
    pub eta: Duration,
}

/// Derived state of one model artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelState {
    NotPresent,
    Downloading(DownloadProgress),
    Present,
    Corrupt(String),
}

/// Progress callback for model downloads and imports.
pub type ProgressCallback = Box<dyn Fn(DownloadProgress) + Send>;

/// Owns the models directory. The only component that reads or writes
/// model files.
pub struct ModelManager {
    models_dir: PathBuf,
    client: reqwest::Client,
    /// Progress of downloads currently in flight, keyed by model, so
    /// `state` can report `Downloading` while the stream runs.
    in_flight: Mutex<HashMap<Model, DownloadProgress>>,
}

impl ModelManager {
    pub fn new(models_dir: PathBuf) -> Self {
        Self {
            models_dir,
            client: reqwest::Client::new(),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn model_path(&self, model: Model) -> PathBuf {
        self.models_dir.join(model.file_name())
    }

    fn temp_path(&self, model: Model) -> PathBuf {
        self.models_dir.join(format!("{}.tmp", model.file_name()))
    }

    /// True iff the artifact exists and its size sits inside the tight
    /// presence band around the descriptor's expected size.
    pub fn is_downloaded(&self, model: Model) -> bool {
        matches!(self.state(model), ModelState::Present)
    }

    /// Derived state of the artifact.
    pub fn state(&self, model: Model) -> ModelState {
        if let Some(progress) = self.in_flight.lock().unwrap().get(&model) {
            return ModelState::Downloading(progress.clone());
        }
        let path = self.model_path(model);
        let Ok(meta) = fs::metadata(&path) else {
            return ModelState::NotPresent;
        };
        let actual = meta.len();
        if within_tolerance(model.size_bytes(), actual, PRESENCE_TOLERANCE) {
            ModelState::Present
        } else {
            ModelState::Corrupt(size_mismatch_detail(model, actual, PRESENCE_TOLERANCE))
        }
    }

    pub fn downloaded_models(&self) -> Vec<Model> {
        Model::ALL
            .iter()
            .copied()
            .filter(|&m| self.is_downloaded(m))
            .collect()
    }

    /// Download a model from its descriptor URL. See [`download_from`].
    ///
    /// [`download_from`]: ModelManager::download_from
    pub async fn download(
        &self,
        model: Model,
        on_progress: Option<ProgressCallback>,
    ) -> Result<PathBuf> {
        self.download_from(model, &model.url(), on_progress).await
    }

    /// Stream `url` into the model's artifact location.
    ///
    /// The body lands in `<file>.tmp`; on completion the size is checked
    /// against the descriptor within [`COMPLETION_TOLERANCE`] and the temp
    /// file is renamed into place (deleting any previous artifact first).
    /// Any failure removes the temp file and leaves the final path
    /// exactly as it was.
    pub async fn download_from(
        &self,
        model: Model,
        url: &str,
        on_progress: Option<ProgressCallback>,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.models_dir)?;

        let final_path = self.model_path(model);
        let temp_path = self.temp_path(model);

        tracing::info!(model = model.id(), url, "starting model download");

        self.in_flight
            .lock()
            .unwrap()
            .insert(model, make_progress(0, model.size_bytes(), Instant::now()));

        // Dropping this future (caller-side cancellation) must not strand
        // a Downloading entry or a half-written temp file; the guard's
        // Drop restores both on every exit path, including cancellation.
        let _guard = DownloadGuard {
            manager: self,
            model,
            temp_path: temp_path.clone(),
        };

        let bytes_written = self
            .stream_to_temp(model, url, &temp_path, on_progress)
            .await?;

        if !within_tolerance(model.size_bytes(), bytes_written, COMPLETION_TOLERANCE) {
            return Err(VoxkeyError::ModelCorrupt {
                model: model.id(),
                detail: format!(
                    "{} (source: {url})",
                    size_mismatch_detail(model, bytes_written, COMPLETION_TOLERANCE)
                ),
            });
        }

        install_artifact(&temp_path, &final_path)?;

        tracing::info!(
            model = model.id(),
            bytes = bytes_written,
            path = %final_path.display(),
            "model download complete"
        );
        Ok(final_path)
    }

    async fn stream_to_temp(
        &self,
        model: Model,
        url: &str,
        temp_path: &Path,
        on_progress: Option<ProgressCallback>,
    ) -> Result<u64> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(VoxkeyError::Download(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }

        let total = response.content_length().unwrap_or(model.size_bytes());
        let mut file = fs::File::create(temp_path)?;
        let mut stream = response.bytes_stream();

        let started = Instant::now();
        let mut downloaded: u64 = 0;
        let mut last_emit = Instant::now();
        let mut last_fraction = 0.0f64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;

            let fraction = if total > 0 {
                downloaded as f64 / total as f64
            } else {
                0.0
            };
            // Throttled: a progress bar has no use for per-chunk
            // sub-percent updates.
            if last_emit.elapsed() >= PROGRESS_MIN_INTERVAL
                || fraction - last_fraction >= PROGRESS_MIN_DELTA
            {
                let progress = make_progress(downloaded, total, started);
                self.in_flight
                    .lock()
                    .unwrap()
                    .insert(model, progress.clone());
                if let Some(ref callback) = on_progress {
                    callback(progress);
                }
                last_emit = Instant::now();
                last_fraction = fraction;
            }
        }

        file.flush()?;
        drop(file);

        if let Some(ref callback) = on_progress {
            callback(make_progress(downloaded, total, started));
        }

        Ok(downloaded)
    }

    /// Remove the artifact if present. Idempotent: the model ends up
    /// `NotPresent` whether or not a file existed.
    pub fn delete(&self, model: Model) -> Result<()> {
        let path = self.model_path(model);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(model = model.id(), "model deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Copy a model shipped with the application package into the models
    /// directory. Returns `false` without touching anything when the
    /// bundled asset does not exist (bundling is optional); other I/O
    /// failures propagate.
    pub fn extract_bundled(&self, model: Model, assets_dir: &Path) -> Result<bool> {
        let source = assets_dir.join(model.file_name());
        if !source.exists() {
            return Ok(false);
        }
        if self.is_downloaded(model) {
            return Ok(false);
        }

        fs::create_dir_all(&self.models_dir)?;
        let temp_path = self.temp_path(model);
        if let Err(e) = fs::copy(&source, &temp_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        install_artifact(&temp_path, &self.model_path(model))?;

        tracing::info!(model = model.id(), from = %source.display(), "extracted bundled model");
        Ok(true)
    }

    /// Install a user-selected file as this model's artifact, with the
    /// same temp/verify/rename discipline as a download.
    pub fn import_from_file(&self, model: Model, source: &Path) -> Result<PathBuf> {
        if !source.exists() {
            return Err(VoxkeyError::FileNotFound(source.to_path_buf()));
        }

        fs::create_dir_all(&self.models_dir)?;
        let temp_path = self.temp_path(model);
        let final_path = self.model_path(model);

        let copied = match fs::copy(source, &temp_path) {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                return Err(e.into());
            }
        };

        if !within_tolerance(model.size_bytes(), copied, COMPLETION_TOLERANCE) {
            let _ = fs::remove_file(&temp_path);
            return Err(VoxkeyError::ModelCorrupt {
                model: model.id(),
                detail: format!(
                    "{} (source: {})",
                    size_mismatch_detail(model, copied, COMPLETION_TOLERANCE),
                    source.display()
                ),
            });
        }

        install_artifact(&temp_path, &final_path)?;
        tracing::info!(model = model.id(), from = %source.display(), "imported model file");
        Ok(final_path)
    }

    /// Move models from a previous storage location into the current one.
    ///
    /// Runs copy → verify byte length → delete original, one model at a
    /// time; the source is never removed before the destination copy is
    /// proven length-equal. Safe to call on every startup — it no-ops
    /// when there is nothing to migrate. Returns how many models moved.
    pub fn migrate_from(&self, legacy_dir: &Path) -> Result<usize> {
        if legacy_dir == self.models_dir || !legacy_dir.is_dir() {
            return Ok(0);
        }

        let mut migrated = 0;
        for &model in Model::ALL {
            let source = legacy_dir.join(model.file_name());
            let destination = self.model_path(model);
            if !source.exists() || destination.exists() {
                continue;
            }

            fs::create_dir_all(&self.models_dir)?;
            let temp_path = self.temp_path(model);
            let source_len = fs::metadata(&source)?.len();

            let copied = match fs::copy(&source, &temp_path) {
                Ok(n) => n,
                Err(e) => {
                    let _ = fs::remove_file(&temp_path);
                    return Err(e.into());
                }
            };
            if copied != source_len {
                let _ = fs::remove_file(&temp_path);
                return Err(VoxkeyError::Download(format!(
                    "migration copy of {} was {} bytes, expected {}",
                    model.file_name(),
                    copied,
                    source_len
                )));
            }

            install_artifact(&temp_path, &destination)?;
            fs::remove_file(&source)?;
            migrated += 1;
            tracing::info!(model = model.id(), "migrated model to new storage location");
        }

        Ok(migrated)
    }

    /// Total bytes of everything in the models directory, temp files
    /// included. Settings-screen display only, so no caching.
    pub fn total_storage_used(&self) -> u64 {
        let Ok(entries) = fs::read_dir(&self.models_dir) else {
            return 0;
        };
        entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.metadata().ok())
            .filter(|m| m.is_file())
            .map(|m| m.len())
            .sum()
    }
}

/// Cleanup that must happen however a download ends — success, failure,
/// or the future being dropped mid-stream: forget the in-flight entry so
/// `state` falls back to the on-disk truth, and drop the temp file (a
/// no-op once `install_artifact` has renamed it away).
struct DownloadGuard<'a> {
    manager: &'a ModelManager,
    model: Model,
    temp_path: PathBuf,
}

impl Drop for DownloadGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.manager.in_flight.lock() {
            in_flight.remove(&self.model);
        }
        let _ = fs::remove_file(&self.temp_path);
    }
}

/// Whether `actual` lies within `tolerance` (relative) of `expected`.
/// A zero-byte file never passes.
fn within_tolerance(expected: u64, actual: u64, tolerance: f64) -> bool {
    if actual == 0 {
        return false;
    }
    let deviation = (actual as f64 - expected as f64).abs();
    deviation <= expected as f64 * tolerance
}

/// Replace whatever is at `final_path` with the verified temp file.
/// Delete-then-rename rather than an in-place overwrite, so a reader can
/// never observe a partially written artifact.
fn install_artifact(temp_path: &Path, final_path: &Path) -> Result<()> {
    if final_path.exists() {
        fs::remove_file(final_path)?;
    }
    fs::rename(temp_path, final_path)?;
    Ok(())
}

fn make_progress(downloaded: u64, total: u64, started: Instant) -> DownloadProgress {
    let elapsed = started.elapsed().as_secs_f64();
    let bytes_per_sec = if elapsed > 0.0 {
        downloaded as f64 / elapsed
    } else {
        0.0
    };
    let remaining = total.saturating_sub(downloaded);
    let eta = if bytes_per_sec > 0.0 {
        Duration::from_secs_f64(remaining as f64 / bytes_per_sec)
    } else {
        Duration::ZERO
    };
    DownloadProgress {
        fraction: if total > 0 {
            (downloaded as f64 / total as f64).min(1.0)
        } else {
            0.0
        },
        bytes_done: downloaded,
        bytes_total: total,
        bytes_per_sec,
        eta,
    }
}

fn size_mismatch_detail(model: Model, actual: u64, tolerance: f64) -> String {
    format!(
        "size {} outside ±{:.0}% of expected {} ({} vs {} bytes)",
        format_bytes(actual),
        tolerance * 100.0,
        format_bytes(model.size_bytes()),
        actual,
        model.size_bytes()
    )
}

/// Human-readable byte count, e.g. "147.9 MB".
pub fn format_bytes(bytes: u64) -> String {
    const MB: f64 = 1_000_000.0;
    if bytes as f64 >= MB {
        format!("{:.1} MB", bytes as f64 / MB)
    } else {
        format!("{:.1} kB", bytes as f64 / 1_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (tempfile::TempDir, ModelManager) {
        let dir = tempfile::tempdir().unwrap();
        let mgr = ModelManager::new(dir.path().join("models"));
        (dir, mgr)
    }

    /// Write a fake artifact of `len` bytes directly at the final path.
    fn plant_artifact(mgr: &ModelManager, model: Model, len: usize) {
        fs::create_dir_all(mgr.models_dir()).unwrap();
        fs::write(mgr.model_path(model), vec![0u8; len]).unwrap();
    }

    #[test]
    fn tolerance_band_edges() {
        assert!(within_tolerance(1000, 1000, 0.10));
        assert!(within_tolerance(1000, 905, 0.10));
        assert!(within_tolerance(1000, 1100, 0.10));
        assert!(!within_tolerance(1000, 880, 0.10));
        assert!(!within_tolerance(1000, 1150, 0.10));
        // Zero bytes never passes, however loose the band
        assert!(!within_tolerance(1000, 0, 0.50));
        assert!(!within_tolerance(1000, 0, 10.0));
    }

    #[test]
    fn presence_and_completion_bands_differ() {
        // 5% short: complete enough to install, and still present
        assert!(within_tolerance(1000, 950, COMPLETION_TOLERANCE));
        assert!(within_tolerance(1000, 950, PRESENCE_TOLERANCE));
        // 20% short: installable at completion time, but a presence check
        // flags it — the two bands disagree by design
        assert!(within_tolerance(1000, 800, COMPLETION_TOLERANCE));
        assert!(!within_tolerance(1000, 800, PRESENCE_TOLERANCE));
        // 60% short: rejected everywhere
        assert!(!within_tolerance(1000, 400, COMPLETION_TOLERANCE));
    }

    #[test]
    fn model_catalog_is_consistent() {
        for &model in Model::ALL {
            assert_eq!(Model::from_id(model.id()).unwrap(), model);
            assert!(model.url().ends_with(model.file_name()));
            assert!(model.size_bytes() > 0);
        }
        assert!(Model::from_id("gigantic").is_err());
        assert_eq!(Model::ALL.iter().filter(|m| m.recommended()).count(), 1);
    }

    #[test]
    fn state_of_absent_model() {
        let (_dir, mgr) = manager();
        assert_eq!(mgr.state(Model::Tiny), ModelState::NotPresent);
        assert!(!mgr.is_downloaded(Model::Tiny));
    }

    #[test]
    fn state_of_truncated_model_is_corrupt() {
        let (_dir, mgr) = manager();
        plant_artifact(&mgr, Model::Tiny, 1024);
        assert!(matches!(mgr.state(Model::Tiny), ModelState::Corrupt(_)));
        assert!(!mgr.is_downloaded(Model::Tiny));
    }

    #[test]
    fn delete_is_idempotent() {
        let (_dir, mgr) = manager();
        plant_artifact(&mgr, Model::Tiny, 64);
        mgr.delete(Model::Tiny).unwrap();
        assert_eq!(mgr.state(Model::Tiny), ModelState::NotPresent);
        // Second delete with nothing on disk is still fine
        mgr.delete(Model::Tiny).unwrap();
        assert_eq!(mgr.state(Model::Tiny), ModelState::NotPresent);
    }

    #[test]
    fn import_rejects_undersized_file_and_cleans_up() {
        let (dir, mgr) = manager();
        let source = dir.path().join("stray.bin");
        fs::write(&source, vec![1u8; 100]).unwrap();

        let err = mgr.import_from_file(Model::Tiny, &source).unwrap_err();
        assert!(matches!(err, VoxkeyError::ModelCorrupt { .. }));
        assert!(!mgr.model_path(Model::Tiny).exists());
        assert!(!mgr.models_dir().join("ggml-tiny.bin.tmp").exists());
    }

    #[test]
    fn import_missing_source_is_not_found() {
        let (dir, mgr) = manager();
        let err = mgr
            .import_from_file(Model::Tiny, &dir.path().join("absent.bin"))
            .unwrap_err();
        assert!(matches!(err, VoxkeyError::FileNotFound(_)));
    }

    #[test]
    fn extract_bundled_noops_without_asset() {
        let (dir, mgr) = manager();
        let assets = dir.path().join("assets");
        fs::create_dir_all(&assets).unwrap();
        assert!(!mgr.extract_bundled(Model::Tiny, &assets).unwrap());
        assert_eq!(mgr.state(Model::Tiny), ModelState::NotPresent);
    }

    #[test]
    fn extract_bundled_installs_asset() {
        let (dir, mgr) = manager();
        let assets = dir.path().join("assets");
        fs::create_dir_all(&assets).unwrap();
        fs::write(assets.join(Model::Tiny.file_name()), vec![7u8; 2048]).unwrap();

        assert!(mgr.extract_bundled(Model::Tiny, &assets).unwrap());
        assert!(mgr.model_path(Model::Tiny).exists());
    }

    #[test]
    fn migration_moves_and_verifies() {
        let (dir, mgr) = manager();
        let legacy = dir.path().join("legacy");
        fs::create_dir_all(&legacy).unwrap();
        fs::write(legacy.join(Model::Tiny.file_name()), vec![3u8; 4096]).unwrap();

        let moved = mgr.migrate_from(&legacy).unwrap();
        assert_eq!(moved, 1);
        assert!(mgr.model_path(Model::Tiny).exists());
        assert!(!legacy.join(Model::Tiny.file_name()).exists());

        // Second run has nothing left to do
        assert_eq!(mgr.migrate_from(&legacy).unwrap(), 0);
    }

    #[test]
    fn migration_skips_models_already_present() {
        let (dir, mgr) = manager();
        plant_artifact(&mgr, Model::Tiny, 500);
        let legacy = dir.path().join("legacy");
        fs::create_dir_all(&legacy).unwrap();
        fs::write(legacy.join(Model::Tiny.file_name()), vec![3u8; 4096]).unwrap();

        assert_eq!(mgr.migrate_from(&legacy).unwrap(), 0);
        // Source untouched, destination untouched
        assert!(legacy.join(Model::Tiny.file_name()).exists());
        assert_eq!(fs::metadata(mgr.model_path(Model::Tiny)).unwrap().len(), 500);
    }

    #[test]
    fn storage_used_sums_all_files() {
        let (_dir, mgr) = manager();
        assert_eq!(mgr.total_storage_used(), 0);
        plant_artifact(&mgr, Model::Tiny, 100);
        plant_artifact(&mgr, Model::Base, 250);
        assert_eq!(mgr.total_storage_used(), 350);
    }

    #[test]
    fn format_bytes_is_human_readable() {
        assert_eq!(format_bytes(147_951_465), "148.0 MB");
        assert_eq!(format_bytes(5_000), "5.0 kB");
    }

    #[test]
    fn install_replaces_previous_artifact_atomically() {
        let (_dir, mgr) = manager();
        plant_artifact(&mgr, Model::Tiny, 100);
        let tmp = mgr.models_dir().join("ggml-tiny.bin.tmp");
        fs::write(&tmp, vec![9u8; 300]).unwrap();

        install_artifact(&tmp, &mgr.model_path(Model::Tiny)).unwrap();
        assert_eq!(fs::metadata(mgr.model_path(Model::Tiny)).unwrap().len(), 300);
        assert!(!tmp.exists());
    }
}

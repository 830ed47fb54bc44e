//! Metadata-keyed demonstration store.
//!
//! The store is an append-only cache of demonstration files under a single
//! root, addressed by keys derived from metadata (see [`key`]). Retrieval
//! falls back from the exact key to canonical-frequency and lightweight
//! variants, rebuilding the requested representation by decimation and
//! replay, and caches everything it rebuilds before serving it.

pub mod fetch;
pub mod key;

use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::convert::{decimate, replay_in_env};
use crate::demo::file::DEMO_SUFFIX;
use crate::demo::{Demo, Metadata, ObservationMode};
use crate::env::{EnvRegistry, CONTROL_FREQUENCY_MAX};
use crate::error::StoreError;

pub use fetch::ArchiveFetcher;

/// Version of the published demonstration set this build reads and writes.
pub const DEMO_VERSION: &str = "0.9.0";

const DEMOS_SUBDIR: &str = "demonstrations";
const LOCK_FILE: &str = ".lock";

/// Local cache of demonstrations keyed by metadata.
pub struct DemoStore {
    cache_path: PathBuf,
    registry: EnvRegistry,
    fetcher: Option<ArchiveFetcher>,
}

impl DemoStore {
    /// Open (or create) a store under `cache_root`. Demonstrations live in a
    /// versioned subdirectory, so incompatible releases never mix.
    pub fn new(cache_root: impl Into<PathBuf>, registry: EnvRegistry) -> Result<Self, StoreError> {
        let cache_path = cache_root.into().join(DEMOS_SUBDIR).join(DEMO_VERSION);
        fs::create_dir_all(&cache_path)?;
        Ok(Self {
            cache_path,
            registry,
            fetcher: None,
        })
    }

    /// Attach a remote archive source consulted once, lazily, on first
    /// retrieval.
    pub fn with_fetcher(mut self, fetcher: ArchiveFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn registry(&self) -> &EnvRegistry {
        &self.registry
    }

    /// Directory holding all demonstrations matching `metadata` at
    /// `frequency` (`None` for the canonical recording frequency).
    pub fn demo_dir(
        &self,
        metadata: &Metadata,
        frequency: Option<u32>,
    ) -> Result<PathBuf, StoreError> {
        let default_robot = self
            .registry
            .default_robot(&metadata.environment_data.env_name)?;
        Ok(key::demo_dir(
            &self.cache_path,
            metadata,
            frequency,
            default_robot,
        ))
    }

    /// Path of the single demonstration file addressed by `metadata`.
    pub fn demo_path(
        &self,
        metadata: &Metadata,
        frequency: Option<u32>,
    ) -> Result<PathBuf, StoreError> {
        let default_robot = self
            .registry
            .default_robot(&metadata.environment_data.env_name)?;
        Ok(key::demo_path(
            &self.cache_path,
            metadata,
            frequency,
            default_robot,
        ))
    }

    /// Whether the demonstration addressed by `metadata` is cached. Never
    /// mutates the store or contacts the remote archive.
    pub fn demo_exists(
        &self,
        metadata: &Metadata,
        frequency: Option<u32>,
    ) -> Result<bool, StoreError> {
        Ok(self.demo_path(metadata, frequency)?.exists())
    }

    /// Whether a lightweight variant of the demonstration is cached. Pure,
    /// like [`DemoStore::demo_exists`].
    pub fn light_demo_exists(
        &self,
        metadata: &Metadata,
        frequency: Option<u32>,
    ) -> Result<bool, StoreError> {
        self.demo_exists(
            &metadata.with_observation_mode(ObservationMode::Lightweight),
            frequency,
        )
    }

    /// Add a demonstration to the cache.
    ///
    /// Caching a full demonstration at the canonical frequency also caches
    /// its lightweight variant, so the raw actions survive even if the full
    /// file is later regenerated differently. Re-caching an already present
    /// demonstration is a no-op: cached files are never overwritten.
    pub fn cache_demo(&self, demo: &Demo, frequency: Option<u32>) -> Result<(), StoreError> {
        let frequency = key::normalize_frequency(frequency);
        if !demo.is_lightweight()
            && frequency.is_none()
            && !self.light_demo_exists(demo.metadata(), None)?
        {
            self.cache_demo(&demo.lighten(), None)?;
        }
        if self.demo_exists(demo.metadata(), frequency)? {
            debug!(uuid = demo.uuid(), "demonstration already cached");
            return Ok(());
        }
        let path = self.demo_path(demo.metadata(), frequency)?;
        demo.save(&path)?;
        debug!(uuid = demo.uuid(), path = %path.display(), "cached demonstration");
        Ok(())
    }

    /// Retrieve up to `amount` demonstrations matching `metadata` at
    /// `frequency` (`None` returns all available).
    ///
    /// When the exact key is not fully populated, the store falls back to
    /// the canonical-frequency cache, then to the lightweight cache, and
    /// rebuilds the requested representation by decimation and replay. All
    /// rebuilt demonstrations are cached before being served, so the next
    /// identical request is a pure cache hit.
    pub fn get_demos(
        &self,
        metadata: &Metadata,
        amount: Option<usize>,
        frequency: u32,
    ) -> Result<Vec<Demo>, StoreError> {
        if amount == Some(0) {
            return Ok(Vec::new());
        }
        self.ensure_cached()?;

        let freq = key::normalize_frequency(Some(frequency));
        let light_metadata = metadata.with_observation_mode(ObservationMode::Lightweight);
        let light_dir = self.demo_dir(&light_metadata, None)?;
        let demos_dir = self.demo_dir(metadata, freq)?;

        // The lightweight cache holds one file per recorded episode, so a
        // matching count means the requested key is fully backfilled
        if count_demo_files(&demos_dir) == count_demo_files(&light_dir) {
            let demos = self.collect_dir(&demos_dir, amount)?;
            if !demos.is_empty() {
                return Ok(demos);
            }
        }

        let mut sources = self.collect_dir(&self.demo_dir(metadata, None)?, None)?;
        if sources.is_empty() && metadata.observation_mode != ObservationMode::Lightweight {
            sources = self.collect_dir(&light_dir, None)?;
        }
        if sources.is_empty() {
            return Err(StoreError::NotFound(
                demos_dir
                    .strip_prefix(&self.cache_path)
                    .unwrap_or(&demos_dir)
                    .display()
                    .to_string(),
            ));
        }

        info!(
            count = sources.len(),
            frequency, "rebuilding demonstrations from fallback cache"
        );
        let robot = self
            .registry
            .robot(&metadata.environment_data.robot_name)?
            .clone();
        let mut env = if metadata.observation_mode != ObservationMode::Lightweight {
            Some(self.registry.build_env(
                &metadata.environment_data.env_name,
                &metadata.environment_data.robot_name,
                metadata.environment_data.action_mode.clone(),
                metadata.environment_data.cameras.clone(),
                frequency,
            )?)
        } else {
            None
        };

        for source in &sources {
            let mut rebuilt = decimate(source, frequency, CONTROL_FREQUENCY_MAX, &robot)?;
            if let Some(env) = env.as_deref_mut() {
                rebuilt = replay_in_env(&rebuilt, env)?;
            }
            self.cache_demo(&rebuilt, freq)?;
        }
        self.collect_dir(&demos_dir, amount)
    }

    /// Paths of every cached demonstration matching `metadata` at the
    /// canonical frequency.
    pub fn list_demo_paths(&self, metadata: &Metadata) -> Result<Vec<PathBuf>, StoreError> {
        self.ensure_cached()?;
        let dir = self.demo_dir(metadata, None)?;
        if !dir.exists() {
            warn!(dir = %dir.display(), "no demonstrations cached under key");
            return Ok(Vec::new());
        }
        demo_files(&dir).map_err(StoreError::from)
    }

    fn collect_dir(&self, dir: &Path, amount: Option<usize>) -> Result<Vec<Demo>, StoreError> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut files = demo_files(dir)?;
        if let Some(requested) = amount {
            if requested > files.len() {
                return Err(StoreError::OverRequested {
                    requested,
                    found: files.len(),
                });
            }
        }
        files.shuffle(&mut rand::rng());
        if let Some(requested) = amount {
            files.truncate(requested);
        }
        files
            .iter()
            .map(|path| Demo::load(path).map_err(StoreError::from))
            .collect()
    }

    /// Populate the cache from the remote archive once. A failed download
    /// degrades to serving the local cache; a corrupt archive is an error.
    fn ensure_cached(&self) -> Result<(), StoreError> {
        let Some(fetcher) = &self.fetcher else {
            return Ok(());
        };
        let lock = self.cache_path.join(LOCK_FILE);
        if lock.exists() {
            return Ok(());
        }
        match fetcher.fetch_into(&self.cache_path) {
            Ok(()) => {
                fs::File::create(&lock)?;
                Ok(())
            }
            Err(StoreError::FetchFailed(message)) => {
                warn!(
                    error = message.as_str(),
                    "archive fetch failed; serving local cache only"
                );
                Ok(())
            }
            Err(other) => Err(other),
        }
    }
}

fn demo_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(DEMO_SUFFIX))
        .collect();
    files.sort();
    Ok(files)
}

fn count_demo_files(dir: &Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    demo_files(dir).map(|files| files.len()).unwrap_or(0)
}

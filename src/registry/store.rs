//! Snapshot publication and periodic refresh.
//!
//! Readers take an `Arc` to the current snapshot and keep using it for as long
//! as they like; publication swaps the whole `Arc` under a short write lock.
//! Nobody ever observes a partially updated registry.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{AppError, MappingError};
use crate::registry::file::read_registry_json;
use crate::registry::snapshot::RegistrySnapshot;

/// How often a `RefreshingRegistry` looks for a newer snapshot by default.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Atomically swappable registry.
#[derive(Debug)]
pub struct ModelRegistry {
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(RegistrySnapshot::empty())
    }
}

impl ModelRegistry {
    pub fn new(snapshot: RegistrySnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot in effect right now.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        // A poisoned lock still holds a complete snapshot; the swap is a single assignment.
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn version(&self) -> u64 {
        self.snapshot().version
    }

    /// Replace the current snapshot. Versions must strictly increase.
    pub fn publish(&self, snapshot: RegistrySnapshot) -> Result<u64, MappingError> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        if snapshot.version <= guard.version {
            return Err(MappingError::StaleSnapshot {
                current: guard.version,
                offered: snapshot.version,
            });
        }
        let version = snapshot.version;
        *guard = Arc::new(snapshot);
        info!(version, "registry snapshot published");
        Ok(version)
    }
}

/// Where snapshots come from.
pub trait SnapshotSource: Send + Sync {
    fn load(&self) -> Result<RegistrySnapshot, AppError>;
}

/// A registry JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for JsonFileSource {
    fn load(&self) -> Result<RegistrySnapshot, AppError> {
        read_registry_json(&self.path)
    }
}

/// A registry that reloads from its source at most once per interval.
///
/// Loading happens only in `refresh`/`refresh_if_due`, never on the
/// conversion path. A failed reload keeps the previous snapshot.
pub struct RefreshingRegistry<S: SnapshotSource> {
    source: S,
    registry: ModelRegistry,
    interval: Duration,
    last_check: Mutex<Option<Instant>>,
}

impl<S: SnapshotSource> RefreshingRegistry<S> {
    /// Start empty; the first `refresh_if_due` loads.
    pub fn new(source: S, interval: Duration) -> Self {
        Self {
            source,
            registry: ModelRegistry::default(),
            interval,
            last_check: Mutex::new(None),
        }
    }

    /// Load once up front and fail if that load fails.
    pub fn open(source: S, interval: Duration) -> Result<Self, AppError> {
        let this = Self::new(source, interval);
        this.refresh()?;
        *this.last_check.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
        Ok(this)
    }

    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.registry.snapshot()
    }

    /// Load from the source and publish if newer. Returns whether a new
    /// snapshot was published.
    pub fn refresh(&self) -> Result<bool, AppError> {
        let loaded = self.source.load()?;
        let current = self.registry.version();
        if loaded.version == current {
            debug!(version = current, "registry unchanged");
            return Ok(false);
        }
        self.registry.publish(loaded)?;
        Ok(true)
    }

    /// Refresh if the interval has elapsed since the last attempt.
    ///
    /// Failures are logged and the old snapshot stays in effect.
    pub fn refresh_if_due(&self) -> bool {
        {
            let mut last = self.last_check.lock().unwrap_or_else(|e| e.into_inner());
            let now = Instant::now();
            if let Some(t) = *last {
                if now.duration_since(t) < self.interval {
                    return false;
                }
            }
            *last = Some(now);
        }

        match self.refresh() {
            Ok(published) => published,
            Err(err) => {
                warn!(error = %err, version = self.registry.version(), "registry refresh failed, keeping current snapshot");
                false
            }
        }
    }
}

//! In-memory hazard registry.
//!
//! Plays the part of the hazard store that feeds the engines: it creates
//! hazard records from worker reports and sensor readings, answers the usual
//! listing queries and serializes status changes per hazard.

use crate::error::RegistryError;
use chrono::{DateTime, Utc};
use mineguard_core::detection::detect_hazard;
use mineguard_core::{Hazard, HazardStatus, HazardType, Location, Sector, SensorReading, Severity};
use mineguard_env::HazardId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Default number of hazards returned by [`HazardRegistry::all`].
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Default half-width of the box searched by [`HazardRegistry::near`].
pub const DEFAULT_NEAR_RADIUS: f64 = 0.01;

/// Default number of readings returned by [`HazardRegistry::recent_readings`].
pub const DEFAULT_READINGS_LIMIT: usize = 100;

/// Readings kept in the sensor log before the oldest are dropped.
const READING_LOG_CAPACITY: usize = 1000;

/// A manual hazard report from a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardReport {
    #[serde(rename = "type", default)]
    pub hazard_type: Option<HazardType>,
    #[serde(default)]
    pub severity: Option<Severity>,
    pub location: Location,
    #[serde(default)]
    pub worker: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl HazardReport {
    pub fn new(hazard_type: impl Into<HazardType>, location: Location, worker: impl Into<String>) -> Self {
        Self {
            hazard_type: Some(hazard_type.into()),
            severity: None,
            location,
            worker: Some(worker.into()),
            description: String::new(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn validate(&self) -> Result<(HazardType, &str), RegistryError> {
        let hazard_type = match &self.hazard_type {
            Some(t) if !t.label().trim().is_empty() => t.clone(),
            _ => return Err(RegistryError::InvalidReport("missing hazard type".into())),
        };
        let worker = match self.worker.as_deref() {
            Some(w) if !w.trim().is_empty() => w,
            _ => return Err(RegistryError::InvalidReport("missing reporter id".into())),
        };
        Ok((hazard_type, worker))
    }
}

/// Result of a status update.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub hazard: Hazard,
    pub previous: HazardStatus,
}

impl StatusChange {
    /// False when the hazard already had the requested status.
    pub fn changed(&self) -> bool {
        self.previous != self.hazard.status()
    }
}

#[derive(Default)]
struct Store {
    /// Insertion order
    order: Vec<HazardId>,
    entries: HashMap<HazardId, Arc<Mutex<Hazard>>>,
}

/// Thread-safe hazard store.
pub struct HazardRegistry {
    store: RwLock<Store>,
    readings: Mutex<VecDeque<SensorReading>>,
    id_seed: u64,
    next_id: AtomicU64,
}

impl HazardRegistry {
    /// Creates an empty registry whose ids derive from `id_seed`.
    pub fn new(id_seed: u64) -> Self {
        Self {
            store: RwLock::new(Store::default()),
            readings: Mutex::new(VecDeque::new()),
            id_seed,
            next_id: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(entry: &Mutex<Hazard>) -> MutexGuard<'_, Hazard> {
        entry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate_id(&self) -> HazardId {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        HazardId::from_seed(self.id_seed.wrapping_add(n))
    }

    fn insert(&self, hazard: Hazard) -> Hazard {
        let mut store = self.write();
        store.order.push(hazard.id);
        store.entries.insert(hazard.id, Arc::new(Mutex::new(hazard.clone())));
        hazard
    }

    pub fn len(&self) -> usize {
        self.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records a worker report as a new pending hazard.
    pub fn report(&self, report: HazardReport, at: DateTime<Utc>) -> Result<Hazard, RegistryError> {
        let (hazard_type, worker) = report.validate()?;

        let hazard = Hazard::new(self.allocate_id(), hazard_type, report.location.clone(), at)
            .with_severity(report.severity.unwrap_or_default())
            .with_reporter(worker)
            .with_description(report.description.clone());

        Ok(self.insert(hazard))
    }

    /// Logs a sensor reading and creates a hazard if it breaches a threshold.
    pub fn ingest_reading(&self, reading: &SensorReading, at: DateTime<Utc>) -> Option<Hazard> {
        {
            let mut log = self.readings.lock().unwrap_or_else(PoisonError::into_inner);
            if log.len() == READING_LOG_CAPACITY {
                log.pop_front();
            }
            log.push_back(reading.clone());
        }

        let detection = detect_hazard(reading)?;
        let hazard = reading.to_hazard(&detection, self.allocate_id(), at);
        Some(self.insert(hazard))
    }

    /// Most recent sensor readings, newest first.
    pub fn recent_readings(&self, limit: Option<usize>) -> Vec<SensorReading> {
        let limit = limit.unwrap_or(DEFAULT_READINGS_LIMIT);
        let log = self.readings.lock().unwrap_or_else(PoisonError::into_inner);
        log.iter().rev().take(limit).cloned().collect()
    }

    pub fn get(&self, id: &HazardId) -> Option<Hazard> {
        let store = self.read();
        store.entries.get(id).map(|entry| Self::lock(entry).clone())
    }

    /// Hazards matching `filter`, newest first.
    fn select(&self, filter: impl Fn(&Hazard) -> bool) -> Vec<Hazard> {
        let store = self.read();
        let mut hazards: Vec<Hazard> = store
            .order
            .iter()
            .rev()
            .filter_map(|id| store.entries.get(id))
            .map(|entry| Self::lock(entry).clone())
            .filter(|hazard| filter(hazard))
            .collect();

        // Stable: equal timestamps keep latest-inserted first
        hazards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        hazards
    }

    /// Newest hazards, at most `limit` (default [`DEFAULT_LIST_LIMIT`]).
    pub fn all(&self, limit: Option<usize>) -> Vec<Hazard> {
        let mut hazards = self.select(|_| true);
        hazards.truncate(limit.unwrap_or(DEFAULT_LIST_LIMIT));
        hazards
    }

    /// Pending, acknowledged and escalated hazards.
    pub fn active(&self) -> Vec<Hazard> {
        self.select(Hazard::is_active)
    }

    pub fn by_worker(&self, worker_id: &str) -> Vec<Hazard> {
        self.select(|h| h.worker.as_deref() == Some(worker_id))
    }

    pub fn by_sector(&self, sector: &Sector) -> Vec<Hazard> {
        self.select(|h| &h.location.sector == sector)
    }

    /// Hazards inside the axis-aligned box of half-width `radius` around
    /// (`lat`, `lng`), edges included.
    pub fn near(&self, lat: f64, lng: f64, radius: Option<f64>) -> Vec<Hazard> {
        let radius = radius.unwrap_or(DEFAULT_NEAR_RADIUS);
        self.select(|h| {
            (h.location.lat - lat).abs() <= radius && (h.location.lng - lng).abs() <= radius
        })
    }

    /// Moves a hazard through its lifecycle.
    ///
    /// Updates to one hazard are serialized; the last accepted write wins.
    pub fn update_status(&self, id: &HazardId, status: HazardStatus) -> Result<StatusChange, RegistryError> {
        let entry = {
            let store = self.read();
            store.entries.get(id).cloned().ok_or(RegistryError::NotFound(*id))?
        };

        let mut hazard = Self::lock(&entry);
        let previous = hazard.transition_to(status)?;
        Ok(StatusChange {
            hazard: hazard.clone(),
            previous,
        })
    }
}

impl Default for HazardRegistry {
    fn default() -> Self {
        Self::new(0)
    }
}

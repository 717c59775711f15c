//! Process-wide registry of device sessions.
//!
//! Maps a device id to its [`DeviceSession`]. Ids are unique, listing order
//! is insertion order, and nothing is persisted: devices added at runtime
//! disappear with the process. The map sits behind a `RwLock` so lookups run
//! concurrently while every mutation is a single insert or delete.

use std::sync::{Arc, PoisonError, RwLock};

use fortimcp_api::{AuthMode, DeviceConfig, DeviceSession, DeviceSettings};
use futures_util::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::CoreError;

/// Non-secret description of a registered device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub vdom: String,
    pub auth_mode: AuthMode,
    pub verify_tls: bool,
}

impl DeviceSummary {
    fn of(session: &DeviceSession) -> Self {
        let config = session.config();
        Self {
            id: session.id().to_owned(),
            host: config.host.clone(),
            port: config.port,
            vdom: config.vdom.clone(),
            auth_mode: config.auth_mode(),
            verify_tls: config.tls.verifies(),
        }
    }
}

#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<IndexMap<String, Arc<DeviceSession>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configured devices.
    ///
    /// A device whose settings cannot produce a session is logged and left
    /// out; its error is returned alongside the registry so the caller can
    /// report it. One bad entry never prevents the others from loading.
    pub fn from_settings<'a, I>(entries: I) -> (Self, Vec<CoreError>)
    where
        I: IntoIterator<Item = (&'a String, &'a DeviceSettings)>,
    {
        let registry = Self::new();
        let mut failures = Vec::new();

        for (id, settings) in entries {
            if let Err(e) = registry.register_settings(id, settings) {
                warn!(device = %id, error = %e, "skipping device");
                failures.push(e);
            }
        }

        info!(
            loaded = registry.len(),
            skipped = failures.len(),
            "device registry initialised"
        );
        (registry, failures)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Register a device from a validated config.
    pub fn register(&self, id: &str, config: DeviceConfig) -> Result<Arc<DeviceSession>, CoreError> {
        if self.contains(id) {
            return Err(CoreError::DuplicateDevice {
                device_id: id.to_owned(),
            });
        }
        let session = DeviceSession::new(id, config)?;
        self.insert(session)
    }

    /// Validate raw settings and register the resulting device.
    pub fn register_settings(
        &self,
        id: &str,
        settings: &DeviceSettings,
    ) -> Result<Arc<DeviceSession>, CoreError> {
        if self.contains(id) {
            return Err(CoreError::DuplicateDevice {
                device_id: id.to_owned(),
            });
        }
        let config = DeviceConfig::from_settings(id, settings)?;
        self.register(id, config)
    }

    /// Insert an already-built session under its own id.
    pub fn insert(&self, session: DeviceSession) -> Result<Arc<DeviceSession>, CoreError> {
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        let id = session.id().to_owned();
        if devices.contains_key(&id) {
            return Err(CoreError::DuplicateDevice { device_id: id });
        }
        let session = Arc::new(session);
        devices.insert(id.clone(), Arc::clone(&session));
        drop(devices);

        info!(device = %id, base_url = session.base_url(), auth = %session.auth_mode(), "device registered");
        Ok(session)
    }

    /// Evict a device. In-flight calls holding the session finish normally.
    pub fn remove(&self, id: &str) -> Result<Arc<DeviceSession>, CoreError> {
        let removed = self
            .devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .shift_remove(id);

        match removed {
            Some(session) => {
                info!(device = %id, "device removed");
                Ok(session)
            }
            None => Err(CoreError::UnknownDevice {
                device_id: id.to_owned(),
            }),
        }
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub fn get(&self, id: &str) -> Result<Arc<DeviceSession>, CoreError> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::UnknownDevice {
                device_id: id.to_owned(),
            })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Device ids in registration order.
    pub fn list(&self) -> Vec<String> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.devices.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn describe(&self) -> Vec<DeviceSummary> {
        self.snapshot().iter().map(|s| DeviceSummary::of(s)).collect()
    }

    fn snapshot(&self) -> Vec<Arc<DeviceSession>> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    // ── Fleet probes ─────────────────────────────────────────────────

    /// Fetch system status from every device concurrently.
    ///
    /// Each device gets its own result; one failure never affects another.
    pub async fn probe_all(&self) -> IndexMap<String, Result<Value, CoreError>> {
        let sessions = self.snapshot();
        let probes = sessions.iter().map(|session| async move {
            let result = session.system_status().await.map_err(CoreError::from);
            (session.id().to_owned(), result)
        });
        join_all(probes).await.into_iter().collect()
    }

    /// Connection test for every device: id -> reachable.
    pub async fn test_all(&self) -> IndexMap<String, bool> {
        let sessions = self.snapshot();
        let probes = sessions.iter().map(|session| async move {
            (session.id().to_owned(), session.test_connection().await)
        });
        join_all(probes).await.into_iter().collect()
    }
}

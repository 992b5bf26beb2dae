use crate::descriptor::{AppDescriptor, ConnectionType, DescriptorPatch};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Application store is corrupt: {0}")]
    Corrupt(String),

    #[error("Application already exists: {0}")]
    AlreadyExists(String),

    #[error("Application not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    applications: Vec<AppDescriptor>,
}

/// Single source of truth for which external applications the
/// assistant can reach, and how.
///
/// Backed by one JSON document rewritten wholesale on every mutation.
/// Mutations serialize on an internal lock and persist via a temp file
/// and atomic rename, so concurrent writers cannot interleave partial
/// writes and a crash mid-write leaves the previous store intact.
/// Lookup is a linear scan; the expected cardinality is tens of
/// entries, not thousands.
pub struct AppRegistry {
    store_path: PathBuf,
    applications: Mutex<Vec<AppDescriptor>>,
}

impl AppRegistry {
    /// Opens the registry at `store_path`.
    ///
    /// A missing store is initialized to the empty document and
    /// persisted immediately, so subsequent reads never fail. A store
    /// that exists but cannot be parsed is fatal (`Corrupt`) and must
    /// surface to the operator: proceeding with an empty registry
    /// would silently forget configured integrations.
    pub fn open<P: AsRef<Path>>(store_path: P) -> Result<Self, RegistryError> {
        let store_path = store_path.as_ref().to_path_buf();

        if let Some(parent) = store_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !store_path.exists() {
            let registry = Self {
                store_path,
                applications: Mutex::new(Vec::new()),
            };
            registry.persist(&[])?;
            info!(
                store = %registry.store_path.display(),
                "initialized empty application store"
            );
            return Ok(registry);
        }

        let raw = fs::read_to_string(&store_path)?;
        let doc: StoreDocument =
            serde_json::from_str(&raw).map_err(|e| RegistryError::Corrupt(e.to_string()))?;
        debug!(
            store = %store_path.display(),
            applications = doc.applications.len(),
            "loaded application store"
        );

        Ok(Self {
            store_path,
            applications: Mutex::new(doc.applications),
        })
    }

    /// Looks up one application by name. Absence is a normal outcome,
    /// not an error: callers report "that integration isn't set up"
    /// rather than failing.
    pub fn get(&self, app_name: &str) -> Option<AppDescriptor> {
        self.applications
            .lock()
            .iter()
            .find(|app| app.app_name == app_name)
            .cloned()
    }

    pub fn list(&self) -> Vec<AppDescriptor> {
        self.applications.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.applications.lock().len()
    }

    /// Adds a new descriptor. Rejected if the name is already taken.
    /// Success is reported only after the store is persisted.
    pub fn add(&self, descriptor: AppDescriptor) -> Result<(), RegistryError> {
        validate(&descriptor)?;

        let mut apps = self.applications.lock();
        if apps.iter().any(|app| app.app_name == descriptor.app_name) {
            return Err(RegistryError::AlreadyExists(descriptor.app_name));
        }

        let mut next = apps.clone();
        info!(app = %descriptor.app_name, "adding application");
        next.push(descriptor);
        self.persist(&next)?;
        *apps = next;
        Ok(())
    }

    /// Shallow-merges `patch` into the named descriptor: each field
    /// present in the patch replaces the stored field wholesale.
    pub fn update(&self, app_name: &str, patch: DescriptorPatch) -> Result<(), RegistryError> {
        let mut apps = self.applications.lock();
        let index = apps
            .iter()
            .position(|app| app.app_name == app_name)
            .ok_or_else(|| RegistryError::NotFound(app_name.to_string()))?;

        let mut merged = apps[index].clone();
        if let Some(connection_type) = patch.connection_type {
            merged.connection_type = connection_type;
        }
        if let Some(credentials) = patch.credentials {
            merged.credentials = credentials;
        }
        if let Some(config) = patch.config {
            merged.config = config;
        }
        validate(&merged)?;

        let mut next = apps.clone();
        next[index] = merged;
        self.persist(&next)?;
        *apps = next;
        info!(app = app_name, "updated application");
        Ok(())
    }

    pub fn delete(&self, app_name: &str) -> Result<(), RegistryError> {
        let mut apps = self.applications.lock();
        let index = apps
            .iter()
            .position(|app| app.app_name == app_name)
            .ok_or_else(|| RegistryError::NotFound(app_name.to_string()))?;

        let mut next = apps.clone();
        next.remove(index);
        self.persist(&next)?;
        *apps = next;
        info!(app = app_name, "deleted application");
        Ok(())
    }

    fn persist(&self, applications: &[AppDescriptor]) -> Result<(), RegistryError> {
        let doc = StoreDocument {
            applications: applications.to_vec(),
        };
        let json = serde_json::to_string_pretty(&doc)?;

        let temp_path = self.store_path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.store_path)?;

        Ok(())
    }
}

fn validate(descriptor: &AppDescriptor) -> Result<(), RegistryError> {
    if descriptor.app_name.trim().is_empty() {
        return Err(RegistryError::Validation(
            "app_name must be non-empty".to_string(),
        ));
    }

    if descriptor.connection_type == ConnectionType::WebhookRelay {
        match descriptor.webhook_url() {
            Some(url) if !url.trim().is_empty() => {}
            _ => {
                return Err(RegistryError::Validation(format!(
                    "webhook_relay application '{}' requires a non-empty webhook_url in config",
                    descriptor.app_name
                )))
            }
        }
    }

    Ok(())
}

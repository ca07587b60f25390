//! Lightweight annotator identity persisted across sessions.

use crate::config::IdentityConfig;
use crate::error::{CoreError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::RwLock;
use rand::Rng;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const ACCOUNT_KEY: &str = "annotation_account";
pub const FINGERPRINT_KEY: &str = "browser_fingerprint";

/// Sent in place of a fingerprint when none can be produced.
pub const UNKNOWN_FINGERPRINT: &str = "unknown";

/// Key-value persistence behind [`SessionIdentity`].
pub trait IdentityStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: IdentityStore + ?Sized> IdentityStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    pub(crate) values: RwLock<BTreeMap<String, String>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Identity values kept in a small JSON document on disk.
#[derive(Debug)]
pub struct FileIdentityStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileIdentityStore {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) if !content.trim().is_empty() => serde_json::from_str(&content)?,
            Ok(_) => BTreeMap::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, values: RwLock::new(values) })
    }

    /// `<config dir>/judge-review/identity.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("judge-review").join("identity.json"))
    }

    /// Store at the configured path, or under the platform config directory.
    pub fn from_config(config: &IdentityConfig) -> Result<Self> {
        let path = config
            .store_path
            .clone()
            .or_else(Self::default_path)
            .ok_or_else(|| CoreError::Identity("no config directory for the identity store".into()))?;
        tracing::debug!(path = %path.display(), "opening identity store");
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(values)?)?;
        Ok(())
    }
}

impl IdentityStore for FileIdentityStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write();
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }
}

/// Account name and fingerprint, read and written only through a store.
pub struct SessionIdentity<S: IdentityStore> {
    store: S,
}

impl<S: IdentityStore> SessionIdentity<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn account_name(&self) -> Option<String> {
        self.store
            .get(ACCOUNT_KEY)
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
    }

    pub fn set_account_name(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::EmptyAccountName);
        }
        self.store.set(ACCOUNT_KEY, name)?;
        tracing::info!(account = name, "annotator account set");
        Ok(name.to_string())
    }

    /// Stored fingerprint, generating and persisting one on first use.
    pub fn fingerprint(&self) -> String {
        if let Some(fp) = self.store.get(FINGERPRINT_KEY).filter(|f| !f.is_empty()) {
            return fp;
        }
        let fp = generate_fingerprint(&host_traits());
        if let Err(e) = self.store.set(FINGERPRINT_KEY, &fp) {
            tracing::warn!(error = %e, "failed to persist fingerprint");
        }
        fp
    }
}

fn host_traits() -> Vec<String> {
    let mut traits = vec![
        std::env::consts::OS.to_string(),
        std::env::consts::ARCH.to_string(),
        chrono::Local::now().offset().to_string(),
    ];
    for var in ["USER", "USERNAME", "LANG", "HOSTNAME"] {
        if let Ok(v) = std::env::var(var) {
            traits.push(v);
        }
    }
    traits
}

/// Base64 of the joined traits cut to 16 characters, or a random
/// `fp_<millis>_<suffix>` when there is nothing to hash.
pub fn generate_fingerprint(traits: &[String]) -> String {
    let joined = traits.join("|");
    if joined.is_empty() {
        return random_fingerprint();
    }
    STANDARD.encode(joined.as_bytes()).chars().take(16).collect()
}

fn random_fingerprint() -> String {
    const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("fp_{}_{}", chrono::Utc::now().timestamp_millis(), suffix)
}

//! Credential store: username → one-way hash of a blink PIN
//!
//! The whole file is read into memory on open and rewritten on every
//! successful registration. Writes go to `users.json.tmp` first and are then
//! renamed over the store, so a crash never leaves a half-written file.
//!
//! Registration holds an exclusive lock on `users.json.lock` and re-reads the
//! file under it, so handles opened by other processes can neither overwrite
//! nor drop each other's records.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{BlinkError, Result};
use crate::types::{AuthOutcome, FailureReason, PatternSequence, UserRecord};
use crate::PIN_LENGTH;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.@-]{1,64}$").unwrap();
}

/// On-disk layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    users: BTreeMap<String, StoredCredential>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCredential {
    pin_hash: String,
    #[serde(default = "default_pin_length")]
    pin_length: usize,
    updated_at: DateTime<Utc>,
}

fn default_pin_length() -> usize {
    PIN_LENGTH
}

impl StoredCredential {
    fn to_record(&self, username: &str) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            pin_hash: self.pin_hash.clone(),
            pin_length: self.pin_length,
            updated_at: self.updated_at,
        }
    }
}

/// SHA-256 of the canonical encoding, lowercase hex
pub fn hash_pattern(pattern: &PatternSequence) -> String {
    hex::encode(Sha256::digest(pattern.encode().as_bytes()))
}

/// Trim and check a username
pub fn validate_username(username: &str) -> Result<&str> {
    let trimmed = username.trim();
    if USERNAME_RE.is_match(trimmed) {
        Ok(trimmed)
    } else {
        Err(BlinkError::InvalidUsername(username.to_string()))
    }
}

/// Compare without an early exit on the first differing byte
fn hashes_equal(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

/// Exclusive advisory lock on the file next to the store, released on drop
struct StoreLock {
    file: fs::File,
}

impl StoreLock {
    fn acquire(store_path: &Path) -> Result<Self> {
        let lock_path = store_path.with_extension("json.lock");
        let file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        FileExt::lock_exclusive(&file)?;
        debug!("Locked {}", lock_path.display());
        Ok(Self { file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Could not release store lock: {}", e);
        }
    }
}

/// Read the user map; a missing or empty file is an empty map
fn read_users(path: &Path) -> Result<BTreeMap<String, StoredCredential>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let file: StoreFile = serde_json::from_str(&contents)
        .map_err(|e| BlinkError::CorruptStore(format!("{}: {}", path.display(), e)))?;
    Ok(file.users)
}

/// Persisted username → pin hash mapping
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    users: BTreeMap<String, StoredCredential>,
}

impl CredentialStore {
    /// Load the store at `path`. A missing file is an empty store; a file
    /// that does not parse is an error rather than silently discarded.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            debug!("No store at {}, starting empty", path.display());
        }
        let users = read_users(&path)?;
        Ok(Self { path, users })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register a new user. Existing users are never overwritten, including
    /// ones written by another handle since this one was opened.
    pub fn register(&mut self, username: &str, pattern: &PatternSequence) -> Result<UserRecord> {
        let username = validate_username(username)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let _lock = StoreLock::acquire(&self.path)?;
        self.users = read_users(&self.path)?;
        if self.users.contains_key(username) {
            warn!("Registration refused, {} already exists", username);
            return Err(BlinkError::AlreadyExists(username.to_string()));
        }

        let credential = StoredCredential {
            pin_hash: hash_pattern(pattern),
            pin_length: PIN_LENGTH,
            updated_at: Utc::now(),
        };
        self.users.insert(username.to_string(), credential.clone());

        if let Err(e) = self.save() {
            // Keep memory in step with disk
            self.users.remove(username);
            return Err(e);
        }

        info!("Registered {}", username);
        Ok(credential.to_record(username))
    }

    /// Look up a user's record
    pub fn lookup(&self, username: &str) -> Result<UserRecord> {
        let username = username.trim();
        self.users
            .get(username)
            .map(|c| c.to_record(username))
            .ok_or_else(|| BlinkError::NotFound(username.to_string()))
    }

    /// Hash `pattern` and compare it with the stored hash for `username`
    pub fn verify(&self, username: &str, pattern: &PatternSequence) -> AuthOutcome {
        let record = match self.lookup(username) {
            Ok(record) => record,
            Err(_) => {
                info!("Authentication failed for {}: unknown user", username.trim());
                return AuthOutcome::Failure(FailureReason::UnknownUser);
            }
        };

        if record.pin_length == PIN_LENGTH && hashes_equal(&hash_pattern(pattern), &record.pin_hash) {
            info!("Authentication succeeded for {}", record.username);
            AuthOutcome::Success
        } else {
            info!("Authentication failed for {}: pattern mismatch", record.username);
            AuthOutcome::Failure(FailureReason::HashMismatch)
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username.trim())
    }

    /// Registered usernames in sorted order
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Write to a temp file next to the store, then rename over it.
    /// Callers hold the store lock.
    fn save(&self) -> Result<()> {
        let file = StoreFile {
            users: self.users.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;

        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut temp = fs::File::create(&temp_path)?;
            temp.write_all(content.as_bytes())?;
            temp.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;

        debug!("Saved {} users to {}", self.users.len(), self.path.display());
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

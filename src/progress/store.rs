use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::Progress;

const SNAPSHOT_VERSION: u32 = 1;
const SNAPSHOT_FILE: &str = "progress.json";

/// On-disk form of a user's progress.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    updated: String,
    #[serde(flatten)]
    progress: Progress,
}

/// Per-user progress snapshots.
///
/// Layout:
///   {base_path}/{user}/progress.json
pub struct ProgressStore {
    base_path: PathBuf,
}

impl ProgressStore {
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;
        info!("Progress store opened at {}", path.display());
        Ok(Self {
            base_path: path.to_path_buf(),
        })
    }

    fn snapshot_path(&self, user: &str) -> PathBuf {
        self.base_path.join(sanitize_user(user)).join(SNAPSHOT_FILE)
    }

    /// Loads a user's progress. Unknown users start fresh.
    pub fn load(&self, user: &str) -> Result<Progress> {
        let path = self.snapshot_path(user);
        if !path.exists() {
            return Ok(Progress::new());
        }

        let content = fs::read_to_string(&path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        if snapshot.version != SNAPSHOT_VERSION {
            warn!(
                "Snapshot {} has version {}, expected {SNAPSHOT_VERSION}",
                path.display(),
                snapshot.version
            );
        }
        Ok(snapshot.progress)
    }

    pub fn save(&self, user: &str, progress: &Progress) -> Result<()> {
        let path = self.snapshot_path(user);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            updated: chrono::Utc::now().to_rfc3339(),
            progress: progress.clone(),
        };
        // Write beside the snapshot, then rename over it
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&snapshot)?)?;
        fs::rename(&tmp, &path)?;

        debug!("Saved progress for {user} to {}", path.display());
        Ok(())
    }

    /// Deletes a user's snapshot. Returns whether one existed.
    pub fn remove(&self, user: &str) -> Result<bool> {
        let path = self.snapshot_path(user);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        info!("Removed progress for {user}");
        Ok(true)
    }
}

/// Maps a user id onto a single safe path component.
fn sanitize_user(user: &str) -> String {
    let cleaned: String = user
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match cleaned.trim_matches('.') {
        "" => "_".to_string(),
        _ => cleaned,
    }
}

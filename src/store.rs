use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const STORE_FILE: &str = "class123.json";
pub const FORMAT_VERSION: u32 = 1;

/// Targeting value of a published assignment, kept in the loose shape the
/// app has always written: the keyword "all", an explicit id list, or absent.
/// Id entries may be JSON strings or numbers depending on which client wrote
/// them; compare only via `visibility::normalize_id`. Anything else found on
/// disk lands in `Other` and is treated as "no restriction" by the filter,
/// never as a load error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssignedTo {
    Keyword(String),
    Ids(Vec<serde_json::Value>),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: serde_json::Value,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    pub id: serde_json::Value,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to_all: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<AssignedTo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorEvent {
    pub id: String,
    pub student_id: serde_json::Value,
    pub points: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub recorded_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub id: serde_json::Value,
    pub name: String,
    #[serde(default)]
    pub students: Vec<StudentRecord>,
    #[serde(default)]
    pub assignments: Vec<AssignmentRecord>,
    #[serde(default)]
    pub behaviors: Vec<BehaviorEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    pub format_version: u32,
    #[serde(default)]
    pub classes: Vec<ClassRecord>,
}

impl Database {
    pub fn empty() -> Self {
        Database {
            format_version: FORMAT_VERSION,
            classes: Vec::new(),
        }
    }
}

pub fn store_path(workspace: &Path) -> PathBuf {
    workspace.join(STORE_FILE)
}

/// Open (or initialize) the store document in a workspace directory.
/// A missing file means a fresh workspace, not an error.
pub fn open_store(workspace: &Path) -> anyhow::Result<Database> {
    std::fs::create_dir_all(workspace).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace.to_string_lossy()
        )
    })?;
    let path = store_path(workspace);
    if !path.is_file() {
        let db = Database::empty();
        save_store(workspace, &db)?;
        return Ok(db);
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read store {}", path.to_string_lossy()))?;
    let db: Database = serde_json::from_str(&text)
        .with_context(|| format!("store {} is not valid JSON", path.to_string_lossy()))?;
    Ok(db)
}

/// Atomic save: write a sibling temp file, then rename over the store.
pub fn save_store(workspace: &Path, db: &Database) -> anyhow::Result<()> {
    let path = store_path(workspace);
    let tmp = workspace.join(format!("{}.saving", STORE_FILE));
    let text = serde_json::to_string_pretty(db).context("failed to serialize store")?;
    std::fs::write(&tmp, text)
        .with_context(|| format!("failed to write temp store {}", tmp.to_string_lossy()))?;
    std::fs::rename(&tmp, &path).with_context(|| {
        format!("failed to move temp store into place at {}", path.to_string_lossy())
    })?;
    Ok(())
}

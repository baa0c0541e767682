//! Test utilities for Chatvault
//!
//! In-memory stand-ins for the host platform and the handle store, plus
//! sample data. The fakes share an event log so tests can assert the order
//! in which the save pipeline touches its collaborators.

use crate::conversation::{Conversation, Message};
use crate::error::Result;
use crate::platform::{
    AccessError, AccessResult, DirectoryCapability, FileAccessPlatform, FileWriter, HandleRecord,
    PermissionMode, PermissionState,
};
use crate::storage::HandleStore;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared, ordered log of collaborator calls
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// Create an empty event log
pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Push an entry onto an event log
pub fn log_event(log: &EventLog, event: impl Into<String>) {
    log.lock().unwrap().push(event.into());
}

/// The "Fix bug" conversation used across tests
pub fn sample_conversation() -> Conversation {
    Conversation {
        title: "Fix bug".to_string(),
        messages: vec![
            Message::user("why crash?"),
            Message::assistant("null pointer"),
        ],
        url: "https://chatgpt.com/c/abc".to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap(),
    }
}

/// In-memory handle store recording every call
#[derive(Default)]
pub struct MemoryHandleStore {
    records: Mutex<HashMap<String, HandleRecord>>,
    log: Option<EventLog>,
}

impl MemoryHandleStore {
    /// Empty store writing to `log`
    pub fn with_log(log: EventLog) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            log: Some(log),
        }
    }

    /// Store pre-populated with `record` under `key`
    pub fn seeded(key: &str, record: HandleRecord, log: EventLog) -> Self {
        let store = Self::with_log(log);
        store
            .records
            .lock()
            .unwrap()
            .insert(key.to_string(), record);
        store
    }

    fn log(&self, event: String) {
        if let Some(log) = &self.log {
            log_event(log, event);
        }
    }
}

impl HandleStore for MemoryHandleStore {
    fn put(&self, key: &str, handle: &HandleRecord) -> Result<()> {
        self.log(format!("put:{}", key));
        self.records
            .lock()
            .unwrap()
            .insert(key.to_string(), handle.clone());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<HandleRecord>> {
        self.log(format!("get:{}", key));
        Ok(self.records.lock().unwrap().get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.log(format!("delete:{}", key));
        self.records.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Scripted behaviour of a [`MemoryDirectory`]
#[derive(Clone)]
pub struct DirectoryScript {
    /// Answer to permission queries
    pub query: AccessResult<PermissionState>,
    /// Answer to permission requests
    pub request: AccessResult<PermissionState>,
    /// Error returned when opening a child directory
    pub child_error: Option<AccessError>,
    /// Error returned when creating a file
    pub write_error: Option<AccessError>,
}

impl Default for DirectoryScript {
    fn default() -> Self {
        Self {
            query: Ok(PermissionState::Granted),
            request: Ok(PermissionState::Granted),
            child_error: None,
            write_error: None,
        }
    }
}

/// Files written through a [`MemoryDirectory`], keyed by `dir/name`
pub type FileMap = Arc<Mutex<HashMap<String, String>>>;

/// In-memory directory capability
pub struct MemoryDirectory {
    path: String,
    name: String,
    script: DirectoryScript,
    files: FileMap,
    log: EventLog,
}

impl MemoryDirectory {
    /// Root directory named `name`
    pub fn new(name: &str, script: DirectoryScript, files: FileMap, log: EventLog) -> Self {
        Self {
            path: name.to_string(),
            name: name.to_string(),
            script,
            files,
            log,
        }
    }
}

#[async_trait]
impl DirectoryCapability for MemoryDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn record(&self) -> HandleRecord {
        HandleRecord {
            name: self.name.clone(),
            payload: serde_json::json!({ "memory": self.path }),
        }
    }

    async fn query_permission(&self, _mode: PermissionMode) -> AccessResult<PermissionState> {
        log_event(&self.log, "query_permission");
        self.script.query.clone()
    }

    async fn request_permission(&self, _mode: PermissionMode) -> AccessResult<PermissionState> {
        log_event(&self.log, "request_permission");
        self.script.request.clone()
    }

    async fn get_child_directory(
        &self,
        name: &str,
        _create: bool,
    ) -> AccessResult<Arc<dyn DirectoryCapability>> {
        log_event(&self.log, format!("child:{}", name));
        if let Some(error) = &self.script.child_error {
            return Err(error.clone());
        }
        Ok(Arc::new(MemoryDirectory {
            path: format!("{}/{}", self.path, name),
            name: name.to_string(),
            script: self.script.clone(),
            files: Arc::clone(&self.files),
            log: Arc::clone(&self.log),
        }))
    }

    async fn create_file(&self, name: &str) -> AccessResult<Box<dyn FileWriter>> {
        log_event(&self.log, format!("create_file:{}/{}", self.path, name));
        if let Some(error) = &self.script.write_error {
            return Err(error.clone());
        }
        Ok(Box::new(MemoryFile {
            key: format!("{}/{}", self.path, name),
            buffer: Vec::new(),
            files: Arc::clone(&self.files),
        }))
    }
}

struct MemoryFile {
    key: String,
    buffer: Vec<u8>,
    files: FileMap,
}

#[async_trait]
impl FileWriter for MemoryFile {
    async fn write_all(&mut self, bytes: &[u8]) -> AccessResult<()> {
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    async fn close(self: Box<Self>) -> AccessResult<()> {
        let content = String::from_utf8(self.buffer).map_err(|e| AccessError::other(e.to_string()))?;
        self.files.lock().unwrap().insert(self.key, content);
        Ok(())
    }
}

/// In-memory platform handing out [`MemoryDirectory`] capabilities
pub struct MemoryPlatform {
    /// Whether directory access is available
    pub supported: bool,
    /// Folder the picker returns; `None` simulates a cancelled picker
    pub pick: Option<String>,
    /// Behaviour of every directory handed out
    pub script: DirectoryScript,
    /// Files written so far
    pub files: FileMap,
    /// Shared event log
    pub log: EventLog,
}

impl MemoryPlatform {
    /// Supported platform whose picker returns `pick`
    pub fn new(pick: Option<&str>, script: DirectoryScript, log: EventLog) -> Self {
        Self {
            supported: true,
            pick: pick.map(str::to_string),
            script,
            files: Arc::new(Mutex::new(HashMap::new())),
            log,
        }
    }

    fn directory(&self, name: &str) -> MemoryDirectory {
        MemoryDirectory::new(
            name,
            self.script.clone(),
            Arc::clone(&self.files),
            Arc::clone(&self.log),
        )
    }

    /// Record of a folder as this platform would store it
    pub fn record_for(&self, name: &str) -> HandleRecord {
        self.directory(name).record()
    }
}

#[async_trait]
impl FileAccessPlatform for MemoryPlatform {
    fn supports_directory_access(&self) -> bool {
        self.supported
    }

    async fn pick_directory(&self) -> AccessResult<Arc<dyn DirectoryCapability>> {
        log_event(&self.log, "pick_directory");
        match &self.pick {
            Some(name) => Ok(Arc::new(self.directory(name))),
            None => Err(AccessError::aborted("picker dismissed")),
        }
    }

    fn restore(&self, record: &HandleRecord) -> AccessResult<Arc<dyn DirectoryCapability>> {
        let name = record
            .payload
            .get("memory")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AccessError::other("not a memory record"))?;
        Ok(Arc::new(self.directory(name)))
    }
}

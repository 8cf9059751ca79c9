use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::{HistoryStore, SessionError, SessionInfo, Turn};

const INDEX_FILE: &str = "sessions.json";
const TURNS_DIR: &str = "turns";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TurnRecord {
    seq: u64,
    turn: Turn,
}

/// History kept on disk: a JSON index of sessions plus one JSONL file of
/// turns per session.
#[derive(Clone, Debug)]
pub struct FileHistoryStore {
    base_dir: PathBuf,
    // Serializes every read-modify-write of the index and the turn files.
    write_lock: Arc<Mutex<()>>,
}

impl FileHistoryStore {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn sanitize_session_id(session_id: &str) -> String {
        let mut out = String::with_capacity(session_id.len());
        for ch in session_id.chars() {
            match ch {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => out.push('_'),
                c if c.is_control() => {}
                c => out.push(c),
            }
        }
        let trimmed = out.trim_matches(|c: char| c == '.' || c.is_whitespace() || c == '_');
        if trimmed.is_empty() {
            let mut hasher = DefaultHasher::new();
            session_id.hash(&mut hasher);
            return format!("session-{:08x}", hasher.finish());
        }
        trimmed.to_string()
    }

    fn index_path(&self) -> PathBuf {
        self.base_dir.join(INDEX_FILE)
    }

    fn turns_path(&self, session_id: &str) -> PathBuf {
        let filename = format!("{}.jsonl", Self::sanitize_session_id(session_id));
        self.base_dir.join(TURNS_DIR).join(filename)
    }

    async fn read_index(&self) -> Result<Vec<SessionInfo>, SessionError> {
        match fs::read(self.index_path()).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_index(&self, infos: &[SessionInfo]) -> Result<(), SessionError> {
        fs::create_dir_all(&self.base_dir).await?;
        let path = self.index_path();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(infos)?).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn read_records(&self, session_id: &str) -> Result<Vec<TurnRecord>, SessionError> {
        let path = self.turns_path(session_id);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut records = Vec::new();
        for (index, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: TurnRecord =
                serde_json::from_str(line).map_err(|err| SessionError::Corrupt {
                    path: path.clone(),
                    line: index + 1,
                    reason: err.to_string(),
                })?;
            records.push(record);
        }
        Ok(records)
    }
}

#[async_trait::async_trait]
impl HistoryStore for FileHistoryStore {
    async fn create_session(&self, user_id: &str) -> Result<SessionInfo, SessionError> {
        let _guard = self.write_lock.lock().await;
        let mut infos = self.read_index().await?;
        let info = SessionInfo::new(user_id);
        infos.push(info.clone());
        self.write_index(&infos).await?;
        tracing::debug!(session_id = %info.session_id, "created session");
        Ok(info)
    }

    async fn session(&self, session_id: &str) -> Result<Option<SessionInfo>, SessionError> {
        Ok(self
            .read_index()
            .await?
            .into_iter()
            .find(|info| info.session_id == session_id))
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionInfo>, SessionError> {
        Ok(self
            .read_index()
            .await?
            .into_iter()
            .rev()
            .filter(|info| info.user_id == user_id)
            .collect())
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool, SessionError> {
        let _guard = self.write_lock.lock().await;
        let mut infos = self.read_index().await?;
        let before = infos.len();
        infos.retain(|info| info.session_id != session_id);
        if infos.len() == before {
            return Ok(false);
        }
        self.write_index(&infos).await?;
        match fs::remove_file(self.turns_path(session_id)).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        Ok(true)
    }

    async fn set_title(&self, session_id: &str, title: &str) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().await;
        let mut infos = self.read_index().await?;
        let info = infos
            .iter_mut()
            .find(|info| info.session_id == session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        info.title = Some(title.to_string());
        info.updated_at = Utc::now();
        self.write_index(&infos).await
    }

    async fn load(&self, session_id: &str) -> Result<Vec<Turn>, SessionError> {
        if self.session(session_id).await?.is_none() {
            return Err(SessionError::NotFound(session_id.to_string()));
        }
        Ok(self
            .read_records(session_id)
            .await?
            .into_iter()
            .map(|record| record.turn)
            .collect())
    }

    async fn append(&self, session_id: &str, turn: Turn) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().await;
        let mut infos = self.read_index().await?;
        let info = infos
            .iter_mut()
            .find(|info| info.session_id == session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        info.updated_at = turn.created_at;

        let seq = self
            .read_records(session_id)
            .await?
            .last()
            .map(|record| record.seq + 1)
            .unwrap_or(1);
        let line = serde_json::to_string(&TurnRecord { seq, turn })?;

        let path = self.turns_path(session_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(format!("{line}\n").as_bytes()).await?;
        file.flush().await?;

        self.write_index(&infos).await
    }
}

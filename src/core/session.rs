use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{Result, UploadError};
use super::types::{ByteRange, CompletedPart, SessionId, TransportMode};

/// Coordinator state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum SessionState {
    Idle,
    StrategySelected,
    SingleInFlight,
    MultipartInitiated,
    PartsAuthorized,
    PartsUploading,
    Completing,
    Aborting,
    Done,
    Failed,
    Aborted,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Done | SessionState::Failed | SessionState::Aborted)
    }

    pub fn is_multipart(self) -> bool {
        matches!(
            self,
            SessionState::MultipartInitiated
                | SessionState::PartsAuthorized
                | SessionState::PartsUploading
                | SessionState::Completing
        )
    }

    pub fn is_valid_transition(from: SessionState, to: SessionState) -> bool {
        use SessionState::*;

        if from.is_terminal() {
            return false;
        }

        match (from, to) {
            (Idle, StrategySelected) => true,
            (StrategySelected, SingleInFlight) => true,
            (StrategySelected, MultipartInitiated) => true,
            (SingleInFlight, Done) => true,
            (MultipartInitiated, PartsAuthorized) => true,
            (PartsAuthorized, PartsUploading) => true,
            (PartsUploading, Completing) => true,
            (Completing, Done) => true,
            (from, Aborting) => from.is_multipart(),
            (Aborting, Failed | Aborted) => true,
            (_, Failed) => true,
            _ => false,
        }
    }
}

/// One unit of multipart work.
#[derive(Debug, Clone)]
pub struct PartTask {
    pub part_number: u32,
    pub range: ByteRange,
    pub presigned_url: String,
    pub e_tag: Option<String>,
}

impl PartTask {
    pub fn new(part_number: u32, range: ByteRange, presigned_url: String) -> Self {
        Self {
            part_number,
            range,
            presigned_url,
            e_tag: None,
        }
    }
}

/// Remote handle of a multipart upload. Both values are assigned once by the
/// backend and shared by every part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartTarget {
    pub upload_id: String,
    pub key: String,
}

/// State of one transfer attempt. Never reused after reaching a terminal state.
#[derive(Debug)]
pub struct UploadSession {
    id: SessionId,
    mode: Option<TransportMode>,
    state: SessionState,
    key: Option<String>,
    upload_id: Option<String>,
    parts: Vec<PartTask>,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            mode: None,
            state: SessionState::Idle,
            key: None,
            upload_id: None,
            parts: Vec::new(),
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> Option<TransportMode> {
        self.mode
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    pub fn parts(&self) -> &[PartTask] {
        &self.parts
    }

    pub fn transition(&mut self, to: SessionState) -> Result<()> {
        if !SessionState::is_valid_transition(self.state, to) {
            return Err(UploadError::internal(format!(
                "Invalid session transition {:?} -> {:?}",
                self.state, to
            )));
        }

        tracing::debug!(session = %self.id, from = ?self.state, to = ?to, "session transition");
        self.state = to;
        if to.is_terminal() {
            self.finished_at = Some(Utc::now());
        }

        Ok(())
    }

    pub fn select_mode(&mut self, mode: TransportMode) -> Result<()> {
        self.transition(SessionState::StrategySelected)?;
        self.mode = Some(mode);
        Ok(())
    }

    /// Assigns the storage key. A second, different key is rejected.
    pub fn assign_key(&mut self, key: &str) -> Result<()> {
        match &self.key {
            Some(existing) if existing != key => Err(UploadError::internal(format!(
                "Storage key already assigned ({} != {})",
                existing, key
            ))),
            Some(_) => Ok(()),
            None => {
                self.key = Some(key.to_string());
                Ok(())
            }
        }
    }

    pub fn assign_target(&mut self, target: &MultipartTarget) -> Result<()> {
        if let Some(existing) = &self.upload_id {
            if existing != &target.upload_id {
                return Err(UploadError::internal("Upload id already assigned"));
            }
        }
        self.assign_key(&target.key)?;
        self.upload_id = Some(target.upload_id.clone());
        Ok(())
    }

    pub fn target(&self) -> Option<MultipartTarget> {
        match (&self.upload_id, &self.key) {
            (Some(upload_id), Some(key)) => Some(MultipartTarget {
                upload_id: upload_id.clone(),
                key: key.clone(),
            }),
            _ => None,
        }
    }

    pub fn set_parts(&mut self, parts: Vec<PartTask>) {
        self.parts = parts;
    }

    pub fn record_receipt(&mut self, part_number: u32, e_tag: String) {
        if let Some(part) = self.parts.iter_mut().find(|part| part.part_number == part_number) {
            part.e_tag = Some(e_tag);
        }
    }

    /// Receipts ordered by ascending part number, or `None` while any part
    /// is still missing one.
    pub fn completed_parts(&self) -> Option<Vec<CompletedPart>> {
        let mut completed = self
            .parts
            .iter()
            .map(|part| {
                part.e_tag.as_ref().map(|e_tag| CompletedPart {
                    part_number: part.part_number,
                    e_tag: e_tag.clone(),
                })
            })
            .collect::<Option<Vec<_>>>()?;

        completed.sort_by_key(|part| part.part_number);
        Some(completed)
    }

    pub fn report(&self) -> UploadReport {
        UploadReport {
            session_id: self.id,
            mode: self.mode,
            state: self.state,
            key: self.key.clone(),
            upload_id: self.upload_id.clone(),
            part_count: self.parts.len(),
            created_at: self.created_at,
            finished_at: self.finished_at,
        }
    }
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of how a session ended, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub session_id: SessionId,
    pub mode: Option<TransportMode>,
    pub state: SessionState,
    pub key: Option<String>,
    pub upload_id: Option<String>,
    pub part_count: usize,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl UploadReport {
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.created_at)
    }
}

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use oid4vc_core::identifier::CredentialId;

use crate::context::AgentContext;
use crate::records::CredentialRecord;
use crate::session::{AuthFlowSession, SessionId};

/// TTL after which in-flight authorization sessions are garbage-collected.
pub const SESSION_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
    #[error("record {0} not found")]
    RecordNotFound(CredentialId),
    #[error("stored value could not be decoded: {0}")]
    Corrupt(String),
    #[error("storage backend failed: {0}")]
    Backend(String),
}

/// Durable keyed store for in-flight authorization-code flows. Writes are
/// last-writer-wins per id; reads of a missing id fail `SessionNotFound`.
/// The only shared-mutable surface of the crate; implementations serialize
/// per key.
#[async_trait]
pub trait AuthFlowSessionStore: Send + Sync {
    async fn store(&self, ctx: &AgentContext, session: &AuthFlowSession) -> Result<(), StorageError>;
    async fn get(&self, ctx: &AgentContext, session_id: &SessionId) -> Result<AuthFlowSession, StorageError>;
    async fn delete(&self, ctx: &AgentContext, session_id: &SessionId) -> Result<(), StorageError>;
    /// Drop sessions older than `ttl`. Returns how many were collected.
    async fn purge_expired(&self, ctx: &AgentContext, ttl: Duration) -> Result<usize, StorageError>;
}

/// Store for issued credential records. The `save` call is the commit point
/// of an issuance flow; no partial credential is ever persisted.
#[async_trait]
pub trait CredentialRecordStore: Send + Sync {
    async fn save(&self, ctx: &AgentContext, record: &CredentialRecord) -> Result<(), StorageError>;
    async fn get(&self, ctx: &AgentContext, credential_id: &CredentialId) -> Result<CredentialRecord, StorageError>;
    async fn list(&self, ctx: &AgentContext) -> Result<Vec<CredentialRecord>, StorageError>;
    async fn delete(&self, ctx: &AgentContext, credential_id: &CredentialId) -> Result<(), StorageError>;
}

/// In-memory session store, keyed per wallet. Good enough for tests and
/// single-process embedders; durable backends implement the same trait.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<(String, SessionId), AuthFlowSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|sessions| sessions.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuthFlowSessionStore for MemorySessionStore {
    async fn store(&self, ctx: &AgentContext, session: &AuthFlowSession) -> Result<(), StorageError> {
        let mut sessions = lock(&self.sessions)?;
        sessions.insert(
            (ctx.wallet_id().to_string(), session.session_id.clone()),
            session.clone(),
        );
        Ok(())
    }

    async fn get(&self, ctx: &AgentContext, session_id: &SessionId) -> Result<AuthFlowSession, StorageError> {
        let sessions = lock(&self.sessions)?;
        sessions
            .get(&(ctx.wallet_id().to_string(), session_id.clone()))
            .cloned()
            .ok_or_else(|| StorageError::SessionNotFound(session_id.clone()))
    }

    async fn delete(&self, ctx: &AgentContext, session_id: &SessionId) -> Result<(), StorageError> {
        let mut sessions = lock(&self.sessions)?;
        sessions.remove(&(ctx.wallet_id().to_string(), session_id.clone()));
        Ok(())
    }

    async fn purge_expired(&self, ctx: &AgentContext, ttl: Duration) -> Result<usize, StorageError> {
        let mut sessions = lock(&self.sessions)?;
        let before = sessions.len();
        sessions.retain(|(wallet_id, _), session| {
            wallet_id.as_str() != ctx.wallet_id() || !session.is_expired(ttl)
        });
        Ok(before - sessions.len())
    }
}

/// In-memory record store. Values are kept in the canonical record JSON so
/// every read exercises the decode path.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<(String, CredentialId), serde_json::Value>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialRecordStore for MemoryRecordStore {
    async fn save(&self, ctx: &AgentContext, record: &CredentialRecord) -> Result<(), StorageError> {
        let mut records = lock(&self.records)?;
        records.insert(
            (ctx.wallet_id().to_string(), record.credential_id()),
            record.to_json(),
        );
        Ok(())
    }

    async fn get(&self, ctx: &AgentContext, credential_id: &CredentialId) -> Result<CredentialRecord, StorageError> {
        let records = lock(&self.records)?;
        let value = records
            .get(&(ctx.wallet_id().to_string(), *credential_id))
            .cloned()
            .ok_or_else(|| StorageError::RecordNotFound(*credential_id))?;
        CredentialRecord::from_json(value).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    async fn list(&self, ctx: &AgentContext) -> Result<Vec<CredentialRecord>, StorageError> {
        let records = lock(&self.records)?;
        records
            .iter()
            .filter(|((wallet_id, _), _)| wallet_id.as_str() == ctx.wallet_id())
            .map(|(_, value)| {
                CredentialRecord::from_json(value.clone()).map_err(|e| StorageError::Corrupt(e.to_string()))
            })
            .collect()
    }

    async fn delete(&self, ctx: &AgentContext, credential_id: &CredentialId) -> Result<(), StorageError> {
        let mut records = lock(&self.records)?;
        records.remove(&(ctx.wallet_id().to_string(), *credential_id));
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, StorageError> {
    mutex.lock().map_err(|_| StorageError::Backend("poisoned lock".to_string()))
}

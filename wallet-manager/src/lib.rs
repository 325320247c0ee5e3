pub mod context;
pub mod local_key_service;
pub mod managers;
pub mod records;
pub mod session;
pub mod storage;

pub use context::AgentContext;
pub use local_key_service::LocalKeyService;
pub use managers::issuance::{AuthFlowInitiation, CredentialOfferMetadata, IssuanceError, IssuanceManager};
pub use managers::presentation::PresentationManager;
pub use records::{CredentialRecord, CredentialState, MdocRecord, SdJwtRecord};
pub use session::{AuthFlowSession, AuthorizationData, ClientOptions, SessionId};
pub use storage::{
    AuthFlowSessionStore, CredentialRecordStore, MemoryRecordStore, MemorySessionStore, StorageError, SESSION_TTL,
};

use serde::{Deserialize, Serialize};

/// Per-wallet context passed explicitly into every store operation. There is
/// no ambient agent state: whoever drives a flow decides which wallet's
/// stores it touches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentContext {
    wallet_id: String,
}

impl AgentContext {
    pub fn new(wallet_id: impl Into<String>) -> Self {
        Self {
            wallet_id: wallet_id.into(),
        }
    }

    pub fn wallet_id(&self) -> &str {
        &self.wallet_id
    }
}

use std::collections::BTreeMap;
use std::time::Duration;

use crate::url::{AgentKind, DEFAULT_AGENT_BASE_URL};

/// Default `userId` carried in stream request payloads.
pub const DEFAULT_USER_ID: &str = "user-001";

/// Transport configuration for agent stream requests.
#[derive(Debug, Clone)]
pub struct AgentApiConfig {
    /// Base URL for agent endpoints.
    pub base_url: String,
    /// Agent flavor selecting endpoint and payload `agentType`.
    pub agent: AgentKind,
    /// `userId` substituted into payloads that leave it empty.
    pub user_id: String,
    /// Optional `session_id` request header value.
    pub session_id: Option<String>,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional request timeout.
    pub timeout: Option<Duration>,
}

impl Default for AgentApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AGENT_BASE_URL.to_string(),
            agent: AgentKind::ReAct,
            user_id: DEFAULT_USER_ID.to_string(),
            session_id: None,
            user_agent: None,
            extra_headers: BTreeMap::new(),
            timeout: None,
        }
    }
}

impl AgentApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_agent(mut self, agent: AgentKind) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.extra_headers.extend(headers);
        self
    }
}

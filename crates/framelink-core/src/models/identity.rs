use std::fmt;

/// Identity the client acts as when talking to the backend.
///
/// Credentials are never printed; `Debug` and `label` only reveal the kind.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `X-API-Key: {key}`
    ApiKey(String),
}

impl Identity {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }

    /// Non-secret label used in cache keys and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Identity::Anonymous => "anonymous",
            Identity::Bearer(_) | Identity::ApiKey(_) => "authenticated",
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Anonymous => f.write_str("Anonymous"),
            Identity::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Identity::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
        }
    }
}

//! Connector configuration types.

/// Default `User-Agent` sent when a request sets none.
pub const DEFAULT_USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

/// Configuration for the [`crate::HyperConnector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// Refuse plain `http://` URLs.
    pub https_only: bool,
    /// Offer HTTP/2 during TLS negotiation.
    pub http2: bool,
    /// `User-Agent` applied when the request does not set one.
    pub user_agent: Option<String>,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            https_only: false,
            http2: true,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
        }
    }
}

impl ConnectorConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ConnectorConfigBuilder {
        ConnectorConfigBuilder::default()
    }
}

/// Builder for [`ConnectorConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConnectorConfigBuilder {
    https_only: Option<bool>,
    http2: Option<bool>,
    user_agent: Option<Option<String>>,
}

impl ConnectorConfigBuilder {
    /// Only allow `https://` URLs.
    #[must_use]
    pub const fn https_only(mut self, https_only: bool) -> Self {
        self.https_only = Some(https_only);
        self
    }

    /// Enable or disable HTTP/2.
    #[must_use]
    pub const fn http2(mut self, http2: bool) -> Self {
        self.http2 = Some(http2);
        self
    }

    /// Set the default `User-Agent`.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(Some(user_agent.into()));
        self
    }

    /// Do not send a default `User-Agent`.
    #[must_use]
    pub fn without_user_agent(mut self) -> Self {
        self.user_agent = Some(None);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ConnectorConfig {
        let defaults = ConnectorConfig::default();
        ConnectorConfig {
            https_only: self.https_only.unwrap_or(defaults.https_only),
            http2: self.http2.unwrap_or(defaults.http2),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        }
    }
}

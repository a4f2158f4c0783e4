//! Bearer token resolution
//!
//! The token can come from the `SOLACE_API_TOKEN` environment variable or
//! from `api.token` in the config file; the environment wins. Running
//! without a token is allowed for unauthenticated deployments.

use solace_application::CredentialProvider;

/// Environment variable consulted before the config file.
pub const TOKEN_ENV: &str = "SOLACE_API_TOKEN";

/// Credential provider resolved once at startup.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    /// Resolve against the process environment, falling back to the
    /// config file value.
    pub fn resolve(config_token: Option<String>) -> Self {
        let env_token = std::env::var(TOKEN_ENV).ok();
        Self::from_sources(env_token, config_token)
    }

    /// Pure precedence rule, split out so it can be tested without
    /// touching the process environment.
    fn from_sources(env_token: Option<String>, config_token: Option<String>) -> Self {
        let token = env_token
            .filter(|t| !t.trim().is_empty())
            .or(config_token)
            .filter(|t| !t.trim().is_empty());
        Self { token }
    }
}

impl CredentialProvider for StaticCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_wins_over_config() {
        let creds =
            StaticCredentials::from_sources(Some("env-token".into()), Some("file-token".into()));
        assert_eq!(creds.bearer_token().as_deref(), Some("env-token"));
    }

    #[test]
    fn config_fills_in_when_environment_is_unset_or_blank() {
        let creds = StaticCredentials::from_sources(None, Some("file-token".into()));
        assert_eq!(creds.bearer_token().as_deref(), Some("file-token"));

        let creds = StaticCredentials::from_sources(Some("  ".into()), Some("file-token".into()));
        assert_eq!(creds.bearer_token().as_deref(), Some("file-token"));
    }

    #[test]
    fn no_source_means_no_token() {
        let creds = StaticCredentials::from_sources(None, Some("   ".into()));
        assert_eq!(creds.bearer_token(), None);
    }
}

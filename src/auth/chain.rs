//! Default credential chain.

use super::{
    AccessToken, AuthError, AzureCliCredential, AzureDeveloperCliCredential, TokenCredential,
};
use async_trait::async_trait;

/// Tries each source in order and returns the first token obtained.
pub struct DefaultCredential {
    sources: Vec<Box<dyn TokenCredential>>,
}

impl DefaultCredential {
    /// Azure CLI, then Azure Developer CLI.
    pub fn new(tenant_id: Option<String>) -> Self {
        Self::from_sources(vec![
            Box::new(AzureCliCredential::new(tenant_id.clone())),
            Box::new(AzureDeveloperCliCredential::new(tenant_id)),
        ])
    }

    pub fn from_sources(sources: Vec<Box<dyn TokenCredential>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl TokenCredential for DefaultCredential {
    fn name(&self) -> &'static str {
        "default credential chain"
    }

    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthError> {
        let mut failures = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            match source.get_token(scope).await {
                Ok(token) => {
                    tracing::debug!(source = source.name(), "Acquired access token");
                    return Ok(token);
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), "Credential source failed: {e}");
                    failures.push(e.to_string());
                }
            }
        }

        Err(AuthError::Exhausted(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenCredential;

    struct Failing;

    #[async_trait]
    impl TokenCredential for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn get_token(&self, _scope: &str) -> Result<AccessToken, AuthError> {
            Err(AuthError::Unavailable {
                source_name: "failing",
                reason: "not signed in".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let chain = DefaultCredential::from_sources(vec![
            Box::new(Failing),
            Box::new(StaticTokenCredential::new("second")),
            Box::new(StaticTokenCredential::new("third")),
        ]);
        let token = chain.get_token("scope").await.unwrap();
        assert_eq!(token.secret(), "second");
    }

    #[tokio::test]
    async fn test_all_failures_reported() {
        let chain = DefaultCredential::from_sources(vec![Box::new(Failing), Box::new(Failing)]);
        let err = chain.get_token("scope").await.unwrap_err();
        match err {
            AuthError::Exhausted(failures) => {
                assert_eq!(failures.len(), 2);
                assert!(failures[0].contains("not signed in"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

use crate::{constants::*, Credential};
use async_trait::async_trait;
use popsign_core::{Context, ProvideCredential, Result};

/// EnvCredentialProvider loads Alibaba Cloud credentials from environment variables.
///
/// This provider looks for the following environment variables:
/// - `ALIBABA_CLOUD_ACCESS_KEY_ID`: The Alibaba Cloud access key ID
/// - `ALIBABA_CLOUD_ACCESS_KEY_SECRET`: The Alibaba Cloud access key secret
/// - `ALIBABA_CLOUD_SECURITY_TOKEN`: The Alibaba Cloud security token (optional)
///
/// Empty values are treated as unset.
#[derive(Debug, Default)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    /// Create a new EnvCredentialProvider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let var = |key: &str| ctx.env_var(key).filter(|v| !v.is_empty());

        match (
            var(ALIBABA_CLOUD_ACCESS_KEY_ID),
            var(ALIBABA_CLOUD_ACCESS_KEY_SECRET),
        ) {
            (Some(access_key_id), Some(access_key_secret)) => Ok(Some(Credential {
                access_key_id,
                access_key_secret,
                security_token: var(ALIBABA_CLOUD_SECURITY_TOKEN),
            })),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use popsign_core::StaticEnv;
    use std::collections::HashMap;

    fn ctx(envs: &[(&str, &str)]) -> Context {
        Context::new().with_env(StaticEnv {
            envs: envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    #[tokio::test]
    async fn test_env_credential_provider() -> anyhow::Result<()> {
        let ctx = ctx(&[
            (ALIBABA_CLOUD_ACCESS_KEY_ID, "test_access_key"),
            (ALIBABA_CLOUD_ACCESS_KEY_SECRET, "test_secret_key"),
        ]);

        let cred = EnvCredentialProvider::new()
            .provide_credential(&ctx)
            .await?
            .expect("credential must be loaded");
        assert_eq!(cred.access_key_id, "test_access_key");
        assert_eq!(cred.access_key_secret, "test_secret_key");
        assert!(cred.security_token.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_env_credential_provider_with_security_token() -> anyhow::Result<()> {
        let ctx = ctx(&[
            (ALIBABA_CLOUD_ACCESS_KEY_ID, "test_access_key"),
            (ALIBABA_CLOUD_ACCESS_KEY_SECRET, "test_secret_key"),
            (ALIBABA_CLOUD_SECURITY_TOKEN, "test_security_token"),
        ]);

        let cred = EnvCredentialProvider::new()
            .provide_credential(&ctx)
            .await?
            .expect("credential must be loaded");
        assert_eq!(cred.security_token.as_deref(), Some("test_security_token"));

        Ok(())
    }

    #[tokio::test]
    async fn test_env_credential_provider_partial_credentials() -> anyhow::Result<()> {
        let provider = EnvCredentialProvider::new();

        let cred = provider
            .provide_credential(&ctx(&[(ALIBABA_CLOUD_ACCESS_KEY_ID, "test_access_key")]))
            .await?;
        assert!(cred.is_none());

        let cred = provider
            .provide_credential(&ctx(&[
                (ALIBABA_CLOUD_ACCESS_KEY_ID, "test_access_key"),
                (ALIBABA_CLOUD_ACCESS_KEY_SECRET, ""),
            ]))
            .await?;
        assert!(cred.is_none());

        let cred = provider
            .provide_credential(&Context::new().with_env(StaticEnv {
                envs: HashMap::new(),
            }))
            .await?;
        assert!(cred.is_none());

        Ok(())
    }
}

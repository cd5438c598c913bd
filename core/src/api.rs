use crate::{Context, Result};
use log::{debug, warn};
use std::fmt::{self, Debug};

/// SigningCredential is the trait used by signer as the signing credential.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check if the credential is valid.
    fn is_valid(&self) -> bool;
}

impl<T: SigningCredential> SigningCredential for Option<T> {
    fn is_valid(&self) -> bool {
        let Some(cred) = self else {
            return false;
        };

        cred.is_valid()
    }
}

/// ProvideCredential is the trait used by signer to load the credential from the environment.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + Unpin + 'static {
    /// Credential returned by this loader.
    type Credential: Send + Sync + Unpin + 'static;

    /// Load signing credential from current env.
    ///
    /// Returns `Ok(None)` when this source has nothing to offer.
    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>>;
}

/// SignRequest is the trait used by signer to turn a request into a signed one.
///
/// The request is taken by value and the signed form is returned, so every
/// request is owned by exactly one stage at a time.
#[async_trait::async_trait]
pub trait SignRequest: Debug + Send + Sync + Unpin + 'static {
    /// Credential used by this signer.
    type Credential: SigningCredential;
    /// Request accepted by this signer.
    type Request: Send + 'static;
    /// Signed request produced by this signer.
    type Signed: Send + 'static;

    /// Whether signing `req` needs a credential at all.
    ///
    /// Anonymous requests return `false` so no credential is loaded for them.
    fn requires_credential(&self, _req: &Self::Request) -> bool {
        true
    }

    /// Sign the request.
    ///
    /// `credential` is `None` only when [`SignRequest::requires_credential`]
    /// returned `false` for this request.
    async fn sign_request(
        &self,
        ctx: &Context,
        req: Self::Request,
        credential: Option<&Self::Credential>,
    ) -> Result<Self::Signed>;
}

/// ProvideCredentialChain tries a list of credential providers in order.
///
/// The first provider that returns `Some` wins. Errors from a provider are
/// logged and the next provider is tried.
pub struct ProvideCredentialChain<C> {
    providers: Vec<Box<dyn ProvideCredential<Credential = C>>>,
}

impl<C> Debug for ProvideCredentialChain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvideCredentialChain")
            .field("providers", &self.providers)
            .finish()
    }
}

impl<C> Default for ProvideCredentialChain<C>
where
    C: Send + Sync + Unpin + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ProvideCredentialChain<C>
where
    C: Send + Sync + Unpin + 'static,
{
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Append a provider to the end of the chain.
    pub fn push(mut self, provider: impl ProvideCredential<Credential = C>) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Insert a provider at the front of the chain.
    pub fn push_front(mut self, provider: impl ProvideCredential<Credential = C>) -> Self {
        self.providers.insert(0, Box::new(provider));
        self
    }

    /// Number of providers in the chain.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the chain has no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait::async_trait]
impl<C> ProvideCredential for ProvideCredentialChain<C>
where
    C: Send + Sync + Unpin + 'static,
{
    type Credential = C;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        for provider in &self.providers {
            debug!("trying credential provider: {provider:?}");
            match provider.provide_credential(ctx).await {
                Ok(Some(cred)) => {
                    debug!("loaded credential from provider: {provider:?}");
                    return Ok(Some(cred));
                }
                Ok(None) => continue,
                Err(err) => {
                    warn!("credential provider {provider:?} failed, skipped: {err}");
                    continue;
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[derive(Debug)]
    struct Fixed(Option<&'static str>);

    #[async_trait::async_trait]
    impl ProvideCredential for Fixed {
        type Credential = String;

        async fn provide_credential(&self, _: &Context) -> Result<Option<String>> {
            Ok(self.0.map(|v| v.to_string()))
        }
    }

    #[derive(Debug)]
    struct Broken;

    #[async_trait::async_trait]
    impl ProvideCredential for Broken {
        type Credential = String;

        async fn provide_credential(&self, _: &Context) -> Result<Option<String>> {
            Err(Error::credential_denied("permission denied"))
        }
    }

    #[tokio::test]
    async fn test_chain_first_some_wins() -> Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        let chain = ProvideCredentialChain::new()
            .push(Fixed(None))
            .push(Broken)
            .push(Fixed(Some("second")))
            .push(Fixed(Some("third")));
        assert_eq!(chain.len(), 4);

        let cred = chain.provide_credential(&Context::new()).await?;
        assert_eq!(cred.as_deref(), Some("second"));
        Ok(())
    }

    #[tokio::test]
    async fn test_chain_push_front() -> Result<()> {
        let chain = ProvideCredentialChain::new()
            .push(Fixed(Some("default")))
            .push_front(Fixed(Some("override")));

        let cred = chain.provide_credential(&Context::new()).await?;
        assert_eq!(cred.as_deref(), Some("override"));
        Ok(())
    }

    /// Credential type that has no `Debug` impl.
    struct Opaque;

    #[derive(Debug)]
    struct OpaqueProvider;

    #[async_trait::async_trait]
    impl ProvideCredential for OpaqueProvider {
        type Credential = Opaque;

        async fn provide_credential(&self, _: &Context) -> Result<Option<Opaque>> {
            Ok(Some(Opaque))
        }
    }

    #[tokio::test]
    async fn test_chain_debug_without_debug_credential() -> Result<()> {
        let chain = ProvideCredentialChain::new().push(OpaqueProvider);
        assert_eq!(
            format!("{chain:?}"),
            "ProvideCredentialChain { providers: [OpaqueProvider] }"
        );
        assert!(chain.provide_credential(&Context::new()).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_chain() -> Result<()> {
        let chain: ProvideCredentialChain<String> = ProvideCredentialChain::default();
        assert!(chain.is_empty());
        assert_eq!(chain.provide_credential(&Context::new()).await?, None);
        Ok(())
    }
}

use crate::{Context, Error, ProvideCredential, Result, SignRequest, SigningCredential};
use std::sync::Arc;

/// Signer is the main struct used to sign the request.
///
/// A credential is loaded for every request that needs one; nothing signed
/// for one request is kept around for the next.
#[derive(Debug)]
pub struct Signer<S: SignRequest> {
    ctx: Context,
    loader: Arc<dyn ProvideCredential<Credential = S::Credential>>,
    builder: Arc<S>,
}

impl<S: SignRequest> Clone for Signer<S> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            loader: self.loader.clone(),
            builder: self.builder.clone(),
        }
    }
}

impl<S: SignRequest> Signer<S> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        loader: impl ProvideCredential<Credential = S::Credential>,
        builder: S,
    ) -> Self {
        Self {
            ctx,
            loader: Arc::new(loader),
            builder: Arc::new(builder),
        }
    }

    /// The context this signer runs with.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Signing request.
    pub async fn sign(&self, req: S::Request) -> Result<S::Signed> {
        if !self.builder.requires_credential(&req) {
            return self.builder.sign_request(&self.ctx, req, None).await;
        }

        let cred = self
            .loader
            .provide_credential(&self.ctx)
            .await?
            .ok_or_else(|| Error::credential_invalid("no credential found for signing"))?;
        if !cred.is_valid() {
            return Err(Error::credential_invalid(
                "loaded credential is not valid for signing",
            ));
        }

        self.builder.sign_request(&self.ctx, req, Some(&cred)).await
    }
}

use crate::request::{ApiRequest, SignedRequest};
use crate::response::{decode_response, ApiResponse};
use crate::{Config, Credential, RequestSigner};
use log::debug;
use popsign_core::{Context, ProvideCredential, Result, Signer};

/// Client runs the full call pipeline: sign, send, decode.
///
/// The transport is the [`HttpSend`](popsign_core::HttpSend) configured in
/// the [`Context`].
#[derive(Debug, Clone)]
pub struct Client {
    signer: Signer<RequestSigner>,
}

impl Client {
    /// Create a new client.
    pub fn new(
        ctx: Context,
        config: Config,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Self {
        Self::with_signer(Signer::new(ctx, provider, RequestSigner::new(config)))
    }

    /// Create a client from an existing signer.
    pub fn with_signer(signer: Signer<RequestSigner>) -> Self {
        Self { signer }
    }

    /// Sign the request without sending it.
    pub async fn sign(&self, req: ApiRequest) -> Result<SignedRequest> {
        self.signer.sign(req).await
    }

    /// Sign and send the request, then decode the response.
    pub async fn call(&self, req: ApiRequest) -> Result<ApiResponse> {
        let action = req.action.clone();
        let signed = self.sign(req).await?;
        let body_type = signed.body_type;

        let resp = self.signer.context().http_send(signed.into_http()?).await?;
        debug!("{action} responded with status {}", resp.status());

        decode_response(body_type, resp)
    }
}

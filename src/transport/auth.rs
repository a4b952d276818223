//! Credential-grant exchange against the configured token endpoint.

use serde::Deserialize;
use url::form_urlencoded;

use crate::config::Credentials;

use super::exec::HttpExec;
use super::{TransportError, TransportResult};

#[derive(Debug, Deserialize)]
struct TokenReply {
    token_type: String,
    access_token: String,
}

/// Run the client-credentials grant and return the bearer header value
/// (`"<token_type> <access_token>"`).
pub(super) async fn refresh(
    exec: &dyn HttpExec,
    credentials: &Credentials,
) -> TransportResult<String> {
    let body = form_urlencoded::Serializer::new(String::new())
        .append_pair("grant_type", "client_credentials")
        .append_pair("client_id", &credentials.client_id)
        .append_pair("client_secret", &credentials.client_secret)
        .append_pair("scope", &credentials.scopes)
        .finish();

    let reply = exec.post_form(&credentials.token_url, &body).await?;
    if reply.status != 200 {
        return Err(TransportError::Status(reply.status));
    }
    let token: TokenReply = serde_json::from_str(&reply.body)?;
    Ok(format!("{} {}", token.token_type, token.access_token))
}

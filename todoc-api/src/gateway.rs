use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use todoc_session::SessionStore;

use crate::endpoints::auth::{AUTH_PATH, RefreshToken, TokenResponse};
use crate::error::ApiError;
use crate::request::{Request, RequestData, Upload, query_pairs};
use crate::transport::{
    Body, HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError,
};

/// Single egress point for all backend calls.
///
/// Attaches the bearer token held by the [`SessionStore`], turns non-2xx
/// responses into [`ApiError::Server`], and logs the session out when the
/// server rejects the token.
pub struct Gateway {
    base_url: String,
    session: Arc<SessionStore>,
    transport: Arc<dyn Transport>,
    silent_refresh: bool,
}

impl Gateway {
    pub fn new(base_url: impl Into<String>, session: Arc<SessionStore>) -> Self {
        Self::with_transport(base_url, session, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(
        base_url: impl Into<String>,
        session: Arc<SessionStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            session,
            transport,
            silent_refresh: false,
        }
    }

    /// On 401, try the stored refresh token once before logging out
    pub fn silent_refresh(mut self, enabled: bool) -> Self {
        self.silent_refresh = enabled;
        self
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a typed endpoint request
    pub async fn send<R>(&self, request: R) -> Result<R::Response, ApiError>
    where
        R: Request,
    {
        let endpoint = request.endpoint();

        let (body, query) = match request.data() {
            RequestData::Empty => (Body::Empty, Vec::new()),
            RequestData::Query(data) => (Body::Empty, query_pairs(data).map_err(encode_error)?),
            RequestData::Json(data) => (Body::json(data).map_err(encode_error)?, Vec::new()),
            RequestData::Multipart(upload) => (Body::Multipart(upload), Vec::new()),
        };

        self.request(R::METHOD, &endpoint, body, &query).await
    }

    pub async fn get<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let query: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.request(Method::GET, path, Body::Empty, &query).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = Body::json(body).map_err(encode_error)?;
        self.request(Method::POST, path, body, &[]).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = Body::json(body).map_err(encode_error)?;
        self.request(Method::PUT, path, body, &[]).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = Body::json(body).map_err(encode_error)?;
        self.request(Method::PATCH, path, body, &[]).await
    }

    pub async fn delete<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::DELETE, path, Body::Empty, &[]).await
    }

    /// Multipart file upload; same auth and error handling as JSON calls
    pub async fn upload<T>(&self, path: &str, upload: Upload) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Body::Multipart(upload), &[])
            .await
    }

    /// The request primitive every other call goes through
    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Body,
        query: &[(String, String)],
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path, query)?;
        let mut sent_token = self.session.token();

        let mut response = self
            .dispatch(&method, &url, &body, sent_token.as_ref())
            .await?;

        if response.status == StatusCode::UNAUTHORIZED {
            if let Some(refreshed) = self.try_refresh(path, sent_token.as_ref()).await {
                tracing::debug!(%method, %url, "Retrying with refreshed token");
                response = self
                    .dispatch(&method, &url, &body, Some(&refreshed))
                    .await?;
                sent_token = Some(refreshed);
            }
        }

        if response.status == StatusCode::UNAUTHORIZED {
            self.force_logout(sent_token.as_ref());
        }

        decode_response(response)
    }

    fn url(&self, path: &str, query: &[(String, String)]) -> Result<Url, ApiError> {
        let separator = if path.starts_with('/') { "" } else { "/" };
        let raw = format!("{}{}{}", self.base_url, separator, path);

        let mut url = Url::parse(&raw)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid URL '{}': {}", raw, e)))?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }

        Ok(url)
    }

    async fn dispatch(
        &self,
        method: &Method,
        url: &Url,
        body: &Body,
        token: Option<&SecretString>,
    ) -> Result<HttpResponse, ApiError> {
        let mut headers = HeaderMap::new();

        if !body.is_multipart() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|_| {
                    ApiError::InvalidRequest("access token is not a valid header value".into())
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        tracing::debug!(%method, %url, "Sending request");

        let request = HttpRequest {
            method: method.clone(),
            url: url.clone(),
            headers,
            body: body.clone(),
        };

        let response = self.transport.execute(request).await.map_err(|e| match e {
            TransportError::InvalidRequest(message) => {
                tracing::warn!(%method, %url, "Request not sent: {}", message);
                ApiError::InvalidRequest(message)
            }
            e => {
                tracing::warn!(%method, %url, "Request failed without a response: {}", e);
                ApiError::Network(e)
            }
        })?;

        tracing::debug!(%method, %url, status = %response.status, "Received response");
        Ok(response)
    }

    /// Mint a new access token from the refresh token of the session that
    /// sent the rejected request.
    ///
    /// Returns `None` when refresh is disabled or not applicable, when it
    /// fails, or when that session was replaced in the meantime.
    async fn try_refresh(
        &self,
        path: &str,
        sent_token: Option<&SecretString>,
    ) -> Option<SecretString> {
        if !self.silent_refresh || path.starts_with(AUTH_PATH) {
            return None;
        }

        let sent = sent_token.map(|t| t.expose_secret());
        let Some(refresh_token) = self.session.refresh_token_for(sent) else {
            tracing::debug!("No refresh token for the session that sent the request");
            return None;
        };
        let request = RefreshToken::new(refresh_token.expose_secret());

        let body = Body::json(&request).ok()?;
        let url = self.url(&request.endpoint(), &[]).ok()?;

        let response = match self.dispatch(&Method::POST, &url, &body, None).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                return None;
            }
        };

        let tokens: TokenResponse = match decode_response(response) {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!("Token refresh rejected: {}", e);
                return None;
            }
        };

        match self.session.renew(sent, tokens) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                tracing::error!("Failed to store refreshed token: {}", e);
                return None;
            }
        }

        tracing::info!("Access token refreshed");
        self.session.token()
    }

    fn force_logout(&self, sent_token: Option<&SecretString>) {
        let sent = sent_token.map(|t| t.expose_secret());
        if let Err(e) = self.session.expire(sent) {
            tracing::error!("Failed to clear session after 401: {}", e);
        }
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .field("silent_refresh", &self.silent_refresh)
            .finish_non_exhaustive()
    }
}

fn encode_error(err: serde_json::Error) -> ApiError {
    ApiError::InvalidRequest(format!("failed to encode payload: {}", err))
}

/// Map a raw response onto the success/failure envelope.
///
/// An empty 2xx body decodes as `{}`. Non-2xx bodies are searched for a
/// string `detail` field.
pub(crate) fn decode_response<T>(response: HttpResponse) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let status = response.status;

    if status.is_success() {
        let body: &[u8] = if response.body.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &response.body
        };
        return serde_json::from_slice(body).map_err(|source| ApiError::Decode { status, source });
    }

    let message = serde_json::from_slice::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|value| value.get("detail")?.as_str().map(str::to_owned))
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));

    tracing::debug!(status = status.as_u16(), "Server returned error: {}", message);
    Err(ApiError::Server { status, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::EmptyResponse;
    use serde_json::{Value, json};

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse::new(StatusCode::from_u16(status).unwrap(), body.as_bytes())
    }

    #[test]
    fn test_empty_success_body_is_empty_object() {
        let value: Value = decode_response(response(200, "")).unwrap();
        assert_eq!(value, json!({}));

        let value: Value = decode_response(response(204, "  \n")).unwrap();
        assert_eq!(value, json!({}));

        let empty: EmptyResponse = decode_response(response(204, "")).unwrap();
        assert_eq!(empty, EmptyResponse {});
    }

    #[test]
    fn test_success_body_is_decoded() {
        let value: Value = decode_response(response(201, r#"{"id":7,"name":"Kid"}"#)).unwrap();
        assert_eq!(value, json!({"id": 7, "name": "Kid"}));
    }

    #[test]
    fn test_detail_becomes_message() {
        let err = decode_response::<Value>(response(404, r#"{"detail":"Kid not found"}"#))
            .unwrap_err();
        assert_eq!(err.status(), 404);
        assert_eq!(err.message(), "Kid not found");
    }

    #[test]
    fn test_missing_or_non_string_detail_falls_back() {
        let err = decode_response::<Value>(response(500, "Internal Server Error")).unwrap_err();
        assert_eq!(err.message(), "HTTP error! status: 500");

        let err = decode_response::<Value>(response(502, "")).unwrap_err();
        assert_eq!(err.message(), "HTTP error! status: 502");

        // FastAPI validation errors carry a list in `detail`
        let err = decode_response::<Value>(response(422, r#"{"detail":[{"msg":"bad"}]}"#))
            .unwrap_err();
        assert_eq!(err.status(), 422);
        assert_eq!(err.message(), "HTTP error! status: 422");
    }

    #[test]
    fn test_mismatched_success_body_is_decode_error() {
        #[derive(Debug, serde::Deserialize)]
        struct Kid {
            #[allow(dead_code)]
            id: i64,
        }

        let err = decode_response::<Kid>(response(200, r#"{"name":"no id"}"#)).unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
        assert_eq!(err.status(), 200);
    }
}

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::request::Upload;

#[derive(Debug, Clone)]
pub enum Body {
    Empty,
    Json(Vec<u8>),
    Multipart(Upload),
}

impl Body {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Body::Json(serde_json::to_vec(value)?))
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Body::Multipart(_))
    }
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Body,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Failure to get any HTTP response at all
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request could not be turned into HTTP; nothing was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Other(String),
}

/// Moves one request over the wire and hands back the raw response.
///
/// Status handling, authentication and decoding belong to the gateway; a
/// transport only fails when no response was received.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

pub struct ReqwestTransport {
    http_client: Client,
}

impl ReqwestTransport {
    /// Transport without a request timeout
    pub fn new() -> Self {
        Self {
            http_client: Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let builder = self
            .http_client
            .request(request.method, request.url)
            .headers(request.headers);

        // Multipart leaves Content-Type to reqwest so the boundary is set
        let builder = match request.body {
            Body::Empty => builder,
            Body::Json(bytes) => builder.body(bytes),
            Body::Multipart(upload) => builder.multipart(multipart_form(upload)?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse { status, body })
    }
}

fn multipart_form(upload: Upload) -> Result<Form, TransportError> {
    let part = Part::bytes(upload.bytes)
        .file_name(upload.file_name)
        .mime_str(&upload.content_type)
        .map_err(|_| {
            TransportError::InvalidRequest(format!(
                "invalid content type '{}'",
                upload.content_type
            ))
        })?;
    Ok(Form::new().part(upload.field_name, part))
}

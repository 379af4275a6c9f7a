use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::protocol::CompileRequest;
use tracing::{debug, warn};
use url::Url;

use crate::{config::ClientSettings, error::TransportError, session::Session};

pub const CONFIG_PATH: &str = "api/compiler/config";
pub const COMPILE_PATH: &str = "api/compiler/compile";
pub const EXECUTE_PATH: &str = "api/compiler/execute";

/// Remote operations of the compiler service, each returning the raw reply body.
#[async_trait]
pub trait CompilerApi: Send + Sync {
    async fn fetch_config(&self) -> Result<String, TransportError>;
    async fn compile(&self, request: &CompileRequest) -> Result<String, TransportError>;
    async fn execute(&self, request: &CompileRequest) -> Result<String, TransportError>;
}

/// Snapshot the parts of a session the service needs.
///
/// Options travel only for languages that accept custom arguments, and only
/// when the user left something in the field.
pub fn build_request(session: &Session) -> CompileRequest {
    let compiler_options = (session.language.allow_custom_args && !session.options.is_empty())
        .then(|| session.options.clone());

    CompileRequest {
        language: session.language.id.clone(),
        code: session.source.clone(),
        compiler_id: session.compiler.id.clone(),
        compiler_options,
    }
}

#[derive(Debug, Clone)]
struct Endpoints {
    config: Url,
    compile: Url,
    execute: Url,
}

impl Endpoints {
    fn new(server_url: &str) -> Result<Self, TransportError> {
        let mut base = Url::parse(server_url.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            config: base.join(CONFIG_PATH)?,
            compile: base.join(COMPILE_PATH)?,
            execute: base.join(EXECUTE_PATH)?,
        })
    }
}

/// HTTP side of the compiler service. One call per request, no retries.
#[derive(Debug, Clone)]
pub struct RequestDispatcher {
    http: Client,
    endpoints: Endpoints,
}

impl RequestDispatcher {
    pub fn new(server_url: &str) -> Result<Self, TransportError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(TransportError::Client)?;
        Self::with_client(http, &settings.server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, TransportError> {
        Ok(Self {
            http,
            endpoints: Endpoints::new(server_url)?,
        })
    }

    pub fn compile_url(&self) -> &Url {
        &self.endpoints.compile
    }

    pub async fn send_compile(&self, request: &CompileRequest) -> Result<String, TransportError> {
        self.post(&self.endpoints.compile, request).await
    }

    pub async fn send_execute(&self, request: &CompileRequest) -> Result<String, TransportError> {
        self.post(&self.endpoints.execute, request).await
    }

    async fn post(&self, url: &Url, request: &CompileRequest) -> Result<String, TransportError> {
        debug!(
            url = %url,
            language = %request.language,
            compiler = %request.compiler_id,
            has_options = request.compiler_options.is_some(),
            "sending compiler request"
        );
        let response = self
            .http
            .post(url.clone())
            .json(request)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;
        read_body(url, response).await
    }
}

async fn read_body(url: &Url, response: Response) -> Result<String, TransportError> {
    let status = response.status();
    if !status.is_success() {
        warn!(url = %url, status = %status, "compiler service rejected request");
        return Err(TransportError::Status {
            status,
            url: url.to_string(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;
    debug!(url = %url, bytes = body.len(), "received compiler reply");
    Ok(body)
}

#[async_trait]
impl CompilerApi for RequestDispatcher {
    async fn fetch_config(&self) -> Result<String, TransportError> {
        let url = &self.endpoints.config;
        debug!(url = %url, "fetching compiler catalog");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;
        read_body(url, response).await
    }

    async fn compile(&self, request: &CompileRequest) -> Result<String, TransportError> {
        self.send_compile(request).await
    }

    async fn execute(&self, request: &CompileRequest) -> Result<String, TransportError> {
        self.send_execute(request).await
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;

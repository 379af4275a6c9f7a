use std::collections::VecDeque;

use async_trait::async_trait;
use reqwest::StatusCode;
use shared::protocol::CompileRequest;
use tokio::sync::{oneshot, Mutex};

use crate::{dispatcher::CompilerApi, error::TransportError};

pub(crate) const JAVA_CPP_CATALOG: &str = r#"{
    "languages": [
        {
            "id": "java",
            "name": "Java",
            "extension": "java",
            "allowCustomArgs": false,
            "defaultCode": "public class Main {}",
            "compilers": [
                { "id": "javac", "name": "javac", "path": "/usr/bin/javac", "version": "21", "defaultArgs": "-g" }
            ]
        },
        {
            "id": "cpp",
            "name": "C++",
            "extension": "cpp",
            "allowCustomArgs": true,
            "defaultCode": "int main() {}",
            "compilers": [
                { "id": "gcc", "name": "GCC", "path": "/usr/bin/g++", "version": "13", "defaultArgs": "-O2", "default": true },
                { "id": "msvc", "name": "MSVC", "path": "cl.exe", "version": "19", "defaultArgs": "/O2 /EHsc" }
            ]
        }
    ]
}"#;

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Body(String),
    Status(StatusCode),
}

impl Reply {
    pub(crate) fn body(body: &str) -> Self {
        Reply::Body(body.to_string())
    }

    fn into_result(self, path: &str) -> Result<String, TransportError> {
        match self {
            Reply::Body(body) => Ok(body),
            Reply::Status(status) => Err(TransportError::Status {
                status,
                url: format!("http://compiler.test/{path}"),
            }),
        }
    }
}

/// In-process compiler service with queued replies and call recording.
pub(crate) struct ScriptedApi {
    pub(crate) config_reply: Mutex<Reply>,
    pub(crate) compile_replies: Mutex<VecDeque<Reply>>,
    pub(crate) execute_replies: Mutex<VecDeque<Reply>>,
    pub(crate) compile_calls: Mutex<Vec<CompileRequest>>,
    pub(crate) execute_calls: Mutex<Vec<CompileRequest>>,
    compile_entered: Mutex<Option<oneshot::Sender<()>>>,
    compile_release: Mutex<Option<oneshot::Receiver<()>>>,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self {
            config_reply: Mutex::new(Reply::body(JAVA_CPP_CATALOG)),
            compile_replies: Mutex::new(VecDeque::new()),
            execute_replies: Mutex::new(VecDeque::new()),
            compile_calls: Mutex::new(Vec::new()),
            execute_calls: Mutex::new(Vec::new()),
            compile_entered: Mutex::new(None),
            compile_release: Mutex::new(None),
        }
    }

    /// The first compile call signals `entered` and then waits for `release`.
    pub(crate) fn gated() -> (Self, oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let api = Self::new();
        *api.compile_entered.try_lock().expect("fresh mutex") = Some(entered_tx);
        *api.compile_release.try_lock().expect("fresh mutex") = Some(release_rx);
        (api, entered_rx, release_tx)
    }

    pub(crate) fn with_compile_replies(self, replies: Vec<Reply>) -> Self {
        *self.compile_replies.try_lock().expect("fresh mutex") = replies.into();
        self
    }

    pub(crate) fn with_execute_replies(self, replies: Vec<Reply>) -> Self {
        *self.execute_replies.try_lock().expect("fresh mutex") = replies.into();
        self
    }

    pub(crate) async fn compile_count(&self) -> usize {
        self.compile_calls.lock().await.len()
    }

    pub(crate) async fn execute_count(&self) -> usize {
        self.execute_calls.lock().await.len()
    }
}

#[async_trait]
impl CompilerApi for ScriptedApi {
    async fn fetch_config(&self) -> Result<String, TransportError> {
        self.config_reply
            .lock()
            .await
            .clone()
            .into_result("api/compiler/config")
    }

    async fn compile(&self, request: &CompileRequest) -> Result<String, TransportError> {
        self.compile_calls.lock().await.push(request.clone());

        if let Some(entered) = self.compile_entered.lock().await.take() {
            let _ = entered.send(());
        }
        let release = self.compile_release.lock().await.take();
        if let Some(release) = release {
            let _ = release.await;
        }

        self.compile_replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Reply::body(r#"{"assemblyOutput":"compiled"}"#))
            .into_result("api/compiler/compile")
    }

    async fn execute(&self, request: &CompileRequest) -> Result<String, TransportError> {
        self.execute_calls.lock().await.push(request.clone());
        self.execute_replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Reply::body(r#"{"output":"42"}"#))
            .into_result("api/compiler/execute")
    }
}

//! Session state and the compile -> execute state machine.
//!
//! The controller owns a single [`Session`] behind a mutex. Every remote call
//! works on a [`CompileRequest`] captured while the lock is held, so edits made
//! while a call is in flight never leak into the request already sent.
//!
//! The remote part of a compile or execute runs on its own task. A caller that
//! stops waiting (timeout, `select!`, abort) does not cancel it, and the
//! session still settles back to [`ControllerState::Idle`].

use std::sync::Arc;

use shared::{
    domain::{CompilerConfigModel, CompilerId, CompilerInfo, LanguageConfig, LanguageId},
    error::CatalogError,
    protocol::{CompileRequest, CompileResult},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    config_store::ConfigStore,
    dispatcher::{build_request, CompilerApi},
    error::ConfigLoadError,
    normalizer::{normalize, UNKNOWN_ERROR},
};

pub const OUTPUT_PLACEHOLDER: &str = "Compilation output will appear here...";
pub const EMPTY_COMPILE_OUTPUT: &str = "Compilation successful but no output generated.";
pub const EMPTY_EXECUTION_OUTPUT: &str = "Program finished without output.";
const COMPILE_ERROR_PREFIX: &str = "Error: ";
const EXECUTION_ERROR_PREFIX: &str = "Execution Error: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Compiling,
    CompilingThenExecuting,
    Executing,
}

impl ControllerState {
    pub fn is_busy(self) -> bool {
        self != ControllerState::Idle
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub language: LanguageConfig,
    pub compiler: CompilerInfo,
    pub options: String,
    pub source: String,
    pub compile_output: String,
    pub execution_output: Option<String>,
    pub execution_view: bool,
    pub state: ControllerState,
    /// Source text of the last successful compile.
    last_compiled: Option<String>,
}

impl Session {
    /// Session positioned on the catalog's first language and its default compiler.
    pub fn from_catalog(catalog: &CompilerConfigModel) -> Result<Self, CatalogError> {
        let language = catalog.default_language();
        let compiler = language
            .default_compiler()
            .ok_or_else(|| CatalogError::NoCompilers {
                language: language.id.to_string(),
            })?;

        Ok(Self {
            language: language.clone(),
            compiler: compiler.clone(),
            options: compiler.default_args.clone(),
            source: language.default_source().to_string(),
            compile_output: OUTPUT_PLACEHOLDER.to_string(),
            execution_output: None,
            execution_view: false,
            state: ControllerState::Idle,
            last_compiled: None,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// Source text of the last successful compile, if the dedup cache is primed.
    pub fn last_compiled_source(&self) -> Option<&str> {
        self.last_compiled.as_deref()
    }

    fn apply_language(&mut self, language: &LanguageConfig, compiler: &CompilerInfo) {
        self.language = language.clone();
        self.compiler = compiler.clone();
        self.options = compiler.default_args.clone();
        self.source = language.default_source().to_string();
        self.compile_output = OUTPUT_PLACEHOLDER.to_string();
        self.execution_output = None;
        self.last_compiled = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    StateChanged(ControllerState),
    LanguageSelected {
        language: LanguageId,
        compiler: CompilerId,
    },
    CompilerSelected {
        compiler: CompilerId,
    },
    OptionsChanged(String),
    SourceChanged,
    ExecutionViewToggled(bool),
    CompileOutputUpdated(String),
    ExecutionOutputUpdated(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Busy,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Skipped(SkipReason),
    Finished {
        compile: Option<CompileResult>,
        execution: Option<CompileResult>,
    },
    /// The task running the remote call ended without reporting back.
    Interrupted,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Compile,
    Execute,
}

pub struct SessionController {
    api: Arc<dyn CompilerApi>,
    catalog: Arc<CompilerConfigModel>,
    inner: Mutex<Session>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(
        catalog: Arc<CompilerConfigModel>,
        api: Arc<dyn CompilerApi>,
    ) -> Result<Arc<Self>, CatalogError> {
        let session = Session::from_catalog(&catalog)?;
        let (events, _) = broadcast::channel(256);
        info!(
            language = %session.language.id,
            compiler = %session.compiler.id,
            "compiler session started"
        );
        Ok(Arc::new(Self {
            api,
            catalog,
            inner: Mutex::new(session),
            events,
        }))
    }

    /// Starts a session from an already loaded store.
    pub async fn start(
        store: &ConfigStore,
        api: Arc<dyn CompilerApi>,
    ) -> Result<Arc<Self>, ConfigLoadError> {
        let catalog = store.catalog().await.ok_or(ConfigLoadError::NotLoaded)?;
        Ok(Self::new(catalog, api)?)
    }

    pub fn catalog(&self) -> &CompilerConfigModel {
        &self.catalog
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> Session {
        self.inner.lock().await.clone()
    }

    pub async fn state(&self) -> ControllerState {
        self.inner.lock().await.state
    }

    /// Returns `false` when the id is unknown or a compile/execute chain is running.
    pub async fn select_language(&self, id: &str) -> bool {
        let Some(language) = self.catalog.language(id) else {
            debug!(language = id, "ignoring unknown language");
            return false;
        };
        let Some(compiler) = language.default_compiler() else {
            warn!(language = id, "language has no compilers");
            return false;
        };

        let mut session = self.inner.lock().await;
        if session.is_busy() {
            debug!(language = id, state = ?session.state, "ignoring language change while busy");
            return false;
        }

        session.apply_language(language, compiler);
        info!(language = %language.id, compiler = %compiler.id, "language selected");
        self.emit(SessionEvent::LanguageSelected {
            language: language.id.clone(),
            compiler: compiler.id.clone(),
        });
        self.emit(SessionEvent::CompileOutputUpdated(
            session.compile_output.clone(),
        ));
        self.emit(SessionEvent::ExecutionOutputUpdated(None));
        true
    }

    /// Returns `false` when the id is not a compiler of the selected language.
    pub async fn select_compiler(&self, id: &str) -> bool {
        let mut session = self.inner.lock().await;
        let Some(compiler) = session.language.compiler(id).cloned() else {
            debug!(
                language = %session.language.id,
                compiler = id,
                "ignoring compiler outside selected language"
            );
            return false;
        };

        session.options = compiler.default_args.clone();
        info!(compiler = %compiler.id, "compiler selected");
        self.emit(SessionEvent::CompilerSelected {
            compiler: compiler.id.clone(),
        });
        session.compiler = compiler;
        true
    }

    pub async fn set_options(&self, text: impl Into<String>) {
        let mut session = self.inner.lock().await;
        session.options = text.into();
        self.emit(SessionEvent::OptionsChanged(session.options.clone()));
    }

    pub async fn set_source_text(&self, text: impl Into<String>) {
        self.inner.lock().await.source = text.into();
        self.emit(SessionEvent::SourceChanged);
    }

    pub async fn toggle_execution_view(&self, enabled: bool) {
        let mut session = self.inner.lock().await;
        if session.execution_view != enabled {
            session.execution_view = enabled;
            self.emit(SessionEvent::ExecutionViewToggled(enabled));
        }
    }

    /// Compiles the current source and, with the execution view on, runs it.
    ///
    /// Skipped while another chain is in flight or when the source text equals
    /// the last successfully compiled one.
    pub async fn compile(self: &Arc<Self>) -> RunOutcome {
        let (request, chain) = {
            let mut session = self.inner.lock().await;
            if session.is_busy() {
                debug!(state = ?session.state, "ignoring compile while busy");
                return RunOutcome::Skipped(SkipReason::Busy);
            }

            let request = build_request(&session);
            if session.last_compiled.as_deref() == Some(request.code.as_str()) {
                debug!(language = %request.language, "source unchanged since last compile");
                return RunOutcome::Skipped(SkipReason::Unchanged);
            }

            let chain = session.execution_view;
            let next = if chain {
                ControllerState::CompilingThenExecuting
            } else {
                ControllerState::Compiling
            };
            self.transition(&mut session, next);
            (request, chain)
        };

        let controller = Arc::clone(self);
        let flight = tokio::spawn(async move { controller.run_compile(request, chain).await });
        self.settle(flight).await
    }

    async fn run_compile(&self, request: CompileRequest, chain: bool) -> RunOutcome {
        let compile = self.call(Operation::Compile, &request).await;

        let run_execute = {
            let mut session = self.inner.lock().await;
            if compile.success {
                session.compile_output = compile
                    .output
                    .clone()
                    .filter(|output| !output.is_empty())
                    .unwrap_or_else(|| EMPTY_COMPILE_OUTPUT.to_string());
                session.last_compiled = Some(request.code.clone());
            } else {
                let error = compile.error.as_deref().unwrap_or(UNKNOWN_ERROR);
                session.compile_output = format!("{COMPILE_ERROR_PREFIX}{error}");
                session.execution_output = None;
                self.emit(SessionEvent::ExecutionOutputUpdated(None));
            }
            self.emit(SessionEvent::CompileOutputUpdated(
                session.compile_output.clone(),
            ));

            let run_execute = compile.success && chain;
            let next = if run_execute {
                ControllerState::Executing
            } else {
                ControllerState::Idle
            };
            self.transition(&mut session, next);
            run_execute
        };

        let execution = if run_execute {
            Some(self.finish_execute(&request).await)
        } else {
            None
        };

        RunOutcome::Finished {
            compile: Some(compile),
            execution,
        }
    }

    /// Runs the current source without consulting the dedup cache.
    pub async fn execute(self: &Arc<Self>) -> RunOutcome {
        let request = {
            let mut session = self.inner.lock().await;
            if session.is_busy() {
                debug!(state = ?session.state, "ignoring execute while busy");
                return RunOutcome::Skipped(SkipReason::Busy);
            }
            self.transition(&mut session, ControllerState::Executing);
            build_request(&session)
        };

        let controller = Arc::clone(self);
        let flight = tokio::spawn(async move {
            let execution = controller.finish_execute(&request).await;
            RunOutcome::Finished {
                compile: None,
                execution: Some(execution),
            }
        });
        self.settle(flight).await
    }

    /// Waits for a spawned chain; a chain that died mid-flight still leaves the session idle.
    async fn settle(&self, flight: JoinHandle<RunOutcome>) -> RunOutcome {
        match flight.await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "compiler call task ended abnormally");
                let mut session = self.inner.lock().await;
                self.transition(&mut session, ControllerState::Idle);
                RunOutcome::Interrupted
            }
        }
    }

    async fn finish_execute(&self, request: &CompileRequest) -> CompileResult {
        let execution = self.call(Operation::Execute, request).await;

        let mut session = self.inner.lock().await;
        let display = if execution.success {
            execution
                .output
                .clone()
                .filter(|output| !output.is_empty())
                .unwrap_or_else(|| EMPTY_EXECUTION_OUTPUT.to_string())
        } else {
            let error = execution.error.as_deref().unwrap_or(UNKNOWN_ERROR);
            format!("{EXECUTION_ERROR_PREFIX}{error}")
        };
        session.execution_output = Some(display);
        self.emit(SessionEvent::ExecutionOutputUpdated(
            session.execution_output.clone(),
        ));
        self.transition(&mut session, ControllerState::Idle);
        execution
    }

    async fn call(&self, operation: Operation, request: &CompileRequest) -> CompileResult {
        let reply = match operation {
            Operation::Compile => self.api.compile(request).await,
            Operation::Execute => self.api.execute(request).await,
        };

        match reply {
            Ok(body) => {
                let result = normalize(&body);
                info!(
                    operation = ?operation,
                    language = %request.language,
                    compiler = %request.compiler_id,
                    success = result.success,
                    "compiler call finished"
                );
                result
            }
            Err(err) => {
                warn!(
                    operation = ?operation,
                    language = %request.language,
                    compiler = %request.compiler_id,
                    error = %err,
                    "compiler call failed"
                );
                CompileResult::failure(err.to_string())
            }
        }
    }

    fn transition(&self, session: &mut Session, next: ControllerState) {
        if session.state == next {
            return;
        }
        debug!(from = ?session.state, to = ?next, "session state change");
        session.state = next;
        self.emit(SessionEvent::StateChanged(next));
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;

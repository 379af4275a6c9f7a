//! Compilation session controller for a remote compiler service.
//!
//! [`ConfigStore`] loads the language catalog, [`SessionController`] owns the
//! user's selection and drives compile/execute round trips through a
//! [`CompilerApi`] (normally the reqwest-backed [`RequestDispatcher`]), and
//! [`normalize`] folds every reply into a [`shared::protocol::CompileResult`].

pub mod config;
pub mod config_store;
pub mod dispatcher;
pub mod error;
pub mod normalizer;
pub mod session;

pub use config::{load_settings, ClientSettings};
pub use config_store::ConfigStore;
pub use dispatcher::{build_request, CompilerApi, RequestDispatcher};
pub use error::{ConfigLoadError, TransportError};
pub use normalizer::normalize;
pub use session::{
    ControllerState, RunOutcome, Session, SessionController, SessionEvent, SkipReason,
};

#[cfg(test)]
#[path = "tests/test_support.rs"]
mod test_support;

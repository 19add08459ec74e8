//! Orchestration for the session-start hook.
//!
//! Classifies the starting session and updates the context store: a main-thread
//! session clears stale markers, a workflow session writes fresh ones, anything
//! else leaves the store alone. Nothing here can fail the session.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::core::remediation::activation_banner;
use crate::core::session::{SessionCategory, SessionClass, classify_session};
use crate::enforce::open_store;
use crate::io::env::GateEnv;
use crate::io::request::decode_request;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStartOutcome {
    /// Request could not be decoded.
    InvalidInput,
    /// Main-thread session; `cleared` is true if stale markers were removed.
    MainThread { cleared: bool },
    /// Context persisted; `banner` is meant for stdout.
    Activated {
        category: SessionCategory,
        banner: String,
    },
    /// A workflow session was detected but the store could not be written.
    ActivationFailed { category: SessionCategory },
    /// Ordinary session; the store was not touched.
    Unrecognized,
}

pub fn session_start(input: &[u8], env: &GateEnv, fallback_cwd: &Path) -> SessionStartOutcome {
    let request = match decode_request(input, fallback_cwd) {
        Ok(request) => request,
        Err(err) => {
            warn!(err = %format!("{err:#}"), "failed to decode session start");
            return SessionStartOutcome::InvalidInput;
        }
    };
    let session_id = request.session_id.as_str();
    let cwd = request.cwd.as_path();
    debug!(session = %session_id, cwd = %cwd.display(), "session start");

    match classify_session(session_id, cwd, &env.session_env()) {
        SessionClass::MainThread => {
            let cleared = match open_store(env).map(|store| store.clear()) {
                Some(Ok(cleared)) => cleared,
                Some(Err(err)) => {
                    warn!(err = %format!("{err:#}"), "failed to clear stale context");
                    false
                }
                None => false,
            };
            info!(cleared, "main thread session");
            SessionStartOutcome::MainThread { cleared }
        }
        SessionClass::Workflow(category) => {
            let Some(store) = open_store(env) else {
                warn!(category = category.as_str(), "cannot persist context without a store");
                return SessionStartOutcome::ActivationFailed { category };
            };
            if let Err(err) = store.set(category.as_str(), session_id) {
                warn!(err = %format!("{err:#}"), "failed to set quality cycle context");
                return SessionStartOutcome::ActivationFailed { category };
            }
            info!(category = category.as_str(), session = %session_id, "quality cycle context set");
            let banner =
                activation_banner(category.as_str(), session_id, &cwd.display().to_string());
            SessionStartOutcome::Activated { category, banner }
        }
        SessionClass::Unrecognized => {
            debug!("no workflow context detected");
            SessionStartOutcome::Unrecognized
        }
    }
}

//! Process-wide network runtime.
//!
//! Built once, on first use, and shared by every transport in the process. It
//! is never torn down per transport; its worker threads end with the process.

use crate::errors::TransportError;
use crate::transport::fault::{FailurePoint, FailureStrategy};
use once_cell::sync::OnceCell;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

static RUNTIME: OnceCell<Runtime> = OnceCell::new();

/// Returns the shared runtime, building it on the first call.
pub(crate) fn shared(strategy: &dyn FailureStrategy) -> Result<&'static Runtime, TransportError> {
    if strategy.should_fail(FailurePoint::Initialize) {
        return Err(TransportError::Initialization(
            "network runtime initialization failed (injected)".to_string(),
        ));
    }

    RUNTIME
        .get_or_try_init(|| {
            debug!("initializing shared network runtime");
            Builder::new_multi_thread()
                .worker_threads(2)
                .thread_name("ipfs-transport")
                .enable_all()
                .build()
        })
        .map_err(|e| TransportError::Initialization(e.to_string()))
}

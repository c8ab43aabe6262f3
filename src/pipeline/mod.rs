//! The annotation pipeline: demonstration retrieval, prompt assembly,
//! reasoning generation, and prediction.
//!
//! Everything here is strictly sequential; collaborator calls are blocking
//! round trips wrapped only in the optional deadline/cancellation guard.

pub mod predict;
pub mod prompt;
pub mod reasoning;
pub mod retrieval;

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{AnnotationError, Result};

/// Run a collaborator call under an optional deadline and cancellation
/// token. Expiry surfaces as the retryable `Timeout` kind; cancellation as
/// `Cancelled`. With neither set, the call runs unchanged.
pub(crate) async fn guarded<T, F>(
    fut: F,
    timeout: Option<Duration>,
    cancel: Option<&CancellationToken>,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let work = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                AnnotationError::Timeout {
                    millis: limit.as_millis() as u64,
                }
            })?,
            None => fut.await,
        }
    };

    match cancel {
        Some(token) => tokio::select! {
            result = work => result,
            _ = token.cancelled() => Err(AnnotationError::Cancelled),
        },
        None => work.await,
    }
}

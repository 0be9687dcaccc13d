//! Shared utilities for use cases.
//!
//! Cancellation checking and the cancellable, retrying generation call used
//! by both the GP controller and the specialist research loop.

use crate::config::RetryPolicy;
use crate::ports::generation::{GatewayError, GenerationGateway, GenerationRequest};
use crate::ports::progress::ConsultationProgressNotifier;
use interconsult_domain::GenerationResponse;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Why a generation call produced no response
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GenerationFailure {
    Cancelled,
    Gateway(GatewayError),
}

/// Check if cancellation has been requested.
pub(crate) fn check_cancelled(token: &CancellationToken) -> Result<(), GenerationFailure> {
    if token.is_cancelled() {
        return Err(GenerationFailure::Cancelled);
    }
    Ok(())
}

/// Call the generation capability, retrying transient failures with backoff.
///
/// Both the call and the backoff sleep are abandoned as soon as the token is
/// cancelled. Non-retryable errors are returned immediately.
pub(crate) async fn generate_with_retry<G: GenerationGateway + ?Sized>(
    gateway: &G,
    request: &GenerationRequest,
    policy: &RetryPolicy,
    token: &CancellationToken,
    progress: &dyn ConsultationProgressNotifier,
    label: &str,
) -> Result<GenerationResponse, GenerationFailure> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        check_cancelled(token)?;
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(GenerationFailure::Cancelled),
            result = gateway.generate(request) => result,
        };
        match result {
            Ok(response) => return Ok(response),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.backoff(attempt);
                warn!(
                    label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Generation failed, retrying: {}",
                    e
                );
                progress.on_retry(label, attempt, &e.to_string());
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(GenerationFailure::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
            Err(e) => {
                debug!(label, attempt, "Generation failed: {}", e);
                return Err(GenerationFailure::Gateway(e));
            }
        }
    }
}

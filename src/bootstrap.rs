//! Connection bootstrap with a fixed retry budget.
//!
//! Repositories never retry; the only retry loop lives here, around the
//! initial connection. [`connect_with_retry`] calls a [`Connector`] up to
//! [`RetryPolicy::attempts`] times, sleeping a fixed delay between attempts,
//! then gives up for good.

use crate::error::{Error, Result};
use std::time::Duration;

/// Something that can open a connection (or a connected store).
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Connection;

    /// Make one connection attempt.
    ///
    /// # Errors
    /// Returns `Err` if the attempt fails.
    async fn connect(&self) -> Result<Self::Connection>;

    /// Short description used in log records.
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 5,
            delay: Duration::from_secs(3),
        }
    }
}

/// Connect, retrying failed attempts according to `policy`.
///
/// # Errors
/// Returns `Error::ConfigError` with the attempt count and the last error
/// once every attempt has failed. A policy of zero attempts fails
/// immediately.
pub async fn connect_with_retry<C: Connector>(
    connector: &C,
    policy: &RetryPolicy,
) -> Result<C::Connection> {
    let target = connector.describe();
    let mut last_error = None;

    for attempt in 1..=policy.attempts {
        match connector.connect().await {
            Ok(conn) => {
                info!("✓ Connected to {} (attempt {})", target, attempt);
                return Ok(conn);
            }
            Err(e) => {
                warn!(
                    "⚠ Connection to {} failed (attempt {}/{}): {}",
                    target, attempt, policy.attempts, e
                );
                last_error = Some(e);
            }
        }

        if attempt < policy.attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    let reason = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no attempts allowed".to_string());
    error!("Giving up on {} after {} attempts", target, policy.attempts);
    Err(Error::ConfigError(format!(
        "connection to {} failed after {} attempts: {}",
        target, policy.attempts, reason
    )))
}

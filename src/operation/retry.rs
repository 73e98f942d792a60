// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! One-shot capability downgrade.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::connector::CommandOptions;
use crate::error::{ConnectorResult, ErrorCode};

/// Retries a command once without `flag` when the server reports the
/// feature as unsupported.
///
/// Once downgraded, the flag stays cleared for every later call made
/// through the same instance.
#[derive(Debug)]
pub struct FeatureRetry {
    flag: CommandOptions,
    enabled: bool,
    downgraded: AtomicBool,
}

impl FeatureRetry {
    /// Creates a retry guard for `flag`; `enabled` opts into the retry.
    #[must_use]
    pub const fn new(flag: CommandOptions, enabled: bool) -> Self {
        Self {
            flag,
            enabled,
            downgraded: AtomicBool::new(false),
        }
    }

    /// Whether the flag has been dropped.
    #[must_use]
    pub fn is_downgraded(&self) -> bool {
        self.downgraded.load(Ordering::Acquire)
    }

    /// Options to send, with the flag removed after a downgrade.
    #[must_use]
    pub fn effective(&self, requested: CommandOptions) -> CommandOptions {
        if self.is_downgraded() {
            requested - self.flag
        } else {
            requested
        }
    }

    /// Issues `command`, retrying once without the flag on
    /// [`ErrorCode::UnsupportedFeature`]. Any other error propagates.
    ///
    /// # Errors
    ///
    /// Returns the command's error when no retry applies, or the retry's
    /// own error.
    pub async fn call<T, F, Fut>(&self, requested: CommandOptions, mut command: F) -> ConnectorResult<T>
    where
        F: FnMut(CommandOptions) -> Fut,
        Fut: Future<Output = ConnectorResult<T>>,
    {
        let options = self.effective(requested);
        match command(options).await {
            Err(err)
                if err.code() == ErrorCode::UnsupportedFeature
                    && self.enabled
                    && options.intersects(self.flag) =>
            {
                self.downgraded.store(true, Ordering::Release);
                tracing::warn!(
                    verb = err.verb(),
                    flag = ?self.flag,
                    "server does not support requested feature, retrying without it"
                );
                command(options - self.flag).await
            }
            other => other,
        }
    }
}

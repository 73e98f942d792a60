// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Line-by-line blame.

use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;

use crate::connector::{AnnotationLine, CommandOptions, Connector};
use crate::console::CommandLine;
use crate::error::Result;
use crate::operation::{ActionOperation, FeatureRetry, OperationContext, StepReporter};

/// Annotates one file.
///
/// Files are annotated regardless of their MIME type unless the server
/// refuses the option, in which case it is dropped for good.
pub struct AnnotateOperation {
    url: String,
    options: CommandOptions,
    retry: FeatureRetry,
    connector: Arc<dyn Connector>,
    lines: Mutex<Vec<AnnotationLine>>,
}

impl AnnotateOperation {
    pub fn new(connector: Arc<dyn Connector>, url: impl Into<String>, retry: bool) -> Self {
        Self {
            url: url.into(),
            options: CommandOptions::IGNORE_MIME_TYPE,
            retry: FeatureRetry::new(CommandOptions::IGNORE_MIME_TYPE, retry),
            connector,
            lines: Mutex::new(Vec::new()),
        }
    }

    /// Annotation of the last run.
    #[must_use]
    pub fn lines(&self) -> Vec<AnnotationLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_downgraded(&self) -> bool {
        self.retry.is_downgraded()
    }
}

impl ActionOperation for AnnotateOperation {
    fn name(&self) -> &str {
        "Annotate"
    }

    fn run_impl<'a>(
        &'a self,
        ctx: &'a OperationContext,
        steps: &'a mut StepReporter,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.lines
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
            CommandLine::new("annotate")
                .path(&self.url)
                .flags(self.retry.effective(self.options))
                .emit(ctx.console());

            steps
                .protect(ctx.progress(), 1, |_| async move {
                    let lines = self
                        .retry
                        .call(self.options, |options| {
                            self.connector.annotate(&self.url, options)
                        })
                        .await?;
                    *self.lines.lock().unwrap_or_else(PoisonError::into_inner) = lines;
                    Ok(())
                })
                .await;
            Ok(())
        })
    }
}

//! # Telemetry: Observability Decorators
//!
//! Wraps a Flow so each call runs inside its own `tracing` span. Nothing is
//! recorded unless the application installs a subscriber.

use crate::flow::Flow;
use std::fmt::Debug;
use std::time::Instant;
use tracing::{Instrument, info_span};

impl<In, Out, E> Flow<In, Out, E>
where
    In: Send + 'static,
    Out: Send + 'static,
    E: Debug + Send + 'static,
{
    /// Run every call of this flow inside a `Flow` span named after it.
    ///
    /// Metadata is kept as-is, so a traced flow composes exactly like the
    /// original.
    pub fn traced(&self) -> Flow<In, Out, E> {
        let name = self.metadata().display_name().to_string();
        let inner = self.clone();
        Flow::new(move |input: In| {
            let span = info_span!("Flow", conflux.flow = %name);
            let inner = inner.clone();
            async move {
                tracing::debug!("Entering flow");
                let start = Instant::now();

                let result = inner.call(input).await;

                let duration = start.elapsed();
                match &result {
                    Ok(_) => tracing::info!(?duration, "Flow completed"),
                    Err(e) => tracing::error!(error = ?e, ?duration, "Flow failed"),
                }
                result
            }
            .instrument(span)
        })
        .with_metadata(self.metadata().clone())
    }
}

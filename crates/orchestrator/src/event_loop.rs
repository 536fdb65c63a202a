//! Drives a [`Dispatcher`] from an [`EventSource`].

use pipeline::{EventSource, EventSourceError};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::dispatcher::Dispatcher;

#[cfg(test)]
#[path = "event_loop_tests.rs"]
mod tests;

/// Dispatches every event `source` yields, each on its own task.
///
/// Undecodable events are logged and dropped. Returns once the source is
/// exhausted and every in-flight dispatch has finished, or as soon as the
/// source becomes unavailable.
pub async fn run_event_loop<S>(dispatcher: Dispatcher, source: &mut S) -> Result<(), EventSourceError>
where
    S: EventSource + ?Sized,
{
    let mut in_flight = JoinSet::new();

    loop {
        // Reap finished dispatches so the set does not grow without bound.
        while let Some(joined) = in_flight.try_join_next() {
            if let Err(e) = joined {
                error!(error = %e, "Dispatch task ended abnormally");
            }
        }

        match source.next_event().await {
            Ok(Some(envelope)) => {
                let dispatcher = dispatcher.clone();
                in_flight.spawn(async move { dispatcher.dispatch(&envelope).await });
            }
            Ok(None) => break,
            Err(EventSourceError::Decode { message }) => {
                warn!(%message, "Dropping undecodable event");
            }
            Err(e) => {
                error!(error = %e, "Event source failed");
                return Err(e);
            }
        }
    }

    info!(in_flight = in_flight.len(), "Event source exhausted; waiting for dispatches");
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Dispatch task ended abnormally");
        }
    }
    Ok(())
}

use super::{NodeDescriptor, NodeTransport};
use futures::{StreamExt, stream};
use std::{sync::Arc, time::Duration};
use tracing::debug;

/// Result of one readiness probe.
#[derive(Debug, Clone)]
pub(super) struct ProbeOutcome {
    pub(super) node_id: String,
    pub(super) generation: u64,
    pub(super) ok: bool,
}

/// Probes every target with at most `max_concurrent` probes in flight, each
/// bounded by `timeout`. Anything but a ready answer counts as a failure.
pub(super) async fn probe_all(
    transport: &Arc<dyn NodeTransport>,
    targets: Vec<(NodeDescriptor, u64)>,
    timeout: Duration,
    max_concurrent: usize,
) -> Vec<ProbeOutcome> {
    stream::iter(targets)
        .map(|(node, generation)| {
            let transport = Arc::clone(transport);
            async move {
                let ok = match tokio::time::timeout(timeout, transport.probe(&node)).await {
                    Ok(Ok(status)) => status.is_ready(),
                    Ok(Err(e)) => {
                        debug!("Probe of {} failed: {e}", node.node_id());
                        false
                    }
                    Err(_) => {
                        debug!("Probe of {} timed out", node.node_id());
                        false
                    }
                };
                ProbeOutcome { node_id: node.node_id().to_string(), generation, ok }
            }
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await
}

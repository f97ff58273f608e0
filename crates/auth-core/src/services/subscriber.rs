//! The cache-invalidation side of the pub/sub subscriber: drains
//! `client.secret.rotated` envelopes and evicts the matching authorizer
//! cache entry. Grounded in the teacher's `AuditWorker::run` shape — a
//! single long-lived loop over a channel, spawned once at startup and
//! aborted on shutdown, that never terminates on a single bad message.

use std::sync::Arc;

use auth_cache::Subscription;

use super::authorizer::Authorizer;

const ROTATED_EVENT: &str = "client.secret.rotated";

/// Runs until `subscription` closes (which in practice only happens when
/// the task is aborted during shutdown). Envelopes of a type other than
/// `client.secret.rotated`, or missing `data.id`, are dropped silently —
/// pub/sub is advisory, per spec.md §9, so there is nothing to escalate.
pub async fn run_eviction_subscriber(authorizer: Arc<Authorizer>, mut subscription: Box<dyn Subscription>) {
    while let Some(envelope) = subscription.recv().await {
        if envelope.event_type != ROTATED_EVENT {
            continue;
        }
        if let Some(client_id) = envelope.target_client_id() {
            authorizer.invalidate_cache(client_id);
        } else {
            tracing::warn!("rotation event carried no client id, dropping");
        }
    }
}

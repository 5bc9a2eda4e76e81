use sitequote_core::audit::{AuditEvent, AuditOutcome, AuditSink};
use tracing::{error, info, warn};

/// Forwards engine audit events to the process log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        let quote_id = event.quote_id.as_ref().map(|id| id.0.as_str()).unwrap_or("unknown");
        let metadata = serde_json::to_string(&event.metadata).unwrap_or_default();
        let category = format!("{:?}", event.category).to_ascii_lowercase();

        match event.outcome {
            AuditOutcome::Success => info!(
                event_name = %event.event_type,
                correlation_id = %event.correlation_id,
                quote_id,
                actor = %event.actor,
                category = %category,
                metadata = %metadata,
                "audit event"
            ),
            AuditOutcome::Rejected => warn!(
                event_name = %event.event_type,
                correlation_id = %event.correlation_id,
                quote_id,
                actor = %event.actor,
                category = %category,
                metadata = %metadata,
                "audit event rejected"
            ),
            AuditOutcome::Failed => error!(
                event_name = %event.event_type,
                correlation_id = %event.correlation_id,
                quote_id,
                actor = %event.actor,
                category = %category,
                metadata = %metadata,
                "audit event failed"
            ),
        }
    }
}

//! Trigger processor.
//!
//! An input-pin edge event fires every matching trigger, then the
//! intended-state delta it caused is computed from snapshots taken
//! around the firing. A failing trigger is logged and skipped without
//! stopping the remaining triggers or the final snapshot.

use pinhub_domain::error::HubError;
use pinhub_domain::expr::PinEvent;
use pinhub_domain::log::{LogEntry, Severity};
use pinhub_domain::state::StateDelta;
use pinhub_domain::trigger::Edge;

use super::context::EvalContext;
use super::intent;
use crate::ports::StoreTx;

/// Fire all triggers matching the event's edge and return the resulting
/// intended-state delta.
pub(crate) async fn fire_triggers<T: StoreTx>(
    tx: &mut T,
    ctx: &mut EvalContext,
    event: &PinEvent,
) -> Result<StateDelta, HubError> {
    let before = intent::intended_states(tx, ctx, None).await?;

    let edge = Edge::from_level(event.level);
    let triggers = tx.triggers_matching(&event.device, &event.pin, edge).await?;
    tracing::debug!(
        device = %event.device,
        pin = %event.pin,
        %edge,
        count = triggers.len(),
        "firing triggers"
    );

    for trigger in &triggers {
        if let Err(err) = ctx.evaluate_trigger_expression(&trigger.expression, event) {
            tracing::warn!(
                device = %event.device,
                pin = %event.pin,
                error = %err,
                "trigger expression failed"
            );
            ctx.record(
                LogEntry::new(Severity::Error, format!("Trigger failed: {err}"))
                    .with_device(&event.device)
                    .with_pin(&event.pin),
            );
        }
    }

    let after = intent::intended_states(tx, ctx, None).await?;
    Ok(before.diff(&after))
}

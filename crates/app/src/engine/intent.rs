//! Intended-state calculator.
//!
//! Walks every eligible output pin, evaluates its expression, and
//! assembles the per-device/per-pin value map. A failing expression is
//! logged and its pin omitted — never populated with a stale or default
//! value — and the rest of the pass continues.

use pinhub_domain::error::HubError;
use pinhub_domain::log::{LogEntry, Severity};
use pinhub_domain::state::IntendedState;

use super::context::EvalContext;
use crate::ports::StoreTx;

/// Compute intended states for output pins carrying an expression.
///
/// With a device filter, only that device's pins are considered. Without
/// one, pins of dead devices are skipped — they are not candidates for
/// dispatch.
pub(crate) async fn intended_states<T: StoreTx>(
    tx: &mut T,
    ctx: &mut EvalContext,
    device: Option<&str>,
) -> Result<IntendedState, HubError> {
    let pins = tx.output_pins(device).await?;
    let mut result = IntendedState::default();

    for pin in pins {
        let Some(text) = pin.expression.as_deref() else {
            continue;
        };
        if device.is_none() && ctx.devices.alive(&pin.device) != Some(true) {
            continue;
        }
        match ctx.evaluate_pin_expression(text) {
            Ok(value) => result.insert(&pin.device, &pin.name, value),
            Err(err) => {
                tracing::warn!(
                    device = %pin.device,
                    pin = %pin.name,
                    error = %err,
                    "output pin expression failed"
                );
                ctx.record(
                    LogEntry::new(Severity::Error, format!("Expression failed: {err}"))
                        .with_device(&pin.device)
                        .with_pin(&pin.name),
                );
            }
        }
    }

    Ok(result)
}

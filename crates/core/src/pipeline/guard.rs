//! Transition guards.
//!
//! A guard decides whether a requested stage move is allowed. Guards are
//! plain functions: synchronous and free of side effects, so they can run
//! before any optimistic mutation.

use crate::pipeline::catalog::{KindDescriptor, ORDER_DELIVERED};
use pb_protocol::{Delivery, PipelineEntity};

/// Signature shared by every per-kind guard.
pub type GuardFn = fn(&TransitionRequest<'_>, &GuardContext<'_>) -> TransitionGuardResult;

/// A requested move.
#[derive(Debug, Clone, Copy)]
pub struct TransitionRequest<'a> {
    pub entity: &'a PipelineEntity,
    pub from_stage: &'a str,
    pub to_stage: &'a str,
}

/// Related data a guard may consult.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardContext<'a> {
    /// The deliveries collection, `None` when it is not loaded.
    pub deliveries: Option<&'a [Delivery]>,
}

/// Whether an allowed move relabels the entity or archives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Move,
    /// The entity leaves the active pipeline.
    Archive,
}

/// Outcome of a guard evaluation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionGuardResult {
    pub allowed: bool,
    /// User-facing explanation when the move is rejected.
    pub reason: Option<String>,
    pub kind: TransitionKind,
}

impl TransitionGuardResult {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            kind: TransitionKind::Move,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            kind: TransitionKind::Move,
        }
    }
}

/// Evaluate the guard for moving `entity` to `to_stage`.
///
/// Targets outside the kind's catalog (and not its archive stage) are
/// rejected before the kind-specific guard runs. Allowed moves onto the
/// archive stage are reported as [`TransitionKind::Archive`].
pub fn can_transition(
    descriptor: &KindDescriptor,
    entity: &PipelineEntity,
    to_stage: &str,
    context: &GuardContext<'_>,
) -> TransitionGuardResult {
    if !descriptor.accepts(to_stage) {
        return TransitionGuardResult::reject(format!("Etapa desconocida: \"{to_stage}\""));
    }

    let request = TransitionRequest {
        entity,
        from_stage: &entity.stage,
        to_stage,
    };
    let mut result = (descriptor.guard)(&request, context);

    if result.allowed && descriptor.is_archive_stage(to_stage) {
        result.kind = TransitionKind::Archive;
    }
    result
}

/// Default policy: any stage may move to any other stage.
///
/// Pipelines are not acyclic here; "Reactivación" moves back toward
/// active stages.
pub fn allow_any(_request: &TransitionRequest<'_>, _context: &GuardContext<'_>) -> TransitionGuardResult {
    TransitionGuardResult::allow()
}

/// Sales orders may only enter "Entregada" once every delivery attached
/// to them is delivered. Orders without deliveries are not blocked.
pub fn sales_order_guard(
    request: &TransitionRequest<'_>,
    context: &GuardContext<'_>,
) -> TransitionGuardResult {
    if request.to_stage != ORDER_DELIVERED {
        return TransitionGuardResult::allow();
    }

    let Some(deliveries) = context.deliveries else {
        return TransitionGuardResult::reject(
            "No se pudieron verificar las entregas de la orden. Recargue e intente de nuevo.",
        );
    };

    let pending = deliveries
        .iter()
        .filter(|d| d.sales_order_id == request.entity.id)
        .filter(|d| !d.is_delivered())
        .count();

    if pending > 0 {
        TransitionGuardResult::reject(format!(
            "La orden \"{}\" tiene {pending} entrega(s) sin completar; no puede marcarse como {ORDER_DELIVERED}.",
            request.entity.display_title()
        ))
    } else {
        TransitionGuardResult::allow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::catalog::{descriptor, SAMPLE_ARCHIVED};
    use pb_protocol::{DeliveryStatus, EntityKind};

    fn order() -> PipelineEntity {
        PipelineEntity::new("so-1", "Orden ACME", "En Tránsito")
    }

    #[test]
    fn test_default_policy_allows_backward_moves() {
        let prospect = PipelineEntity::new("p-1", "Acme", "Perdido");
        let result = can_transition(
            descriptor(EntityKind::Prospect),
            &prospect,
            "Contactado",
            &GuardContext::default(),
        );
        assert!(result.allowed);
        assert_eq!(result.kind, TransitionKind::Move);
    }

    #[test]
    fn test_unknown_target_is_rejected() {
        let quote = PipelineEntity::new("q-1", "Q", "Borrador");
        let result = can_transition(
            descriptor(EntityKind::Quote),
            &quote,
            "Facturada",
            &GuardContext::default(),
        );
        assert!(!result.allowed);
        assert!(result.reason.unwrap().contains("Facturada"));
    }

    #[test]
    fn test_order_with_pending_delivery_cannot_be_delivered() {
        let deliveries = vec![
            Delivery::new("d-1", "so-1", DeliveryStatus::Delivered),
            Delivery::new("d-2", "so-1", DeliveryStatus::InTransit),
        ];
        let context = GuardContext {
            deliveries: Some(deliveries.as_slice()),
        };

        let result = can_transition(descriptor(EntityKind::SalesOrder), &order(), ORDER_DELIVERED, &context);

        assert!(!result.allowed);
        assert!(result.reason.unwrap().contains("1 entrega"));
    }

    #[test]
    fn test_order_with_all_deliveries_delivered_passes() {
        let deliveries = vec![
            Delivery::new("d-1", "so-1", DeliveryStatus::Delivered),
            Delivery::new("d-2", "so-1", DeliveryStatus::Delivered),
            // Another order's pending delivery must not block this one.
            Delivery::new("d-3", "so-2", DeliveryStatus::Pending),
        ];
        let context = GuardContext {
            deliveries: Some(deliveries.as_slice()),
        };

        let result = can_transition(descriptor(EntityKind::SalesOrder), &order(), ORDER_DELIVERED, &context);
        assert!(result.allowed);
    }

    #[test]
    fn test_order_without_deliveries_passes() {
        let context = GuardContext {
            deliveries: Some(&[][..]),
        };
        let result = can_transition(descriptor(EntityKind::SalesOrder), &order(), ORDER_DELIVERED, &context);
        assert!(result.allowed);
    }

    #[test]
    fn test_order_guard_requires_loaded_deliveries() {
        let result = can_transition(
            descriptor(EntityKind::SalesOrder),
            &order(),
            ORDER_DELIVERED,
            &GuardContext::default(),
        );
        assert!(!result.allowed);

        // Other targets do not need deliveries.
        let result = can_transition(
            descriptor(EntityKind::SalesOrder),
            &order(),
            "Cancelada",
            &GuardContext::default(),
        );
        assert!(result.allowed);
    }

    #[test]
    fn test_sample_archive_is_a_distinct_transition() {
        let sample = PipelineEntity::new("s-1", "Muestra", "Rechazada");
        let result = can_transition(
            descriptor(EntityKind::Sample),
            &sample,
            SAMPLE_ARCHIVED,
            &GuardContext::default(),
        );
        assert!(result.allowed);
        assert_eq!(result.kind, TransitionKind::Archive);
    }
}

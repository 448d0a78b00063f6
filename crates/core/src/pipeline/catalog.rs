//! Stage catalogs.
//!
//! One [`KindDescriptor`] per entity kind parameterizes the whole engine:
//! which stages exist, how they group, which guard applies, which field is
//! summed per column and where stage-change activities point.

use crate::pipeline::guard::{self, GuardFn};
use pb_protocol::{EntityKind, StageDefinition};

/// Everything the engine needs to know about one entity kind.
pub struct KindDescriptor {
    pub kind: EntityKind,
    /// Document-store collection holding the entities.
    pub collection: &'static str,
    /// Stages in render order.
    pub stages: &'static [StageDefinition],
    pub guard: GuardFn,
    /// Numeric field summed into each column's value aggregate.
    pub aggregate_field: Option<&'static str>,
    /// Foreign-key field on activity records.
    pub activity_foreign_key: &'static str,
    /// Stage value that archives an entity instead of relabeling it.
    pub archive_stage: Option<&'static str>,
}

impl KindDescriptor {
    /// Look up a catalog stage.
    pub fn stage(&self, stage: &str) -> Option<&'static StageDefinition> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Catalog position of a stage, used for ordering.
    pub fn position(&self, stage: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.stage == stage)
    }

    pub fn is_archive_stage(&self, stage: &str) -> bool {
        self.archive_stage == Some(stage)
    }

    /// Whether an entity may be dropped onto `stage`.
    pub fn accepts(&self, stage: &str) -> bool {
        self.stage(stage).is_some() || self.is_archive_stage(stage)
    }

    /// Stages partitioned by group, groups in first-declaration order.
    pub fn groups(&self) -> Vec<(&'static str, Vec<&'static StageDefinition>)> {
        let mut groups: Vec<(&'static str, Vec<&'static StageDefinition>)> = Vec::new();
        for stage in self.stages {
            match groups.iter_mut().find(|(name, _)| *name == stage.group) {
                Some((_, members)) => members.push(stage),
                None => groups.push((stage.group, vec![stage])),
            }
        }
        groups
    }
}

impl std::fmt::Debug for KindDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KindDescriptor")
            .field("kind", &self.kind)
            .field("collection", &self.collection)
            .field("stages", &self.stages.len())
            .field("aggregate_field", &self.aggregate_field)
            .field("archive_stage", &self.archive_stage)
            .finish_non_exhaustive()
    }
}

/// The descriptor for an entity kind.
pub fn descriptor(kind: EntityKind) -> &'static KindDescriptor {
    match kind {
        EntityKind::Prospect => &PROSPECT,
        EntityKind::Quote => &QUOTE,
        EntityKind::SalesOrder => &SALES_ORDER,
        EntityKind::Sample => &SAMPLE,
        EntityKind::Company => &COMPANY,
    }
}

/// Terminal stage of a sales order, guarded by delivery completion.
pub const ORDER_DELIVERED: &str = "Entregada";

/// Archive target for samples.
pub const SAMPLE_ARCHIVED: &str = "Archivada";

static PROSPECT_STAGES: [StageDefinition; 8] = [
    StageDefinition::new("Nuevo", "Prospección", "Registrar el interés y los datos de contacto"),
    StageDefinition::new("Contactado", "Prospección", "Lograr una primera conversación"),
    StageDefinition::new("Calificado", "Prospección", "Confirmar necesidad, presupuesto y decisor"),
    StageDefinition::new("Propuesta", "Negociación", "Presentar una propuesta formal"),
    StageDefinition::new("Negociación", "Negociación", "Acordar precio y condiciones"),
    StageDefinition::new("Ganado", "Cierre", "Convertir en cliente"),
    StageDefinition::new("Perdido", "Cierre", "Documentar el motivo de la pérdida"),
    StageDefinition::new("Reactivación", "Cierre", "Retomar el contacto con prospectos inactivos"),
];

static QUOTE_STAGES: [StageDefinition; 7] = [
    StageDefinition::new("Borrador", "Elaboración", "Completar partidas y precios"),
    StageDefinition::new("En Revisión", "Elaboración", "Obtener aprobación interna"),
    StageDefinition::new("Enviada", "Seguimiento", "Confirmar recepción con el cliente"),
    StageDefinition::new("Negociación", "Seguimiento", "Resolver objeciones y ajustes"),
    StageDefinition::new("Aceptada", "Resultado", "Generar la orden de venta"),
    StageDefinition::new("Rechazada", "Resultado", "Registrar el motivo del rechazo"),
    StageDefinition::new("Vencida", "Resultado", "Decidir si se reemite la cotización"),
];

static SALES_ORDER_STAGES: [StageDefinition; 6] = [
    StageDefinition::new("Pendiente", "Registro", "Validar datos y condiciones de pago"),
    StageDefinition::new("Confirmada", "Registro", "Reservar inventario"),
    StageDefinition::new("En Producción", "Operación", "Completar la fabricación o el surtido"),
    StageDefinition::new("En Tránsito", "Operación", "Dar seguimiento a las entregas"),
    StageDefinition::new(ORDER_DELIVERED, "Cierre", "Confirmar la recepción de todas las entregas"),
    StageDefinition::new("Cancelada", "Cierre", "Liberar inventario y notificar al cliente"),
];

static SAMPLE_STAGES: [StageDefinition; 7] = [
    StageDefinition::new("Solicitada", "Solicitud", "Validar la solicitud del cliente"),
    StageDefinition::new("En Preparación", "Solicitud", "Preparar y etiquetar la muestra"),
    StageDefinition::new("Enviada", "Logística", "Dar seguimiento al envío"),
    StageDefinition::new("Recibida", "Logística", "Confirmar la recepción con el cliente"),
    StageDefinition::new("En Evaluación", "Evaluación", "Obtener retroalimentación técnica"),
    StageDefinition::new("Aprobada", "Evaluación", "Convertir en cotización"),
    StageDefinition::new("Rechazada", "Evaluación", "Registrar observaciones del cliente"),
];

static COMPANY_STAGES: [StageDefinition; 6] = [
    StageDefinition::new("Prospecto", "Adquisición", "Identificar al tomador de decisiones"),
    StageDefinition::new("Cliente Nuevo", "Adquisición", "Asegurar la segunda compra"),
    StageDefinition::new("Cliente Activo", "Cartera", "Mantener la frecuencia de compra"),
    StageDefinition::new("Cliente Clave", "Cartera", "Ampliar la cuenta con nuevas líneas"),
    StageDefinition::new("Cliente Inactivo", "Recuperación", "Detectar la causa de la inactividad"),
    StageDefinition::new("Reactivación", "Recuperación", "Recuperar el volumen de compra"),
];

static PROSPECT: KindDescriptor = KindDescriptor {
    kind: EntityKind::Prospect,
    collection: "prospects",
    stages: &PROSPECT_STAGES,
    guard: guard::allow_any,
    aggregate_field: Some("estimatedValue"),
    activity_foreign_key: "prospectId",
    archive_stage: None,
};

static QUOTE: KindDescriptor = KindDescriptor {
    kind: EntityKind::Quote,
    collection: "quotes",
    stages: &QUOTE_STAGES,
    guard: guard::allow_any,
    aggregate_field: Some("total"),
    activity_foreign_key: "quoteId",
    archive_stage: None,
};

static SALES_ORDER: KindDescriptor = KindDescriptor {
    kind: EntityKind::SalesOrder,
    collection: "salesOrders",
    stages: &SALES_ORDER_STAGES,
    guard: guard::sales_order_guard,
    aggregate_field: Some("total"),
    activity_foreign_key: "salesOrderId",
    archive_stage: None,
};

static SAMPLE: KindDescriptor = KindDescriptor {
    kind: EntityKind::Sample,
    collection: "samples",
    stages: &SAMPLE_STAGES,
    guard: guard::allow_any,
    aggregate_field: Some("quantity"),
    activity_foreign_key: "sampleId",
    archive_stage: Some(SAMPLE_ARCHIVED),
};

static COMPANY: KindDescriptor = KindDescriptor {
    kind: EntityKind::Company,
    collection: "companies",
    stages: &COMPANY_STAGES,
    guard: guard::allow_any,
    aggregate_field: Some("annualRevenue"),
    activity_foreign_key: "companyId",
    archive_stage: None,
};

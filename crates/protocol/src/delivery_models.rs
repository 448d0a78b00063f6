//! Deliveries attached to sales orders.
//!
//! Deliveries are read-only to the engine; they only feed the sales order
//! transition guard.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a single delivery.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "En Preparación")]
    Preparing,
    #[serde(rename = "En Tránsito")]
    InTransit,
    #[serde(rename = "Entregada")]
    Delivered,
    #[serde(rename = "Devuelta")]
    Returned,
    #[serde(other)]
    Unknown,
}

/// A delivery record from the `deliveries` collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: String,
    pub sales_order_id: String,
    pub status: DeliveryStatus,
}

impl Delivery {
    pub fn new(id: impl Into<String>, sales_order_id: impl Into<String>, status: DeliveryStatus) -> Self {
        Self {
            id: id.into(),
            sales_order_id: sales_order_id.into(),
            status,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.status == DeliveryStatus::Delivered
    }
}

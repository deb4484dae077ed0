//! Domain model for remisiones (work orders) and informes técnicos.
//!
//! The store owns these records; the pipeline only reads them and writes
//! back the consolidation fields after a successful generation. All field
//! fallbacks for rendering live in [`NormalizedOrder`], applied once at
//! pipeline entry rather than scattered through the page builders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder rendered for missing scalar fields.
pub const NOT_SPECIFIED: &str = "No especificado";
/// Placeholder rendered for unassigned technicians.
pub const NOT_ASSIGNED: &str = "No asignado";

/// Consolidation status of a work order.
///
/// Stored as a plain string field; transitions are `pendiente` (no report)
/// → `creado` (report saved, external to this crate) → `consolidado`
/// (consolidated PDF exists). Regeneration keeps `consolidado`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InformeStatus {
    #[default]
    Pendiente,
    Creado,
    Consolidado,
}

impl InformeStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pendiente => "pendiente",
            Self::Creado => "creado",
            Self::Consolidado => "consolidado",
        }
    }
}

impl std::fmt::Display for InformeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional file references attached to a work order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attachments {
    /// Uploaded order-of-work PDF, if any.
    #[serde(default)]
    pub order_url: Option<String>,
    /// Scanned remisión (PDF or image), if any.
    #[serde(default)]
    pub scanned_url: Option<String>,
}

/// A remisión: one unit of vehicle-maintenance work.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: String,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub remision_number: Option<String>,
    /// Vehicle identifier ("móvil").
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub remision_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub technician1: Option<String>,
    #[serde(default)]
    pub technician2: Option<String>,
    #[serde(default)]
    pub technician3: Option<String>,
    /// Amounts in Colombian pesos, no decimals.
    #[serde(default)]
    pub subtotal: Option<i64>,
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub attachments: Attachments,
    #[serde(default)]
    pub status: InformeStatus,
    #[serde(default)]
    pub consolidated_url: Option<String>,
    #[serde(default)]
    pub consolidated_filename: Option<String>,
    #[serde(default)]
    pub consolidated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub consolidated_by: Option<String>,
}

/// One photo attached to a technical report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// An informe técnico: work description plus before/after photo evidence.
///
/// The creation path guarantees a non-empty description and non-empty photo
/// lists; the pipeline renders whatever it is given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnicalReport {
    pub work_description: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub before_photos: Vec<Photo>,
    #[serde(default)]
    pub after_photos: Vec<Photo>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Fields written back to the work order after a successful consolidation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationRecord {
    pub url: String,
    pub filename: String,
    pub at: DateTime<Utc>,
    pub by: String,
    pub status: InformeStatus,
}

/// Work-order fields normalized for rendering.
///
/// Every value is a ready-to-draw string with the documented fallback
/// already applied, so the page builders never see an `Option`.
#[derive(Debug, Clone)]
pub struct NormalizedOrder {
    pub order_number: String,
    pub remision_number: String,
    pub vehicle_id: String,
    pub state: String,
    pub remision_date: String,
    pub technicians: [String; 3],
    pub subtotal: String,
    pub total: String,
    pub generated_by: String,
}

impl NormalizedOrder {
    pub fn from_order(order: &WorkOrder) -> Self {
        let field = |v: &Option<String>| {
            v.as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(NOT_SPECIFIED)
                .to_string()
        };
        let tech = |v: &Option<String>| {
            v.as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(NOT_ASSIGNED)
                .to_string()
        };

        Self {
            order_number: field(&order.order_number),
            remision_number: field(&order.remision_number),
            vehicle_id: field(&order.vehicle_id),
            state: field(&order.state),
            remision_date: order
                .remision_date
                .map_or_else(|| NOT_SPECIFIED.to_string(), format_date),
            technicians: [
                tech(&order.technician1),
                tech(&order.technician2),
                tech(&order.technician3),
            ],
            subtotal: format_currency(order.subtotal.unwrap_or(0)),
            total: format_currency(order.total.unwrap_or(0)),
            generated_by: order
                .created_by
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or("Sistema")
                .to_string(),
        }
    }
}

/// Format a timestamp as `dd/mm/yyyy` (es-CO convention).
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Format an amount of Colombian pesos with dot thousands separators,
/// no decimals: `1234567` → `$ 1.234.567`.
pub fn format_currency(amount: i64) -> String {
    let negative = amount < 0;
    let digits = amount.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if negative {
        format!("-$ {grouped}")
    } else {
        format!("$ {grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_currency_grouping() {
        assert_eq!(format_currency(0), "$ 0");
        assert_eq!(format_currency(950), "$ 950");
        assert_eq!(format_currency(1000), "$ 1.000");
        assert_eq!(format_currency(1_234_567), "$ 1.234.567");
        assert_eq!(format_currency(-45_000), "-$ 45.000");
    }

    #[test]
    fn test_format_date_es() {
        let d = Utc.with_ymd_and_hms(2025, 9, 3, 14, 30, 0).single();
        assert_eq!(format_date(d.expect("valid date")), "03/09/2025");
    }

    #[test]
    fn test_status_roundtrip() {
        let json = serde_json::to_string(&InformeStatus::Consolidado).expect("serialize");
        assert_eq!(json, "\"consolidado\"");
        let back: InformeStatus = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, InformeStatus::Consolidado);
    }

    #[test]
    fn test_normalize_applies_fallbacks() {
        let order = WorkOrder {
            id: "r1".to_string(),
            order_number: Some("1001".to_string()),
            technician1: Some("Carlos Pérez".to_string()),
            total: Some(350_000),
            ..Default::default()
        };
        let normalized = NormalizedOrder::from_order(&order);

        assert_eq!(normalized.order_number, "1001");
        assert_eq!(normalized.vehicle_id, NOT_SPECIFIED);
        assert_eq!(normalized.remision_date, NOT_SPECIFIED);
        assert_eq!(normalized.technicians[0], "Carlos Pérez");
        assert_eq!(normalized.technicians[1], NOT_ASSIGNED);
        assert_eq!(normalized.subtotal, "$ 0");
        assert_eq!(normalized.total, "$ 350.000");
        assert_eq!(normalized.generated_by, "Sistema");
    }

    #[test]
    fn test_normalize_blank_strings_fall_back() {
        let order = WorkOrder {
            id: "r1".to_string(),
            state: Some("   ".to_string()),
            ..Default::default()
        };
        let normalized = NormalizedOrder::from_order(&order);
        assert_eq!(normalized.state, NOT_SPECIFIED);
    }
}

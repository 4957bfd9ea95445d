//! Derived-field recalculation applied to rows before indexing.
//!
//! Recalculation changes only the in-memory row handed to the index; the row
//! store is never written back.

use serde_json::{Map, Value};

use reindex_types::EntityRow;

use crate::error::IndexingError;

/// Recomputes derived fields of a row before it is indexed.
pub trait Recalculate: Send + Sync {
    fn recalculate(&self, row: &mut EntityRow) -> Result<(), IndexingError>;
}

/// Invoice net and gross totals from its positions.
///
/// Each entry of `positions` contributes `quantity × unitPrice` to `netSum`
/// and that amount times `1 + vat` to `grossSum`. A missing quantity counts
/// as 1, a missing unit price or VAT rate as 0. Totals are rounded to cents.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvoiceTotals;

impl InvoiceTotals {
    fn number(
        row: &EntityRow,
        position: &Map<String, Value>,
        index: usize,
        name: &str,
    ) -> Result<Option<f64>, IndexingError> {
        match position.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| {
                recalculation_error(row, format!("position {} has invalid {} '{}'", index, name, s))
            }),
            Some(other) => Err(recalculation_error(
                row,
                format!("position {} has invalid {} {}", index, name, other),
            )),
        }
    }
}

impl Recalculate for InvoiceTotals {
    fn recalculate(&self, row: &mut EntityRow) -> Result<(), IndexingError> {
        let positions = match row.fields.get("positions") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(_) => return Err(recalculation_error(row, "positions is not an array")),
        };

        let mut net = 0.0;
        let mut gross = 0.0;
        for (index, item) in positions.iter().enumerate() {
            let position = item.as_object().ok_or_else(|| {
                recalculation_error(row, format!("position {} is not an object", index))
            })?;
            let quantity = Self::number(row, position, index, "quantity")?.unwrap_or(1.0);
            let unit_price = Self::number(row, position, index, "unitPrice")?.unwrap_or(0.0);
            let vat = Self::number(row, position, index, "vat")?.unwrap_or(0.0);

            let position_net = quantity * unit_price;
            net += position_net;
            gross += position_net * (1.0 + vat);
        }

        row.fields.insert("netSum".to_string(), Value::from(round_cents(net)));
        row.fields
            .insert("grossSum".to_string(), Value::from(round_cents(gross)));
        Ok(())
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

fn recalculation_error(row: &EntityRow, reason: impl Into<String>) -> IndexingError {
    IndexingError::Recalculation {
        entity_type: row.entity_type.clone(),
        id: row.id,
        reason: reason.into(),
    }
}

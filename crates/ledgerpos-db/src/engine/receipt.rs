//! # Receipt Assembly
//!
//! Builds the receipt view for a settled (or cancelled) sale: company
//! name, sequence number, timestamp, client, line items, totals, payment
//! method and a cancellation banner when the sale was reversed.
//!
//! Rendering (print layout, CSV export) belongs to the caller; this
//! module only assembles the data.

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::pool::Database;
use ledgerpos_core::{CoreError, Money, SaleStatus};

/// One line of a receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// The assembled receipt view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub company_name: String,
    /// The sale's per-tenant sequence number.
    pub sequence: i64,
    pub timestamp: String,
    /// Client display name, or "not provided" for anonymous sales.
    pub client_name: String,
    pub lines: Vec<ReceiptLine>,
    /// Sum of line totals, before the whole-sale discount.
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub payment_method: String,
    /// True when the sale has been reversed; the UI shows a banner.
    pub cancelled: bool,
}

impl Receipt {
    /// Formats the grand total for display.
    pub fn total_display(&self) -> String {
        Money::from_cents(self.total_cents).to_string()
    }
}

/// Assembles a receipt for a sale, scoped to the tenant.
///
/// ## Errors
/// `SaleNotFound` when the sale is absent or owned by another tenant.
pub async fn build_receipt(
    db: &Database,
    tenant_id: &str,
    sale_id: &str,
    company_name: &str,
) -> EngineResult<Receipt> {
    let sale = db
        .sales()
        .get_by_id(tenant_id, sale_id)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

    let items = db.sales().get_items_with_products(sale_id).await?;

    let client_name = match &sale.client_id {
        Some(client_id) => db
            .clients()
            .name_of(tenant_id, client_id)
            .await?
            .unwrap_or_else(|| "not provided".to_string()),
        None => "not provided".to_string(),
    };

    let subtotal_cents: i64 = items.iter().map(|i| i.line_total_cents).sum();

    Ok(Receipt {
        company_name: company_name.to_string(),
        sequence: sale.sequence,
        timestamp: sale.created_at.to_rfc3339(),
        client_name,
        lines: items
            .into_iter()
            .map(|i| ReceiptLine {
                product_name: i.product_name,
                quantity: i.quantity,
                unit_price_cents: i.unit_price_cents,
                line_total_cents: i.line_total_cents,
            })
            .collect(),
        subtotal_cents,
        discount_cents: sale.discount_cents,
        total_cents: sale.total_cents,
        payment_method: sale.payment_method.label().to_string(),
        cancelled: sale.status == SaleStatus::Cancelled,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

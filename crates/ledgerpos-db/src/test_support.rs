//! Shared fixtures for ledgerpos-db tests.
//!
//! Compiled only under `#[cfg(test)]`; keeps the per-module tests free of
//! repetitive struct literals.

use chrono::Utc;
use uuid::Uuid;

use crate::repository::client::Client;
use ledgerpos_core::{
    Cart, CartItem, Movement, MovementKind, PaymentMethod, Product, Sale, SaleStatus,
};

pub fn product(tenant_id: &str, name: &str, price_cents: i64, quantity: i64) -> Product {
    Product {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant_id.to_string(),
        name: name.to_string(),
        category: "general".to_string(),
        price_cents,
        quantity,
        created_at: Utc::now(),
    }
}

pub fn client(tenant_id: &str, name: &str) -> Client {
    Client {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant_id.to_string(),
        name: name.to_string(),
        created_at: Utc::now(),
    }
}

pub fn movement(tenant_id: &str, product_id: &str, kind: MovementKind, quantity: i64) -> Movement {
    Movement {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant_id.to_string(),
        product_id: product_id.to_string(),
        kind,
        quantity,
        sale_id: None,
        created_at: Utc::now(),
    }
}

pub fn sale(tenant_id: &str, sequence: i64, total_cents: i64) -> Sale {
    Sale {
        id: Uuid::new_v4().to_string(),
        tenant_id: tenant_id.to_string(),
        sequence,
        status: SaleStatus::Completed,
        total_cents,
        discount_cents: 0,
        payment_method: PaymentMethod::Cash,
        client_id: None,
        created_at: Utc::now(),
    }
}

pub fn cart_line(product_id: &str, quantity: i64, unit_price_cents: i64) -> CartItem {
    CartItem {
        product_id: product_id.to_string(),
        quantity,
        unit_price_cents,
        discount_cents: 0,
    }
}

pub fn cart(items: Vec<CartItem>, total_cents: i64) -> Cart {
    Cart {
        items,
        discount_cents: 0,
        total_cents,
        payment_method: PaymentMethod::Cash,
        client_id: None,
    }
}

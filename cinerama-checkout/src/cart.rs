use std::collections::BTreeMap;

use cinerama_shared::{ConcessionDetail, ConcessionLine, Product};
use uuid::Uuid;

/// Cart entry with a price snapshot taken when the product was first
/// added, so a mid-checkout catalog price change cannot skew the local
/// subtotal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
}

/// Concession quantities for one checkout. A line at quantity zero is
/// removed outright; zero and absent are the same thing everywhere.
#[derive(Debug, Clone, Default)]
pub struct ConcessionCart {
    lines: BTreeMap<Uuid, CartLine>,
}

impl ConcessionCart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, product: &Product) {
        self.lines
            .entry(product.id)
            .and_modify(|line| line.quantity += 1)
            .or_insert_with(|| CartLine {
                product_id: product.id,
                name: product.name.clone(),
                unit_price_cents: product.price_cents,
                quantity: 1,
            });
    }

    pub fn remove(&mut self, product_id: Uuid) {
        let drop_line = match self.lines.get_mut(&product_id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_sub(1);
                line.quantity == 0
            }
            None => false,
        };
        if drop_line {
            self.lines.remove(&product_id);
        }
    }

    pub fn quantity(&self, product_id: Uuid) -> u32 {
        self.lines.get(&product_id).map_or(0, |line| line.quantity)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    /// Wire form for total/confirm requests
    pub fn request_lines(&self) -> Vec<ConcessionLine> {
        self.lines
            .values()
            .map(|line| ConcessionLine {
                product_id: line.product_id,
                quantity: line.quantity,
            })
            .collect()
    }

    pub fn subtotal_cents(&self) -> i64 {
        self.lines
            .values()
            .map(|line| line.unit_price_cents * i64::from(line.quantity))
            .sum()
    }

    /// Itemization from the snapshotted prices, for local breakdowns
    pub fn details(&self) -> Vec<ConcessionDetail> {
        self.lines
            .values()
            .map(|line| ConcessionDetail {
                product_id: line.product_id,
                name: line.name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                subtotal_cents: line.unit_price_cents * i64::from(line.quantity),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn popcorn() -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Popcorn grande".into(),
            price_cents: 4500,
            image_url: None,
            active: true,
        }
    }

    #[test]
    fn test_add_and_remove_track_quantity() {
        let product = popcorn();
        let mut cart = ConcessionCart::new();
        cart.add(&product);
        cart.add(&product);
        assert_eq!(cart.quantity(product.id), 2);
        assert_eq!(cart.subtotal_cents(), 9000);

        cart.remove(product.id);
        assert_eq!(cart.quantity(product.id), 1);
    }

    #[test]
    fn test_zero_quantity_line_disappears() {
        let product = popcorn();
        let mut cart = ConcessionCart::new();
        cart.add(&product);
        cart.remove(product.id);

        assert!(cart.is_empty());
        assert!(cart.request_lines().is_empty());
        assert_eq!(cart.subtotal_cents(), 0);

        // Removing past zero stays a no-op
        cart.remove(product.id);
        assert_eq!(cart.quantity(product.id), 0);
    }

    #[test]
    fn test_price_snapshot_survives_catalog_change() {
        let mut product = popcorn();
        let mut cart = ConcessionCart::new();
        cart.add(&product);

        product.price_cents = 9900;
        cart.add(&product);
        assert_eq!(cart.subtotal_cents(), 9000);
        assert_eq!(cart.details()[0].unit_price_cents, 4500);
    }
}

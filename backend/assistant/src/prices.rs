//! Reads the operator's product/price block into [`PricingProduct`]s.
//!
//! Expected shape, repeated per product, lines in any order after `Producto:`:
//!
//! ```text
//! Producto: Arábica
//! Precio actual: 120
//! Costo: 80
//! Margen deseado: 30%
//! ```

use cafetal_core::{AssistantError, PricingProduct};

const PRODUCT: &str = "Producto:";
const CURRENT_PRICE: &str = "Precio actual:";
const COST: &str = "Costo:";
const DESIRED_MARGIN: &str = "Margen deseado:";

/// Parse a free-text price block.
///
/// A number that does not parse leaves only that field unset. Field lines
/// before the first `Producto:` have nothing to attach to and are ignored.
pub fn parse_price_block(text: &str) -> Result<Vec<PricingProduct>, AssistantError> {
    let mut products = Vec::new();
    let mut current: Option<PricingProduct> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(name) = line.strip_prefix(PRODUCT) {
            commit(&mut products, current.take());
            current = Some(PricingProduct {
                name: name.trim().to_string(),
                ..Default::default()
            });
            continue;
        }

        let Some(product) = current.as_mut() else {
            continue;
        };

        if let Some(value) = line.strip_prefix(CURRENT_PRICE) {
            product.current_price = parse_number(value);
        } else if let Some(value) = line.strip_prefix(COST) {
            product.cost = parse_number(value);
        } else if let Some(value) = line.strip_prefix(DESIRED_MARGIN) {
            product.desired_margin_pct = parse_number(value.trim().trim_end_matches('%'));
        }
    }
    commit(&mut products, current);

    if products.is_empty() {
        return Err(AssistantError::NoProductsFound);
    }
    Ok(products)
}

fn commit(products: &mut Vec<PricingProduct>, product: Option<PricingProduct>) {
    if let Some(product) = product.filter(|p| !p.name.is_empty()) {
        products.push(product);
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

//! Pricing: flat tax lookup by postal code and the order total.

use common::Money;

/// Flat tax amount for a postal code.
///
/// Fixed lookup table; a postal code without tax data yields zero tax.
/// That is a documented simplification of this system, not an error.
pub fn tax_for(zip: &str) -> Money {
    match zip {
        "80523" => Money::from_cents(225),
        "80534" => Money::from_cents(525),
        "12345" => Money::from_cents(325),
        _ => Money::zero(),
    }
}

/// The grand total of an order: subtotal + tax + delivery fee, in exact
/// fixed-point arithmetic.
pub fn total(subtotal: Money, tax: Money, delivery_fee: Money) -> Money {
    subtotal + tax + delivery_fee
}

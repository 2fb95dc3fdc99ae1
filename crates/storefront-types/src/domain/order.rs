use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// Flat-rate shipping. The cost table lives here so the server-side
/// computation is the single authority; any client-side preview is untrusted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ShippingMethod {
    Standard,
    Express,
}

impl ShippingMethod {
    pub fn cost_cents(self) -> i64 {
        match self {
            ShippingMethod::Standard => 1000,
            ShippingMethod::Express => 2000,
        }
    }
}

impl FromStr for ShippingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Standard" => Ok(ShippingMethod::Standard),
            "Express" => Ok(ShippingMethod::Express),
            other => Err(format!("unknown shipping method: {other}")),
        }
    }
}

/// Payment capture is simulated; the method is recorded on the order and the
/// payment status starts out `Pending`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    CreditCard,
    PayPal,
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CreditCard" => Ok(PaymentMethod::CreditCard),
            "PayPal" => Ok(PaymentMethod::PayPal),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShippingAddress {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: String,
}

impl ShippingAddress {
    /// Returns the names of every invalid field, not just the first one, so
    /// a caller can fix the whole form in one round trip.
    pub fn invalid_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        for (name, value) in [
            ("full_name", &self.full_name),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zip_code", &self.zip_code),
            ("country", &self.country),
        ] {
            if value.trim().is_empty() {
                fields.push(name.to_string());
            }
        }
        // Phone needs enough digits to be minimally plausible.
        if self.phone.chars().filter(|c| c.is_ascii_digit()).count() < 7 {
            fields.push("phone".to_string());
        }
        fields
    }
}

/// Immutable snapshot of a purchased product: id, quantity and the unit
/// price at the moment of purchase. Never re-read from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub name: String,
    pub qty: u32,
    pub unit_price_cents: i64,
}

impl OrderLine {
    pub fn subtotal_cents(&self) -> i64 {
        i64::from(self.qty) * self.unit_price_cents
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lines: Vec<OrderLine>,
    pub subtotal_cents: i64,
    pub shipping_cost_cents: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_method: ShippingMethod,
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Builds a new `Pending` order from already-priced lines. Line prices
    /// are frozen here; later catalog changes never touch an existing order.
    pub fn place(
        user_id: Uuid,
        lines: Vec<OrderLine>,
        shipping_method: ShippingMethod,
        payment_method: PaymentMethod,
        shipping_address: ShippingAddress,
    ) -> anyhow::Result<Self> {
        if lines.is_empty() {
            anyhow::bail!("order needs at least one line");
        }
        for line in &lines {
            if line.qty == 0 {
                anyhow::bail!("line qty must be > 0");
            }
            if line.unit_price_cents <= 0 {
                anyhow::bail!("line price must be > 0");
            }
        }
        let subtotal: i64 = lines.iter().map(OrderLine::subtotal_cents).sum();
        let shipping_cost = shipping_method.cost_cents();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            lines,
            subtotal_cents: subtotal,
            shipping_cost_cents: shipping_cost,
            total_cents: subtotal + shipping_cost,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping_method,
            payment_method,
            shipping_address,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Alice Doe".into(),
            street: "1 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zip_code: "62701".into(),
            country: "US".into(),
            phone: "555-010-2030".into(),
        }
    }

    #[test]
    fn place_computes_totals_and_defaults_pending() {
        let lines = vec![
            OrderLine {
                product_id: Uuid::new_v4(),
                name: "A".into(),
                qty: 2,
                unit_price_cents: 2000,
            },
            OrderLine {
                product_id: Uuid::new_v4(),
                name: "B".into(),
                qty: 3,
                unit_price_cents: 500,
            },
        ];
        let order = Order::place(
            Uuid::new_v4(),
            lines,
            ShippingMethod::Express,
            PaymentMethod::CreditCard,
            address(),
        )
        .unwrap();
        assert_eq!(order.subtotal_cents, 5500);
        assert_eq!(order.shipping_cost_cents, 2000);
        assert_eq!(order.total_cents, 7500);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn place_rejects_empty_and_zero_qty_lines() {
        let empty = Order::place(
            Uuid::new_v4(),
            vec![],
            ShippingMethod::Standard,
            PaymentMethod::PayPal,
            address(),
        );
        assert!(empty.is_err());

        let zero_qty = Order::place(
            Uuid::new_v4(),
            vec![OrderLine {
                product_id: Uuid::new_v4(),
                name: "A".into(),
                qty: 0,
                unit_price_cents: 100,
            }],
            ShippingMethod::Standard,
            PaymentMethod::PayPal,
            address(),
        );
        assert!(zero_qty.is_err());
    }

    #[test]
    fn shipping_costs_are_flat_rates() {
        assert_eq!(ShippingMethod::Standard.cost_cents(), 1000);
        assert_eq!(ShippingMethod::Express.cost_cents(), 2000);
    }

    #[test]
    fn methods_parse_from_wire_strings() {
        assert_eq!(
            "Standard".parse::<ShippingMethod>().unwrap(),
            ShippingMethod::Standard
        );
        assert!("Overnight".parse::<ShippingMethod>().is_err());
        assert_eq!(
            "PayPal".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::PayPal
        );
        assert!("Bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn address_validation_collects_all_offenders() {
        let mut addr = address();
        addr.city = "  ".into();
        addr.phone = "12".into();
        let fields = addr.invalid_fields();
        assert_eq!(fields, vec!["city".to_string(), "phone".to_string()]);
    }

    #[test]
    fn valid_address_has_no_offenders() {
        assert!(address().invalid_fields().is_empty());
    }
}

//! A single validated sale and the rules for creating one.

use crate::model::{Amount, PriceCatalog};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Bad user input that prevents a sale (or a catalog edit) from being accepted.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ValidationError {
    /// The unit price was zero or negative.
    InvalidPrice { price: Amount },
    /// The item name was empty, or the item is not listed in the selected category.
    MissingItem { category: String, item: String },
    /// The quantity was not a positive whole number.
    InvalidQuantity { quantity: String },
    /// No category in the catalog lists the item.
    ItemNotFound { item: String },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidPrice { price } => {
                write!(f, "Invalid price {price}, please enter a valid price")
            }
            ValidationError::MissingItem { category, item } if item.trim().is_empty() => {
                write!(f, "No item was selected in category '{category}'")
            }
            ValidationError::MissingItem { category, item } => {
                write!(f, "The item '{item}' is not listed in category '{category}'")
            }
            ValidationError::InvalidQuantity { quantity } => {
                write!(f, "Invalid quantity '{quantity}', expected a whole number of 1 or more")
            }
            ValidationError::ItemNotFound { item } => {
                write!(f, "The item '{item}' is not listed in any category")
            }
        }
    }
}

impl Error for ValidationError {}

/// Parses user-supplied quantity text, rejecting anything that is not a whole number.
pub fn parse_quantity(s: &str) -> Result<i64, ValidationError> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidQuantity {
            quantity: s.to_string(),
        })
}

/// The raw fields of a sale as entered by a user, before validation. The total is
/// absent: it is always computed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewSale {
    pub date: NaiveDate,
    pub category: String,
    pub item: String,
    pub quantity: i64,
    pub unit_price: Amount,
    pub note: Option<String>,
}

impl NewSale {
    /// Validates the entry against `catalog` and produces a `SaleRecord`.
    ///
    /// Checks happen in this order: price, item name, quantity, then catalog membership. The item
    /// name check does not depend on the catalog so that a caller who skipped catalog selection
    /// still gets `MissingItem` for an empty name.
    pub fn validate(self, catalog: &PriceCatalog) -> Result<SaleRecord, ValidationError> {
        if !self.unit_price.is_positive() {
            return Err(ValidationError::InvalidPrice {
                price: self.unit_price,
            });
        }
        if self.item.trim().is_empty() {
            return Err(ValidationError::MissingItem {
                category: self.category,
                item: self.item,
            });
        }
        let quantity = u32::try_from(self.quantity)
            .ok()
            .filter(|&q| q > 0)
            .ok_or_else(|| ValidationError::InvalidQuantity {
                quantity: self.quantity.to_string(),
            })?;
        let _ = catalog.lookup(&self.category, &self.item)?;
        if self.unit_price.checked_mul(quantity).is_none() {
            return Err(ValidationError::InvalidPrice {
                price: self.unit_price,
            });
        }

        Ok(SaleRecord::new(
            self.date,
            self.item,
            quantity,
            self.unit_price,
            self.category,
            self.note,
        ))
    }
}

/// One sale line. `total` is always `quantity * unit_price`; the record keeps its own copy of the
/// price and category so it stays valid if the catalog changes later.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "SaleRecordFields")]
pub struct SaleRecord {
    date: NaiveDate,
    item: String,
    quantity: u32,
    unit_price: Amount,
    total: Amount,
    category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

impl SaleRecord {
    /// Builds a record from already-checked parts. Blank notes are dropped.
    pub(crate) fn new(
        date: NaiveDate,
        item: impl Into<String>,
        quantity: u32,
        unit_price: Amount,
        category: impl Into<String>,
        note: Option<String>,
    ) -> Self {
        Self {
            date,
            item: item.into(),
            quantity,
            unit_price,
            total: unit_price * quantity,
            category: category.into(),
            note: note.filter(|n| !n.trim().is_empty()),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Amount {
        self.unit_price
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}

/// The on-disk shape of a `SaleRecord`. Deserialization goes through this so that a file whose
/// `total` disagrees with `quantity * unit_price` is rejected rather than loaded.
#[derive(Debug, Deserialize)]
struct SaleRecordFields {
    date: NaiveDate,
    item: String,
    quantity: u32,
    unit_price: Amount,
    total: Amount,
    category: String,
    #[serde(default)]
    note: Option<String>,
}

impl TryFrom<SaleRecordFields> for SaleRecord {
    type Error = String;

    fn try_from(f: SaleRecordFields) -> Result<Self, Self::Error> {
        if f.unit_price.is_negative() {
            return Err(format!("negative unit_price for item '{}'", f.item));
        }
        if f.unit_price.checked_mul(f.quantity).is_none() {
            return Err(format!(
                "{} x {} is too large for item '{}'",
                f.quantity,
                f.unit_price.plain(),
                f.item
            ));
        }
        let record = SaleRecord::new(f.date, f.item, f.quantity, f.unit_price, f.category, f.note);
        if record.total.value() != f.total.value() {
            return Err(format!(
                "total {} does not equal {} x {} for item '{}'",
                f.total.plain(),
                f.quantity,
                f.unit_price.plain(),
                record.item
            ));
        }
        Ok(SaleRecord {
            total: f.total,
            ..record
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn sale(category: &str, item: &str, quantity: i64, price: &str) -> NewSale {
        NewSale {
            date: date(),
            category: category.to_string(),
            item: item.to_string(),
            quantity,
            unit_price: Amount::from_str(price).unwrap(),
            note: None,
        }
    }

    #[test]
    fn test_valid_sale_computes_total() {
        let catalog = PriceCatalog::house_menu();
        let record = sale("Snacks", "Chapo", 3, "30")
            .validate(&catalog)
            .unwrap();
        assert_eq!(record.total(), Amount::from(90));
        assert_eq!(record.category(), "Snacks");
        assert_eq!(record.date(), date());
    }

    #[test]
    fn test_total_is_exact_for_fractional_prices() {
        let catalog = PriceCatalog::house_menu();
        for (quantity, price) in [(1, "0.1"), (3, "0.1"), (7, "33.33"), (250, "19.99")] {
            let record = sale("Snacks", "Chapo", quantity, price)
                .validate(&catalog)
                .unwrap();
            let expected = Amount::from_str(price).unwrap().value() * rust_decimal::Decimal::from(quantity);
            assert_eq!(record.total().value(), expected);
        }
    }

    #[test]
    fn test_zero_price_is_invalid() {
        let catalog = PriceCatalog::house_menu();
        let err = sale("Snacks", "Chapo", 1, "0").validate(&catalog).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPrice { .. }));
    }

    #[test]
    fn test_negative_price_is_invalid() {
        let catalog = PriceCatalog::house_menu();
        let err = sale("Snacks", "Chapo", 1, "-30").validate(&catalog).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPrice { .. }));
    }

    #[test]
    fn test_empty_item_is_missing_even_without_catalog() {
        let err = sale("Snacks", "  ", 1, "30")
            .validate(&PriceCatalog::new())
            .unwrap_err();
        assert!(matches!(err, ValidationError::MissingItem { .. }));
        assert_eq!(err.to_string(), "No item was selected in category 'Snacks'");
    }

    #[test]
    fn test_item_outside_category_is_missing() {
        let catalog = PriceCatalog::house_menu();
        let err = sale("Drinks", "Chapo", 1, "30").validate(&catalog).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingItem {
                category: "Drinks".to_string(),
                item: "Chapo".to_string()
            }
        );
    }

    #[test]
    fn test_non_positive_quantity_is_invalid() {
        let catalog = PriceCatalog::house_menu();
        for quantity in [0, -2, i64::from(u32::MAX) + 1] {
            let err = sale("Snacks", "Chapo", quantity, "30")
                .validate(&catalog)
                .unwrap_err();
            assert!(matches!(err, ValidationError::InvalidQuantity { .. }));
        }
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(" 4 ").unwrap(), 4);
        assert!(parse_quantity("2.5").is_err());
        assert!(parse_quantity("two").is_err());
    }

    #[test]
    fn test_blank_note_is_dropped() {
        let catalog = PriceCatalog::house_menu();
        let mut new_sale = sale("Snacks", "Chapo", 1, "30");
        new_sale.note = Some("   ".to_string());
        assert_eq!(new_sale.validate(&catalog).unwrap().note(), None);
    }

    #[test]
    fn test_record_keeps_price_after_catalog_change() {
        let mut catalog = PriceCatalog::house_menu();
        let record = sale("Snacks", "Chapo", 2, "30").validate(&catalog).unwrap();
        catalog.remove_item("Snacks", "Chapo").unwrap();
        assert_eq!(record.unit_price(), Amount::from(30));
        assert_eq!(record.total(), Amount::from(60));
    }

    #[test]
    fn test_total_too_large_is_invalid_price() {
        let catalog = PriceCatalog::house_menu();
        let err = sale("Snacks", "Chapo", 2, "79228162514264337593543950335")
            .validate(&catalog)
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPrice { .. }));
        assert!(sale("Snacks", "Chapo", 1, "79228162514264337593543950335")
            .validate(&catalog)
            .is_ok());
    }

    #[test]
    fn test_deserialize_rejects_total_too_large() {
        let json = r#"{"date":"2024-01-01","item":"Chapo","quantity":2,
            "unit_price":"79228162514264337593543950335","total":"1","category":"Snacks"}"#;
        let err = serde_json::from_str::<SaleRecord>(json).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_deserialize_rejects_inconsistent_total() {
        let json = r#"{"date":"2024-01-01","item":"Chapo","quantity":2,"unit_price":"30",
            "total":"70","category":"Snacks"}"#;
        let err = serde_json::from_str::<SaleRecord>(json).unwrap_err();
        assert!(err.to_string().contains("does not equal"));
    }

    #[test]
    fn test_serialized_shape() {
        let catalog = PriceCatalog::house_menu();
        let mut new_sale = sale("Snacks", "Chapo", 2, "30");
        new_sale.note = Some("morning".to_string());
        let record = new_sale.validate(&catalog).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"date":"2024-01-01","item":"Chapo","quantity":2,"unit_price":"30","total":"60","category":"Snacks","note":"morning"}"#
        );
    }
}

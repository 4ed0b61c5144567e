use crate::model::{Amount, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The price list: category name -> item name -> unit price.
///
/// Item names are unique within a category but the same name may appear in more than one category,
/// in which case the entries are distinct. Serializes as a plain nested JSON object, e.g.
/// `{"Snacks": {"Chapo": "30"}}`.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceCatalog {
    categories: BTreeMap<String, BTreeMap<String, Amount>>,
}

/// One row of the catalog, used when flattening it for display or upload.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct CatalogEntry<'a> {
    pub category: &'a str,
    pub item: &'a str,
    pub price: Amount,
}

impl PriceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The menu used when no catalog file exists yet.
    pub fn house_menu() -> Self {
        let mut catalog = Self::new();
        for &(category, items) in HOUSE_MENU {
            for &(item, price) in items {
                catalog.insert(category, item, Amount::from(price));
            }
        }
        catalog
    }

    /// Adds or replaces an item without any checks. Used while building a catalog from trusted
    /// data; interactive edits go through `AppState`.
    pub(crate) fn insert(
        &mut self,
        category: impl Into<String>,
        item: impl Into<String>,
        price: Amount,
    ) -> Option<Amount> {
        self.categories
            .entry(category.into())
            .or_default()
            .insert(item.into(), price)
    }

    /// Sets the price of `item` in `category`, creating either if needed. Returns the previous
    /// price if there was one.
    pub(crate) fn set_price(
        &mut self,
        category: &str,
        item: &str,
        price: Amount,
    ) -> Result<Option<Amount>, ValidationError> {
        if price.is_negative() {
            return Err(ValidationError::InvalidPrice { price });
        }
        if category.trim().is_empty() || item.trim().is_empty() {
            return Err(ValidationError::MissingItem {
                category: category.to_string(),
                item: item.to_string(),
            });
        }
        Ok(self.insert(category, item, price))
    }

    /// Removes `item` from `category`. A category left without items is removed as well.
    pub(crate) fn remove_item(
        &mut self,
        category: &str,
        item: &str,
    ) -> Result<Amount, ValidationError> {
        let items = self
            .categories
            .get_mut(category)
            .ok_or_else(|| missing(category, item))?;
        let price = items.remove(item).ok_or_else(|| missing(category, item))?;
        if items.is_empty() {
            let _ = self.categories.remove(category);
        }
        Ok(price)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn items(&self, category: &str) -> Option<&BTreeMap<String, Amount>> {
        self.categories.get(category)
    }

    /// The price of `item` within `category`.
    pub fn price(&self, category: &str, item: &str) -> Option<Amount> {
        self.categories.get(category)?.get(item).copied()
    }

    /// Like `price` but fails with `MissingItem`, for use during sale validation.
    pub fn lookup(&self, category: &str, item: &str) -> Result<Amount, ValidationError> {
        self.price(category, item)
            .ok_or_else(|| missing(category, item))
    }

    /// Finds the first category, in catalog order, that lists `item`, and returns it together with
    /// the item's price.
    pub fn resolve(&self, item: &str) -> Result<(&str, Amount), ValidationError> {
        self.categories
            .iter()
            .find_map(|(category, items)| items.get(item).map(|p| (category.as_str(), *p)))
            .ok_or_else(|| ValidationError::ItemNotFound {
                item: item.to_string(),
            })
    }

    /// All entries in catalog order.
    pub fn entries(&self) -> impl Iterator<Item = CatalogEntry<'_>> {
        self.categories.iter().flat_map(|(category, items)| {
            items.iter().map(move |(item, price)| CatalogEntry {
                category,
                item,
                price: *price,
            })
        })
    }

    /// The number of items across all categories.
    pub fn len(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn missing(category: &str, item: &str) -> ValidationError {
    ValidationError::MissingItem {
        category: category.to_string(),
        item: item.to_string(),
    }
}

/// Prices in KSh.
const HOUSE_MENU: &[(&str, &[(&str, u32)])] = &[
    (
        "Snacks",
        &[
            ("Chapo", 30),
            ("Ndazi", 20),
            ("Tm", 30),
            ("Cake", 30),
            ("Hcake", 30),
            ("Eggs", 40),
            ("Omelet", 50),
            ("Sausage/Smokie", 50),
        ],
    ),
    (
        "Food",
        &[
            ("ChapoMix", 90),
            ("Walimix", 150),
            ("Ugalimix", 150),
            ("PilauMix", 180),
            ("ChapoMinji", 140),
            ("Waliminji", 200),
            ("Ugaliminji", 200),
            ("PilauMinji", 200),
            ("BeefChapo", 190),
            ("BeefUgali", 250),
            ("BeefRice", 250),
            ("BeefPilau", 300),
            ("UgaliMatumbo", 200),
            ("RiceMatumbo", 200),
            ("ChapoMatumbo", 140),
            ("PilauMatumbo", 200),
            ("UgaliManagu", 150),
            ("RiceManagu", 150),
            ("ChapoManagu", 90),
            ("PilauManagu", 200),
            ("UgaliFryManagu", 300),
            ("RiceFryManagu", 300),
            ("ChapoFryManagu", 240),
            ("PilauFryManagu", 300),
            ("UgaliMatumboManagu", 200),
            ("RiceMatumboManagu", 200),
            ("ChapoMatumboManagu", 200),
            ("PilauMatumboManagu", 200),
            ("UgaliMboga", 100),
            ("RiceMboga", 100),
            ("ChapoMboga", 40),
            ("UgaliPlain", 50),
            ("MchelePlain", 100),
            ("PilauPlain", 100),
            ("ServiceNyama", 75),
        ],
    ),
    (
        "Kuku",
        &[
            ("KukuChapo", 290),
            ("KukuUgali", 350),
            ("KukuRice", 350),
            ("KukuPilau", 400),
            ("UgaliKukuManagu", 400),
            ("RiceKukuManagu", 400),
            ("ChapoKukuManagu", 340),
            ("PilauKukuManagu", 400),
        ],
    ),
    (
        "Drinks",
        &[
            ("BlackCoffee", 30),
            ("WhiteCoffee", 50),
            ("LemonTea", 30),
            ("Concusion", 50),
            ("Predator", 70),
            ("Soda", 50),
            ("PlasticSoda", 50),
            ("Dasani_.5ltr", 50),
            ("Dasani_1ltr", 100),
            ("Water_.5ltr", 40),
            ("Water_1ltr", 80),
            ("MinuteMaid", 80),
        ],
    ),
    ("No. cups of tea", &[("Tea", 30)]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_house_menu() {
        let catalog = PriceCatalog::house_menu();
        assert_eq!(catalog.categories().count(), 5);
        assert_eq!(catalog.price("Snacks", "Chapo"), Some(Amount::from(30)));
        assert_eq!(catalog.price("No. cups of tea", "Tea"), Some(Amount::from(30)));
        assert_eq!(catalog.price("Snacks", "Tea"), None);
    }

    #[test]
    fn test_same_item_in_two_categories_is_distinct() {
        let mut catalog = PriceCatalog::new();
        catalog.insert("Snacks", "Cake", Amount::from(30));
        catalog.insert("Desserts", "Cake", Amount::from(80));
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.price("Snacks", "Cake"), Some(Amount::from(30)));
        assert_eq!(catalog.price("Desserts", "Cake"), Some(Amount::from(80)));
    }

    #[test]
    fn test_resolve_uses_catalog_order() {
        let mut catalog = PriceCatalog::new();
        catalog.insert("Snacks", "Cake", Amount::from(30));
        catalog.insert("Desserts", "Cake", Amount::from(80));
        let (category, price) = catalog.resolve("Cake").unwrap();
        assert_eq!(category, "Desserts");
        assert_eq!(price, Amount::from(80));
    }

    #[test]
    fn test_resolve_unknown_item() {
        let catalog = PriceCatalog::house_menu();
        let err = catalog.resolve("Pizza").unwrap_err();
        assert_eq!(
            err,
            ValidationError::ItemNotFound {
                item: "Pizza".to_string()
            }
        );
    }

    #[test]
    fn test_lookup_wrong_category() {
        let catalog = PriceCatalog::house_menu();
        assert!(matches!(
            catalog.lookup("Drinks", "Chapo"),
            Err(ValidationError::MissingItem { .. })
        ));
    }

    #[test]
    fn test_set_price_rejects_negative() {
        let mut catalog = PriceCatalog::house_menu();
        let price = Amount::from_str("-5").unwrap();
        assert!(matches!(
            catalog.set_price("Snacks", "Chapo", price),
            Err(ValidationError::InvalidPrice { .. })
        ));
        assert_eq!(catalog.price("Snacks", "Chapo"), Some(Amount::from(30)));
    }

    #[test]
    fn test_set_price_returns_previous() {
        let mut catalog = PriceCatalog::house_menu();
        let old = catalog
            .set_price("Snacks", "Chapo", Amount::from(35))
            .unwrap();
        assert_eq!(old, Some(Amount::from(30)));
        assert_eq!(catalog.price("Snacks", "Chapo"), Some(Amount::from(35)));
    }

    #[test]
    fn test_remove_last_item_drops_category() {
        let mut catalog = PriceCatalog::house_menu();
        let price = catalog.remove_item("No. cups of tea", "Tea").unwrap();
        assert_eq!(price, Amount::from(30));
        assert!(catalog.items("No. cups of tea").is_none());
        assert!(catalog.remove_item("No. cups of tea", "Tea").is_err());
    }

    #[test]
    fn test_entries_are_flat_and_ordered() {
        let mut catalog = PriceCatalog::new();
        catalog.insert("B", "y", Amount::from(2));
        catalog.insert("A", "x", Amount::from(1));
        let items: Vec<&str> = catalog.entries().map(|e| e.item).collect();
        assert_eq!(items, vec!["x", "y"]);
    }

    #[test]
    fn test_json_shape() {
        let mut catalog = PriceCatalog::new();
        catalog.insert("Snacks", "Chapo", Amount::from(30));
        let json = serde_json::to_string(&catalog).unwrap();
        assert_eq!(json, r#"{"Snacks":{"Chapo":"30"}}"#);
        let parsed: PriceCatalog = serde_json::from_str(r#"{"Snacks":{"Chapo":30}}"#).unwrap();
        assert_eq!(parsed, catalog);
    }
}

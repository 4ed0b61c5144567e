//! Showing and editing the price catalog.

use crate::args::{RemoveItemArgs, SetPriceArgs};
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::{Amount, PriceCatalog};
use crate::state::AppState;
use crate::{Config, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// The outcome of a catalog edit.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub category: String,
    pub item: String,
    /// The price before the edit; `None` when the item was added.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_price: Option<Amount>,
    /// The price after the edit; `None` when the item was removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_price: Option<Amount>,
}

/// Lists every category with its items and prices.
pub async fn catalog_show(config: Config) -> Result<Out<PriceCatalog>> {
    let state = AppState::load(&config)
        .await
        .pub_result(ErrorType::Persistence)?;
    let catalog = state.catalog().clone();
    let mut message = String::new();
    for category in catalog.categories() {
        let _ = writeln!(message, "{category}");
        for (item, price) in catalog.items(category).into_iter().flatten() {
            let _ = writeln!(message, "  {item}: {price}");
        }
    }
    message.push_str(&format!(
        "{} in {} categories",
        super::plural(catalog.len(), "item"),
        catalog.categories().count()
    ));
    Ok(Out::new(message, catalog))
}

/// Adds an item or changes its price after unlocking with the price password.
///
/// # Errors
///
/// - `ErrorType::Auth` if the password is wrong; nothing changes.
/// - `ErrorType::Validation` if the price is negative or the names are empty.
/// - `ErrorType::Persistence` if `catalog.json` cannot be written. The edit is lost with the
///   process, so running the command again retries it.
pub async fn set_price(config: Config, args: SetPriceArgs) -> Result<Out<PriceChange>> {
    let mut state = AppState::load(&config)
        .await
        .pub_result(ErrorType::Persistence)?;
    state
        .authenticate(args.password())
        .pub_result(ErrorType::Auth)?;
    let old_price = state
        .set_price(args.category(), args.item(), args.price())
        .classify(ErrorType::Persistence)?;
    state
        .save_catalog()
        .await
        .pub_result(ErrorType::Persistence)?;

    let message = match old_price {
        Some(old) => format!(
            "Changed the price of {} in {} from {old} to {}",
            args.item(),
            args.category(),
            args.price()
        ),
        None => format!(
            "Added {} to {} at {}",
            args.item(),
            args.category(),
            args.price()
        ),
    };
    Ok(Out::new(
        message,
        PriceChange {
            category: args.category().to_string(),
            item: args.item().to_string(),
            old_price,
            new_price: Some(args.price()),
        },
    ))
}

/// Removes an item from a category after unlocking with the price password. Sales already
/// recorded for the item keep their own copy of its price and category.
pub async fn remove_item(config: Config, args: RemoveItemArgs) -> Result<Out<PriceChange>> {
    let mut state = AppState::load(&config)
        .await
        .pub_result(ErrorType::Persistence)?;
    state
        .authenticate(args.password())
        .pub_result(ErrorType::Auth)?;
    let old_price = state
        .remove_item(args.category(), args.item())
        .classify(ErrorType::Persistence)?;
    state
        .save_catalog()
        .await
        .pub_result(ErrorType::Persistence)?;

    Ok(Out::new(
        format!("Removed {} from {}", args.item(), args.category()),
        PriceChange {
            category: args.category().to_string(),
            item: args.item().to_string(),
            old_price: Some(old_price),
            new_price: None,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_catalog_show() {
        let env = TestEnv::new().await;
        let out = catalog_show(env.config()).await.unwrap();
        assert!(out.message().contains("Snacks\n  Cake: KSh 30.00"));
        assert!(out.message().ends_with("in 5 categories"));
        assert_eq!(out.structure().unwrap(), &PriceCatalog::house_menu());
    }

    #[tokio::test]
    async fn test_set_price_persists() {
        let env = TestEnv::new().await;
        let args = SetPriceArgs::new("bushman", "Snacks", "Chapo", Amount::from(35));
        let out = set_price(env.config(), args).await.unwrap();
        assert_eq!(
            out.message(),
            "Changed the price of Chapo in Snacks from KSh 30.00 to KSh 35.00"
        );
        assert_eq!(
            env.state().await.catalog().price("Snacks", "Chapo"),
            Some(Amount::from(35))
        );

        let args = SetPriceArgs::new("bushman", "Specials", "Githeri", Amount::from(120));
        let out = set_price(env.config(), args).await.unwrap();
        assert_eq!(out.structure().unwrap().old_price, None);
        assert!(env
            .state()
            .await
            .catalog()
            .price("Specials", "Githeri")
            .is_some());
    }

    #[tokio::test]
    async fn test_set_price_wrong_password() {
        let env = TestEnv::new().await;
        let args = SetPriceArgs::new("guess", "Snacks", "Chapo", Amount::from(1));
        let err = set_price(env.config(), args).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Auth);
        assert_eq!(
            env.state().await.catalog().price("Snacks", "Chapo"),
            Some(Amount::from(30))
        );
    }

    #[tokio::test]
    async fn test_set_negative_price_is_validation() {
        let env = TestEnv::new().await;
        let args = SetPriceArgs::new("bushman", "Snacks", "Chapo", Amount::from_str("-1").unwrap());
        let err = set_price(env.config(), args).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
    }

    #[tokio::test]
    async fn test_remove_item() {
        let env = TestEnv::new().await;
        let out = remove_item(env.config(), RemoveItemArgs::new("bushman", "Drinks", "Soda"))
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().old_price, Some(Amount::from(50)));
        assert_eq!(env.state().await.catalog().price("Drinks", "Soda"), None);

        let err = remove_item(env.config(), RemoveItemArgs::new("bushman", "Drinks", "Soda"))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
    }
}

use crate::{db_types::CatalogItem, traits::PaymentGatewayError};

#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Fetches the catalog items with the given ids that can currently be bought: the item's event must be active and
    /// its price must be positive. Unknown ids are silently skipped. Results are ordered by item id.
    async fn fetch_purchasable_items(&self, item_ids: &[i64]) -> Result<Vec<CatalogItem>, PaymentGatewayError>;
}

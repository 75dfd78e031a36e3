use crate::errors::AppError;
use shop_types::domain::id::ObjectId;
use shop_types::domain::product::Product;
use shop_types::domain::request::StockRequest;
use shop_types::ports::product_repository::ProductRepository;

pub struct StockService<P: ProductRepository> {
    products: P,
}

impl<P: ProductRepository> StockService<P> {
    pub fn new(products: P) -> Self {
        Self { products }
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.products.list_products().await?)
    }

    /// Overwrites the stock level. Concurrent writers race; the last one wins.
    pub async fn update_product_stock(
        &self,
        product_id: &str,
        request: StockRequest,
    ) -> Result<Product, AppError> {
        let stock = request
            .validate()
            .map_err(|details| AppError::invalid("Invalid stock value.", details))?;
        let id = ObjectId::parse(product_id)
            .map_err(|e| AppError::invalid("Invalid product id.", vec![e.to_string()]))?;

        let product = self
            .products
            .update_stock(id, stock)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {id} not found.")))?;
        tracing::info!(product_id = %id, stock, "stock updated");
        Ok(product)
    }
}

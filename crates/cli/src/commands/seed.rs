//! Seed the catalog from a YAML file.
//!
//! Products whose name already exists are skipped, so the command can be
//! re-run after editing the file.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use bazaar_core::{Money, ProductCategory, ProductStatus};
use bazaar_storefront::db::ProductRepository;
use bazaar_storefront::models::product::{NewProduct, normalize_tags};

use super::{CliError, connect};

/// Top level of a catalog file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    pub products: Vec<SeedProduct>,
}

/// One product entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    pub compare_price: Option<Money>,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: ProductCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub inventory: i32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub status: ProductStatus,
}

impl SeedProduct {
    fn into_new_product(self) -> NewProduct {
        NewProduct {
            name: self.name.trim().to_owned(),
            description: self.description.trim().to_owned(),
            price: self.price,
            compare_price: self.compare_price,
            images: self.images,
            category: self.category,
            tags: normalize_tags(self.tags),
            inventory: self.inventory,
            featured: self.featured,
            status: self.status,
        }
    }
}

/// Problems that would make an insert fail or produce a broken listing.
fn validate(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();
    for (index, product) in catalog.products.iter().enumerate() {
        let label = format!("products[{index}]");
        if product.name.trim().is_empty() {
            errors.push(format!("{label}: name is empty"));
        }
        if product.inventory < 0 {
            errors.push(format!("{label}: inventory is negative"));
        }
        if product.compare_price.is_some_and(|compare| compare <= product.price) {
            errors.push(format!("{label}: compare_price must exceed price"));
        }
    }
    errors
}

fn parse(content: &str) -> Result<CatalogFile, CliError> {
    let catalog: CatalogFile = serde_yaml::from_str(content)?;
    let errors = validate(&catalog);
    if !errors.is_empty() {
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CliError::InvalidCatalog(format!(
            "{} validation errors found",
            errors.len()
        )));
    }
    Ok(catalog)
}

/// Insert the products listed in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, or if a
/// database operation fails.
pub async fn catalog(file_path: &str) -> Result<(), CliError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading catalog from file");

    // Read and validate before connecting to the database
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let catalog = parse(&content)?;
    info!(products = catalog.products.len(), "Catalog validated");

    let pool = connect().await?;
    let products = ProductRepository::new(&pool);

    let mut inserted = 0_usize;
    let mut skipped = 0_usize;
    for entry in catalog.products {
        let product = entry.into_new_product();
        if products.exists_named(&product.name).await? {
            skipped += 1;
            continue;
        }
        let created = products.create(&product).await?;
        info!(product_id = %created.id, name = %created.name, "Inserted");
        inserted += 1;
    }

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");
    info!("  Products skipped (already exist): {skipped}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_is_valid() {
        let content = include_str!("../../seed/catalog.yaml");
        let catalog = parse(content).unwrap();
        assert!(!catalog.products.is_empty());
    }

    #[test]
    fn test_rejects_compare_price_below_price() {
        let content = r#"
products:
  - name: Mug
    price: "12.00"
    compare_price: "10.00"
    category: home
"#;
        assert!(matches!(parse(content), Err(CliError::InvalidCatalog(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let content = r#"
products:
  - name: Mug
    price: "12.00"
    category: home
    colour: blue
"#;
        assert!(matches!(parse(content), Err(CliError::Yaml(_))));
    }
}

use serde::Deserialize;

use crate::model::Product;

/// Model list filter. Archived products are hidden unless asked for; the
/// query matches name, article or description, ignoring case.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductFilter {
    #[serde(rename = "q")]
    pub query: Option<String>,
    #[serde(rename = "archived")]
    pub include_archived: bool,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if product.is_archived && !self.include_archived {
            return false;
        }

        let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
            return true;
        };
        let needle = query.to_lowercase();

        [
            product.details.name.as_str(),
            product.article.as_str(),
            product.details.description.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        products.into_iter().filter(|p| self.matches(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProductDetails;

    fn product(name: &str, article: &str, description: &str, archived: bool) -> Product {
        let mut product = Product::new(
            article.to_string(),
            ProductDetails {
                name: name.to_string(),
                description: description.to_string(),
                ..ProductDetails::default()
            },
        );
        product.is_archived = archived;
        product
    }

    #[test]
    fn test_archived_hidden_by_default() {
        let products = vec![
            product("Vase", "PM-AAAAAA", "", false),
            product("Old vase", "PM-BBBBBB", "", true),
        ];

        assert_eq!(ProductFilter::default().apply(products.clone()).len(), 1);

        let all = ProductFilter { include_archived: true, ..ProductFilter::default() };
        assert_eq!(all.apply(products).len(), 2);
    }

    #[test]
    fn test_query_matches_any_text_field() {
        let products = vec![
            product("Dragon figurine", "PM-DRG001", "", false),
            product("Planter", "PM-PLT001", "Self-watering pot", false),
            product("Hook", "PM-HK0001", "", false),
        ];

        let by = |q: &str| ProductFilter { query: Some(q.to_string()), include_archived: false };

        assert_eq!(by("DRAGON").apply(products.clone()).len(), 1);
        assert_eq!(by("plt").apply(products.clone()).len(), 1);
        assert_eq!(by("watering").apply(products.clone()).len(), 1);
        assert_eq!(by("   ").apply(products.clone()).len(), 3);
        assert!(by("lamp").apply(products).is_empty());
    }
}

//! Static catalog and the catalog filter/sort view.

use std::cmp::Ordering;

use noscope_core::{Price, Product, ProductId};

/// The static product catalog.
///
/// This is the authoritative product list; the on-disk product cache is a
/// mirror of it (see [`crate::store::products`]).
#[must_use]
pub fn static_catalog() -> Vec<Product> {
    vec![
        product(
            "p1",
            "Combo Gamer",
            400_000,
            "Periféricos",
            "/static/images/products/product-4.png",
            "Combo completo para gamers iniciantes.",
        ),
        product(
            "p2",
            "Smartband 4",
            19_990,
            "Wearables",
            "/static/images/exclusive.png",
            "Acompanhe sua atividade física.",
        ),
        product(
            "p3",
            "Placa de Video",
            34_990,
            "Periféricos",
            "/static/images/products/product-5.png",
            "Som imersivo com microfone flexível.",
        ),
        product(
            "p4",
            "Controle PS5",
            89_900,
            "Móveis",
            "/static/images/products/product-6.png",
            "Cadeira ergonômica para longas sessões.",
        ),
        product(
            "p5",
            "Cadeira Gamer",
            29_990,
            "Periféricos",
            "/static/images/products/product-7.png",
            "Switches azuis, iluminação RGB.",
        ),
    ]
}

fn product(
    id: &str,
    name: &str,
    cents: u32,
    category: &str,
    image: &str,
    description: &str,
) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        price: Price::from_cents(cents),
        category: category.to_owned(),
        images: vec![image.to_owned()],
        description: description.to_owned(),
    }
}

/// Catalog ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Keep catalog order.
    #[default]
    None,
    PriceAsc,
    PriceDesc,
    NameAsc,
}

impl SortMode {
    /// Parse the sort select value. Empty or unknown values mean no sorting.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "price-asc" => Self::PriceAsc,
            "price-desc" => Self::PriceDesc,
            "name-asc" => Self::NameAsc,
            _ => Self::None,
        }
    }

    /// The select value for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::NameAsc => "name-asc",
        }
    }
}

/// Filter and sort parameters for the catalog view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Case-insensitive substring matched against the product name.
    pub term: String,
    /// Exact category; empty matches any category.
    pub category: String,
    pub sort: SortMode,
}

impl CatalogQuery {
    /// Build a query from raw request parameters.
    #[must_use]
    pub fn from_params(term: Option<&str>, category: Option<&str>, sort: Option<&str>) -> Self {
        Self {
            term: term.map(str::trim).unwrap_or_default().to_owned(),
            category: category.unwrap_or_default().to_owned(),
            sort: sort.map(SortMode::parse).unwrap_or_default(),
        }
    }
}

/// Filter `catalog` by name term and category, then sort.
///
/// Sorting is stable, so ties (and the unsorted view) keep catalog order.
#[must_use]
pub fn filter_catalog(catalog: &[Product], query: &CatalogQuery) -> Vec<Product> {
    let term = query.term.trim().to_lowercase();

    let mut matches: Vec<Product> = catalog
        .iter()
        .filter(|p| term.is_empty() || p.name.to_lowercase().contains(&term))
        .filter(|p| query.category.is_empty() || p.category == query.category)
        .cloned()
        .collect();

    match query.sort {
        SortMode::None => {}
        SortMode::PriceAsc => matches.sort_by(|a, b| a.price.cmp(&b.price)),
        SortMode::PriceDesc => matches.sort_by(|a, b| b.price.cmp(&a.price)),
        SortMode::NameAsc => matches.sort_by(|a, b| compare_names(&a.name, &b.name)),
    }

    matches
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Distinct categories in first-seen catalog order.
#[must_use]
pub fn categories(catalog: &[Product]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for product in catalog {
        if !seen.contains(&product.category) {
            seen.push(product.category.clone());
        }
    }
    seen
}

/// Look a product up by id.
#[must_use]
pub fn find_product<'a>(catalog: &'a [Product], id: &ProductId) -> Option<&'a Product> {
    catalog.iter().find(|p| &p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_empty_query_returns_catalog_in_order() {
        let catalog = static_catalog();
        let result = filter_catalog(&catalog, &CatalogQuery::default());
        assert_eq!(result, catalog);
    }

    #[test]
    fn test_term_is_case_insensitive_substring() {
        let catalog = static_catalog();
        let query = CatalogQuery::from_params(Some("combo"), None, None);
        let result = filter_catalog(&catalog, &query);

        let expected: Vec<&str> = catalog
            .iter()
            .filter(|p| p.name.to_lowercase().contains("combo"))
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids(&result), expected);
        assert_eq!(ids(&result), vec!["p1"]);

        let upper = CatalogQuery::from_params(Some("  GAMER "), None, None);
        assert_eq!(ids(&filter_catalog(&catalog, &upper)), vec!["p1", "p5"]);
    }

    #[test]
    fn test_category_is_exact_match() {
        let catalog = static_catalog();
        let query = CatalogQuery::from_params(None, Some("Periféricos"), None);
        assert_eq!(ids(&filter_catalog(&catalog, &query)), vec!["p1", "p3", "p5"]);

        let partial = CatalogQuery::from_params(None, Some("Perif"), None);
        assert!(filter_catalog(&catalog, &partial).is_empty());
    }

    #[test]
    fn test_term_and_category_combine() {
        let catalog = static_catalog();
        let query = CatalogQuery::from_params(Some("gamer"), Some("Periféricos"), Some("price-asc"));
        assert_eq!(ids(&filter_catalog(&catalog, &query)), vec!["p5", "p1"]);
    }

    #[test]
    fn test_sort_modes() {
        let catalog = static_catalog();

        let asc = CatalogQuery::from_params(None, None, Some("price-asc"));
        assert_eq!(
            ids(&filter_catalog(&catalog, &asc)),
            vec!["p2", "p5", "p3", "p4", "p1"]
        );

        let desc = CatalogQuery::from_params(None, None, Some("price-desc"));
        assert_eq!(
            ids(&filter_catalog(&catalog, &desc)),
            vec!["p1", "p4", "p3", "p5", "p2"]
        );

        let name = CatalogQuery::from_params(None, None, Some("name-asc"));
        assert_eq!(
            ids(&filter_catalog(&catalog, &name)),
            vec!["p5", "p1", "p4", "p3", "p2"]
        );
    }

    #[test]
    fn test_price_sort_is_stable() {
        let mut catalog = static_catalog();
        for p in &mut catalog {
            p.price = Price::from_cents(100);
        }
        let query = CatalogQuery::from_params(None, None, Some("price-desc"));
        assert_eq!(ids(&filter_catalog(&catalog, &query)), ids(&catalog));
    }

    #[test]
    fn test_unknown_sort_keeps_order() {
        assert_eq!(SortMode::parse("rating"), SortMode::None);
        assert_eq!(SortMode::parse(""), SortMode::None);
        assert_eq!(SortMode::parse(SortMode::NameAsc.as_str()), SortMode::NameAsc);
    }

    #[test]
    fn test_categories_first_seen_order() {
        assert_eq!(
            categories(&static_catalog()),
            vec!["Periféricos", "Wearables", "Móveis"]
        );
    }

    #[test]
    fn test_find_product() {
        let catalog = static_catalog();
        assert_eq!(
            find_product(&catalog, &ProductId::new("p3")).map(|p| p.name.as_str()),
            Some("Placa de Video")
        );
        assert!(find_product(&catalog, &ProductId::new("nope")).is_none());
    }
}

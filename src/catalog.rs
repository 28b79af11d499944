//! Request URLs and response shapes of the two catalog endpoints.
//!
//! The listing endpoint pages through a category (`offset` cursor, `limit`
//! page size, `total` catalog size). The detail endpoint returns one product
//! plus at most one offer.

use crate::error::CrawlError;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct PaginationMetadata {
    pub limit: u32,
    pub offset: u32,
    pub total: u32,
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(rename = "_result")]
    result: Option<PaginationMetadata>,
    products: Option<Vec<ListingItem>>,
}

#[derive(Debug, Deserialize)]
struct ListingItem {
    id: u64,
}

/// One decoded page of the listing endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    pub pagination: PaginationMetadata,
    pub product_ids: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    product: DetailProduct,
    offer: Option<DetailOffer>,
}

#[derive(Debug, Deserialize)]
struct DetailProduct {
    result: DetailProductResult,
}

#[derive(Debug, Deserialize)]
struct DetailProductResult {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailOffer {
    result: Option<DetailOfferResult>,
}

#[derive(Debug, Deserialize)]
struct DetailOfferResult {
    offers: Option<Vec<Offer>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Offer {
    sales_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub price: f64,
}

/// Listing query for `category`; offset 0 is the first page and carries no
/// `offset` parameter.
pub fn search_url(base: &str, category: u64, offset: u32) -> Result<String, CrawlError> {
    let filter = format!(
        r#"{{"id":"category.id","value":"{}","fixed":true}}"#,
        category
    );
    let mut params = vec![("source", "omega".to_string()), ("filter", filter)];
    if offset != 0 {
        params.push(("offset", offset.to_string()));
    }

    Url::parse_with_params(base, &params)
        .map(String::from)
        .map_err(|source| CrawlError::Url {
            url: base.to_string(),
            source,
        })
}

pub fn product_url(base: &str, product_id: u64) -> Result<String, CrawlError> {
    let params = [
        ("id", product_id.to_string()),
        ("offerLimit", "1".to_string()),
        ("opn", String::new()),
        ("storeId", "nil".to_string()),
    ];

    Url::parse_with_params(base, &params)
        .map(String::from)
        .map_err(|source| CrawlError::Url {
            url: base.to_string(),
            source,
        })
}

pub fn parse_listing(body: &str, url: &str) -> Result<ListingPage, CrawlError> {
    let response: ListingResponse =
        serde_json::from_str(body).map_err(|e| CrawlError::decode(url, e))?;

    Ok(ListingPage {
        pagination: response.result.unwrap_or_default(),
        product_ids: response
            .products
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.id)
            .collect(),
    })
}

/// Decodes a detail document. A product without offers is priced at zero.
pub fn parse_product(body: &str, url: &str) -> Result<ProductRecord, CrawlError> {
    let response: DetailResponse =
        serde_json::from_str(body).map_err(|e| CrawlError::decode(url, e))?;

    // A null at any level of the offer means no offer.
    let price = response
        .offer
        .and_then(|offer| offer.result)
        .and_then(|result| result.offers)
        .and_then(|offers| offers.first().and_then(|offer| offer.sales_price))
        .unwrap_or(0.0);

    Ok(ProductRecord {
        id: response.product.result.id.unwrap_or_default(),
        name: response.product.result.name.unwrap_or_default(),
        price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH: &str = "https://catalog.test/search";
    const PRODUCT: &str = "https://catalog.test/product";

    #[test]
    fn first_page_has_no_offset() {
        let url = Url::parse(&search_url(SEARCH, 123, 0).unwrap()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("source".to_string(), "omega".to_string()),
                (
                    "filter".to_string(),
                    r#"{"id":"category.id","value":"123","fixed":true}"#.to_string()
                ),
            ]
        );
    }

    #[test]
    fn later_pages_carry_offset() {
        let url = Url::parse(&search_url(SEARCH, 123, 100).unwrap()).unwrap();
        let offset = url
            .query_pairs()
            .find(|(k, _)| k == "offset")
            .map(|(_, v)| v.into_owned());
        assert_eq!(offset.as_deref(), Some("100"));
    }

    #[test]
    fn product_url_params() {
        let url = Url::parse(&product_url(PRODUCT, 42).unwrap()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("id".to_string(), "42".to_string()));
        assert_eq!(pairs[1], ("offerLimit".to_string(), "1".to_string()));
        assert_eq!(pairs[2], ("opn".to_string(), String::new()));
        assert_eq!(pairs[3], ("storeId".to_string(), "nil".to_string()));
    }

    #[test]
    fn listing_decodes_pagination_and_ids() {
        let body = r#"{"_result":{"limit":24,"offset":0,"total":100},"products":[{"id":7},{"id":9}]}"#;
        let page = parse_listing(body, "u").unwrap();
        assert_eq!(
            page.pagination,
            PaginationMetadata {
                limit: 24,
                offset: 0,
                total: 100
            }
        );
        assert_eq!(page.product_ids, vec![7, 9]);
    }

    #[test]
    fn listing_without_products_is_empty() {
        let body = r#"{"_result":{"limit":24,"offset":480,"total":100}}"#;
        assert!(parse_listing(body, "u").unwrap().product_ids.is_empty());
    }

    #[test]
    fn listing_with_null_products_is_empty() {
        let body = r#"{"_result":{"limit":24,"offset":0,"total":0},"products":null}"#;
        let page = parse_listing(body, "u").unwrap();
        assert!(page.product_ids.is_empty());
        assert_eq!(page.pagination.limit, 24);
    }

    #[test]
    fn listing_without_result_has_no_pagination() {
        let bodies = [
            r#"{"products":[{"id":5}]}"#,
            r#"{"_result":null,"products":[{"id":5}]}"#,
        ];
        for body in bodies {
            let page = parse_listing(body, "u").unwrap();
            assert_eq!(page.pagination, PaginationMetadata::default());
            assert_eq!(page.product_ids, vec![5]);
        }
    }

    #[test]
    fn product_takes_first_offer_sales_price() {
        let body = r#"{
            "product":{"result":{"id":"42","name":"Kettle"}},
            "offer":{"result":{"offers":[{"salesPrice":19.9,"listPrice":25.0},{"salesPrice":1.0}]}}
        }"#;
        let record = parse_product(body, "u").unwrap();
        assert_eq!(record.id, "42");
        assert_eq!(record.name, "Kettle");
        assert_eq!(record.price, 19.9);
    }

    #[test]
    fn product_without_offer_costs_zero() {
        let body = r#"{"product":{"result":{"id":"42","name":"Kettle"}}}"#;
        assert_eq!(parse_product(body, "u").unwrap().price, 0.0);

        let body = r#"{"product":{"result":{"id":"42","name":"Kettle"}},"offer":{"result":{"offers":[]}}}"#;
        assert_eq!(parse_product(body, "u").unwrap().price, 0.0);
    }

    #[test]
    fn null_offer_costs_zero() {
        let bodies = [
            r#"{"product":{"result":{"id":"42","name":"Kettle"}},"offer":null}"#,
            r#"{"product":{"result":{"id":"42","name":"Kettle"}},"offer":{"result":null}}"#,
            r#"{"product":{"result":{"id":"42","name":"Kettle"}},"offer":{"result":{"offers":null}}}"#,
        ];
        for body in bodies {
            let record = parse_product(body, "u").unwrap();
            assert_eq!(record.name, "Kettle");
            assert_eq!(record.price, 0.0);
        }
    }

    #[test]
    fn product_without_id_is_still_printed() {
        let bodies = [
            r#"{"product":{"result":{"name":"Kettle"}},"offer":{"result":{"offers":[{"salesPrice":3.5}]}}}"#,
            r#"{"product":{"result":{"id":null,"name":"Kettle"}},"offer":{"result":{"offers":[{"salesPrice":3.5}]}}}"#,
        ];
        for body in bodies {
            let record = parse_product(body, "u").unwrap();
            assert_eq!(record.id, "");
            assert_eq!(record.name, "Kettle");
            assert_eq!(record.price, 3.5);
        }
    }

    #[test]
    fn garbage_body_is_a_decode_error() {
        assert!(matches!(
            parse_product("<html>", "u"),
            Err(CrawlError::Decode { .. })
        ));
    }
}

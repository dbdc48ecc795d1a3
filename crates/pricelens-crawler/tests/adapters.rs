//! Adapter integration tests against a local `wiremock` server — no real
//! network traffic. Covers query-parameter mapping on the wire, response
//! normalization, the adapter-boundary filtering invariant, retry behavior,
//! and the 1688 unreachable-fallback path.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pricelens_core::{SearchFilters, SortKey, StockStatus};
use pricelens_crawler::{
    Alibaba1688Crawler, CrawlerConfig, CrawlerError, PchomeCrawler, PlatformCrawler, ShopeeCrawler,
};

/// Config suitable for tests: short timeout, no retry sleeping.
fn test_config() -> CrawlerConfig {
    CrawlerConfig {
        request_timeout_secs: 5,
        user_agent: "pricelens-test/0.1".to_owned(),
        max_attempts: 1,
        retry_base_delay_ms: 0,
    }
}

fn test_config_with_attempts(max_attempts: u32) -> CrawlerConfig {
    CrawlerConfig {
        max_attempts,
        ..test_config()
    }
}

fn shopee_item(name: &str, price_raw: f64, shopid: u64, itemid: u64) -> serde_json::Value {
    json!({
        "item_basic": {
            "name": name,
            "price": price_raw,
            "price_before_discount": 0,
            "image": "abcdef",
            "shopid": shopid,
            "itemid": itemid,
            "item_rating": {"rating_star": 4.8, "rating_count": [321]},
            "historical_sold": 1500,
            "stock": 10
        }
    })
}

// ---------------------------------------------------------------------------
// Shopee
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shopee_search_normalizes_prices_and_builds_urls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/search/search_items"))
        .and(query_param("keyword", "iphone"))
        .and(query_param("by", "relevancy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "items": [shopee_item("iPhone 15 128G", 2_890_000_000.0, 77, 888)]
        })))
        .mount(&server)
        .await;

    let crawler = ShopeeCrawler::with_base_url(&test_config(), server.uri()).unwrap();
    let results = crawler
        .search("iphone", &SearchFilters::default())
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    let r = &results[0];
    assert_eq!(r.name, "iPhone 15 128G");
    assert!((r.price - 28_900.0).abs() < f64::EPSILON);
    assert!(r.original_price.is_none(), "zero pre-discount price is None");
    assert_eq!(r.product_url, format!("{}/product/77/888", server.uri()));
    assert_eq!(
        r.image_url.as_deref(),
        Some("https://cf.shopee.tw/file/abcdef")
    );
    assert_eq!(r.rating, Some(4.8));
    assert_eq!(r.review_count, Some(321));
    assert_eq!(r.sales_volume, Some(1500));
    assert_eq!(r.stock_status, Some(StockStatus::Available));
}

#[tokio::test]
async fn shopee_search_sends_price_sort_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/search/search_items"))
        .and(query_param("by", "price"))
        .and(query_param("order", "asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = ShopeeCrawler::with_base_url(&test_config(), server.uri()).unwrap();
    let filters = SearchFilters {
        sort_by: Some(SortKey::Price),
        ..SearchFilters::default()
    };
    let results = crawler.search("ssd", &filters).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn shopee_search_drops_unlistable_items() {
    let server = MockServer::start().await;
    let zero_priced = json!({
        "item_basic": {
            "name": "免費贈品",
            "price": 0,
            "shopid": 1,
            "itemid": 2,
            "stock": 5
        }
    });
    Mock::given(method("GET"))
        .and(path("/api/v4/search/search_items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "items": [
                shopee_item("正常商品", 100_000_000.0, 3, 4),
                zero_priced,
                {"item_basic": null}
            ]
        })))
        .mount(&server)
        .await;

    let crawler = ShopeeCrawler::with_base_url(&test_config(), server.uri()).unwrap();
    let results = crawler
        .search("whatever", &SearchFilters::default())
        .await
        .unwrap();

    assert_eq!(results.len(), 1, "zero-priced and ad entries are dropped");
    assert_eq!(results[0].name, "正常商品");
}

#[tokio::test]
async fn shopee_search_no_results_is_empty_not_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/search/search_items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"items": []})))
        .mount(&server)
        .await;

    let crawler = ShopeeCrawler::with_base_url(&test_config(), server.uri()).unwrap();
    let results = crawler
        .search("nothing matches this", &SearchFilters::default())
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn shopee_search_malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/search/search_items"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
        .mount(&server)
        .await;

    let crawler = ShopeeCrawler::with_base_url(&test_config(), server.uri()).unwrap();
    let result = crawler.search("iphone", &SearchFilters::default()).await;
    assert!(matches!(result, Err(CrawlerError::Deserialize { .. })));
}

#[tokio::test]
async fn shopee_retries_server_errors_up_to_attempt_bound() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/search/search_items"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let crawler =
        ShopeeCrawler::with_base_url(&test_config_with_attempts(3), server.uri()).unwrap();
    let result = crawler.search("iphone", &SearchFilters::default()).await;
    assert!(
        matches!(result, Err(CrawlerError::UnexpectedStatus { status: 503, .. })),
        "last error is surfaced after attempts are exhausted"
    );
}

#[tokio::test]
async fn shopee_does_not_retry_client_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/search/search_items"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let crawler =
        ShopeeCrawler::with_base_url(&test_config_with_attempts(3), server.uri()).unwrap();
    let result = crawler.search("iphone", &SearchFilters::default()).await;
    assert!(matches!(
        result,
        Err(CrawlerError::UnexpectedStatus { status: 403, .. })
    ));
}

#[tokio::test]
async fn shopee_details_resolves_ids_from_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/item/get"))
        .and(query_param("shopid", "77"))
        .and(query_param("itemid", "888"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "data": {
                "name": "iPhone 15 128G",
                "price": 2_890_000_000.0,
                "price_before_discount": 3_190_000_000.0,
                "shopid": 77,
                "itemid": 888,
                "stock": 3,
                "shop": {"name": "Apple 旗艦店"},
                "categories": [{"display_name": "手機"}, {"display_name": "Apple"}]
            }
        })))
        .mount(&server)
        .await;

    let crawler = ShopeeCrawler::with_base_url(&test_config(), server.uri()).unwrap();
    let url = "https://shopee.tw/iPhone-15-i.77.888";
    let detail = crawler
        .product_details(url)
        .await
        .unwrap()
        .expect("detail should parse");

    assert_eq!(detail.product_url, url);
    assert_eq!(detail.original_price, Some(31_900.0));
    assert_eq!(detail.vendor_name.as_deref(), Some("Apple 旗艦店"));
    assert_eq!(
        detail.specs.get("category"),
        Some(&json!("手機 > Apple"))
    );
}

#[tokio::test]
async fn shopee_details_rejects_malformed_url_without_fetching() {
    let crawler = ShopeeCrawler::new(&test_config()).unwrap();
    let result = crawler
        .product_details("https://shopee.tw/no-ids-here")
        .await;
    assert!(matches!(
        result,
        Err(CrawlerError::InvalidProductUrl { .. })
    ));
}

#[tokio::test]
async fn shopee_details_missing_data_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/item/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"data": null})))
        .mount(&server)
        .await;

    let crawler = ShopeeCrawler::with_base_url(&test_config(), server.uri()).unwrap();
    let detail = crawler
        .product_details("https://shopee.tw/gone-i.1.2")
        .await
        .unwrap();
    assert!(detail.is_none());
}

// ---------------------------------------------------------------------------
// PChome
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pchome_search_parses_cards_over_http() {
    let server = MockServer::start().await;
    let html = r#"
        <div id="ProductContainer">
          <div class="prod_item">
            <a href="/prod/DYAJ1D-A900HG6S2"><img src="//cs-a.ecimg.tw/items/a.jpg"/></a>
            <div class="prod_name">Kingston 1TB SSD</div>
            <div class="price">$1,588</div>
          </div>
          <div class="prod_item">
            <a href="/prod/NOPRICE"></a>
            <div class="prod_name">無價商品</div>
            <div class="price"></div>
          </div>
        </div>
    "#;
    Mock::given(method("GET"))
        .and(path("/search/v3.3/"))
        .and(query_param("q", "ssd"))
        .and(query_param("sort", "price/asc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&server)
        .await;

    let crawler = PchomeCrawler::with_base_url(&test_config(), server.uri()).unwrap();
    let filters = SearchFilters {
        sort_by: Some(SortKey::Price),
        ..SearchFilters::default()
    };
    let results = crawler.search("ssd", &filters).await.unwrap();

    assert_eq!(results.len(), 1, "unpriced card must be dropped");
    assert_eq!(results[0].name, "Kingston 1TB SSD");
    assert_eq!(
        results[0].product_url,
        format!("{}/prod/DYAJ1D-A900HG6S2", server.uri())
    );
}

#[tokio::test]
async fn pchome_search_server_error_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/v3.3/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let crawler = PchomeCrawler::with_base_url(&test_config(), server.uri()).unwrap();
    let result = crawler.search("ssd", &SearchFilters::default()).await;
    assert!(matches!(
        result,
        Err(CrawlerError::UnexpectedStatus { status: 500, .. })
    ));
}

// ---------------------------------------------------------------------------
// 1688
// ---------------------------------------------------------------------------

#[tokio::test]
async fn alibaba_search_extracts_embedded_blob_over_http() {
    let server = MockServer::start().await;
    let html = r#"
        <html><script>
        window.__GLOBAL_DATA__ = {"data": {"offerList": [
            {"subject": "工業電風扇", "detailUrl": "//detail.1688.com/offer/1.html",
             "priceInfo": {"price": "¥128.00"}, "monthSoldQuantity": "352",
             "canBookCount": 5, "company": {"name": "佛山電器廠"}}
        ]}};
        </script></html>
    "#;
    Mock::given(method("GET"))
        .and(path("/selloffer/offer_search.htm"))
        .and(query_param("keywords", "電風扇"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&server)
        .await;

    let crawler = Alibaba1688Crawler::with_base_url(&test_config(), server.uri()).unwrap();
    let results = crawler
        .search("電風扇", &SearchFilters::default())
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "工業電風扇");
    assert_eq!(results[0].platform, "1688");
}

#[tokio::test]
async fn alibaba_search_degrades_to_placeholder_when_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/selloffer/offer_search.htm"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let crawler = Alibaba1688Crawler::with_base_url(&test_config(), server.uri()).unwrap();
    let results = crawler
        .search("水壺", &SearchFilters::default())
        .await
        .expect("unreachable 1688 must not error the search");

    assert_eq!(results.len(), 1);
    assert!(results[0].name.contains("水壺"));
    assert!(results[0].is_listable());
}

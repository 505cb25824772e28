use std::{collections::BTreeSet, sync::Arc};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use rust_decimal::{Decimal, dec};
use serde_json::Value;
use tower::ServiceExt;

use storefront::{
    AppState, app,
    config::SessionConfig,
    database::MemoryCatalog,
    models::{Category, Color, Product, ProductTag},
};

fn color(id: i32, name: &str) -> Color {
    Color {
        id,
        name: name.to_string(),
        image: None,
    }
}

fn product(id: i32, name: &str, original: Decimal, discounted: Option<Decimal>) -> Product {
    Product {
        id,
        name: name.to_string(),
        original_price: original,
        discounted_price: discounted,
        category: None,
        tags: BTreeSet::new(),
        features: String::new(),
        materials: String::new(),
        measurements: String::new(),
        is_in_stock: true,
        delivery_availability: String::new(),
        colors: Vec::new(),
        images: Vec::new(),
    }
}

struct TestApp {
    router: Router,
    catalog: Arc<MemoryCatalog>,
    cookie: Option<String>,
}

impl TestApp {
    fn new() -> Self {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.insert_color(color(9, "Ivory"));

        let mut sofa = product(5, "Chesterfield Sofa", dec!(100), Some(dec!(80)));
        sofa.category = Some(Category::Sofa);
        sofa.tags = BTreeSet::from([ProductTag::Offers]);
        sofa.materials = "Leather".to_string();
        sofa.colors = vec![color(3, "Walnut"), color(4, "Oak")];
        catalog.insert_product(sofa);

        let mut stool = product(6, "Bar Stool", dec!(40), None);
        stool.category = Some(Category::Chairs);
        stool.tags = BTreeSet::from([ProductTag::NewArrivals]);
        catalog.insert_product(stool);

        let mut loveseat = product(7, "Loveseat", dec!(300), None);
        loveseat.category = Some(Category::Sofa);
        catalog.insert_product(loveseat);

        let state = AppState::new(catalog.clone());
        let router = app::router(state, &SessionConfig::default());

        Self {
            router,
            catalog,
            cookie: None,
        }
    }

    async fn send(&mut self, mut request: Request<Body>) -> (StatusCode, Option<String>, Value) {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|value| value.to_str().unwrap().to_string());

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, location, body)
    }

    async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri)
            .header(header::HOST, "shop.test")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = self.send(request).await;
        (status, body)
    }

    async fn post_form(&mut self, uri: &str, form: &str) -> (StatusCode, Option<String>, Value) {
        let request = Request::post(uri)
            .header(header::HOST, "shop.test")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn post_empty(&mut self, uri: &str) -> (StatusCode, Option<String>, Value) {
        let request = Request::post(uri)
            .header(header::HOST, "shop.test")
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }
}

fn product_ids(body: &Value) -> Vec<i64> {
    body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn add_to_cart_accumulates_in_session() {
    let mut app = TestApp::new();

    let (status, _, body) = app.post_form("/add-to-cart/5", "quantity=2&color=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Added 2 item(s) to cart");
    assert_eq!(body["cart_count"], 2);
    assert_eq!(body["redirect_url"], "http://shop.test/shopping-cart");
    assert!(app.cookie.is_some());

    let (status, _, body) = app.post_form("/add-to-cart/5", "quantity=1&color=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart_count"], 3);

    let (status, cart) = app.get("/shopping-cart").await;
    assert_eq!(status, StatusCode::OK);

    let items = cart["cart_items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["key"], "5|3");
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(items[0]["color"]["name"], "Walnut");
    assert_eq!(cart["subtotal"], "240");
    assert_eq!(cart["total"], cart["subtotal"]);
}

#[tokio::test]
async fn add_to_cart_validation_errors() {
    let mut app = TestApp::new();

    let (status, _, body) = app.post_form("/add-to-cart/5", "quantity=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please select a color before adding to cart");

    let (status, _, body) = app.post_form("/add-to-cart/5", "quantity=1&color=9").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please select a valid color");

    let (status, _, body) = app.post_form("/add-to-cart/404", "quantity=1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found");
}

#[tokio::test]
async fn add_to_cart_without_body_adds_one() {
    let mut app = TestApp::new();

    let (status, _, body) = app.post_empty("/add-to-cart/6").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["cart_count"], 1);

    let (status, _, body) = app.post_empty("/add-to-cart/5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please select a color before adding to cart");
}

#[tokio::test]
async fn add_to_cart_with_non_numeric_id_is_not_found() {
    let mut app = TestApp::new();

    let (status, _, body) = app.post_form("/add-to-cart/abc", "quantity=1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found");

    let (_, cart) = app.get("/shopping-cart").await;
    assert!(cart["cart_items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn colorless_product_coerces_quantity_and_ignores_color() {
    let mut app = TestApp::new();

    let (status, _, body) = app.post_form("/add-to-cart/6", "quantity=-3&color=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart_count"], 1);

    let (_, cart) = app.get("/shopping-cart").await;
    assert_eq!(cart["cart_items"][0]["key"], "6");
    assert!(cart["cart_items"][0]["color"].is_null());
}

#[tokio::test]
async fn cart_updates_redirect_back_to_cart() {
    let mut app = TestApp::new();
    app.post_form("/add-to-cart/6", "quantity=2").await;
    app.post_form("/add-to-cart/5", "color=4").await;

    let (status, location, _) = app.post_form("/shopping-cart", "increase=6").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/shopping-cart"));

    let (_, cart) = app.get("/shopping-cart").await;
    assert_eq!(cart["cart_items"][1]["quantity"], 3);

    app.post_form("/shopping-cart", "decrease=5%7C4").await;
    app.post_form("/shopping-cart", "remove=6").await;
    app.post_form("/shopping-cart", "remove=999").await;

    let (_, cart) = app.get("/shopping-cart").await;
    assert!(cart["cart_items"].as_array().unwrap().is_empty());
    assert_eq!(cart["subtotal"], "0");
}

#[tokio::test]
async fn cart_update_without_body_redirects() {
    let mut app = TestApp::new();
    app.post_form("/add-to-cart/6", "quantity=2").await;

    let (status, location, _) = app.post_empty("/shopping-cart").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/shopping-cart"));

    let (_, cart) = app.get("/shopping-cart").await;
    assert_eq!(cart["cart_items"][0]["quantity"], 2);
}

#[tokio::test]
async fn deleted_product_is_pruned_from_cart() {
    let mut app = TestApp::new();
    app.post_form("/add-to-cart/6", "quantity=1").await;
    app.post_form("/add-to-cart/7", "quantity=2").await;

    app.catalog.remove_product(6);

    let (status, cart) = app.get("/shopping-cart").await;
    assert_eq!(status, StatusCode::OK);
    let items = cart["cart_items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["key"], "7");

    let (_, _, body) = app.post_form("/add-to-cart/7", "quantity=1").await;
    assert_eq!(body["cart_count"], 3);
}

#[tokio::test]
async fn empty_cart_for_new_visitor() {
    let mut app = TestApp::new();

    let (status, cart) = app.get("/shopping-cart").await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart["cart_items"].as_array().unwrap().is_empty());
    assert_eq!(cart["subtotal"], "0");
}

#[tokio::test]
async fn listing_applies_filters_and_echoes_them() {
    let mut app = TestApp::new();

    let (status, body) = app.get("/product").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product_ids(&body), [5, 6, 7]);
    assert_eq!(body["colors"].as_array().unwrap().len(), 3);

    let (_, body) = app.get("/product?tag=Offers%20&min_price=80").await;
    assert_eq!(product_ids(&body), [5]);
    assert_eq!(body["current_tag"], "offers");
    assert_eq!(body["current_min_price"], "80");

    let (_, body) = app.get("/product?tag=offers&min_price=81").await;
    assert!(product_ids(&body).is_empty());

    let (_, body) = app.get("/product?tag=sofa&max_price=abc").await;
    assert_eq!(product_ids(&body), [5, 7]);
    assert_eq!(body["current_max_price"], "abc");

    let (_, body) = app.get("/product?search=LEATHER&color=Walnut").await;
    assert_eq!(product_ids(&body), [5]);
    assert_eq!(body["search_query"], "LEATHER");
    assert_eq!(body["current_color"], "Walnut");
}

#[tokio::test]
async fn index_features_first_match() {
    let mut app = TestApp::new();

    let (_, body) = app.get("/?search=stool").await;
    assert_eq!(product_ids(&body), [6]);
    assert_eq!(body["featured_product"]["id"], 6);

    let (_, body) = app.get("/?search=nothing-matches").await;
    assert!(body["featured_product"].is_null());
}

#[tokio::test]
async fn product_detail_lists_related_products() {
    let mut app = TestApp::new();

    let (status, body) = app.get("/product-detail/5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["name"], "Chesterfield Sofa");
    let discount_rate: Decimal = body["product"]["discount_rate"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(discount_rate, dec!(20));
    assert_eq!(body["product"]["discount_percent"], 20);
    assert_eq!(body["product"]["effective_price"], "80");

    let related: Vec<_> = body["related_products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(related, [7]);

    let (status, body) = app.get("/product-detail/404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found");
}

#[tokio::test]
async fn special_tags_resolve_aliases() {
    let mut app = TestApp::new();

    let (_, body) = app.get("/special-tags?tag=new%20arrivals").await;
    assert_eq!(product_ids(&body), [6]);
    assert_eq!(body["current_tag"], "new_arrivals");

    let (_, body) = app.get("/special-tags?tag=offer").await;
    assert_eq!(product_ids(&body), [5]);

    let (_, body) = app.get("/special-tags").await;
    assert_eq!(product_ids(&body), [5, 6]);
    assert!(body["current_tag"].is_null());
}

#[tokio::test]
async fn health_endpoints() {
    let mut app = TestApp::new();

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

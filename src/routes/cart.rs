use axum::{
    Form, Json,
    extract::{
        Path, State,
        rejection::{FormRejection, PathRejection},
    },
    http::{HeaderMap, header},
    response::Redirect,
};
use tower_sessions::Session;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{AddToCartForm, AddToCartResponse, CartContext, CartUpdateForm},
    services::{cart_service, session_cart},
};

pub const CART_PATH: &str = "/shopping-cart";

pub async fn view_cart(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CartContext>> {
    let mut cart = session_cart::load_cart(&session).await?;
    let materialized = cart_service::materialize(state.catalog.as_ref(), &mut cart).await?;

    if materialized.pruned > 0 {
        session_cart::save_cart(&session, &cart).await?;
    }

    Ok(Json(materialized.context))
}

pub async fn update_cart(
    session: Session,
    form: std::result::Result<Form<CartUpdateForm>, FormRejection>,
) -> Result<Redirect> {
    let form = form_or_default(form);

    if let Some((action, raw_key)) = form.action() {
        let mut cart = session_cart::load_cart(&session).await?;

        if cart_service::update_quantity(&mut cart, raw_key, action) {
            session_cart::save_cart(&session, &cart).await?;
        }
    }

    Ok(Redirect::to(CART_PATH))
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    product_id: std::result::Result<Path<i32>, PathRejection>,
    form: std::result::Result<Form<AddToCartForm>, FormRejection>,
) -> Result<Json<AddToCartResponse>> {
    let Path(product_id) = product_id.map_err(|rejection| {
        tracing::debug!("Rejected add-to-cart path: {}", rejection);
        AppError::NotFound(cart_service::PRODUCT_NOT_FOUND.to_string())
    })?;
    let form = form_or_default(form);

    let added = async {
        let mut cart = session_cart::load_cart(&session).await?;
        let added =
            cart_service::add_to_cart(state.catalog.as_ref(), &mut cart, product_id, &form).await?;
        session_cart::save_cart(&session, &cart).await?;
        Ok::<_, AppError>(added)
    }
    .await
    .map_err(AppError::into_add_to_cart_error)?;

    Ok(Json(AddToCartResponse {
        status: "success",
        message: format!("Added {} item(s) to cart", added.added),
        cart_count: added.cart_count,
        redirect_url: cart_url(state.public_url.as_deref(), &headers),
    }))
}

/// A missing or unreadable form body counts as an empty form.
fn form_or_default<T: Default>(form: std::result::Result<Form<T>, FormRejection>) -> T {
    match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!("Treating form body as empty: {}", rejection);
            T::default()
        }
    }
}

/// Absolute URL of the cart page, relative when no base is known.
fn cart_url(public_url: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(base) = public_url {
        return format!("{}{}", base, CART_PATH);
    }

    match headers.get(header::HOST).and_then(|host| host.to_str().ok()) {
        Some(host) => format!("http://{}{}", host, CART_PATH),
        None => CART_PATH.to_string(),
    }
}

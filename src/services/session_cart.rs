use tower_sessions::Session;

use crate::{
    error::Result,
    models::{Cart, CartRecord},
};

/// Session key holding the cart record.
pub const CART_SESSION_KEY: &str = "cart";

/// Reads the visitor's cart. A missing or unreadable record yields an empty
/// cart.
pub async fn load_cart(session: &Session) -> Result<Cart> {
    let Some(value) = session.get_value(CART_SESSION_KEY).await? else {
        return Ok(Cart::new());
    };

    match serde_json::from_value::<CartRecord>(value) {
        Ok(record) => Ok(Cart::from_record(record)),
        Err(e) => {
            tracing::warn!("Discarding unreadable cart record: {}", e);
            Ok(Cart::new())
        }
    }
}

/// Writes the cart back, creating the session if the visitor has none yet.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(CART_SESSION_KEY, cart.to_record()).await?;
    Ok(())
}

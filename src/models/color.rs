use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Color {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

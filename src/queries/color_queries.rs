use std::collections::HashMap;

use sqlx::PgPool;

use crate::{error::Result, models::Color};

pub async fn get_all(pool: &PgPool) -> Result<Vec<Color>> {
    let colors = sqlx::query_as::<_, Color>("SELECT id, name, image FROM colors ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(colors)
}

pub async fn find_by_ids(pool: &PgPool, ids: &[i32]) -> Result<HashMap<i32, Color>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let colors = sqlx::query_as::<_, Color>("SELECT id, name, image FROM colors WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(colors.into_iter().map(|c| (c.id, c)).collect())
}

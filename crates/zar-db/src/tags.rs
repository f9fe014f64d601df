//! Tags and their url relations. Storage only; nothing on the dispatch
//! path depends on these.

use crate::DbResult;
use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

pub async fn get_or_create_tag(pool: &PgPool, name: &str) -> DbResult<Tag> {
    let tag = sqlx::query_as::<_, Tag>(
        r#"
        INSERT INTO tags (name)
        VALUES (LOWER(TRIM($1)))
        ON CONFLICT (name) DO UPDATE SET name = tags.name
        RETURNING id, name
        "#,
    )
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(tag)
}

pub async fn tag_url(pool: &PgPool, url_id: i64, tag_id: i64) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO url_tags (url_id, tag_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(url_id)
    .bind(tag_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn url_tags(pool: &PgPool, url_id: i64) -> DbResult<Vec<Tag>> {
    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.id, t.name
        FROM tags t
        JOIN url_tags ut ON ut.tag_id = t.id
        WHERE ut.url_id = $1
        ORDER BY t.name
        "#,
    )
    .bind(url_id)
    .fetch_all(pool)
    .await?;
    Ok(tags)
}

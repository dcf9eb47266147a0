use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqliteExecutor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
}

pub async fn get_all_categories<'e, E>(executor: E) -> sqlx::Result<Vec<Category>>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Category>(
        r#"
SELECT id, type
FROM categories
ORDER BY id
        "#,
    )
    .fetch_all(executor)
    .await
}

pub async fn get_category<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<Category>>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Category>(
        r#"
SELECT id, type
FROM categories
WHERE categories.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn create_category<'e, E>(executor: E, kind: &str) -> sqlx::Result<i64>
where
    E: SqliteExecutor<'e>,
{
    let id = sqlx::query(
        r#"
INSERT INTO categories (type) VALUES (?1)
        "#,
    )
    .bind(kind)
    .execute(executor)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// Inserts the given categories, overwriting the type of any id that already
/// exists. Categories absent from `categories` are left untouched since
/// questions may still reference them.
pub async fn import_categories(
    conn: &mut SqliteConnection,
    categories: Vec<Category>,
) -> sqlx::Result<()> {
    for category in categories {
        sqlx::query(
            r#"
INSERT INTO categories (id, type) VALUES (?1, ?2)
ON CONFLICT (id) DO UPDATE SET type = excluded.type
            "#,
        )
        .bind(category.id)
        .bind(&category.kind)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

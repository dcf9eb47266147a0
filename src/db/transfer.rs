//! CSV import/export of the whole question bank, used to seed categories
//! and back up questions.

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Connection, SqlitePool};

use super::queries::categories::{get_all_categories, import_categories};
use super::queries::questions::{get_all_questions, import_questions};
use super::{Category, Question};

pub const CATEGORIES_FILE: &str = "categories.csv";
pub const QUESTIONS_FILE: &str = "questions.csv";

fn write_to(path: &Path, data: Vec<impl Serialize>) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;
    for line in data {
        wtr.serialize(line)?;
    }
    wtr.flush()?;
    Ok(())
}

fn read_from<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Cannot open {}", path.display()))?;
    let mut out = Vec::new();
    for record in rdr.deserialize() {
        let record: T = record.with_context(|| format!("Bad record in {}", path.display()))?;
        out.push(record);
    }
    Ok(out)
}

pub async fn export_data(pool: &SqlitePool, dir: &Path) -> anyhow::Result<()> {
    let categories = get_all_categories(pool).await?;
    let questions = get_all_questions(pool).await?;
    if !dir.exists() {
        std::fs::create_dir_all(dir)?
    }
    tracing::info!(
        categories = categories.len(),
        questions = questions.len(),
        "Exporting to {}",
        dir.display()
    );
    write_to(&dir.join(CATEGORIES_FILE), categories)?;
    write_to(&dir.join(QUESTIONS_FILE), questions)?;
    Ok(())
}

/// Upserts categories, then questions, in a single transaction. A missing
/// questions file only imports categories.
pub async fn import_data(pool: &SqlitePool, dir: &Path) -> anyhow::Result<()> {
    let categories: Vec<Category> = read_from(&dir.join(CATEGORIES_FILE))?;
    let questions_path = dir.join(QUESTIONS_FILE);
    let questions: Vec<Question> = if questions_path.exists() {
        read_from(&questions_path)?
    } else {
        vec![]
    };
    tracing::info!(
        categories = categories.len(),
        questions = questions.len(),
        "Importing from {}",
        dir.display()
    );

    let mut conn = pool.acquire().await?;
    let mut tx = conn.begin().await?;
    import_categories(&mut tx, categories).await?;
    import_questions(&mut tx, questions).await?;
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;

    #[tokio::test]
    async fn export_then_import_restores_the_bank() {
        let dir = tempfile::tempdir().unwrap();
        let source = testing::pool().await;
        testing::seed(&source, 7).await;
        export_data(&source, dir.path()).await.unwrap();

        let target = testing::pool().await;
        import_data(&target, dir.path()).await.unwrap();

        assert_eq!(
            get_all_categories(&target).await.unwrap(),
            get_all_categories(&source).await.unwrap()
        );
        assert_eq!(
            get_all_questions(&target).await.unwrap(),
            get_all_questions(&source).await.unwrap()
        );
    }

    #[tokio::test]
    async fn categories_file_uses_type_header() {
        let dir = tempfile::tempdir().unwrap();
        let pool = testing::pool().await;
        testing::seed_categories(&pool).await;
        export_data(&pool, dir.path()).await.unwrap();

        let content = std::fs::read_to_string(dir.path().join(CATEGORIES_FILE)).unwrap();
        assert!(content.starts_with("id,type\n1,Science\n"));
    }

    #[tokio::test]
    async fn failed_import_leaves_database_untouched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CATEGORIES_FILE), "id,type\n1,Science\n").unwrap();
        // category 42 does not exist
        std::fs::write(
            dir.path().join(QUESTIONS_FILE),
            "id,question,answer,category,difficulty\n1,Why?,Because,42,1\n",
        )
        .unwrap();
        let pool = testing::pool().await;

        assert!(import_data(&pool, dir.path()).await.is_err());
        assert!(get_all_categories(&pool).await.unwrap().is_empty());
    }
}

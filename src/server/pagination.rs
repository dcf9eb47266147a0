use serde::{Deserialize, Deserializer};

pub const QUESTIONS_PER_PAGE: usize = 10;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "first_page", deserialize_with = "deserialize_page")]
    pub page: u32,
}

fn first_page() -> u32 {
    1
}

// `?page=` or `?page=abc` fall back to the first page; a negative or
// oversized number is a page that does not exist.
fn deserialize_page<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(match value.trim().parse::<i64>() {
        Ok(page) => u32::try_from(page).unwrap_or(0),
        Err(_) => first_page(),
    })
}

/// Returns the `page`-th window (1-indexed) of `items`. A page outside the
/// collection, page 0 included, yields an empty slice.
pub fn paginate<T>(page: u32, items: &[T]) -> &[T] {
    let Some(index) = (page as usize).checked_sub(1) else {
        return &[];
    };
    let start = index.saturating_mul(QUESTIONS_PER_PAGE);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(QUESTIONS_PER_PAGE).min(items.len());
    &items[start..end]
}

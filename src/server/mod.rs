pub mod app;
pub mod error;
pub mod extractors;
pub mod pagination;
mod routes;

#[cfg(test)]
pub(crate) mod testing;

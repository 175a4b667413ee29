pub mod read_cache;
pub mod query;

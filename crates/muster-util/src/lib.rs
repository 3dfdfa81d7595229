pub mod pagination;
pub mod snowflake;

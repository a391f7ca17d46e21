pub mod admin_query;
pub mod health;

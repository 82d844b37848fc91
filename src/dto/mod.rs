pub mod auth;
pub mod categories;
pub mod checkout;
pub mod crafters;
pub mod embeddings;
pub mod orders;
pub mod products;
pub mod search;
pub mod webhooks;

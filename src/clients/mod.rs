pub mod embeddings;
pub mod identity;
pub mod payments;

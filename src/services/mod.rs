pub mod admin_service;
pub mod category_service;
pub mod checkout_service;
pub mod crafter_service;
pub mod embedding_service;
pub mod order_service;
pub mod product_service;
pub mod search_service;
pub mod webhook_service;

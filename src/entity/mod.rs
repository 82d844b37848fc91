pub mod audit_logs;
pub mod categories;
pub mod crafters;
pub mod enums;
pub mod order_items;
pub mod orders;
pub mod product_embeddings;
pub mod products;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use crafters::Entity as Crafters;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use product_embeddings::Entity as ProductEmbeddings;
pub use products::Entity as Products;
pub use users::Entity as Users;

use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        categories::{CategoryList, CategoryWithProducts},
        checkout::{CartItemRequest, CreatePaymentIntentRequest, DeliveryRequest, PaymentIntentResponse},
        crafters::{CrafterDecision, CrafterList, CrafterSetupRequest, CrafterWithProducts},
        embeddings::{EmbeddingRun, EmbeddingStatus},
        orders::{OrderList, OrderWithItems},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        search::{ScoredProduct, SearchSort, SemanticSearchRequest, SemanticSearchResults},
        webhooks::WebhookAck,
    },
    entity::enums::{DeliveryMethod, OrderStatus, PaymentStatus, ProductCategory, UserRole},
    models::{Category, Crafter, CrafterSummary, DeliveryAddress, Order, OrderItem, Product, User},
    response::{ApiResponse, Meta},
    routes::{
        admin, categories, checkout, crafters, health, orders, params, products, search, webhooks,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        crafters::list_crafters,
        crafters::get_crafter,
        crafters::setup_profile,
        crafters::my_profile,
        categories::list_categories,
        categories::get_category,
        search::semantic_search,
        checkout::create_payment_intent,
        orders::list_orders,
        orders::confirm_order,
        admin::list_pending_crafters,
        admin::approve_crafter,
        admin::reject_crafter,
        admin::generate_embeddings,
        admin::embedding_status,
        webhooks::identity_webhook
    ),
    components(
        schemas(
            User,
            Crafter,
            CrafterSummary,
            Product,
            Category,
            Order,
            OrderItem,
            DeliveryAddress,
            UserRole,
            ProductCategory,
            DeliveryMethod,
            OrderStatus,
            PaymentStatus,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CrafterList,
            CrafterSetupRequest,
            CrafterWithProducts,
            CrafterDecision,
            CategoryList,
            CategoryWithProducts,
            CartItemRequest,
            DeliveryRequest,
            CreatePaymentIntentRequest,
            PaymentIntentResponse,
            OrderList,
            OrderWithItems,
            SearchSort,
            SemanticSearchRequest,
            ScoredProduct,
            SemanticSearchResults,
            EmbeddingRun,
            EmbeddingStatus,
            WebhookAck,
            params::Pagination,
            params::ProductQuery,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<PaymentIntentResponse>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Crafters", description = "Crafter profile endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Search", description = "Semantic product search"),
        (name = "Checkout", description = "Checkout and payment intents"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Webhooks", description = "Identity provider webhooks"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

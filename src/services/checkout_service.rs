use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, Statement, TransactionTrait, Value,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    audit,
    clients::payments::{CreateIntentParams, PaymentIntent},
    config::PaymentConfig,
    dto::checkout::{CartItemRequest, CreatePaymentIntentRequest, PaymentIntentResponse},
    entity::{
        crafters::Entity as Crafters,
        enums::{DeliveryMethod, OrderStatus, PaymentStatus},
        order_items::ActiveModel as OrderItemActive,
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    models::DeliveryAddress,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// How far back a pending order with the same email and total is reused.
pub const REUSE_WINDOW_MINUTES: i64 = 10;
/// Window used to find the winner after losing an order-number race.
pub const RACE_WINDOW_MINUTES: i64 = 5;
const MAX_PLACE_ATTEMPTS: usize = 3;

/// A checkout request with every required field present.
#[derive(Debug, Clone)]
pub struct ValidCheckout {
    pub items: Vec<CartItemRequest>,
    pub method: DeliveryMethod,
    pub address: Option<DeliveryAddress>,
    pub customer_email: String,
    pub customer_name: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: i64,
    pub crafter_id: Uuid,
    pub crafter_name: String,
}

#[derive(Debug, Clone)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub subtotal: i64,
}

/// The order a checkout settled on; `created` is false when an existing
/// pending order was reused.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: OrderModel,
    pub created: bool,
}

#[instrument(skip(state, payload), fields(items = payload.items.len()))]
pub async fn create_payment_intent(
    state: &AppState,
    payload: CreatePaymentIntentRequest,
) -> AppResult<ApiResponse<PaymentIntentResponse>> {
    let checkout = validate_request(payload)?;
    let cart = price_cart(&state.orm, &checkout.items).await?;
    let delivery_fee = state.config.checkout.fee_for(checkout.method);
    let total = cart
        .subtotal
        .checked_add(delivery_fee)
        .ok_or_else(|| AppError::BadRequest("Order total is too large".into()))?;

    let placed = place_order(&state.orm, &checkout, &cart, delivery_fee, total).await?;
    if placed.created {
        audit::record(
            &state.pool,
            None,
            "order_create",
            "orders",
            serde_json::json!({ "order_id": placed.order.id, "order_number": placed.order.order_number }),
        )
        .await;
    }

    let (order, intent) = ensure_intent(state, placed.order).await?;

    Ok(ApiResponse::success(
        "Payment intent ready",
        PaymentIntentResponse {
            client_secret: intent.client_secret,
            order_id: order.id,
            order_number: order.order_number,
            amount: order.total,
            currency: state.config.payments.currency.clone(),
        },
        Some(Meta::empty()),
    ))
}

pub fn validate_request(payload: CreatePaymentIntentRequest) -> AppResult<ValidCheckout> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Cart items are required".into()));
    }
    if payload.items.iter().any(|item| item.quantity < 1) {
        return Err(AppError::BadRequest(
            "Item quantity must be at least 1".into(),
        ));
    }

    let delivery = payload
        .delivery
        .ok_or_else(|| AppError::BadRequest("Delivery information is required".into()))?;
    let method = delivery
        .method
        .ok_or_else(|| AppError::BadRequest("Delivery method is required".into()))?;

    let customer_email = payload
        .customer_email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("Customer email is required".into()))?;
    if !customer_email.contains('@') {
        return Err(AppError::BadRequest("Customer email is invalid".into()));
    }
    let customer_name = payload
        .customer_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("Customer name is required".into()))?;

    Ok(ValidCheckout {
        items: payload.items,
        method,
        address: delivery.address,
        customer_email,
        customer_name,
        notes: payload.notes.filter(|n| !n.trim().is_empty()),
    })
}

/// Prices the cart from stored products and snapshots product and crafter
/// names for the line items.
pub async fn price_cart<C: ConnectionTrait>(
    db: &C,
    items: &[CartItemRequest],
) -> AppResult<PricedCart> {
    let ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
    let found: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .find_also_related(Crafters)
        .all(db)
        .await?
        .into_iter()
        .map(|(product, crafter)| (product.id, (product, crafter)))
        .collect();

    let mut lines = Vec::with_capacity(items.len());
    let mut subtotal: i64 = 0;
    for item in items {
        let (product, crafter) = found
            .get(&item.product_id)
            .ok_or_else(|| AppError::not_found(format!("Product {}", item.product_id)))?;
        let crafter = crafter
            .as_ref()
            .filter(|c| c.verified)
            .ok_or_else(|| AppError::not_found(format!("Product {}", item.product_id)))?;
        if !product.in_stock {
            return Err(AppError::BadRequest(format!(
                "{} is out of stock",
                product.name
            )));
        }

        subtotal = product
            .price
            .checked_mul(i64::from(item.quantity))
            .and_then(|line| subtotal.checked_add(line))
            .ok_or_else(|| AppError::BadRequest("Order total is too large".into()))?;

        lines.push(PricedLine {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: item.quantity,
            price: product.price,
            crafter_id: crafter.id,
            crafter_name: crafter.name.clone(),
        });
    }

    Ok(PricedCart { lines, subtotal })
}

/// Newest pending order for this customer and total created inside `window`.
pub async fn find_recent_pending<C: ConnectionTrait>(
    db: &C,
    email: &str,
    total: i64,
    window: Duration,
) -> Result<Option<OrderModel>, DbErr> {
    let cutoff = Utc::now() - window;
    Orders::find()
        .filter(OrderCol::CustomerEmail.eq(email))
        .filter(OrderCol::PaymentStatus.eq(PaymentStatus::Pending))
        .filter(OrderCol::Total.eq(total))
        .filter(OrderCol::CreatedAt.gte(cutoff))
        .order_by_desc(OrderCol::CreatedAt)
        .one(db)
        .await
}

/// Reuses a recent pending order for the same customer and total, or inserts
/// a new one. Lookup and numbering run under a per-day advisory lock, so
/// concurrent duplicates see each other's order and never share a number.
pub async fn place_order<C: TransactionTrait + ConnectionTrait>(
    db: &C,
    checkout: &ValidCheckout,
    cart: &PricedCart,
    delivery_fee: i64,
    total: i64,
) -> Result<PlacedOrder, DbErr> {
    let mut attempt = 1;
    loop {
        match try_place(db, checkout, cart, delivery_fee, total).await {
            Err(err) if is_order_number_conflict(&err) && attempt < MAX_PLACE_ATTEMPTS => {
                warn!(error = %err, attempt, "order number conflict, looking for the concurrent order");
                let race_window = Duration::minutes(RACE_WINDOW_MINUTES);
                if let Some(order) =
                    find_recent_pending(db, &checkout.customer_email, total, race_window).await?
                {
                    return Ok(PlacedOrder {
                        order,
                        created: false,
                    });
                }
                attempt += 1;
            }
            result => return result,
        }
    }
}

async fn try_place<C: TransactionTrait>(
    db: &C,
    checkout: &ValidCheckout,
    cart: &PricedCart,
    delivery_fee: i64,
    total: i64,
) -> Result<PlacedOrder, DbErr> {
    let txn = db.begin().await?;
    let prefix = order_number_prefix(Utc::now().date_naive());
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock(hashtext($1))",
        [Value::from(prefix.clone())],
    ))
    .await?;

    let reuse_window = Duration::minutes(REUSE_WINDOW_MINUTES);
    if let Some(order) =
        find_recent_pending(&txn, &checkout.customer_email, total, reuse_window).await?
    {
        txn.commit().await?;
        info!(order_number = %order.order_number, "reusing recent pending order");
        return Ok(PlacedOrder {
            order,
            created: false,
        });
    }

    let order = insert_order(&txn, &prefix, checkout, cart, delivery_fee, total).await?;
    txn.commit().await?;
    debug!(order_number = %order.order_number, "order created");
    Ok(PlacedOrder {
        order,
        created: true,
    })
}

async fn insert_order<C: ConnectionTrait>(
    txn: &C,
    prefix: &str,
    checkout: &ValidCheckout,
    cart: &PricedCart,
    delivery_fee: i64,
    total: i64,
) -> Result<OrderModel, DbErr> {
    let last_seq: Option<i32> = Orders::find()
        .select_only()
        .column_as(
            Expr::cust(format!(
                "MAX(CAST(SUBSTRING(order_number FROM {}) AS INTEGER))",
                prefix.len() + 1
            )),
            "last_seq",
        )
        .filter(OrderCol::OrderNumber.starts_with(prefix))
        .into_tuple::<Option<i32>>()
        .one(txn)
        .await?
        .flatten();
    let order_number = format_order_number(prefix, last_seq.unwrap_or(0) + 1);

    let (street, city, postcode) = match checkout.address.clone() {
        Some(a) => (Some(a.street), Some(a.city), Some(a.postcode)),
        None => (None, None, None),
    };

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        order_number: Set(order_number),
        customer_email: Set(checkout.customer_email.clone()),
        customer_name: Set(checkout.customer_name.clone()),
        subtotal: Set(cart.subtotal),
        delivery_fee: Set(delivery_fee),
        total: Set(total),
        delivery_method: Set(checkout.method),
        delivery_street: Set(street),
        delivery_city: Set(city),
        delivery_postcode: Set(postcode),
        status: Set(OrderStatus::Pending),
        payment_status: Set(PaymentStatus::Pending),
        payment_intent_id: Set(None),
        notes: Set(checkout.notes.clone()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(txn)
    .await?;

    for line in &cart.lines {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            product_name: Set(line.product_name.clone()),
            quantity: Set(line.quantity),
            price: Set(line.price),
            crafter_id: Set(line.crafter_id),
            crafter_name: Set(line.crafter_name.clone()),
            created_at: NotSet,
        }
        .insert(txn)
        .await?;
    }

    Ok(order)
}

/// Reuses the order's intent while it can still be confirmed, otherwise
/// mints a fresh one. Only minting happens under the order's row lock; a
/// request that finds a newer intent attached meanwhile reuses that one.
async fn ensure_intent(
    state: &AppState,
    order: OrderModel,
) -> AppResult<(OrderModel, PaymentIntent)> {
    if let Some(intent_id) = order.payment_intent_id.as_deref() {
        let intent = state.payments.retrieve_intent(intent_id).await?;
        if !intent.status.is_terminal() {
            debug!(intent_id, "reusing payment intent");
            return Ok((order, intent));
        }
        info!(intent_id, status = ?intent.status, "payment intent is terminal, creating a new one");
    }

    let txn = state.orm.begin().await?;
    let locked = Orders::find_by_id(order.id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    if let Some(current) = locked.payment_intent_id.clone() {
        if order.payment_intent_id.as_deref() != Some(current.as_str()) {
            txn.commit().await?;
            debug!(intent_id = %current, "payment intent attached concurrently");
            let intent = state.payments.retrieve_intent(&current).await?;
            return Ok((locked, intent));
        }
    }

    let intent = state
        .payments
        .create_intent(intent_params(&state.config.payments, &locked))
        .await?;

    let mut active: OrderActive = locked.into();
    active.payment_intent_id = Set(Some(intent.id.clone()));
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    Ok((order, intent))
}

pub fn intent_params(config: &PaymentConfig, order: &OrderModel) -> CreateIntentParams {
    let mut metadata = BTreeMap::new();
    metadata.insert("order_id".to_string(), order.id.to_string());
    metadata.insert("order_number".to_string(), order.order_number.clone());
    metadata.insert("customer_email".to_string(), order.customer_email.clone());

    CreateIntentParams {
        amount: order.total,
        currency: config.currency.clone(),
        description: format!("Order {} - {}", order.order_number, config.store_name),
        receipt_email: order.customer_email.clone(),
        metadata,
    }
}

/// `ORD-YYYYMMDD-`
pub fn order_number_prefix(date: NaiveDate) -> String {
    format!("ORD-{}-", date.format("%Y%m%d"))
}

pub fn format_order_number(prefix: &str, sequence: i32) -> String {
    format!("{prefix}{sequence:04}")
}

/// Whether `err` is a unique violation on the order number.
pub fn is_order_number_conflict(err: &DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(msg)) if msg.contains("order_number")
    )
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::dto::checkout::DeliveryRequest;

    fn request() -> CreatePaymentIntentRequest {
        CreatePaymentIntentRequest {
            items: vec![CartItemRequest {
                product_id: Uuid::new_v4(),
                quantity: 2,
            }],
            delivery: Some(DeliveryRequest {
                method: Some(DeliveryMethod::Pickup),
                address: None,
            }),
            customer_email: Some("  Jo@Example.COM ".into()),
            customer_name: Some("Jo Bloggs".into()),
            notes: None,
        }
    }

    fn bad_request(result: AppResult<ValidCheckout>) -> String {
        match result {
            Err(AppError::BadRequest(msg)) => msg,
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn order_numbers_are_dated_and_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let prefix = order_number_prefix(date);
        assert_eq!(prefix, "ORD-20250307-");
        assert_eq!(format_order_number(&prefix, 1), "ORD-20250307-0001");
        assert_eq!(format_order_number(&prefix, 42), "ORD-20250307-0042");
        assert_eq!(format_order_number(&prefix, 12345), "ORD-20250307-12345");
    }

    #[test]
    fn validation_normalizes_customer_email() {
        let checkout = validate_request(request()).unwrap();
        assert_eq!(checkout.customer_email, "jo@example.com");
        assert_eq!(checkout.method, DeliveryMethod::Pickup);
    }

    #[test]
    fn validation_rejects_missing_fields() {
        let mut payload = request();
        payload.items.clear();
        assert_eq!(bad_request(validate_request(payload)), "Cart items are required");

        let mut payload = request();
        payload.items[0].quantity = 0;
        assert_eq!(
            bad_request(validate_request(payload)),
            "Item quantity must be at least 1"
        );

        let mut payload = request();
        payload.delivery = None;
        assert_eq!(
            bad_request(validate_request(payload)),
            "Delivery information is required"
        );

        let mut payload = request();
        payload.customer_name = Some("   ".into());
        assert_eq!(
            bad_request(validate_request(payload)),
            "Customer name is required"
        );

        let mut payload = request();
        payload.customer_email = None;
        assert_eq!(
            bad_request(validate_request(payload)),
            "Customer email is required"
        );
    }

    #[test]
    fn intent_params_describe_the_order() {
        let now = Utc::now().into();
        let order = OrderModel {
            id: Uuid::new_v4(),
            order_number: "ORD-20250307-0003".into(),
            customer_email: "jo@example.com".into(),
            customer_name: "Jo".into(),
            subtotal: 2500,
            delivery_fee: 350,
            total: 2850,
            delivery_method: DeliveryMethod::Delivery,
            delivery_street: None,
            delivery_city: None,
            delivery_postcode: None,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_intent_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let config = PaymentConfig {
            secret_key: SecretString::from("sk_test"),
            api_base: "http://localhost".into(),
            currency: "gbp".into(),
            store_name: "Dymchurch Crafters".into(),
        };

        let params = intent_params(&config, &order);
        assert_eq!(params.amount, 2850);
        assert_eq!(params.currency, "gbp");
        assert_eq!(
            params.description,
            "Order ORD-20250307-0003 - Dymchurch Crafters"
        );
        assert_eq!(params.receipt_email, "jo@example.com");
        assert_eq!(params.metadata["order_id"], order.id.to_string());
        assert_eq!(params.metadata["order_number"], "ORD-20250307-0003");
        assert_eq!(params.metadata["customer_email"], "jo@example.com");
    }

    #[test]
    fn only_order_number_violations_count_as_races() {
        let conflict = DbErr::Custom("other".into());
        assert!(!is_order_number_conflict(&conflict));
    }
}

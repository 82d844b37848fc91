use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    audit,
    clients::payments::PaymentIntentStatus,
    db::OrmConn,
    dto::orders::{ConfirmationQuery, OrderList, OrderWithItems},
    entity::{
        enums::{OrderStatus, PaymentStatus},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Checks the redirect parameters and returns the payment intent id.
pub fn check_redirect(query: &ConfirmationQuery) -> AppResult<&str> {
    match query.redirect_status.as_deref() {
        Some("succeeded") => {}
        Some("failed") => {
            return Err(AppError::BadRequest(
                "Your payment was not successful. Please try again.".into(),
            ));
        }
        _ => return Err(AppError::BadRequest("Invalid payment status".into())),
    }

    query
        .payment_intent
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Payment intent is required".into()))
}

#[instrument(skip(state, query))]
pub async fn confirm_order(
    state: &AppState,
    id: Uuid,
    query: ConfirmationQuery,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let intent_id = check_redirect(&query)?;

    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .filter(|o| o.payment_intent_id.as_deref() == Some(intent_id))
        .ok_or_else(|| AppError::not_found("Order"))?;

    let order = if order.payment_status == PaymentStatus::Paid {
        order
    } else {
        let intent = state.payments.retrieve_intent(intent_id).await?;
        match intent.status {
            PaymentIntentStatus::Succeeded => mark_paid(state, order).await?,
            PaymentIntentStatus::Processing => order,
            status => {
                return Err(AppError::BadRequest(format!(
                    "Payment has not completed ({status:?})"
                )));
            }
        }
    };

    let items = load_items(state, order.id).await?;
    Ok(ApiResponse::success(
        "Order confirmed",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

async fn mark_paid(state: &AppState, order: OrderModel) -> AppResult<OrderModel> {
    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Confirmed);
    active.payment_status = Set(PaymentStatus::Paid);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    info!(order_number = %order.order_number, "order paid");
    audit::record(
        &state.pool,
        None,
        "order_paid",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(order)
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    let email = user.local_user()?.email.to_lowercase();
    let items: Vec<Order> = Orders::find()
        .filter(OrderCol::CustomerEmail.eq(email))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::count(items.len());
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

/// Deletes pending orders that never received a payment intent and are older
/// than `older_than`, then returns the pending orders that remain.
pub async fn cleanup_abandoned(
    db: &OrmConn,
    older_than: Duration,
) -> AppResult<(u64, Vec<OrderModel>)> {
    let cutoff = Utc::now() - older_than;
    let deleted = Orders::delete_many()
        .filter(OrderCol::PaymentStatus.eq(PaymentStatus::Pending))
        .filter(OrderCol::PaymentIntentId.is_null())
        .filter(OrderCol::CreatedAt.lt(cutoff))
        .exec(db)
        .await?
        .rows_affected;

    let remaining = Orders::find()
        .filter(OrderCol::PaymentStatus.eq(PaymentStatus::Pending))
        .order_by_desc(OrderCol::CreatedAt)
        .all(db)
        .await?;

    info!(deleted, remaining = remaining.len(), "abandoned orders cleaned up");
    Ok((deleted, remaining))
}

async fn load_items(state: &AppState, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(intent: Option<&str>, status: Option<&str>) -> ConfirmationQuery {
        ConfirmationQuery {
            payment_intent: intent.map(str::to_string),
            redirect_status: status.map(str::to_string),
        }
    }

    #[test]
    fn succeeded_redirect_yields_intent_id() {
        let q = query(Some("pi_123"), Some("succeeded"));
        assert_eq!(check_redirect(&q).unwrap(), "pi_123");
    }

    #[test]
    fn failed_and_unknown_redirects_are_rejected() {
        match check_redirect(&query(Some("pi_1"), Some("failed"))) {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("not successful")),
            other => panic!("unexpected {other:?}"),
        }
        match check_redirect(&query(Some("pi_1"), Some("requires_action"))) {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Invalid payment status"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(check_redirect(&query(Some("pi_1"), None)).is_err());
        assert!(check_redirect(&query(None, Some("succeeded"))).is_err());
    }
}

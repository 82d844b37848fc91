mod common;

use crafters_market::{
    dto::search::{SearchSort, SemanticSearchRequest},
    entity::{
        enums::UserRole,
        product_embeddings::{Column as EmbeddingCol, Entity as ProductEmbeddings},
    },
    error::AppError,
    services::{embedding_service, search_service},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use common::{caller, create_crafter, create_product, create_user};

#[tokio::test]
async fn ranks_products_by_similarity_within_filters() -> anyhow::Result<()> {
    let Some(ctx) = common::setup().await? else {
        return Ok(());
    };
    let state = &ctx.state;
    let crafter = create_crafter(state, true).await?;
    let spoon = create_product(state, &crafter, "Oak Spoon", 1500, true).await?;
    let mug = create_product(state, &crafter, "Blue Mug", 1200, true).await?;
    let hidden = create_crafter(state, false).await?;
    create_product(state, &hidden, "Oak Board", 2000, true).await?;

    let admin = caller(create_user(state, UserRole::Admin).await?);
    embedding_service::generate(state, &admin).await?;
    let stored = ProductEmbeddings::find()
        .filter(EmbeddingCol::ProductId.is_in([spoon.id, mug.id]))
        .count(&state.orm)
        .await?;
    assert_eq!(stored, 2);

    let results = search_service::semantic_search(
        state,
        SemanticSearchRequest {
            query: Some("something carved from oak".into()),
            crafter_id: Some(crafter.id),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(results.items.len(), 2);
    assert_eq!(results.items[0].product.id, spoon.id);
    assert!(results.items[0].score > results.items[1].score);

    let by_price = search_service::semantic_search(
        state,
        SemanticSearchRequest {
            query: Some("oak".into()),
            crafter_id: Some(crafter.id),
            sort_by: Some(SearchSort::PriceAsc),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    let ids: Vec<_> = by_price.items.iter().map(|s| s.product.id).collect();
    assert_eq!(ids, vec![mug.id, spoon.id]);

    let hidden_results = search_service::semantic_search(
        state,
        SemanticSearchRequest {
            query: Some("oak".into()),
            crafter_id: Some(hidden.id),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert!(hidden_results.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn embedding_admin_endpoints_reject_customers() -> anyhow::Result<()> {
    let Some(ctx) = common::setup().await? else {
        return Ok(());
    };
    let customer = caller(create_user(&ctx.state, UserRole::Customer).await?);
    assert!(matches!(
        embedding_service::generate(&ctx.state, &customer).await,
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        embedding_service::status(&ctx.state, &customer).await,
        Err(AppError::Forbidden)
    ));
    Ok(())
}

#[tokio::test]
async fn blank_query_is_rejected() -> anyhow::Result<()> {
    let Some(ctx) = common::setup().await? else {
        return Ok(());
    };
    let err = search_service::semantic_search(
        &ctx.state,
        SemanticSearchRequest {
            query: Some("   ".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    Ok(())
}

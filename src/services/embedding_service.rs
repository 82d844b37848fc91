use sea_orm::sea_query::OnConflict;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use tracing::{info, instrument, warn};

use crate::{
    clients::embeddings::{EmbeddingProvider, product_text},
    db::OrmConn,
    dto::embeddings::{EmbeddingRun, EmbeddingStatus},
    entity::{
        product_embeddings::{ActiveModel as EmbeddingActive, Column as EmbeddingCol, Entity as ProductEmbeddings},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Embeds every product that has no stored vector. Failures are counted
/// per product and do not stop the run.
#[instrument(skip_all, fields(model = provider.model()))]
pub async fn generate_missing(
    db: &OrmConn,
    provider: &dyn EmbeddingProvider,
) -> AppResult<EmbeddingRun> {
    let pending: Vec<ProductModel> = Products::find()
        .left_join(ProductEmbeddings)
        .filter(EmbeddingCol::ProductId.is_null())
        .all(db)
        .await?;

    let mut run = EmbeddingRun {
        total: pending.len(),
        ..Default::default()
    };

    for product in pending {
        let text = product_text(
            &product.name,
            &product.description,
            &product.materials,
            product.category.as_str(),
        );
        let result = match provider.embed(&text).await {
            Ok(vector) => store_embedding(db, &product, provider.model(), vector).await,
            Err(err) => Err(err.into()),
        };
        match result {
            Ok(()) => run.success_count += 1,
            Err(err) => {
                warn!(product_id = %product.id, error = %err, "embedding failed");
                run.error_count += 1;
            }
        }
    }

    info!(
        total = run.total,
        success = run.success_count,
        errors = run.error_count,
        "embedding run finished"
    );
    Ok(run)
}

async fn store_embedding(
    db: &OrmConn,
    product: &ProductModel,
    model: &str,
    vector: Vec<f32>,
) -> AppResult<()> {
    let active = EmbeddingActive {
        product_id: Set(product.id),
        model: Set(model.to_string()),
        embedding: Set(vector),
        created_at: NotSet,
    };
    ProductEmbeddings::insert(active)
        .on_conflict(
            OnConflict::column(EmbeddingCol::ProductId)
                .update_columns([EmbeddingCol::Model, EmbeddingCol::Embedding])
                .to_owned(),
        )
        .exec(db)
        .await?;
    Ok(())
}

pub async fn embedding_status(db: &OrmConn) -> AppResult<EmbeddingStatus> {
    let total = Products::find().count(db).await?;
    let with_embeddings = ProductEmbeddings::find().count(db).await?.min(total);
    let percent_complete = if total == 0 {
        0
    } else {
        with_embeddings * 100 / total
    };
    Ok(EmbeddingStatus {
        total,
        with_embeddings,
        without_embeddings: total - with_embeddings,
        percent_complete,
    })
}

pub async fn generate(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<EmbeddingRun>> {
    ensure_admin(user)?;
    let provider = state
        .embeddings
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("Embedding API is not configured".into()))?;
    let run = generate_missing(&state.orm, provider.as_ref()).await?;
    Ok(ApiResponse::success("Embeddings generated", run, Some(Meta::empty())))
}

pub async fn status(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<EmbeddingStatus>> {
    ensure_admin(user)?;
    let status = embedding_status(&state.orm).await?;
    Ok(ApiResponse::success("Embedding status", status, None))
}

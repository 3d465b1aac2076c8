use std::path::PathBuf;
use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Scope};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::PredictError;
use crate::inference::{self, ModelProvider};
use crate::models::{Prediction, TARGET_CLASSES};
use crate::preprocess;
use crate::ranking;
use crate::upload;

pub struct AppState {
    pub provider: Arc<ModelProvider>,
    pub upload_dir: PathBuf,
}

/// Mounts the prediction endpoint at `prefix`, with and without a trailing slash.
pub fn scope(prefix: &str) -> Scope {
    web::scope(prefix)
        .route("", web::post().to(predict))
        .route("/", web::post().to(predict))
}

pub async fn predict(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, PredictError> {
    let span = tracing::info_span!("predict", request_id = %Uuid::new_v4());
    async move {
        match classify_upload(&state, payload).await {
            Ok(top) => {
                if let Some(best) = top.first() {
                    tracing::info!(
                        best = %best.class_name,
                        probability = best.probability,
                        "prediction served"
                    );
                }
                Ok(HttpResponse::Ok().json(top))
            }
            Err(e) => {
                tracing::error!(error = %e, "prediction failed");
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}

async fn classify_upload(
    state: &AppState,
    payload: Multipart,
) -> Result<Vec<Prediction>, PredictError> {
    // dropped on every return below, which deletes the file
    let upload = upload::receive(payload, &state.upload_dir).await?;
    tracing::debug!(
        path = %upload.path().display(),
        model_loaded = state.provider.is_loaded(),
        "upload received"
    );

    let raw = upload.read().await?;
    let png = web::block(move || preprocess::normalize(&raw)).await??;
    let tensor = web::block(move || preprocess::to_tensor(&png)).await??;

    let model = state.provider.get().await?;
    let probabilities = inference::infer(tensor, model).await?;
    tracing::debug!(?probabilities, "forward pass done");

    let top = ranking::rank(&probabilities, &TARGET_CLASSES)?;
    drop(upload);
    Ok(top)
}

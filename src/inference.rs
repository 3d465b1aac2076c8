use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use actix_web::web;
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tract_onnx::prelude::*;

use crate::error::{InferenceError, ModelLoadError, PredictError};
use crate::models::{INPUT_SIZE, TARGET_CLASSES};
use crate::preprocess::NormalizedTensor;

/// A loaded network. `classify` takes `&self`, so one handle serves any number of
/// concurrent requests.
pub trait Classifier: Send + Sync {
    fn classify(&self, input: &NormalizedTensor) -> Result<Vec<f32>, InferenceError>;
}

/// Where a model comes from. Each call to `load` performs a full fetch and parse.
#[async_trait]
pub trait ModelSource: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn Classifier>, ModelLoadError>;
}

pub struct OnnxClassifier {
    plan: TypedRunnableModel<TypedModel>,
}

impl OnnxClassifier {
    /// Parses an ONNX graph with an NHWC `[1, 224, 224, 3]` f32 input and checks that
    /// it yields one score per entry of the label table.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelLoadError> {
        let side = INPUT_SIZE as usize;
        let plan = tract_onnx::onnx()
            .model_for_read(&mut Cursor::new(bytes))
            .and_then(|m| m.with_input_fact(0, f32::fact([1, side, side, 3]).into()))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| ModelLoadError::Parse(format!("{e:#}")))?;
        let classifier = OnnxClassifier { plan };

        let probe = classifier.classify(&NormalizedTensor::zeros())?;
        if probe.len() != TARGET_CLASSES.len() {
            return Err(ModelLoadError::ClassCount {
                expected: TARGET_CLASSES.len(),
                found: probe.len(),
            });
        }
        Ok(classifier)
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, input: &NormalizedTensor) -> Result<Vec<f32>, InferenceError> {
        let tensor = Tensor::from_shape(input.shape(), input.as_slice())
            .map_err(|e| InferenceError(format!("{e:#}")))?;
        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError(format!("{e:#}")))?;
        let scores = outputs
            .first()
            .ok_or_else(|| InferenceError("model produced no outputs".into()))?
            .as_slice::<f32>()
            .map_err(|e| InferenceError(format!("{e:#}")))?;
        Ok(scores.to_vec())
    }
}

/// Model artifact on the local filesystem or behind an HTTP(S) URL.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactSource {
    Local(PathBuf),
    Remote(String),
}

impl ArtifactSource {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            ArtifactSource::Remote(location.to_string())
        } else {
            ArtifactSource::Local(PathBuf::from(location))
        }
    }

    async fn fetch(&self) -> Result<Vec<u8>, ModelLoadError> {
        match self {
            ArtifactSource::Local(path) => {
                let path = path.clone();
                let bytes = web::block(move || std::fs::read(path))
                    .await
                    .map_err(|_| ModelLoadError::Interrupted)??;
                Ok(bytes)
            }
            ArtifactSource::Remote(url) => {
                let response = reqwest::get(url).await?;
                if !response.status().is_success() {
                    return Err(ModelLoadError::Status(response.status()));
                }
                Ok(response.bytes().await?.to_vec())
            }
        }
    }
}

impl fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactSource::Local(path) => write!(f, "{}", path.display()),
            ArtifactSource::Remote(url) => f.write_str(url),
        }
    }
}

#[async_trait]
impl ModelSource for ArtifactSource {
    async fn load(&self) -> Result<Arc<dyn Classifier>, ModelLoadError> {
        tracing::info!(source = %self, "fetching model artifact");
        let bytes = self.fetch().await?;
        tracing::debug!(bytes = bytes.len(), "parsing model artifact");
        let classifier = web::block(move || OnnxClassifier::from_bytes(&bytes))
            .await
            .map_err(|_| ModelLoadError::Interrupted)??;
        Ok(Arc::new(classifier))
    }
}

/// Loads the model at most once and hands every caller the same handle.
///
/// Callers arriving while a load is in flight wait on that load instead of starting
/// their own. A failed load leaves the cell empty, so the next caller tries again.
pub struct ModelProvider {
    source: Box<dyn ModelSource>,
    model: OnceCell<Arc<dyn Classifier>>,
}

impl ModelProvider {
    pub fn new(source: impl ModelSource + 'static) -> Self {
        ModelProvider {
            source: Box::new(source),
            model: OnceCell::new(),
        }
    }

    pub async fn get(&self) -> Result<Arc<dyn Classifier>, ModelLoadError> {
        let model = self
            .model
            .get_or_try_init(|| async {
                let loaded = self.source.load().await;
                match &loaded {
                    Ok(_) => tracing::info!("model ready"),
                    Err(e) => tracing::error!(error = %e, "model load failed"),
                }
                loaded
            })
            .await?;
        Ok(Arc::clone(model))
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }
}

/// Runs one forward pass off the async executor.
pub async fn infer(
    tensor: NormalizedTensor,
    model: Arc<dyn Classifier>,
) -> Result<Vec<f32>, PredictError> {
    let scores = web::block(move || model.classify(&tensor)).await??;
    Ok(scores)
}

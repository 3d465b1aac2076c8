use actix_web::{error::BlockingError, http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

/// Body returned for every failed prediction. Details stay in the server log.
pub const PREDICTION_FAILED: &str = "Error occurred during prediction";

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to fetch model artifact: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("model artifact request returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to parse model artifact: {0}")]
    Parse(String),

    #[error("probe inference failed: {0}")]
    Probe(#[from] InferenceError),

    #[error("model produces {found} classes, label table has {expected}")]
    ClassCount { expected: usize, found: usize },

    #[error("model loading task was interrupted")]
    Interrupted,
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("normalized image is not a decodable PNG: {0}")]
    Image(#[from] image::ImageError),

    #[error("expected a {expected}x{expected} image, got {width}x{height}")]
    Dimensions {
        expected: u32,
        width: u32,
        height: u32,
    },

    #[error("expected 8-bit RGB pixels, got {0:?}")]
    Layout(image::ColorType),
}

#[derive(Error, Debug)]
#[error("inference failed: {0}")]
pub struct InferenceError(pub String);

#[derive(Error, Debug)]
#[error("{probabilities} probabilities but {labels} labels")]
pub struct ShapeMismatchError {
    pub probabilities: usize,
    pub labels: usize,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

/// Everything that can go wrong while serving one prediction request.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error("request has no `file` field")]
    UploadMissing,

    #[error("malformed upload: {0}")]
    Upload(String),

    #[error("temp file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("uploaded file is not a readable image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("label table does not match model output: {0}")]
    ShapeMismatch(#[from] ShapeMismatchError),

    #[error("blocking task failed: {0}")]
    Blocking(#[from] BlockingError),
}

impl From<actix_multipart::MultipartError> for PredictError {
    fn from(e: actix_multipart::MultipartError) -> Self {
        PredictError::Upload(e.to_string())
    }
}

impl ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(PREDICTION_FAILED)
    }
}

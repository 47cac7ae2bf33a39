// imgbatch/src/http/handlers.rs
use super::error::AppError;
use super::AppState;
use crate::config::Settings;
use crate::core::{ImageMetadata, ImageToolError, Quality, Result};
use crate::processors::{
    BatchOptions, BatchProcessor, BatchResult, MetadataProcessor, OperationRequest, OPERATION_NAMES,
};
use crate::utils::{ensure_no_traversal, single_output_path};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct SingleTarget {
    input: PathBuf,
    output: Option<PathBuf>,
    quality: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct BatchTarget {
    input: PathBuf,
    output: PathBuf,
    quality: Option<u32>,
    pattern: Option<String>,
    recursive: Option<bool>,
    threads: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SingleResponse {
    pub operation: &'static str,
    pub output: PathBuf,
    pub image: ImageMetadata,
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn list_operations() -> Json<Value> {
    Json(serde_json::json!({ "operations": OPERATION_NAMES }))
}

pub async fn process_single(
    State(state): State<AppState>,
    Path(operation): Path<String>,
    Json(body): Json<Value>,
) -> std::result::Result<Json<SingleResponse>, AppError> {
    let target: SingleTarget = parse_target(&body)?;
    let request = OperationRequest::from_json(&operation, body)?;
    let settings = state.settings.clone();

    let response = tokio::task::spawn_blocking(move || run_single(&settings, request, target))
        .await
        .map_err(|e| AppError::Internal(format!("worker failed: {}", e)))??;
    Ok(Json(response))
}

pub async fn process_batch(
    State(state): State<AppState>,
    Path(operation): Path<String>,
    Json(body): Json<Value>,
) -> std::result::Result<Json<BatchResult>, AppError> {
    let target: BatchTarget = parse_target(&body)?;
    let request = OperationRequest::from_json(&operation, body)?;
    let settings = state.settings.clone();

    let result = tokio::task::spawn_blocking(move || run_batch(&settings, request, target))
        .await
        .map_err(|e| AppError::Internal(format!("worker failed: {}", e)))??;
    Ok(Json(result))
}

fn parse_target<T: serde::de::DeserializeOwned>(body: &Value) -> std::result::Result<T, AppError> {
    serde_json::from_value(body.clone())
        .map_err(|e| AppError::Validation(format!("Invalid request: {}", e)))
}

fn run_single(settings: &Settings, request: OperationRequest, target: SingleTarget) -> Result<SingleResponse> {
    ensure_no_traversal(&target.input, "input")?;
    if let Some(output) = &target.output {
        ensure_no_traversal(output, "output")?;
    }
    if !target.input.is_file() {
        return Err(ImageToolError::InvalidParameter(format!(
            "Input file does not exist: {}",
            target.input.display()
        )));
    }

    let operation = request.build(settings)?;
    let quality = target.quality.map(Quality::new).unwrap_or(settings.quality);
    let output = single_output_path(operation.as_ref(), &target.input, target.output.as_deref());

    operation.process_one(&target.input, &output, quality)?;
    log::info!("{} {} -> {}", operation.name(), target.input.display(), output.display());

    let image = MetadataProcessor::new().describe(&output)?;
    Ok(SingleResponse {
        operation: operation.name(),
        output,
        image,
    })
}

fn run_batch(settings: &Settings, request: OperationRequest, target: BatchTarget) -> Result<BatchResult> {
    let operation = request.build(settings)?;
    let processor = BatchProcessor::new(BatchOptions {
        pattern: target.pattern.unwrap_or_else(|| settings.pattern.clone()),
        recursive: target.recursive.unwrap_or(settings.recursive),
        threads: target.threads.unwrap_or(settings.threads),
        quality: target.quality.map(Quality::new).unwrap_or(settings.quality),
        show_progress: false,
    })?;
    Ok(processor.run(&target.input, &target.output, operation.as_ref()))
}

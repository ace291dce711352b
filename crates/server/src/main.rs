use std::process;
use std::sync::Arc;

use clap::Parser;

use face_upscaler_core::detection::domain::face_locator::FaceLocator;
use face_upscaler_core::detection::infrastructure::model_resolver;
use face_upscaler_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use face_upscaler_core::pipeline::pipeline_logger::{LogPipelineLogger, PipelineLogger};
use face_upscaler_core::pipeline::upscale_face_use_case::UpscaleFaceUseCase;
use face_upscaler_core::shared::constants::{YOLO_MODEL_NAME, YOLO_MODEL_URL};
use face_upscaler_core::upscaling::infrastructure::realesrgan_upscaler::RealEsrganUpscaler;

use face_upscaler_server::config::ServerConfig;
use face_upscaler_server::routes::{router, AppState};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::parse();
    config.validate()?;

    // Model download uses a blocking HTTP client, so it has to finish
    // before the async runtime starts.
    let locator = build_locator(&config);

    let upscaler = RealEsrganUpscaler::new(config.upscaler_config());
    if !upscaler.config().tool_path.is_file() {
        log::warn!(
            "Upscaling tool not found at {}; requests with a face will fail",
            upscaler.config().tool_path.display()
        );
    }

    let logger = Arc::new(LogPipelineLogger::new());
    let use_case = UpscaleFaceUseCase::new(
        Arc::new(locator),
        Arc::new(upscaler),
        logger.clone(),
        config.pipeline_options(),
    );
    let app = router(AppState::new(use_case), config.max_upload_bytes);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let addr = config.bind_addr();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        log::info!("Listening on http://{addr}");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    })?;

    logger.summary();
    Ok(())
}

/// Loads the detector. A failure leaves the service up but answering 503.
fn build_locator(config: &ServerConfig) -> FaceLocator {
    match load_detector(config) {
        Ok(detector) => FaceLocator::new(Box::new(detector)),
        Err(e) => {
            log::error!("Face detector could not be loaded: {e}");
            FaceLocator::unavailable()
        }
    }
}

fn load_detector(config: &ServerConfig) -> Result<OnnxYoloDetector, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {YOLO_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        YOLO_MODEL_NAME,
        YOLO_MODEL_URL,
        config.model_dir.as_deref(),
        Some(Box::new(download_progress)),
    )?;
    log::info!("Loading face detector from {}", model_path.display());
    OnnxYoloDetector::new(&model_path, config.confidence)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        log::debug!("Downloading face detection model... {pct}%");
    } else {
        log::debug!("Downloading face detection model... {downloaded} bytes");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Could not listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}

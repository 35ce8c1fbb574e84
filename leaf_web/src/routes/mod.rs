mod about;
mod health;
mod labels;
mod metrics;
mod predict_image;

use crate::server::SharedState;
use axum::{
    routing::{get, post},
    Router,
};
use leaf_prediction::ModelService;

pub fn api_routes<M: ModelService>() -> Router<SharedState<M>> {
    Router::new()
        .route("/health", get(health::healthcheck::<M>))
        .route("/labels", get(labels::class_labels::<M>))
        .route("/about", get(about::about))
        .route("/predict", post(predict_image::predict_image::<M>))
        .route("/metrics", get(metrics::metrics_handler::<M>))
}

#[cfg(test)]
mod tests {
    use crate::{
        config::UploadConfig,
        server::{build_router, SharedState},
        telemetry::Metrics,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};
    use leaf_prediction::{
        ImageTensor, InferenceError, LabelTable, ModelLoadError, ModelLoader, ModelService,
    };
    use serde_json::Value;
    use std::{io::Cursor, path::PathBuf, sync::Arc};
    use tower::ServiceExt;

    struct GreennessModel;

    impl ModelService for GreennessModel {
        fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
            let view = input.view();
            let green = (view.iter().skip(1).step_by(3).sum::<f32>() / (224.0 * 224.0))
                .clamp(0.0, 1.0);
            Ok(vec![1.0 - green, green])
        }
    }

    fn router_with(
        load: impl Fn() -> Result<GreennessModel, ModelLoadError> + Send + Sync + 'static,
        max_bytes: usize,
    ) -> (Router, &'static ModelLoader<GreennessModel>) {
        let models: &'static ModelLoader<GreennessModel> = Box::leak(Box::new(ModelLoader::new()));
        let state = SharedState {
            models,
            load_model: Arc::new(load),
            labels: Arc::new(LabelTable::default()),
            upload: UploadConfig { max_bytes },
            metrics: Arc::new(Metrics::new().unwrap()),
        };
        (build_router(state), models)
    }

    fn working_router() -> (Router, &'static ModelLoader<GreennessModel>) {
        router_with(|| Ok(GreennessModel), 2 * 1024 * 1024)
    }

    fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img: RgbImage = ImageBuffer::from_pixel(width, height, Rgb(color));
        let mut image_data: Vec<u8> = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut image_data), ImageFormat::Png)
            .unwrap();
        image_data
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_image(uri: &str, image_data: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/octet-stream")
            .body(Body::from(image_data))
            .unwrap()
    }

    #[tokio::test]
    async fn test_predict_green_leaf() {
        let (router, models) = working_router();

        let (status, body) = send(
            router,
            post_image("/predict?source=camera", png(500, 500, [0, 255, 0])),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["label"], "Full-Nutrisi");
        assert_eq!(body["class_index"], 1);
        assert_eq!(body["source"], "camera");
        assert!(body["confidence_percent"].as_str().unwrap().ends_with('%'));
        let confidence = body["confidence"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&confidence));
        assert!(models.is_loaded());
    }

    #[tokio::test]
    async fn test_predict_defaults_to_upload_source() {
        let (router, _) = working_router();

        let (status, body) = send(router, post_image("/predict", png(64, 64, [180, 30, 30]))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["label"], "Defisiensi-Nutrisi");
        assert_eq!(body["source"], "upload");
    }

    #[tokio::test]
    async fn test_predict_without_image() {
        let (router, models) = working_router();

        let (status, body) = send(router, post_image("/predict", Vec::new())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["stage"], "upload");
        assert!(!models.is_loaded());
    }

    #[tokio::test]
    async fn test_predict_rejects_oversized_upload() {
        let (router, models) = router_with(|| Ok(GreennessModel), 64);

        let (status, body) = send(router, post_image("/predict", vec![0xff; 100])).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["stage"], "upload");
        assert!(!models.is_loaded());
    }

    #[tokio::test]
    async fn test_predict_garbage_bytes() {
        let (router, _) = working_router();

        let (status, body) = send(router, post_image("/predict", vec![0x42; 10])).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["stage"], "preprocessing");
    }

    #[tokio::test]
    async fn test_predict_with_missing_model() {
        let (router, _) = router_with(
            || Err(ModelLoadError::NotFound(PathBuf::from("models/missing.onnx"))),
            2 * 1024 * 1024,
        );

        let (status, body) = send(
            router.clone(),
            post_image("/predict", png(20, 20, [0, 255, 0])),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["stage"], "model");
        assert!(body["error"].as_str().unwrap().contains("missing.onnx"));

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Degraded");
        assert_eq!(body["model_loaded"], false);
    }

    #[tokio::test]
    async fn test_healthcheck() {
        let (router, _) = working_router();

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Available");
        assert!(body.get("warning").is_none());
    }

    #[tokio::test]
    async fn test_labels() {
        let (router, _) = working_router();

        let request = Request::builder().uri("/labels").body(Body::empty()).unwrap();
        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::OK);
        let labels = body["class_labels"].as_array().unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0]["label"], "Defisiensi-Nutrisi");
        assert_eq!(labels[1]["label"], "Full-Nutrisi");
        assert_eq!(labels[1]["index"], 1);
    }

    #[tokio::test]
    async fn test_about() {
        let (router, _) = working_router();

        let request = Request::builder().uri("/about").body(Body::empty()).unwrap();
        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["classes"].as_array().unwrap().len(), 2);
        assert_eq!(body["train_split_percent"], 70);
    }
}

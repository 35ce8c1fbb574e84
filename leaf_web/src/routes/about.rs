use axum::response::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct DatasetClass {
    name: &'static str,
    images: u32,
    composition: &'static str,
}

#[derive(Serialize)]
pub struct About {
    title: &'static str,
    classes: Vec<DatasetClass>,
    train_split_percent: u32,
    validation_split_percent: u32,
}

/// Describes the dataset the bundled classifier was trained on.
pub async fn about() -> Json<About> {
    Json(About {
        title: "Romaine lettuce leaf classification",
        classes: vec![
            DatasetClass {
                name: "Full-Nutrisi",
                images: 120,
                composition: "110 observation images and 10 from the FN folder",
            },
            DatasetClass {
                name: "Defisiensi-Nutrisi",
                images: 120,
                composition: "40 images each from the N, P and K deficiency folders",
            },
        ],
        train_split_percent: 70,
        validation_split_percent: 30,
    })
}

use crate::predictor::InferenceError;
use image::{imageops::FilterType, ImageFormat, ImageReader};
use ndarray::{Array, Array4, ArrayView4};
use std::io::Cursor;
use thiserror::Error;

pub const INPUT_WIDTH: u32 = 224;
pub const INPUT_HEIGHT: u32 = 224;
pub const INPUT_CHANNELS: usize = 3;

const INPUT_SHAPE: [usize; 4] = [1, INPUT_HEIGHT as usize, INPUT_WIDTH as usize, INPUT_CHANNELS];

#[derive(Error, Debug)]
pub enum PreprocessingError {
    #[error("Unrecognized image format")]
    UnknownFormat,
    #[error("Unsupported image format {0:?}, expected JPEG or PNG")]
    UnsupportedFormat(ImageFormat),
    #[error("Error decoding image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Error reading image: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image has degenerate dimensions {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
}

/// Model input: one RGB image in NHWC layout, values scaled to [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor(Array4<f32>);

impl ImageTensor {
    pub fn from_array(array: Array4<f32>) -> Result<Self, InferenceError> {
        if array.shape() != INPUT_SHAPE {
            return Err(InferenceError::InputShape(array.shape().to_vec()));
        }
        Ok(Self(array))
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.0.view()
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn into_inner(self) -> Array4<f32> {
        self.0
    }
}

/// Decodes JPEG or PNG bytes and turns them into the classifier input tensor.
///
/// The image is forced to 3-channel RGB, resized (not cropped) to 224x224 with
/// bicubic filtering and each channel is divided by 255.
pub fn preprocess(image_data: &[u8]) -> Result<ImageTensor, PreprocessingError> {
    let image_reader = ImageReader::new(Cursor::new(image_data)).with_guessed_format()?;

    match image_reader.format() {
        Some(ImageFormat::Jpeg) | Some(ImageFormat::Png) => {}
        Some(other) => return Err(PreprocessingError::UnsupportedFormat(other)),
        None => return Err(PreprocessingError::UnknownFormat),
    }

    let original_img = image_reader.decode()?;
    let (width, height) = (original_img.width(), original_img.height());
    if width == 0 || height == 0 {
        return Err(PreprocessingError::EmptyImage { width, height });
    }

    let rgb = original_img.to_rgb8();
    let img = image::imageops::resize(&rgb, INPUT_WIDTH, INPUT_HEIGHT, FilterType::CatmullRom);

    let mut input = Array::zeros(INPUT_SHAPE);
    for (x, y, pixel) in img.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for (c, value) in pixel.0.iter().enumerate() {
            input[[0, y, x, c]] = (*value as f32) / 255.;
        }
    }

    tracing::debug!(
        "Preprocessed {}x{} image into tensor {:?}",
        width,
        height,
        input.shape()
    );

    Ok(ImageTensor(input))
}

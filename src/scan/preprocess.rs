// Builds the fixed, ordered set of image variants tried by the locator.

use image::{DynamicImage, GrayImage, ImageBuffer, ImageResult, Luma};
use imageproc::filter::{filter3x3, separable_filter_equal};
use std::path::Path;

/// BT.601 luma weights in thousandths, the same weights video and most vision
/// libraries use for RGB to gray.
const LUMA_WEIGHTS: [u32; 3] = [299, 587, 114];

/// 5-tap binomial kernel; the Gaussian a 5x5 window gets when sigma is derived from its size.
const BLUR_KERNEL: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];

const THRESHOLD_BLOCK_SIZE: usize = 11;
const THRESHOLD_OFFSET: i16 = 2;

/// Centre 9, neighbours -1. Weights sum to 1, so flat regions keep their value.
const SHARPEN_KERNEL: [i32; 9] = [-1, -1, -1, -1, 9, -1, -1, -1, -1];

/// A named transformation of the decoded raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageVariant {
    Original,
    Grayscale,
    Blurred,
    Threshold,
    Sharpened,
}

impl ImageVariant {
    /// Every variant, in persistence order.
    pub const ALL: [ImageVariant; 5] = [
        ImageVariant::Original,
        ImageVariant::Grayscale,
        ImageVariant::Blurred,
        ImageVariant::Threshold,
        ImageVariant::Sharpened,
    ];

    /// Variants handed to the detector, in trial order.
    pub const CANDIDATES: [ImageVariant; 4] = [
        ImageVariant::Grayscale,
        ImageVariant::Blurred,
        ImageVariant::Threshold,
        ImageVariant::Sharpened,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ImageVariant::Original => "original",
            ImageVariant::Grayscale => "grayscale",
            ImageVariant::Blurred => "blurred",
            ImageVariant::Threshold => "threshold",
            ImageVariant::Sharpened => "sharpened",
        }
    }
}

impl std::fmt::Display for ImageVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// All rasters derived from one submitted image.
pub struct VariantSet {
    original: DynamicImage,
    grayscale: GrayImage,
    blurred: GrayImage,
    threshold: GrayImage,
    sharpened: GrayImage,
}

impl VariantSet {
    pub fn from_image(original: DynamicImage) -> Self {
        let grayscale = luma_bt601(&original);
        let blurred = smooth(&grayscale, &BLUR_KERNEL);
        let threshold =
            adaptive_threshold_gaussian(&blurred, THRESHOLD_BLOCK_SIZE, THRESHOLD_OFFSET);
        let sharpened = filter3x3::<_, i32, u8>(&grayscale, &SHARPEN_KERNEL);

        Self {
            original,
            grayscale,
            blurred,
            threshold,
            sharpened,
        }
    }

    /// The luma raster for a variant. `None` for the colour original.
    pub fn luma(&self, variant: ImageVariant) -> Option<&GrayImage> {
        match variant {
            ImageVariant::Original => None,
            ImageVariant::Grayscale => Some(&self.grayscale),
            ImageVariant::Blurred => Some(&self.blurred),
            ImageVariant::Threshold => Some(&self.threshold),
            ImageVariant::Sharpened => Some(&self.sharpened),
        }
    }

    /// Decode candidates paired with their variant, in trial order.
    pub fn candidates(&self) -> impl Iterator<Item = (ImageVariant, &GrayImage)> {
        ImageVariant::CANDIDATES
            .into_iter()
            .filter_map(|variant| self.luma(variant).map(|image| (variant, image)))
    }

    /// Encodes one variant to `path`; the format follows the file extension.
    pub fn save(&self, variant: ImageVariant, path: &Path) -> ImageResult<()> {
        match self.luma(variant) {
            Some(image) => image.save(path),
            None => self.original.save(path),
        }
    }
}

/// Gray conversion with BT.601 weights, rounded to nearest. Alpha is ignored.
pub fn luma_bt601(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let weighted: u32 = rgb
            .get_pixel(x, y)
            .0
            .iter()
            .zip(LUMA_WEIGHTS)
            .map(|(&channel, weight)| u32::from(channel) * weight)
            .sum();
        Luma([((weighted + 500) / 1000) as u8])
    })
}

/// Separable smoothing with results rounded to nearest rather than truncated.
fn smooth(image: &GrayImage, kernel: &[f32]) -> GrayImage {
    let widened: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
            Luma([f32::from(image.get_pixel(x, y)[0])])
        });
    let smoothed = separable_filter_equal(&widened, kernel);

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([smoothed.get_pixel(x, y)[0].round().clamp(0.0, 255.0) as u8])
    })
}

/// Binarizes against a Gaussian-weighted local mean: a pixel turns white when
/// it is brighter than `mean - offset` over a `block_size` x `block_size` window.
pub fn adaptive_threshold_gaussian(image: &GrayImage, block_size: usize, offset: i16) -> GrayImage {
    let local_mean = smooth(image, &gaussian_kernel(block_size));

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = i16::from(image.get_pixel(x, y)[0]);
        let mean = i16::from(local_mean.get_pixel(x, y)[0]);
        if value > mean - offset {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Normalized 1D Gaussian taps with sigma derived from the window size.
pub fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size as f32 - 1.0) / 2.0;

    let taps: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = taps.iter().sum();

    taps.into_iter().map(|t| t / sum).collect()
}

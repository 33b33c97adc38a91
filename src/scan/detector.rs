// The narrow seam to the external symbol decoder.

use super::linear::LinearDetector;
use image::GrayImage;
use tracing::debug;

/// A symbol found by a detector, payload still in raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedSymbol {
    pub payload: Vec<u8>,
    /// Symbol family label, e.g. `QRCODE`.
    pub family: String,
}

/// Finds and decodes barcode symbols in a luma image.
///
/// Implementations return every symbol they could fully decode, in their own
/// order; callers treat that order as authoritative.
pub trait SymbolDetector: Send + Sync {
    fn detect(&self, image: &GrayImage) -> Vec<DetectedSymbol>;
}

/// QR code detector backed by `rqrr`.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrDetector;

impl QrDetector {
    pub const FAMILY: &'static str = "QRCODE";
}

impl SymbolDetector for QrDetector {
    fn detect(&self, image: &GrayImage) -> Vec<DetectedSymbol> {
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            image.width() as usize,
            image.height() as usize,
            |x, y| image.get_pixel(x as u32, y as u32)[0],
        );

        let grids = prepared.detect_grids();
        let mut symbols = Vec::with_capacity(grids.len());
        for grid in grids {
            let mut payload = Vec::new();
            match grid.decode_to(&mut payload) {
                Ok(meta) => {
                    debug!(
                        "QR grid decoded: version={}, ecc_level={}, {} byte(s)",
                        meta.version.0,
                        meta.ecc_level,
                        payload.len()
                    );
                    symbols.push(DetectedSymbol {
                        payload,
                        family: Self::FAMILY.to_string(),
                    });
                }
                Err(e) => debug!("QR grid located but not decodable: {}", e),
            }
        }
        symbols
    }
}

/// Runs several detectors in order and returns the symbols of the first one
/// that finds anything.
pub struct DetectorChain {
    detectors: Vec<Box<dyn SymbolDetector>>,
}

impl DetectorChain {
    pub fn new(detectors: Vec<Box<dyn SymbolDetector>>) -> Self {
        Self { detectors }
    }

    /// QR codes first, then EAN-13/UPC-A, EAN-8 and Code 128.
    pub fn standard() -> Self {
        Self::new(vec![Box::new(QrDetector), Box::new(LinearDetector)])
    }
}

impl SymbolDetector for DetectorChain {
    fn detect(&self, image: &GrayImage) -> Vec<DetectedSymbol> {
        self.detectors
            .iter()
            .map(|detector| detector.detect(image))
            .find(|symbols| !symbols.is_empty())
            .unwrap_or_default()
    }
}

// Barcode scanning pipeline: preprocessing, variant sweep, debug persistence.

pub mod debug_persist;
pub mod detector;
pub mod error;
pub mod linear;
pub mod locator;
pub mod preprocess;

#[cfg(test)]
pub(crate) mod fixtures;

pub use debug_persist::DebugPersister;
pub use detector::{DetectorChain, SymbolDetector};
pub use error::ScanError;
pub use locator::{LocatedSymbol, ScanResult};

use image::DynamicImage;
use locator::locate;
use preprocess::VariantSet;

/// Runs preprocessing, optional persistence and the variant sweep for one image.
pub fn scan_image(
    image: DynamicImage,
    detector: &dyn SymbolDetector,
    persister: Option<&DebugPersister>,
) -> Result<Option<LocatedSymbol>, ScanError> {
    let variants = VariantSet::from_image(image);

    if let Some(persister) = persister {
        persister.persist(&variants);
    }

    locate(detector, &variants)
}

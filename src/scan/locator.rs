// Sweeps the decode candidates in order and reports the first symbol found.

use super::{
    detector::SymbolDetector,
    error::ScanError,
    preprocess::{ImageVariant, VariantSet},
};
use serde::Serialize;
use tracing::debug;

/// The first symbol found, with the variant it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedSymbol {
    pub variant: ImageVariant,
    pub data: String,
    pub family: String,
}

/// Outcome of a scan as reported to the client.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub symbol_type: Option<String>,
}

impl ScanResult {
    pub fn not_found() -> Self {
        Self {
            success: false,
            data: None,
            symbol_type: None,
        }
    }
}

impl From<Option<LocatedSymbol>> for ScanResult {
    fn from(located: Option<LocatedSymbol>) -> Self {
        match located {
            Some(symbol) => Self {
                success: true,
                data: Some(symbol.data),
                symbol_type: Some(symbol.family),
            },
            None => Self::not_found(),
        }
    }
}

/// Tries each candidate variant until the detector returns a symbol.
///
/// Only the first symbol of the first successful variant is considered; later
/// variants are never run. Exhausting the candidates yields `Ok(None)`.
pub fn locate(
    detector: &dyn SymbolDetector,
    variants: &VariantSet,
) -> Result<Option<LocatedSymbol>, ScanError> {
    for (variant, image) in variants.candidates() {
        let Some(symbol) = detector.detect(image).into_iter().next() else {
            debug!("No symbol in {} variant", variant);
            continue;
        };

        let data = String::from_utf8(symbol.payload).map_err(|source| {
            ScanError::NonUtf8Payload {
                family: symbol.family.clone(),
                source,
            }
        })?;

        debug!("{} symbol found in {} variant", symbol.family, variant);
        return Ok(Some(LocatedSymbol {
            variant,
            data,
            family: symbol.family,
        }));
    }

    Ok(None)
}

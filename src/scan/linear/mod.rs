// Scanline decoder for linear (1D) symbologies.

pub(crate) mod code128;
pub(crate) mod ean;

use super::detector::{DetectedSymbol, SymbolDetector};
use image::GrayImage;
use tracing::debug;

/// Lines sampled across the image in each direction.
const SCAN_LINES: u32 = 16;
/// Lines whose darkest and lightest pixels are closer than this are skipped.
const MIN_CONTRAST: u8 = 48;
/// Light margin required on both sides of a symbol, in modules.
const MIN_QUIET_MODULES: f32 = 5.0;

/// A maximal stretch of dark (bar) or light (space) pixels along a scanline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Run {
    pub dark: bool,
    pub width: usize,
}

pub(crate) fn total_width(runs: &[Run]) -> usize {
    runs.iter().map(|run| run.width).sum()
}

/// Run widths scaled so they add up to `modules`.
pub(crate) fn scaled_widths<const N: usize>(runs: &[Run], modules: u32) -> Option<[f32; N]> {
    if runs.len() != N {
        return None;
    }
    let scale = modules as f32 / total_width(runs) as f32;
    let mut out = [0.0; N];
    for (slot, run) in out.iter_mut().zip(runs) {
        *slot = run.width as f32 * scale;
    }
    Some(out)
}

/// Sum of absolute differences between measured and nominal module widths.
pub(crate) fn distance<const N: usize>(measured: &[f32; N], nominal: &[u8; N]) -> f32 {
    measured
        .iter()
        .zip(nominal)
        .map(|(m, &n)| (m - f32::from(n)).abs())
        .sum()
}

/// Whether the runs bordering `runs[start..end]` are light and wide enough.
pub(crate) fn has_quiet_zones(runs: &[Run], start: usize, end: usize, module: f32) -> bool {
    let min_width = MIN_QUIET_MODULES * module;
    let quiet = |run: Option<&Run>| run.is_some_and(|r| !r.dark && r.width as f32 >= min_width);

    start > 0 && quiet(runs.get(start - 1)) && quiet(runs.get(end))
}

/// Splits one scanline into runs around the midpoint between its extremes.
/// `None` for lines without enough contrast to hold a symbol.
fn binarize(line: &[u8]) -> Option<Vec<Run>> {
    let (min, max) = line
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &p| (lo.min(p), hi.max(p)));
    if max.saturating_sub(min) < MIN_CONTRAST {
        return None;
    }
    let threshold = ((u16::from(min) + u16::from(max)) / 2) as u8;

    let mut runs: Vec<Run> = Vec::new();
    for &pixel in line {
        let dark = pixel < threshold;
        match runs.last_mut() {
            Some(run) if run.dark == dark => run.width += 1,
            _ => runs.push(Run { dark, width: 1 }),
        }
    }
    Some(runs)
}

/// First symbol readable left to right in `runs`.
fn decode_runs(runs: &[Run]) -> Option<DetectedSymbol> {
    (1..runs.len())
        .filter(|&start| runs[start].dark)
        .find_map(|start| ean::decode_at(runs, start).or_else(|| code128::decode_at(runs, start)))
}

/// Evenly spaced sample positions along an axis of `len` pixels.
fn sample_positions(len: u32) -> impl Iterator<Item = u32> {
    let lines = SCAN_LINES.min(len);
    (0..lines).map(move |i| (2 * i + 1) * len / (2 * lines))
}

fn scanlines(image: &GrayImage) -> impl Iterator<Item = Vec<u8>> + '_ {
    let (width, height) = image.dimensions();
    let rows = sample_positions(height)
        .map(move |y| (0..width).map(|x| image.get_pixel(x, y)[0]).collect::<Vec<u8>>());
    let columns = sample_positions(width)
        .map(move |x| (0..height).map(|y| image.get_pixel(x, y)[0]).collect::<Vec<u8>>());
    rows.chain(columns)
}

/// EAN-13 (UPC-A included), EAN-8 and Code 128 detector.
///
/// Samples horizontal then vertical scanlines and reads each one in both
/// directions, so symbols rotated by a multiple of 90 degrees are found.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearDetector;

impl SymbolDetector for LinearDetector {
    fn detect(&self, image: &GrayImage) -> Vec<DetectedSymbol> {
        let mut symbols: Vec<DetectedSymbol> = Vec::new();

        for line in scanlines(image) {
            let Some(mut runs) = binarize(&line) else {
                continue;
            };
            let mut symbol = decode_runs(&runs);
            if symbol.is_none() {
                runs.reverse();
                symbol = decode_runs(&runs);
            }

            if let Some(symbol) = symbol {
                if !symbols.contains(&symbol) {
                    debug!("{} symbol read from scanline", symbol.family);
                    symbols.push(symbol);
                }
            }
        }
        symbols
    }
}

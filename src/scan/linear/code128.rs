// Code 128 scanline decoding: code sets A, B and C with shifts and FNC1.

use super::{Run, distance, has_quiet_zones, scaled_widths, total_width};
use crate::scan::detector::DetectedSymbol;

pub const CODE128: &str = "CODE128";

/// Bar/space widths of symbol values 0..=105, bar first.
pub(crate) const PATTERNS: [&[u8; 6]; 106] = [
    b"212222", b"222122", b"222221", b"121223", b"121322", b"131222", b"122213", b"122312",
    b"132212", b"221213", b"221312", b"231212", b"112232", b"122132", b"122231", b"113222",
    b"123122", b"123221", b"223211", b"221132", b"221231", b"213212", b"223112", b"312131",
    b"311222", b"321122", b"321221", b"312212", b"322112", b"322211", b"212123", b"212321",
    b"232121", b"111323", b"131123", b"131321", b"112313", b"132113", b"132311", b"211313",
    b"231113", b"231311", b"112133", b"112331", b"132131", b"113123", b"113321", b"133121",
    b"313121", b"211331", b"231131", b"213113", b"213311", b"213131", b"311123", b"311321",
    b"331121", b"312113", b"312311", b"332111", b"314111", b"221411", b"431111", b"111224",
    b"111422", b"121124", b"121421", b"141122", b"141221", b"112214", b"112412", b"122114",
    b"122411", b"142112", b"142211", b"241211", b"221114", b"413111", b"241112", b"134111",
    b"111242", b"121142", b"121241", b"114212", b"124112", b"124211", b"411212", b"421112",
    b"421211", b"212141", b"214121", b"412121", b"111143", b"111341", b"131141", b"114113",
    b"114311", b"411113", b"411311", b"113141", b"114131", b"311141", b"411131", b"211412",
    b"211214", b"211232",
];

pub(crate) const STOP: [u8; 7] = [2, 3, 3, 1, 1, 1, 2];

pub(crate) const START_A: u8 = 103;
pub(crate) const START_B: u8 = 104;
pub(crate) const START_C: u8 = 105;

const SHIFT: u8 = 98;
const CODE_C: u8 = 99;
const FNC1: u8 = 102;
const GROUP_SEPARATOR: u8 = 0x1d;

const SYMBOL_RUNS: usize = 6;
const SYMBOL_MODULES: u32 = 11;
const STOP_RUNS: usize = 7;
const STOP_MODULES: u32 = 13;
const MAX_SYMBOL_DISTANCE: f32 = 1.0;
/// Data symbols accepted before giving up on finding a stop pattern.
const MAX_SYMBOLS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
    C,
}

impl CodeSet {
    /// The set a SHIFT switches to for one symbol.
    fn shifted(self) -> Self {
        match self {
            CodeSet::A => CodeSet::B,
            CodeSet::B => CodeSet::A,
            CodeSet::C => CodeSet::C,
        }
    }
}

pub(crate) fn pattern(value: u8) -> [u8; 6] {
    PATTERNS[usize::from(value)].map(|b| b - b'0')
}

/// Reads a Code 128 symbol whose start character begins at `runs[start]`.
pub(crate) fn decode_at(runs: &[Run], start: usize) -> Option<DetectedSymbol> {
    let first = runs.get(start..start + SYMBOL_RUNS)?;
    let module = total_width(first) as f32 / SYMBOL_MODULES as f32;

    let start_value = match_symbol(first)?;
    let set = match start_value {
        START_A => CodeSet::A,
        START_B => CodeSet::B,
        START_C => CodeSet::C,
        _ => return None,
    };

    let mut values: Vec<u8> = Vec::new();
    let mut pos = start + SYMBOL_RUNS;
    while !is_stop(runs.get(pos..pos + STOP_RUNS)?) {
        if values.len() == MAX_SYMBOLS {
            return None;
        }
        values.push(match_symbol(runs.get(pos..pos + SYMBOL_RUNS)?)?);
        pos += SYMBOL_RUNS;
    }
    if !has_quiet_zones(runs, start, pos + STOP_RUNS, module) {
        return None;
    }

    let (&check, data) = values.split_last()?;
    if data.is_empty() || checksum(start_value, data) != check {
        return None;
    }

    Some(DetectedSymbol {
        payload: decode_text(set, data)?,
        family: CODE128.to_string(),
    })
}

/// Start value plus each data value weighted by its position, mod 103.
pub(crate) fn checksum(start_value: u8, data: &[u8]) -> u8 {
    let sum = data
        .iter()
        .enumerate()
        .fold(u32::from(start_value), |sum, (i, &v)| sum + u32::from(v) * (i as u32 + 1));
    (sum % 103) as u8
}

fn match_symbol(chunk: &[Run]) -> Option<u8> {
    let widths = scaled_widths::<SYMBOL_RUNS>(chunk, SYMBOL_MODULES)?;
    (0..PATTERNS.len() as u8)
        .map(|value| (value, distance(&widths, &pattern(value))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .filter(|&(_, d)| d < MAX_SYMBOL_DISTANCE)
        .map(|(value, _)| value)
}

fn is_stop(chunk: &[Run]) -> bool {
    scaled_widths::<STOP_RUNS>(chunk, STOP_MODULES)
        .is_some_and(|widths| distance(&widths, &STOP) < MAX_SYMBOL_DISTANCE)
}

/// Turns data values into bytes. FNC1 becomes a group separator except in
/// first position, where it only flags GS1 data; FNC2 to FNC4 are dropped.
fn decode_text(mut set: CodeSet, values: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(values.len() * 2);
    let mut shifted = false;

    for (i, &value) in values.iter().enumerate() {
        let current = if shifted { set.shifted() } else { set };
        shifted = false;

        match (current, value) {
            (_, FNC1) => {
                if i > 0 {
                    out.push(GROUP_SEPARATOR);
                }
            }
            (CodeSet::C, 0..=99) => {
                out.push(b'0' + value / 10);
                out.push(b'0' + value % 10);
            }
            (CodeSet::A | CodeSet::C, 100) => set = CodeSet::B,
            (CodeSet::B | CodeSet::C, 101) => set = CodeSet::A,
            (CodeSet::A | CodeSet::B, CODE_C) => set = CodeSet::C,
            (CodeSet::A | CodeSet::B, SHIFT) => shifted = true,
            (CodeSet::A, 0..=63) | (CodeSet::B, 0..=95) => out.push(value + 32),
            (CodeSet::A, 64..=95) => out.push(value - 64),
            (CodeSet::A | CodeSet::B, 96 | 97) | (CodeSet::A, 101) | (CodeSet::B, 100) => {}
            _ => return None,
        }
    }
    Some(out)
}

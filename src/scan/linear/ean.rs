// EAN-13 and EAN-8 scanline decoding. UPC-A reads as EAN-13 with a leading zero.

use super::{Run, distance, has_quiet_zones, scaled_widths, total_width};
use crate::scan::detector::DetectedSymbol;

pub const EAN13: &str = "EAN13";
pub const EAN8: &str = "EAN8";

/// Odd-parity ("L") digit widths, space first. Right-hand digits use the same
/// widths starting with a bar; even-parity ("G") digits are these reversed.
pub(crate) const L_PATTERNS: [[u8; 4]; 10] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 2],
];

/// Parity of the six left digits of an EAN-13, indexed by the implied first
/// digit. Bit 5 is the leftmost digit; a set bit means even parity.
pub(crate) const FIRST_DIGIT_PARITY: [u8; 10] = [
    0b000000, 0b001011, 0b001101, 0b001110, 0b010011, 0b011001, 0b011100, 0b010101, 0b010110,
    0b011010,
];

const EAN13_RUNS: usize = 59;
const EAN13_MODULES: u32 = 95;
const EAN8_RUNS: usize = 43;
const EAN8_MODULES: u32 = 67;

const GUARD_RUNS: usize = 3;
const CENTER_RUNS: usize = 5;
const DIGIT_RUNS: usize = 4;
const DIGIT_MODULES: u32 = 7;
const MAX_DIGIT_DISTANCE: f32 = 1.5;

/// Reads an EAN-13 or EAN-8 symbol whose start guard is `runs[start]`.
pub(crate) fn decode_at(runs: &[Run], start: usize) -> Option<DetectedSymbol> {
    let (digits, family) = decode_ean13(runs, start)
        .map(|digits| (digits, EAN13))
        .or_else(|| decode_ean8(runs, start).map(|digits| (digits, EAN8)))?;

    Some(DetectedSymbol {
        payload: digits.iter().map(|d| b'0' + d).collect(),
        family: family.to_string(),
    })
}

fn decode_ean13(runs: &[Run], start: usize) -> Option<Vec<u8>> {
    let symbol = runs.get(start..start + EAN13_RUNS)?;
    let module = total_width(symbol) as f32 / EAN13_MODULES as f32;
    if !has_quiet_zones(runs, start, start + EAN13_RUNS, module) {
        return None;
    }

    let (left, right) = split_halves(symbol, 6, module)?;

    let mut digits = vec![0u8; 13];
    let mut parity = 0u8;
    for (i, chunk) in left.chunks_exact(DIGIT_RUNS).enumerate() {
        let (digit, even) = match_left_digit(chunk)?;
        digits[1 + i] = digit;
        if even {
            parity |= 1 << (5 - i);
        }
    }
    for (i, chunk) in right.chunks_exact(DIGIT_RUNS).enumerate() {
        digits[7 + i] = match_digit(chunk)?;
    }

    digits[0] = FIRST_DIGIT_PARITY.iter().position(|&p| p == parity)? as u8;
    has_valid_check_digit(&digits).then_some(digits)
}

fn decode_ean8(runs: &[Run], start: usize) -> Option<Vec<u8>> {
    let symbol = runs.get(start..start + EAN8_RUNS)?;
    let module = total_width(symbol) as f32 / EAN8_MODULES as f32;
    if !has_quiet_zones(runs, start, start + EAN8_RUNS, module) {
        return None;
    }

    let (left, right) = split_halves(symbol, 4, module)?;

    let mut digits = Vec::with_capacity(8);
    for chunk in left.chunks_exact(DIGIT_RUNS) {
        digits.push(match_digit(chunk)?);
    }
    for chunk in right.chunks_exact(DIGIT_RUNS) {
        digits.push(match_digit(chunk)?);
    }

    has_valid_check_digit(&digits).then_some(digits)
}

/// Checks the three guards and returns the runs of the left and right digits.
fn split_halves(symbol: &[Run], half_digits: usize, module: f32) -> Option<(&[Run], &[Run])> {
    let half = half_digits * DIGIT_RUNS;
    let (start_guard, rest) = symbol.split_at(GUARD_RUNS);
    let (left, rest) = rest.split_at(half);
    let (center, rest) = rest.split_at(CENTER_RUNS);
    let (right, end_guard) = rest.split_at(half);

    let guards_ok = [start_guard, center, end_guard]
        .iter()
        .all(|guard| is_guard(guard, module));
    guards_ok.then_some((left, right))
}

/// Every run of a guard is one module wide.
fn is_guard(runs: &[Run], module: f32) -> bool {
    runs.iter()
        .all(|run| (0.5..1.75).contains(&(run.width as f32 / module)))
}

/// Best match against the odd-parity table, or its reversal when `even`.
fn best_digit(widths: &[f32; 4], even: bool) -> (u8, f32) {
    let mut best = (0u8, f32::MAX);
    for (digit, pattern) in L_PATTERNS.iter().enumerate() {
        let mut pattern = *pattern;
        if even {
            pattern.reverse();
        }
        let d = distance(widths, &pattern);
        if d < best.1 {
            best = (digit as u8, d);
        }
    }
    best
}

/// Odd-parity digit, as used by both halves of EAN-8 and the right half of EAN-13.
fn match_digit(chunk: &[Run]) -> Option<u8> {
    let widths = scaled_widths::<4>(chunk, DIGIT_MODULES)?;
    let (digit, d) = best_digit(&widths, false);
    (d < MAX_DIGIT_DISTANCE).then_some(digit)
}

/// Left-half digit and whether it was encoded with even parity.
fn match_left_digit(chunk: &[Run]) -> Option<(u8, bool)> {
    let widths = scaled_widths::<4>(chunk, DIGIT_MODULES)?;
    let (odd, odd_distance) = best_digit(&widths, false);
    let (even, even_distance) = best_digit(&widths, true);

    if odd_distance <= even_distance {
        (odd_distance < MAX_DIGIT_DISTANCE).then_some((odd, false))
    } else {
        (even_distance < MAX_DIGIT_DISTANCE).then_some((even, true))
    }
}

/// Mod-10 check with weights 3 and 1 alternating leftwards from the check digit.
pub(crate) fn has_valid_check_digit(digits: &[u8]) -> bool {
    let Some((&check, body)) = digits.split_last() else {
        return false;
    };
    let sum: u32 = body
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| u32::from(d) * if i % 2 == 0 { 3 } else { 1 })
        .sum();

    (10 - sum % 10) % 10 == u32::from(check)
}

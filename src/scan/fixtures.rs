// Rendered symbols for decoder tests.

use super::linear::{code128, ean};
use image::{GrayImage, Luma};

const MARGIN_MODULES: u32 = 10;
const BAR_HEIGHT: u32 = 100;

/// Draws alternating bar/space widths, in modules and starting with a bar,
/// centred on a white canvas.
pub fn linear_image(widths: &[u8], module_px: u32) -> GrayImage {
    let modules: u32 = widths.iter().map(|&w| u32::from(w)).sum();
    let margin = MARGIN_MODULES * module_px;
    let mut image = GrayImage::from_pixel(
        modules * module_px + 2 * margin,
        BAR_HEIGHT + 2 * margin,
        Luma([255]),
    );

    let mut x = margin;
    for (i, &w) in widths.iter().enumerate() {
        let span = u32::from(w) * module_px;
        if i % 2 == 0 {
            for bx in x..x + span {
                for y in margin..margin + BAR_HEIGHT {
                    image.put_pixel(bx, y, Luma([0]));
                }
            }
        }
        x += span;
    }
    image
}

fn digits(text: &str) -> Vec<usize> {
    text.bytes().map(|b| usize::from(b - b'0')).collect()
}

/// EAN-13 from all 13 digits; the check digit is drawn as given.
pub fn ean13_image(text: &str, module_px: u32) -> GrayImage {
    let d = digits(text);
    assert_eq!(d.len(), 13);
    let parity = ean::FIRST_DIGIT_PARITY[d[0]];

    let mut widths = vec![1, 1, 1];
    for (i, &digit) in d[1..7].iter().enumerate() {
        let mut pattern = ean::L_PATTERNS[digit];
        if parity & (1 << (5 - i)) != 0 {
            pattern.reverse();
        }
        widths.extend(pattern);
    }
    widths.extend([1, 1, 1, 1, 1]);
    for &digit in &d[7..] {
        widths.extend(ean::L_PATTERNS[digit]);
    }
    widths.extend([1, 1, 1]);

    linear_image(&widths, module_px)
}

/// EAN-8 from all 8 digits.
pub fn ean8_image(text: &str, module_px: u32) -> GrayImage {
    let d = digits(text);
    assert_eq!(d.len(), 8);

    let mut widths = vec![1, 1, 1];
    for &digit in &d[..4] {
        widths.extend(ean::L_PATTERNS[digit]);
    }
    widths.extend([1, 1, 1, 1, 1]);
    for &digit in &d[4..] {
        widths.extend(ean::L_PATTERNS[digit]);
    }
    widths.extend([1, 1, 1]);

    linear_image(&widths, module_px)
}

fn code128_image(start: u8, data: &[u8], module_px: u32) -> GrayImage {
    let mut widths: Vec<u8> = code128::pattern(start).to_vec();
    for &value in data {
        widths.extend(code128::pattern(value));
    }
    widths.extend(code128::pattern(code128::checksum(start, data)));
    widths.extend(code128::STOP);

    linear_image(&widths, module_px)
}

/// Code 128 in set B, printable ASCII only.
pub fn code128_text_image(text: &str, module_px: u32) -> GrayImage {
    let data: Vec<u8> = text.bytes().map(|b| b - 32).collect();
    code128_image(code128::START_B, &data, module_px)
}

/// Code 128 in set C, an even number of digits.
pub fn code128_digits_image(text: &str, module_px: u32) -> GrayImage {
    let data: Vec<u8> = text
        .as_bytes()
        .chunks_exact(2)
        .map(|pair| (pair[0] - b'0') * 10 + (pair[1] - b'0'))
        .collect();
    code128_image(code128::START_C, &data, module_px)
}

/// QR code with a four-module quiet zone.
pub fn qr_image(text: &str, module_px: u32) -> GrayImage {
    let code = qrcode::QrCode::new(text.as_bytes()).unwrap();
    let size = code.width() as u32;
    let colors = code.to_colors();
    let quiet = 4;
    let side = (size + 2 * quiet) * module_px;

    GrayImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / module_px, y / module_px);
        if mx < quiet || my < quiet || mx >= size + quiet || my >= size + quiet {
            return Luma([255]);
        }
        match colors[((my - quiet) * size + (mx - quiet)) as usize] {
            qrcode::Color::Dark => Luma([0]),
            qrcode::Color::Light => Luma([255]),
        }
    })
}

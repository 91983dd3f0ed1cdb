//! Text measurement for layout decisions made before a backend is chosen.
//!
//! Widths are the Helvetica AFM advance widths (units of 1/1000 em) for every
//! character of WinAnsiEncoding. The PDF target draws with the standard
//! Helvetica fonts in that encoding, so there the numbers are exact; the GPU
//! targets lay text out with parley and only use these for spacing.

use super::Weight;

/// Distance from the top of a line box to the baseline, in em.
pub const ASCENT: f64 = 0.905;
/// Distance from the baseline to the bottom of a line box, in em.
pub const DESCENT: f64 = 0.212;

/// Drawn in place of characters the standard fonts lack.
pub const REPLACEMENT: u8 = b'?';

/// Indexed by WinAnsi byte minus 0x20. Unassigned bytes are 0.
#[rustfmt::skip]
const HELVETICA: [u16; 224] = [
  278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
  556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
  1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
  667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
  333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
  556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 0,   // 'p'..DEL
  556, 0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,    // 0x80
  0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0, 500, 667,   // 0x90
  278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // 0xa0
  400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // 0xb0
  667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 0xc0
  722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 0xd0
  556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // 0xe0
  556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // 0xf0
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 224] = [
  278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
  556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
  975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
  667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
  333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
  611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 0,
  556, 0, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
  0, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 0, 500, 667,
  278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
  400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
  722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
  722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
  556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
  611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

/// The WinAnsiEncoding byte for `c`, if the standard fonts can draw it.
pub fn win_ansi(c: char) -> Option<u8> {
  let byte = match c {
    ' '..='~' | '\u{a0}'..='\u{ff}' => c as u8,
    '\u{20ac}' => 0x80,
    '\u{201a}' => 0x82,
    '\u{0192}' => 0x83,
    '\u{201e}' => 0x84,
    '\u{2026}' => 0x85,
    '\u{2020}' => 0x86,
    '\u{2021}' => 0x87,
    '\u{02c6}' => 0x88,
    '\u{2030}' => 0x89,
    '\u{0160}' => 0x8a,
    '\u{2039}' => 0x8b,
    '\u{0152}' => 0x8c,
    '\u{017d}' => 0x8e,
    '\u{2018}' => 0x91,
    '\u{2019}' => 0x92,
    '\u{201c}' => 0x93,
    '\u{201d}' => 0x94,
    '\u{2022}' => 0x95,
    '\u{2013}' => 0x96,
    '\u{2014}' => 0x97,
    '\u{02dc}' => 0x98,
    '\u{2122}' => 0x99,
    '\u{0161}' => 0x9a,
    '\u{203a}' => 0x9b,
    '\u{0153}' => 0x9c,
    '\u{017e}' => 0x9e,
    '\u{0178}' => 0x9f,
    _ => return None,
  };
  Some(byte)
}

/// Advance width of one line of `text` at `size`.
pub fn text_width(text: &str, size: f64, weight: Weight) -> f64 {
  let table = match weight {
    Weight::Normal => &HELVETICA,
    Weight::Bold => &HELVETICA_BOLD,
  };

  let units: u32 = text
    .chars()
    .map(|c| {
      let byte = win_ansi(c).unwrap_or(REPLACEMENT);
      u32::from(table[usize::from(byte - 0x20)])
    })
    .sum();

  f64::from(units) * size / 1000.0
}

/// Height of one line of text at `size`.
pub fn line_height(size: f64) -> f64 { (ASCENT + DESCENT) * size }

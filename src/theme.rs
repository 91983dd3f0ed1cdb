//! Colors shared by every figure.

use peniko::Color;

pub const BACKGROUND: Color = Color::WHITE;
pub const TEXT: Color = Color::BLACK;
pub const FRAME: Color = Color::BLACK;
pub const GRID: Color = Color::from_rgb8(0xb0, 0xb0, 0xb0);
pub const LEGEND_FRAME: Color = Color::from_rgb8(0xcc, 0xcc, 0xcc);

pub const BLUE: Color = Color::from_rgb8(0x1f, 0x77, 0xb4);
pub const GREEN: Color = Color::from_rgb8(0x00, 0x80, 0x00);

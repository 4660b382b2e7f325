//! Dark dashboard theme tokens.
//!
//! The chart palette comes from `ChartTheme` in the core crate; this module
//! adds the UI chrome around it and the tile colors.
//!
//! # Color Palette
//! - **Background**: `#0E1117`, shared with the chart
//! - **Accent**: cyan (focus, highlights)
//! - **Rise / Fall**: red / green when deltas are inverted (Japanese
//!   convention), green / red otherwise
//! - **Dip**: coral text on a dark red badge
//! - **Stable**: mint text on a dark green badge

use ratatui::style::{Color, Modifier, Style};

use dipwatch_core::analysis::{DipCategory, Rgb, Trend};

pub const BACKGROUND: Color = Color::Rgb(0x0E, 0x11, 0x17);
pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const RED: Color = Color::Rgb(255, 75, 75);
pub const GREEN: Color = Color::Rgb(9, 171, 59);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const MUTED: Color = Color::Rgb(130, 130, 140);
pub const SPINE: Color = Color::Rgb(0x44, 0x44, 0x44);

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub accent: Color,
    pub rise: Color,
    pub fall: Color,
    pub flat: Color,
    pub dip_text: Color,
    pub dip_badge: Color,
    pub stable_text: Color,
    pub stable_badge: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark(true)
    }
}

impl Theme {
    /// `inverse_deltas`: rises are red and falls green.
    pub fn dark(inverse_deltas: bool) -> Self {
        let (rise, fall) = if inverse_deltas { (RED, GREEN) } else { (GREEN, RED) };
        Self {
            background: BACKGROUND,
            accent: ACCENT,
            rise,
            fall,
            flat: MUTED,
            dip_text: Color::Rgb(0xFF, 0x6B, 0x6B),
            dip_badge: Color::Rgb(0x3D, 0x22, 0x27),
            stable_text: Color::Rgb(0x5B, 0xE3, 0x86),
            stable_badge: Color::Rgb(0x17, 0x38, 0x28),
            text_primary: Color::White,
            text_secondary: Color::Rgb(0xCC, 0xCC, 0xCC),
        }
    }

    pub fn trend_color(&self, trend: Trend) -> Color {
        match trend {
            Trend::Up => self.rise,
            Trend::Down => self.fall,
            Trend::Flat => self.flat,
        }
    }

    /// Style of the category badge on a drawdown tile.
    pub fn dip_badge(&self, category: DipCategory) -> Style {
        match category {
            DipCategory::Dip => Style::default().fg(self.dip_text).bg(self.dip_badge),
            DipCategory::Normal => Style::default().fg(self.stable_text).bg(self.stable_badge),
        }
    }
}

pub fn rgb(c: Rgb) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn negative() -> Style {
    Style::default().fg(RED)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        Style::default().fg(SPINE)
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

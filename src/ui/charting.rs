use ratatui::{
    style::{Color, Style},
    text::Line,
    widgets::Bar,
};

use crate::summary::CharAccuracy;
use crate::ui::Palette;

const MAX_BAR_WIDTH: u16 = 5;

/// Accuracy ratio as a whole percentage
pub fn percent(ratio: f64) -> u64 {
    (ratio.clamp(0.0, 1.0) * 100.0).round() as u64
}

pub fn bar_color(index: usize, palette: &Palette) -> Color {
    palette.bars[index % 2]
}

/// One bar per character, alternating between the two bar colours
pub fn accuracy_bars(accuracy: &[CharAccuracy], palette: &Palette) -> Vec<Bar<'static>> {
    accuracy
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let value = percent(entry.ratio);
            Bar::default()
                .value(value)
                .label(Line::from(entry.character.to_string()))
                .text_value(format!("{value}"))
                .style(Style::default().fg(bar_color(i, palette)))
        })
        .collect()
}

/// Widest bar that still fits `count` bars (plus gaps) into `width` columns
pub fn bar_width(count: usize, width: u16) -> u16 {
    if count == 0 {
        return MAX_BAR_WIDTH;
    }
    let per_bar = width as usize / count;
    (per_bar.saturating_sub(1) as u16).clamp(1, MAX_BAR_WIDTH)
}

use kef::Volume;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, BorderType, Gauge, Widget},
};

/// Horizontal 0-100 slider drawn as a bordered gauge
pub struct VolumeSlider {
    value: Volume,
    held: bool,
}

impl VolumeSlider {
    pub fn new(value: Volume) -> Self {
        Self { value, held: false }
    }

    /// Highlight while the user holds the slider
    pub fn held(mut self, held: bool) -> Self {
        self.held = held;
        self
    }

    /// Area inside the border, where columns map to values
    pub fn track(area: Rect) -> Rect {
        Block::bordered().inner(area)
    }

    /// Raw slider value under `column`. Columns left or right of the track
    /// give values outside `0..=100`.
    pub fn value_at(area: Rect, column: u16) -> f64 {
        let track = Self::track(area);
        let span = f64::from(track.width.saturating_sub(1).max(1));
        (f64::from(column) - f64::from(track.x)) / span * 100.0
    }
}

impl Widget for VolumeSlider {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let color = if self.held { Color::Cyan } else { Color::Blue };
        let border = if self.held {
            BorderType::Thick
        } else {
            BorderType::Rounded
        };

        Gauge::default()
            .block(Block::bordered().border_type(border))
            .gauge_style(Style::new().fg(color).bg(Color::DarkGray))
            .ratio(self.value.as_fraction())
            .label("")
            .render(area, buf);
    }
}

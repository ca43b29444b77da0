use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    widgets::{Block, BorderType, Paragraph},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Normal,
    Danger,
}

/// A bordered, centered label that reads as a button
pub fn button(label: &str, kind: ButtonKind, focused: bool) -> Paragraph<'_> {
    let accent = match kind {
        ButtonKind::Normal => Color::Blue,
        ButtonKind::Danger => Color::Red,
    };

    let mut block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::new().fg(accent));
    let mut text = Style::new().add_modifier(Modifier::BOLD);

    if focused {
        block = block.border_type(BorderType::Thick);
        text = text.fg(Color::Black).bg(accent);
    }

    Paragraph::new(label)
        .style(text)
        .alignment(Alignment::Center)
        .block(block)
}

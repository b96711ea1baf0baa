use crate::schedule::ColorTag;
use ratatui::style::{Color, Modifier, Style};

pub(crate) const BASE_STYLE: Style = Style::new().fg(Color::White).bg(Color::Black);

pub(crate) const LABEL_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const WEEKDAY_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const TODAY_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::LightYellow)
    .add_modifier(Modifier::BOLD);

pub(crate) const HOUR_STYLE: Style = BASE_STYLE.fg(Color::Gray);

pub(crate) const FAULT_STYLE: Style = BASE_STYLE.fg(Color::LightRed);

/// Style for an event in the grid, chosen by the event's color tag.  Tags may be
/// plain color names ("green") or CSS-like class names ("bg-green-200").
pub(crate) fn event_style(tag: &ColorTag) -> Style {
    let tag = tag.as_str().to_ascii_lowercase();
    let color = [
        ("blue", Color::LightBlue),
        ("green", Color::LightGreen),
        ("red", Color::LightRed),
        ("yellow", Color::LightYellow),
        ("purple", Color::LightMagenta),
        ("magenta", Color::LightMagenta),
        ("cyan", Color::LightCyan),
        ("gray", Color::Gray),
        ("grey", Color::Gray),
    ]
    .into_iter()
    .find_map(|(name, color)| tag.contains(name).then_some(color))
    .unwrap_or(Color::LightBlue);
    Style::new().fg(Color::Black).bg(color)
}

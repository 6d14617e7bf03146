use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(keys: &[&'static str], pad: usize, desc: &'static str) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    let mut width = 0;
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" / "));
            width += 3;
        }
        spans.push(Span::styled(*key, Style::default().fg(Color::Magenta)));
        width += key.chars().count();
    }
    spans.push(Span::raw(" ".repeat(pad.saturating_sub(width).max(1))));
    spans.push(Span::raw(desc));
    Line::from(spans)
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line(&["q", "Ctrl-C"], 14, "Quit"),
        key_line(&["r"], 14, "Refresh now"),
        key_line(&["tab", "shift-tab"], 14, "Switch tabs"),
        key_line(&["↑/↓", "j/k"], 14, "Scroll output"),
        key_line(&["PgUp", "PgDn"], 14, "Scroll a page"),
        key_line(&["g", "G"], 14, "Top / bottom of output"),
        key_line(&["y"], 14, "Copy run ID to clipboard"),
        key_line(&["?"], 14, "Show this help"),
        Line::from(""),
        Line::from("Run actions (only offered when the status allows them):"),
        key_line(&["a"], 14, "Approve the plan and apply"),
        key_line(&["d"], 14, "Discard the plan (press twice)"),
        key_line(&["c"], 14, "Cancel a pending or planning run (press twice)"),
        Line::from(""),
        Line::from("The run is re-fetched every poll interval until it reaches a final status."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}

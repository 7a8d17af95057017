use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
};

use crate::app::SortState;

/// Widest a single column may grow before its cells are clipped.
pub const MAX_COLUMN_WIDTH: usize = 48;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Shorten long identifiers to `head...tail`.
pub fn truncate_middle(value: &str, max: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= max || max < 8 {
        return value.to_string();
    }
    let keep = max - 3;
    let head = keep / 2 + keep % 2;
    let tail = keep / 2;
    let start: String = chars[..head].iter().collect();
    let end: String = chars[chars.len() - tail..].iter().collect();
    format!("{start}...{end}")
}

/// Per-column width: the widest of header and cells, capped.
pub fn column_widths<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> Vec<u16> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|h| h.as_ref().chars().count() + 2)
        .collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths
        .into_iter()
        .map(|w| w.min(MAX_COLUMN_WIDTH) as u16)
        .collect()
}

/// Header label with a direction marker on the sorted column.
pub fn header_label(header: &str, column: usize, sort: &SortState) -> String {
    match sort.last_sorted_column {
        Some(sorted) if sorted == column => {
            let arrow = if sort.ascending { "▲" } else { "▼" };
            format!("{header} {arrow}")
        }
        _ => header.to_string(),
    }
}

pub fn format_kv(key: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{key}: "), Style::default().fg(Color::DarkGray)),
        Span::styled(value.to_string(), Style::default().fg(Color::White)),
    ])
}

pub fn spinner_frame(millis: u128) -> &'static str {
    SPINNER_FRAMES[(millis / 100) as usize % SPINNER_FRAMES.len()]
}

pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .areas(area);

    let [_, center, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width),
        Constraint::Fill(1),
    ])
    .areas(middle);

    center
}

pub fn padded_rect(area: Rect, padding: u16) -> Rect {
    Rect {
        x: area.x + padding,
        y: area.y + padding,
        width: area.width.saturating_sub(padding * 2),
        height: area.height.saturating_sub(padding * 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_middle_short() {
        assert_eq!(truncate_middle("SP1.alex", 20), "SP1.alex");
    }

    #[test]
    fn test_truncate_middle_long() {
        let principal = "SP3K8BC0PPEVCV7NZ6QSRWPQ2JE9E5B6N3PA0KBR9";
        let short = truncate_middle(principal, 15);
        assert_eq!(short.chars().count(), 15);
        assert!(short.starts_with("SP3K8B"));
        assert!(short.ends_with("0KBR9"));
        assert!(short.contains("..."));
    }

    #[test]
    fn test_column_widths_cover_header_and_cells() {
        let widths = column_widths(
            &["Name", "Decimals"],
            &[vec!["Wrapped Bitcoin".into(), "8".into()]],
        );
        assert_eq!(widths, vec![15, 10]);
    }

    #[test]
    fn test_column_widths_are_capped() {
        let widths = column_widths(&["Source"], &[vec!["x".repeat(200)]]);
        assert_eq!(widths, vec![MAX_COLUMN_WIDTH as u16]);
    }

    #[test]
    fn test_header_label_marks_sorted_column() {
        let sort = SortState {
            last_sorted_column: Some(1),
            ascending: false,
        };
        assert_eq!(header_label("Supply", 1, &sort), "Supply ▼");
        assert_eq!(header_label("Name", 0, &sort), "Name");
    }

    #[test]
    fn test_spinner_cycles() {
        assert_eq!(spinner_frame(0), "⠋");
        assert_eq!(spinner_frame(1_000), "⠋");
        assert_eq!(spinner_frame(150), "⠙");
    }

    #[test]
    fn test_padded_rect() {
        let area = Rect::new(0, 0, 100, 50);
        let padded = padded_rect(area, 5);
        assert_eq!(padded.x, 5);
        assert_eq!(padded.y, 5);
        assert_eq!(padded.width, 90);
        assert_eq!(padded.height, 40);
    }

    #[test]
    fn test_centered_rect_fixed() {
        let area = Rect::new(0, 0, 100, 40);
        let centered = centered_rect_fixed(50, 5, area);
        assert_eq!(centered.width, 50);
        assert_eq!(centered.height, 5);
        assert_eq!(centered.x, 25);
    }
}

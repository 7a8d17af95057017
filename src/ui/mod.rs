mod helper;

use helper::*;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row as TableRow, Table, TableState, Wrap},
    Frame,
};

use crate::app::{Browser, Status, SubView, TableView};
use crate::keymap;

pub fn draw(frame: &mut Frame, browser: &Browser) {
    let [top, body, status, help] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_top_bar(frame, browser, top);

    match &browser.sub {
        None => draw_table(frame, &browser.main, &browser.title, browser.focused, body),
        Some(SubView::Detail { headers, row }) => draw_detail(frame, headers, &row.cells, body),
        Some(SubView::Holders { contract_id, table }) => {
            let title = format!("Holders of {}", truncate_middle(contract_id, 60));
            draw_table(frame, table, &title, browser.focused, body);
        }
        Some(SubView::Compare {
            contract_id,
            first,
            second,
            table,
        }) => {
            let title = format!(
                "{} holders at {first} vs {second}",
                truncate_middle(contract_id, 60)
            );
            draw_table(frame, table, &title, browser.focused, body);
        }
        Some(SubView::ContractSource {
            contract_id,
            source,
            scroll,
            ..
        }) => draw_source(frame, contract_id, source, *scroll, body),
    }

    draw_status(frame, browser.status.as_ref(), status);

    let hints = Paragraph::new(keymap::help(browser.mode())).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(hints, help);

    if let Some(message) = &browser.loading {
        draw_loading(frame, message);
    }
}

fn draw_top_bar(frame: &mut Frame, browser: &Browser, area: Rect) {
    let total = browser
        .active_table()
        .map(|table| table.rows.len())
        .unwrap_or(browser.main.rows.len());

    let mut spans = vec![
        Span::styled(format!(" {} ", browser.title), Style::default().fg(Color::Cyan).bold()),
        Span::styled("│ ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("Total: {total}"), Style::default().fg(Color::White)),
    ];
    if !browser.focused {
        spans.push(Span::styled("  (unfocused)", Style::default().fg(Color::DarkGray)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_table(frame: &mut Frame, view: &TableView, title: &str, focused: bool, area: Rect) {
    let cells = view.cells();
    let widths: Vec<Constraint> = column_widths(&view.headers, &cells)
        .into_iter()
        .map(Constraint::Length)
        .collect();

    let header = TableRow::new(
        view.headers
            .iter()
            .enumerate()
            .map(|(i, h)| Cell::from(header_label(h, i, &view.sort))),
    )
    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    .bottom_margin(1);

    let rows = cells
        .into_iter()
        .map(|row| TableRow::new(row.into_iter().map(Cell::from)));

    let border = if focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(format!(" {title} "));

    let highlight = if focused {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default().fg(Color::Gray)
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(2)
        .row_highlight_style(highlight);

    let mut state = TableState::default().with_selected((!view.rows.is_empty()).then_some(view.selected));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_detail(frame: &mut Frame, headers: &[String], cells: &[String], area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Detail ");

    let lines: Vec<Line> = headers
        .iter()
        .zip(cells)
        .map(|(key, value)| format_kv(key, value))
        .collect();

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, padded_rect(area, 1));
}

fn draw_source(frame: &mut Frame, contract_id: &str, source: &str, scroll: u16, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {contract_id} "));

    let paragraph = Paragraph::new(source.to_string())
        .block(block)
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn draw_status(frame: &mut Frame, status: Option<&Status>, area: Rect) {
    let line = match status {
        Some(status @ Status::Error(_)) => {
            Line::from(format!(" ✗ {}", status.message())).fg(Color::Red)
        }
        Some(status) => Line::from(format!(" {}", status.message())).fg(Color::Green),
        None => Line::from(""),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_loading(frame: &mut Frame, msg: &str) {
    let area = frame.area();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Loading ");

    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let text = format!("{} {}", spinner_frame(millis), msg);
    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow));

    let width = (msg.chars().count() as u16 + 8).clamp(30, area.width.max(30));
    let centered = centered_rect_fixed(width.min(area.width), 3, area);
    frame.render_widget(ratatui::widgets::Clear, centered);
    frame.render_widget(paragraph, centered);
}

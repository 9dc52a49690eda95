//! Ratatui rendering of a [`BoardState`] snapshot.

use crate::{
    board::BoardState,
    render::{COLUMNS, DisplayRow, PLACEHOLDER},
};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, Wrap},
};

const BACKGROUND: Color = Color::Rgb(15, 15, 25);
const MUTED: Color = Color::Rgb(128, 128, 150);
const ACCENT: Color = Color::Rgb(100, 255, 218);
const BID: Color = Color::Rgb(255, 69, 58);
const ASK: Color = Color::Rgb(0, 255, 127);
const GOLD: Color = Color::Rgb(255, 215, 0);

/// Draw the whole board: status bar, optional error banner, then the status table.
pub fn render_board(f: &mut Frame, board: &BoardState, endpoint: &str) {
    let model = board.display();

    let mut constraints = vec![Constraint::Length(3)];
    if model.banner.is_some() {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    render_status_bar(f, chunks[0], board, endpoint);

    let table_area = match &model.banner {
        Some(banner) => {
            render_banner(f, chunks[1], banner);
            chunks[2]
        }
        None => chunks[1],
    };

    render_table(f, table_area, &model.rows);
}

fn render_status_bar(f: &mut Frame, area: Rect, board: &BoardState, endpoint: &str) {
    let (symbol, color) = if board.last_error.is_none() && board.last_success.is_some() {
        ("●", ASK)
    } else {
        ("○", BID)
    };

    let updated = board
        .last_success
        .map(|time| time.format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    let stats = board.stats;
    let status_line = Line::from(vec![
        Span::styled(
            format!(" {} {} ", symbol, endpoint),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" ⏱  {} ", updated),
            Style::default().fg(Color::Rgb(100, 149, 237)),
        ),
        Span::styled(
            format!(
                " ok {} | failed {} | skipped {} | dropped {} ",
                stats.polls_ok, stats.polls_failed, stats.ticks_skipped, stats.records_dropped
            ),
            Style::default().fg(MUTED),
        ),
        Span::styled(" [Q] Quit ", Style::default().fg(Color::Rgb(128, 128, 128))),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Rgb(138, 43, 226)))
        .style(Style::default().bg(Color::Rgb(18, 18, 28)));

    let paragraph = Paragraph::new(status_line)
        .block(block)
        .alignment(Alignment::Center);

    f.render_widget(paragraph, area);
}

fn render_banner(f: &mut Frame, area: Rect, banner: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BID))
        .style(Style::default().bg(BACKGROUND));

    let paragraph = Paragraph::new(Line::from(Span::styled(
        format!(" ⚠ {} ", banner),
        Style::default().fg(BID).add_modifier(Modifier::BOLD),
    )))
    .block(block)
    .wrap(Wrap { trim: true });

    f.render_widget(paragraph, area);
}

fn render_table(f: &mut Frame, area: Rect, rows: &[DisplayRow]) {
    let title = Line::from(vec![
        Span::styled(
            " 📡 ",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "LIVE MARKET DATA ",
            Style::default()
                .fg(Color::Rgb(255, 255, 255))
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT))
        .title_top(title.alignment(Alignment::Center))
        .style(Style::default().bg(BACKGROUND));

    let header = Row::new(COLUMNS.iter().map(|column| {
        Cell::from(*column).style(Style::default().fg(GOLD).add_modifier(Modifier::BOLD))
    }))
    .height(1);

    let body = rows.iter().map(|row| {
        let colors = [ACCENT, Color::Rgb(200, 200, 220), MUTED, BID, ASK];
        let cells = row
            .cells()
            .into_iter()
            .zip(colors)
            .enumerate()
            .map(|(column, (content, color))| {
                if content == PLACEHOLDER {
                    Cell::from(PLACEHOLDER).style(Style::default().fg(MUTED))
                } else if column == 0 {
                    Cell::from(content.to_uppercase())
                        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                } else {
                    Cell::from(content.to_string()).style(Style::default().fg(color))
                }
            });
        Row::new(cells).height(1)
    });

    let table = Table::new(
        body,
        [
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(25),
            Constraint::Length(16),
            Constraint::Length(16),
        ],
    )
    .header(header)
    .block(block);

    f.render_widget(table, area);
}

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use bg1_core::watchdog::{SyncWatchdog, TimeRow};

use crate::app::App;
use crate::ui::styles;

/// Label column width; fits "Next queue opening:"
const LABEL_WIDTH: usize = 20;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(board) = app.boards.get(&app.config.location) else {
        let block = Block::default()
            .title(" Clock ")
            .title_style(styles::title_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(true));
        frame.render_widget(
            Paragraph::new(Span::styled(" Clock not running", styles::muted_style())).block(block),
            area,
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    render_board(frame, board, chunks[0], true);

    let status = board.status();
    let note = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(" Park date: {}", status.date),
            styles::muted_style(),
        )),
        Line::from(Span::styled(
            " The clock is marked (unsynced) when it stops ticking.",
            styles::muted_style(),
        )),
    ];
    frame.render_widget(Paragraph::new(note), chunks[1]);
}

/// Render a location's time board rows inside a bordered block
pub fn render_board(frame: &mut Frame, board: &SyncWatchdog, area: Rect, focused: bool) {
    let lines: Vec<Line> = board.rows().iter().map(row_line).collect();

    let block = Block::default()
        .title(format!(" {} ", board.location()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn row_line(row: &TimeRow) -> Line<'static> {
    let mut spans = vec![
        Span::styled(format!(" {:<width$}", row.label, width = LABEL_WIDTH), styles::highlight_style()),
        Span::styled(row.value.clone(), styles::list_item_style()),
    ];
    if let Some(flag) = row.flag {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(flag, styles::unsynced_style()));
    }
    Line::from(spans)
}

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use bg1_core::models::QueueSortColumn;
use bg1_core::utils::truncate_string;

use crate::app::App;
use crate::ui::styles;
use crate::ui::tabs::clock;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_queue_list(frame, app, chunks[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(4)])
        .split(chunks[1]);

    render_queue_detail(frame, app, right[0]);
    if let Some(board) = app.boards.get(&app.config.location) {
        clock::render_board(frame, board, right[1], false);
    }
}

fn render_queue_list(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new([Cell::from("Queue"), Cell::from("Status"), Cell::from("Opens")])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = app
        .queues
        .iter()
        .enumerate()
        .map(|(i, queue)| {
            let style = if i == app.queue_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let status = queue.status_display();
            Row::new(vec![
                Cell::from(truncate_string(&queue.name, 40)),
                Cell::from(Span::styled(status, styles::queue_status_style(status))),
                Cell::from(queue.opening_display().to_string()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(16),
        Constraint::Length(10),
    ];

    let sort_label = match app.queue_sort {
        QueueSortColumn::Opening => "opening",
        QueueSortColumn::Name => "name",
    };
    let title = format!(
        " {} queues ({}) - [s]ort: {} ",
        app.config.location,
        app.queues.len(),
        sort_label
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !app.queues.is_empty() {
        state.select(Some(app.queue_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_queue_detail(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match app.selected_queue() {
        Some(queue) => {
            let yes_no = |b: bool| if b { "yes" } else { "no" };
            vec![
                Line::from(Span::styled(queue.name.clone(), styles::title_style())),
                Line::from(""),
                Line::from(vec![
                    Span::styled("Status:          ", styles::muted_style()),
                    Span::styled(
                        queue.status_display(),
                        styles::queue_status_style(queue.status_display()),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Next opening:    ", styles::muted_style()),
                    Span::raw(queue.opening_display().to_string()),
                ]),
                Line::from(vec![
                    Span::styled("Accepting joins: ", styles::muted_style()),
                    Span::raw(yes_no(queue.is_accepting_joins)),
                ]),
                Line::from(vec![
                    Span::styled("Party creation:  ", styles::muted_style()),
                    Span::raw(yes_no(queue.is_accepting_party_creation)),
                ]),
                Line::from(vec![
                    Span::styled("Max party size:  ", styles::muted_style()),
                    Span::raw(
                        queue
                            .max_party_size
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Queue id:        ", styles::muted_style()),
                    Span::raw(queue.id.clone()),
                ]),
            ]
        }
        None => vec![Line::from(Span::styled(
            "No queues loaded - press [r] to refresh",
            styles::muted_style(),
        ))],
    };

    let block = Block::default()
        .title(" Details ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

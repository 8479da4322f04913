use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use bg1_core::gate::NEWS_VERSION;

use crate::app::{App, AppState, LoginFocus, Screen, Tab};

use super::styles;
use super::tabs::{clock, queues};

const LOGO: [&str; 3] = [
    "          ╔╗ ╔═╗ ╦",
    "          ╠╩╗║ ╦ ║",
    "          ╚═╝╚═╝ ╩",
];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Screen body
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);

    match app.current_screen() {
        Screen::Disclaimer => render_disclaimer(frame),
        Screen::News => render_news(frame),
        Screen::Loading => render_loading(frame, chunks[1]),
        // The login dialog stands in for the main screen; nothing behind it
        Screen::Login => render_login(frame, app),
        Screen::Main => {
            render_main(frame, app, chunks[1]);
            render_status_bar(frame, app, chunks[2]);

            if matches!(app.state, AppState::ShowingHelp) {
                render_help_overlay(frame);
            }
            if matches!(app.state, AppState::ConfirmingQuit) {
                render_quit_overlay(frame);
            }
        }
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.demo { "  BG1 (demo)" } else { "  BG1" };
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + help_hint.len() as u16 + 4)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_main(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(area);

    let mut spans = vec![Span::raw(" ")];
    for (i, (key, tab)) in [("1", Tab::Queues), ("2", Tab::Clock)].iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", key, tab.title());
        spans.push(Span::styled(label, styles::tab_style(app.current_tab == *tab)));
    }
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[0]);

    match app.current_tab {
        Tab::Queues => queues::render(frame, app, chunks[1]),
        Tab::Clock => clock::render(frame, app, chunks[1]),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = match (&app.status_message, app.last_refresh) {
        (Some(msg), _) => format!(" {} ", msg),
        (None, Some(at)) => format!(" Updated {} ", at.format("%H:%M:%S")),
        (None, None) => " Not refreshed yet ".to_string(),
    };

    let mut center = String::new();
    if let Some(expiry) = app.expiry_display() {
        center = format!("Token expires: {}", expiry);
    }
    let right_text = " [r]efresh | [L]ogout | [q]uit ";

    let width = area.width as usize;
    let center_start = width.saturating_sub(center.len()) / 2;
    let left_pad = center_start.saturating_sub(left_text.len());
    let right_pad = width
        .saturating_sub(center_start + center.len())
        .saturating_sub(right_text.len());

    let mut spans = vec![Span::styled(left_text, styles::muted_style())];
    if app.any_unsynced() {
        spans.push(Span::styled("(unsynced) ", styles::unsynced_style()));
    }
    spans.push(Span::raw(" ".repeat(left_pad)));
    spans.push(Span::styled(center, styles::muted_style()));
    spans.push(Span::raw(" ".repeat(right_pad)));
    spans.push(Span::styled(right_text, styles::muted_style()));

    let paragraph = Paragraph::new(Line::from(spans)).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn logo_lines() -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|l| Line::from(Span::styled(*l, styles::title_style())))
        .collect()
}

fn dialog_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default())
}

fn render_loading(frame: &mut Frame, area: Rect) {
    let paragraph = Paragraph::new(Span::styled(" Checking stored credential...", styles::muted_style()));
    frame.render_widget(paragraph, area);
}

fn render_disclaimer(frame: &mut Frame) {
    let area = centered_rect_fixed(60, 14, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(" Warning!", styles::error_style())),
        Line::from(""),
        Line::from(" BG1 is an unofficial tool. It is not affiliated with,"),
        Line::from(" endorsed by or supported by Disney."),
        Line::from(""),
        Line::from(" It talks to the same virtual-queue service the official"),
        Line::from(" app uses, with your own account credential. Use it at"),
        Line::from(" your own risk."),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" to accept, ", styles::muted_style()),
            Span::styled("[q]", styles::help_key_style()),
            Span::styled(" to quit", styles::muted_style()),
        ]),
    ];

    let paragraph = Paragraph::new(lines)
        .block(dialog_block())
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_news(frame: &mut Frame) {
    let area = centered_rect_fixed(60, 13, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(" BG1 News", styles::title_style())),
        Line::from(Span::styled(format!(" Issue {}", NEWS_VERSION), styles::muted_style())),
        Line::from(""),
        Line::from(" - Queue list for Walt Disney World and Disneyland"),
        Line::from(" - Park clock with a sync check: when the clock stops"),
        Line::from("   ticking it is flagged (unsynced)"),
        Line::from(" - Sessions now survive restarts"),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(dialog_block()), area);
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(48, 19, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");
    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", k), styles::help_key_style()),
            Span::styled(desc, styles::help_desc_style()),
        ])
    };

    let mut lines = logo_lines();
    lines.extend([
        Line::from(Span::styled(
            format!("            version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        key("1-2", "Switch tabs"),
        key("←/→", "Prev/next tab"),
        key("↑/↓", "Navigate queue list"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        key("r", "Refresh queues"),
        key("s", "Toggle sort (opening/name)"),
        key("L", "Log out"),
        key("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("     Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ]);

    frame.render_widget(Paragraph::new(lines).block(dialog_block()), area);
}

fn render_login(frame: &mut Frame, app: &App) {
    let form = &app.login;
    let height = if form.error.is_some() { 15 } else { 13 };
    let area = centered_rect_fixed(52, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(""));

    let field = |label: &'static str, value: String, focus: LoginFocus| {
        let focused = form.focus == focus;
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let cursor = if focused { "▌" } else { "" };
        Line::from(vec![
            Span::styled(format!("  {:<10}[", label), styles::muted_style()),
            Span::styled(format!("{:<24}{}", value, cursor), style),
            Span::styled("]", styles::muted_style()),
        ])
    };

    // Show the tail of long values so typing stays visible
    let tail = |s: &str| -> String {
        let count = s.chars().count();
        s.chars().skip(count.saturating_sub(24)).collect()
    };

    lines.push(field("SWID:", tail(&form.swid), LoginFocus::Swid));
    lines.push(field("Token:", "*".repeat(form.token.chars().count().min(24)), LoginFocus::Token));
    lines.push(field("Minutes:", form.lifetime.clone(), LoginFocus::Lifetime));

    let button_focused = form.focus == LoginFocus::Button;
    let (label, style) = if button_focused {
        (" ▶ Log In ◀ ", styles::selected_style())
    } else {
        ("   Log In   ", styles::list_item_style())
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("                 ["),
        Span::styled(label, style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    frame.render_widget(Paragraph::new(lines).block(dialog_block()), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 9, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]);

    frame.render_widget(Paragraph::new(lines).block(dialog_block()), area);
}

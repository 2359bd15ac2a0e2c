use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

use super::status::{Phase, StatusApp};

// Brandbook colors
const BRAND_DARK: Color = Color::Rgb(0x1F, 0x2F, 0x3C); // #1f2f3c
const BRAND_SELECT_BG: Color = Color::Rgb(0xC3, 0xD3, 0xE0); // #c3d3e0
const BRAND_GREEN: Color = Color::Rgb(0x82, 0x9A, 0x68); // #829a68 - done
const BRAND_ORANGE: Color = Color::Rgb(0x9E, 0x68, 0x3C); // #9e683c - prompts
const BRAND_RED: Color = Color::Rgb(0xA6, 0x4B, 0x4B); // #a64b4b - errors
const BRAND_MUTED: Color = Color::Rgb(0x71, 0x65, 0x65); // #716565 - footer

const HEADER_STYLE: Style = Style::new().fg(BRAND_DARK).add_modifier(Modifier::BOLD);
const PROMPT_STYLE: Style = Style::new().fg(BRAND_ORANGE).add_modifier(Modifier::BOLD);
const INPUT_STYLE: Style = Style::new().bg(BRAND_SELECT_BG).fg(BRAND_DARK);

const WINDOW_WIDTH: u16 = 72;
const WINDOW_HEIGHT: u16 = 13;

pub fn draw_status(frame: &mut Frame, app: &StatusApp) {
    let area = centered(frame.area(), WINDOW_WIDTH, WINDOW_HEIGHT);
    frame.render_widget(Clear, area);

    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Length(3), // Gauge
        Constraint::Min(4),    // Status / prompt
        Constraint::Length(3), // Footer
    ])
    .split(area);

    let header = Paragraph::new(format!(
        " Export | {} | {} elements ",
        app.title, app.element_count
    ))
    .style(HEADER_STYLE)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    draw_gauge(frame, chunks[1], app);
    draw_body(frame, chunks[2], app);
    draw_footer(frame, chunks[3], footer_help(&app.phase));
}

fn draw_gauge(frame: &mut Frame, area: Rect, app: &StatusApp) {
    let color = match app.phase {
        Phase::Completed | Phase::SavePrompt { .. } | Phase::SaveFailed { .. } => BRAND_GREEN,
        Phase::Failed(_) => BRAND_RED,
        _ => BRAND_DARK,
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(color).bg(BRAND_SELECT_BG))
        .percent(u16::from(app.percent.min(100)));
    frame.render_widget(gauge, area);
}

fn draw_body(frame: &mut Frame, area: Rect, app: &StatusApp) {
    let lines = match &app.phase {
        Phase::Confirm => vec![Line::from(Span::styled(
            "Do you want to export all the elements in this model?",
            PROMPT_STYLE,
        ))],
        Phase::ConfirmCancel => vec![
            Line::from(app.message.as_str()),
            Line::from(Span::styled(
                "Are you sure that you want to cancel the export?",
                PROMPT_STYLE,
            )),
        ],
        Phase::SavePrompt { input } => vec![
            Line::from(app.message.as_str()),
            Line::from(vec![
                Span::styled("Save copy as: ", PROMPT_STYLE),
                Span::styled(format!("{input}_"), INPUT_STYLE),
            ]),
        ],
        Phase::SaveFailed { destination, error } => vec![
            Line::from(Span::styled(
                format!("Could not save {}", destination.display()),
                Style::default().fg(BRAND_RED),
            )),
            Line::from(error.as_str()),
        ],
        Phase::Failed(error) => vec![
            Line::from(Span::styled("Export failed", Style::default().fg(BRAND_RED))),
            Line::from(error.as_str()),
        ],
        Phase::Running | Phase::Cancelling | Phase::Cancelled | Phase::Completed => {
            vec![Line::from(app.message.as_str())]
        }
    };

    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(body, area);
}

fn draw_footer(frame: &mut Frame, area: Rect, help: &str) {
    let footer = Paragraph::new(help)
        .style(Style::default().fg(BRAND_MUTED))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}

fn footer_help(phase: &Phase) -> &'static str {
    match phase {
        Phase::Confirm => " y/Enter Yes | n/Esc Cancel ",
        Phase::Running => " c/Esc Cancel export ",
        Phase::ConfirmCancel => " y Yes | n/Esc No ",
        Phase::Cancelling => " Waiting for the export to stop ",
        Phase::Cancelled => " any key Close ",
        Phase::Completed => " s Save copy | Enter/q Close ",
        Phase::SavePrompt { .. } => " Enter Save | Esc Back ",
        Phase::SaveFailed { .. } => " r/Enter Retry | c/Esc Cancel ",
        Phase::Failed(_) => " any key Close ",
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}

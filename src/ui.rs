pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::App,
    format::{format_time, LapMark},
    tracker::{Mode, Phase, TrackerSnapshot},
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const HELP_TEXT: &str =
    "space start/pause · l lap · r reset · t mode · c set countdown · s sound · f fullscreen · e export · q quit";

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snapshot = self.tracker.current_snapshot();

        if self.fullscreen {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Percentage(45),
                    Constraint::Length(1),
                    Constraint::Min(0),
                ])
                .split(area);
            time_display(&snapshot).render(chunks[1], buf);
        } else {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .horizontal_margin(HORIZONTAL_MARGIN)
                .vertical_margin(VERTICAL_MARGIN)
                .constraints([
                    Constraint::Length(3), // mode tabs
                    Constraint::Length(1), // padding
                    Constraint::Length(1), // time
                    Constraint::Length(1), // status
                    Constraint::Length(1), // padding
                    Constraint::Min(3),    // laps
                    Constraint::Length(2), // help
                ])
                .split(area);

            mode_tabs(snapshot.mode).render(chunks[0], buf);
            time_display(&snapshot).render(chunks[2], buf);
            status_line(&snapshot).render(chunks[3], buf);
            lap_table(&snapshot).render(chunks[5], buf);

            Paragraph::new(Span::styled(
                HELP_TEXT,
                Style::default().add_modifier(Modifier::DIM),
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[6], buf);
        }

        render_toasts(self, area, buf);
    }
}

fn mode_tabs(mode: Mode) -> Tabs<'static> {
    let selected: usize = match mode {
        Mode::Stopwatch => 0,
        Mode::Countdown => 1,
    };
    Tabs::new(vec!["Stopwatch", "Countdown"])
        .select(selected)
        .block(Block::default().borders(Borders::ALL).title("laptick"))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
}

fn time_display(snapshot: &TrackerSnapshot) -> Paragraph<'static> {
    let color = match snapshot.phase {
        Phase::Running => Color::Green,
        Phase::Paused => Color::Yellow,
        Phase::Idle => Color::White,
    };
    let bold = Style::default().fg(color).add_modifier(Modifier::BOLD);

    Paragraph::new(Line::from(vec![
        Span::styled(snapshot.time.hms(), bold),
        Span::styled(
            format!(".{:03}", snapshot.time.millis),
            Style::default().fg(color).add_modifier(Modifier::DIM),
        ),
    ]))
    .alignment(Alignment::Center)
}

fn status_line(snapshot: &TrackerSnapshot) -> Paragraph<'static> {
    let mut parts = vec![snapshot.phase.to_string()];
    if snapshot.mode == Mode::Countdown {
        parts.push(if snapshot.countdown_target_ms > 0 {
            format!("target {}", format_time(snapshot.countdown_target_ms))
        } else {
            "press c to set a duration".to_string()
        });
    }
    parts.push(if snapshot.sound_enabled {
        "sound on".to_string()
    } else {
        "muted".to_string()
    });

    Paragraph::new(Span::styled(
        parts.join(" · "),
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
}

fn lap_table(snapshot: &TrackerSnapshot) -> Table<'static> {
    let header = Row::new(vec!["#", "Lap", "Total", "Time"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    // newest first so the latest split stays visible
    let rows = snapshot.laps.iter().rev().map(|view| {
        let style = match view.mark {
            Some(LapMark::Best) => Style::default().fg(Color::Green),
            Some(LapMark::Worst) => Style::default().fg(Color::Red),
            None => Style::default(),
        };
        Row::new(vec![
            Cell::from(view.lap.index.to_string()),
            Cell::from(format_time(view.lap.split_ms)),
            Cell::from(format_time(view.lap.cumulative_ms)),
            Cell::from(view.lap.recorded_at.clone()),
        ])
        .style(style)
    });

    Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Min(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Laps ({})", snapshot.laps.len())),
    )
}

fn render_toasts(app: &App, area: Rect, buf: &mut Buffer) {
    for (row, toast) in app.toasts.visible().enumerate() {
        let width = (toast.message.width() as u16 + 4).min(area.width);
        let y = area.y + row as u16;
        if y >= area.bottom() {
            break;
        }
        let rect = Rect::new(area.right().saturating_sub(width), y, width, 1);
        Clear.render(rect, buf);
        Paragraph::new(Span::styled(
            format!(" {} ", toast.message),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ))
        .alignment(Alignment::Right)
        .render(rect, buf);
    }
}

/// Centered rectangle of the given size inside `area`
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [rect] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    rect
}

pub fn render_prompt(title: &str, body: Vec<Line<'static>>, f: &mut Frame) {
    let rect = centered(f.area(), 44, body.len() as u16 + 2);
    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(body)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title.to_string())
                    .border_style(Style::default().fg(Color::Yellow)),
            ),
        rect,
    );
}

/// Draw the whole frame for the current app state
pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(&app.overlay).render(app, f);
}

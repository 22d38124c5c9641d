pub mod charting;
pub mod results_view;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::question::Difficulty;
use crate::util::decode_entities;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

fn bold_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_style() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn italic_style() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn selected_style() -> Style {
    bold_style().fg(Color::Cyan)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen(self.state()).render(self, area, buf);
    }
}

pub(crate) fn render_start(app: &App, area: Rect, buf: &mut Buffer) {
    let mut lines = vec![
        Line::from(Span::styled("Quiz Master", bold_style().fg(Color::Magenta))),
        Line::from(Span::styled("Choose your difficulty", italic_style())),
        Line::default(),
    ];

    for (i, difficulty) in Difficulty::ALL.iter().enumerate() {
        let focused = i == app.round.start_cursor;
        let marker = if focused { "❯ " } else { "  " };
        let style = if focused { selected_style() } else { bold_style() };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker}{}. {}", i + 1, difficulty.label()), style),
            Span::styled(format!("  {}", difficulty.description()), dim_style()),
        ]));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!("High score: {}", app.high_score),
        Style::default().fg(Color::Yellow),
    )));

    let body_height = lines.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(area.height.saturating_sub(body_height + 2) / 2),
            Constraint::Length(body_height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        "(↑/↓) move / (enter) start / (1-3) pick / (esc)ape",
        italic_style(),
    ))
    .render(chunks[3], buf);
}

pub(crate) fn render_loading(app: &App, area: Rect, buf: &mut Buffer) {
    let label = app.round.difficulty.map_or("", |d| d.label());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Span::styled(
        format!("Loading {label} questions…"),
        bold_style().fg(Color::Yellow),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);
}

pub(crate) fn render_quiz(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(session) = app.session() else {
        return;
    };
    let state = session.state();
    let Some(question) = state.current_question() else {
        return;
    };

    let text = decode_entities(&question.text);
    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let question_lines = ((text.width() as f64 / max_chars_per_line as f64).ceil() as u16).max(1);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),              // header
            Constraint::Length(1),              // progress
            Constraint::Length(1),              // padding
            Constraint::Length(question_lines), // question
            Constraint::Length(1),              // padding
            Constraint::Min(1),                 // options
            Constraint::Length(1),              // legend
        ])
        .split(area);

    let header = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(8)])
        .split(chunks[0]);

    let mut info = vec![Span::styled(
        format!("Question {}/{}", state.current_index + 1, state.total()),
        bold_style(),
    )];
    if let Some(difficulty) = app.round.difficulty {
        info.push(Span::styled(format!("  ·  {}", difficulty.label()), dim_style()));
    }
    if let Some(origin) = app.round.origin {
        info.push(Span::styled(format!("  ·  {origin}"), dim_style()));
    }
    info.push(Span::styled(format!("  ·  score {}", state.score), dim_style()));
    Paragraph::new(Line::from(info)).render(header[0], buf);

    if let Some(secs) = app.seconds_remaining() {
        let color = match secs {
            0..=5 => Color::Red,
            6..=10 => Color::Yellow,
            _ => Color::Green,
        };
        Paragraph::new(Span::styled(format!("{secs}s"), bold_style().fg(color)))
            .alignment(Alignment::Right)
            .render(header[1], buf);
    }

    Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio((state.progress() / 100.0).clamp(0.0, 1.0))
        .label(Span::styled(
            format!("{}%", state.progress().round() as u32),
            bold_style(),
        ))
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(text, bold_style()))
        .alignment(if question_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(chunks[3], buf);

    let options = question
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let chosen = state.selected == Some(i);
            let marker = if chosen { "❯ " } else { "  " };
            let style = if chosen {
                selected_style()
            } else {
                Style::default()
            };
            Line::from(Span::styled(
                format!("{marker}{}. {}", i + 1, decode_entities(option)),
                style,
            ))
        })
        .collect::<Vec<_>>();
    Paragraph::new(options)
        .wrap(Wrap { trim: false })
        .render(chunks[5], buf);

    let next_label = if state.current_index + 1 == state.total() {
        "finish"
    } else {
        "next"
    };
    let count = question.options.len();
    let legend = if state.can_retreat() {
        format!("(1-{count}) choose / (enter) {next_label} / (←) back / (esc)ape")
    } else {
        format!("(1-{count}) choose / (enter) {next_label} / (esc)ape")
    };
    Paragraph::new(Span::styled(legend, italic_style())).render(chunks[6], buf);
}

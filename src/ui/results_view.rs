use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Widget},
};

use crate::app::App;
use crate::results::{QuestionReview, ResultSummary, Tier};
use crate::ui::charting::{compute_chart_params, format_label, history_points};
use crate::util::{decode_entities, mean, std_dev, truncate_to_width};

const QUESTION_COLUMN_WIDTH: usize = 40;
const ANSWER_COLUMN_WIDTH: usize = 18;

fn tier_color(tier: Tier) -> Color {
    match tier {
        Tier::Excellent => Color::Green,
        Tier::Good => Color::Cyan,
        Tier::Okay => Color::Yellow,
        Tier::NeedsImprovement => Color::Red,
    }
}

/// Pure presenter for a single breakdown row
pub fn present_row(review: &QuestionReview) -> Row<'static> {
    let style = if review.correct {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red)
    };
    let mark = if review.correct { "✓" } else { "✗" };

    let chosen = match &review.chosen {
        Some(answer) => truncate_to_width(&decode_entities(answer), ANSWER_COLUMN_WIDTH),
        None => "(no answer)".to_string(),
    };
    let correct = review
        .correct_answer
        .as_deref()
        .map(|a| truncate_to_width(&decode_entities(a), ANSWER_COLUMN_WIDTH))
        .unwrap_or_default();

    Row::new(vec![
        Cell::from(format!("{mark} {}", review.number)),
        Cell::from(truncate_to_width(
            &decode_entities(&review.text),
            QUESTION_COLUMN_WIDTH,
        )),
        Cell::from(chosen),
        Cell::from(correct),
    ])
    .style(style)
}

fn summary_lines(summary: &ResultSummary, high_score: u32) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    vec![
        Line::from(Span::styled("Quiz complete", bold.fg(Color::Magenta))),
        Line::from(Span::styled(
            format!(
                "Score: {}/{}   {}%",
                summary.score, summary.total, summary.percentage
            ),
            bold,
        )),
        Line::from(Span::styled(
            summary.tier.message(),
            bold.fg(tier_color(summary.tier)),
        )),
        Line::from(Span::styled(
            format!("High score: {high_score}"),
            Style::default().fg(Color::Yellow),
        )),
    ]
}

pub fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(summary) = app.round.summary.as_ref() else {
        return;
    };

    let chart_height = if app.history.len() >= 2 { 10 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(2)
        .vertical_margin(1)
        .constraints([
            Constraint::Length(4),            // summary
            Constraint::Length(1),            // padding
            Constraint::Min(3),               // breakdown
            Constraint::Length(chart_height), // history
            Constraint::Length(1),            // legend
        ])
        .split(area);

    Paragraph::new(summary_lines(summary, app.high_score))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let header = Row::new(vec!["#", "Question", "Your answer", "Correct answer"]).style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::UNDERLINED),
    );
    let rows = summary
        .reviews
        .iter()
        .skip(app.round.results_scroll)
        .map(present_row)
        .collect::<Vec<_>>();
    let widths = [
        Constraint::Length(5),
        Constraint::Percentage(46),
        Constraint::Percentage(25),
        Constraint::Percentage(25),
    ];
    Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Breakdown ({} correct) ", summary.correct_count())),
        )
        .render(chunks[2], buf);

    if chart_height > 0 {
        render_history(app, chunks[3], buf);
    }

    Paragraph::new(Span::styled(
        "(r)estart / (↑/↓) scroll / (q)uit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[4], buf);
}

fn render_history(app: &App, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let points = history_points(&app.history);
    let (sessions, highest) = compute_chart_params(&points);

    let percentages = points.iter().map(|p| p.1).collect_vec();
    let title = match (mean(&percentages), std_dev(&percentages)) {
        (Some(avg), Some(sd)) => format!(
            " Last {} sessions: avg {avg:.0}%  sd {sd:.1} ",
            percentages.len()
        ),
        _ => " History ".to_string(),
    };

    let datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&points)];

    Chart::new(datasets)
        .block(Block::default().borders(Borders::TOP).title(title))
        .x_axis(
            Axis::default()
                .title("session")
                .bounds([1.0, sessions])
                .labels(vec![
                    Span::styled("1", bold),
                    Span::styled(format_label(sessions), bold),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("%")
                .bounds([0.0, highest])
                .labels(vec![
                    Span::styled("0", bold),
                    Span::styled(format_label(highest), bold),
                ]),
        )
        .render(area, buf);
}

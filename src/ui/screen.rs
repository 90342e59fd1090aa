use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph, Wrap},
    Frame,
};

use super::charting::{compute_chart_params, format_label, series, trend_series};
use super::{
    bold_style, dim_bold_style, italic_style, live_text, prompt_line, status_line, ModeKind,
    UiState, HORIZONTAL_MARGIN, VERTICAL_MARGIN,
};
use crate::chat::{format_reply, Sender, SUGGESTED_QUESTIONS};
use crate::controller::{NO_DATA, PREDICTION_UNAVAILABLE};
use crate::progress::{SpeedForecast, FORECAST_ERROR, NEED_MORE_TESTS};
use crate::util::{format_clock, round_display};
use crate::view::ViewModel;
use unicode_width::UnicodeWidthStr;

/// A UI Screen boundary: responsible for rendering one mode
pub trait Screen {
    fn render(&self, state: &UiState, f: &mut Frame);
}

pub struct TestScreen;

impl Screen for TestScreen {
    fn render(&self, state: &UiState, f: &mut Frame) {
        let view = &state.view;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),  // status
                Constraint::Length(1),  // live stats
                Constraint::Length(1),  // prediction
                Constraint::Min(3),     // prompt
                Constraint::Length(14), // results
                Constraint::Length(1),  // legend
            ])
            .split(f.area());

        f.render_widget(Paragraph::new(status_line(view)), chunks[0]);
        if let Some(live) = live_text(view) {
            f.render_widget(
                Paragraph::new(Span::styled(live, dim_bold_style())).alignment(Alignment::Center),
                chunks[1],
            );
        }
        if let Some(prediction) = prediction_text(view) {
            f.render_widget(
                Paragraph::new(Span::styled(prediction, Style::default().fg(Color::Cyan)))
                    .alignment(Alignment::Center),
                chunks[2],
            );
        }
        f.render_widget(
            Paragraph::new(prompt_line(&view.reference_text, &state.input))
                .wrap(Wrap { trim: false }),
            chunks[3],
        );
        f.render_widget(
            Paragraph::new(result_lines(view)).wrap(Wrap { trim: true }),
            chunks[4],
        );
        f.render_widget(
            Paragraph::new(Span::styled(
                "(enter) finish / (ctrl+r) new text / (esc)ape",
                italic_style(),
            )),
            chunks[5],
        );
    }
}

fn prediction_text(view: &ViewModel) -> Option<String> {
    match view.prediction.as_ref()? {
        Some(p) => Some(format!(
            "predicted {} wpm (now {})",
            round_display(p.predicted_wpm),
            round_display(p.current_wpm)
        )),
        None => Some(PREDICTION_UNAVAILABLE.to_string()),
    }
}

/// Word errors listed under the analysis
const WORD_ERRORS_SHOWN: usize = 5;

pub const NO_SUGGESTIONS: &str = "No specific suggestions available. Keep practicing!";

fn result_lines(view: &ViewModel) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(result) = &view.finished {
        lines.push(Line::from(Span::styled(
            format!(
                "{} wpm   {}% acc   {} errors   {:.1}s",
                round_display(result.wpm),
                round_display(result.accuracy_pct),
                result.error_count,
                result.elapsed_seconds
            ),
            bold_style(),
        )));
    }
    let Some(analysis) = &view.analysis else {
        return lines;
    };
    lines.push(Line::from(format!(
        "analysis: {} wpm   {}% acc",
        round_display(analysis.wpm),
        round_display(analysis.accuracy)
    )));
    if let Some(errors) = &analysis.error_analysis {
        for e in errors.word_errors.iter().take(WORD_ERRORS_SHOWN) {
            lines.push(Line::from(Span::styled(
                format!("Typed \"{}\" instead of \"{}\"", e.typed, e.original),
                Style::default().fg(Color::Red),
            )));
        }
        if !errors.common_errors.is_empty() {
            let common = errors
                .common_errors
                .iter()
                .map(|(pattern, count)| format!("{pattern} ({count})"))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(Line::from(format!("common errors: {common}")));
        }
    }
    match &analysis.prediction {
        Some(prediction) if prediction.is_success() => {
            lines.push(Line::from(format!(
                "next test: {} wpm (average {})",
                round_display(prediction.predicted),
                round_display(prediction.current_avg)
            )));
            if let Some(improvement) = prediction.improvement {
                lines.push(Line::from(format!(
                    "Potential improvement: {}%",
                    round_display(improvement)
                )));
            }
        }
        Some(prediction) => {
            if let Some(message) = &prediction.message {
                lines.push(Line::from(message.clone()));
            }
        }
        None => {}
    }
    if analysis.suggestions.is_empty() {
        lines.push(Line::from(Span::styled(NO_SUGGESTIONS, italic_style())));
    }
    for suggestion in &analysis.suggestions {
        lines.push(Line::from(Span::styled(
            format!("• {suggestion}"),
            italic_style(),
        )));
    }
    lines
}

pub struct LessonScreen;

impl Screen for LessonScreen {
    fn render(&self, state: &UiState, f: &mut Frame) {
        let view = &state.view;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // status
                Constraint::Length(2), // title + description
                Constraint::Length(1), // progress
                Constraint::Min(3),    // prompt
                Constraint::Length(2), // result
                Constraint::Length(1), // legend
            ])
            .split(f.area());

        f.render_widget(Paragraph::new(status_line(view)), chunks[0]);
        if let Some(lesson) = &view.lesson {
            f.render_widget(
                Paragraph::new(vec![
                    Line::from(Span::styled(lesson.title.clone(), bold_style())),
                    Line::from(Span::styled(lesson.description.clone(), italic_style())),
                ]),
                chunks[1],
            );
        }
        f.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(Color::Green))
                .ratio((view.progress_pct / 100.0).clamp(0.0, 1.0))
                .label(format!("{}%", round_display(view.progress_pct))),
            chunks[2],
        );
        f.render_widget(
            Paragraph::new(prompt_line(&view.reference_text, &state.input))
                .wrap(Wrap { trim: false }),
            chunks[3],
        );
        if let Some(result) = &view.finished {
            f.render_widget(
                Paragraph::new(Span::styled(
                    format!(
                        "Lesson complete! {} wpm   {}% acc",
                        round_display(result.wpm),
                        round_display(result.accuracy_pct)
                    ),
                    bold_style().fg(Color::Green),
                ))
                .alignment(Alignment::Center),
                chunks[4],
            );
        }
        f.render_widget(
            Paragraph::new(Span::styled(
                "(enter) start / (pgup) previous / (pgdn) next / (esc)ape",
                italic_style(),
            )),
            chunks[5],
        );
    }
}

pub struct GameScreen;

impl Screen for GameScreen {
    fn render(&self, state: &UiState, f: &mut Frame) {
        let view = &state.view;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // status
                Constraint::Length(1), // clock + score
                Constraint::Min(1),    // padding
                Constraint::Length(1), // word
                Constraint::Length(1), // input
                Constraint::Min(1),    // padding
                Constraint::Length(2), // game over
                Constraint::Length(1), // legend
            ])
            .split(f.area());

        f.render_widget(Paragraph::new(status_line(view)), chunks[0]);
        let clock = view
            .game_clock
            .map(|secs| format_clock(u64::from(secs)))
            .unwrap_or_else(|| "-:--".to_string());
        f.render_widget(
            Paragraph::new(Span::styled(
                format!("{clock}   score {}", view.game_score),
                dim_bold_style(),
            ))
            .alignment(Alignment::Center),
            chunks[1],
        );
        if let Some(word) = &view.game_word {
            f.render_widget(
                Paragraph::new(prompt_line(word, state.input.trim()))
                    .alignment(Alignment::Center),
                chunks[3],
            );
        }
        f.render_widget(
            Paragraph::new(Span::styled(state.input.clone(), bold_style()))
                .alignment(Alignment::Center),
            chunks[4],
        );
        if let Some(result) = &view.game_over {
            f.render_widget(
                Paragraph::new(vec![
                    Line::from(Span::styled(
                        format!("Game over! score {}", result.score),
                        bold_style().fg(Color::Magenta),
                    )),
                    Line::from(format!(
                        "{} words   {} wpm   {}% acc",
                        result.correct_words,
                        round_display(result.summary.wpm),
                        round_display(result.summary.accuracy_pct)
                    )),
                ])
                .alignment(Alignment::Center),
                chunks[6],
            );
        }
        f.render_widget(
            Paragraph::new(Span::styled("(enter) new round / (esc)ape", italic_style())),
            chunks[7],
        );
    }
}

pub struct ProgressScreen;

impl Screen for ProgressScreen {
    fn render(&self, state: &UiState, f: &mut Frame) {
        let view = &state.view;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // status
                Constraint::Min(6),    // wpm chart
                Constraint::Length(8), // accuracy chart
                Constraint::Length(2), // summary
                Constraint::Length(2), // errors
                Constraint::Length(1), // forecast
                Constraint::Length(1), // legend
            ])
            .split(f.area());

        f.render_widget(Paragraph::new(status_line(view)), chunks[0]);
        if let Some(forecast) = &view.forecast {
            f.render_widget(
                Paragraph::new(Span::styled(
                    forecast_text(forecast),
                    Style::default().fg(Color::Cyan),
                ))
                .alignment(Alignment::Center),
                chunks[5],
            );
        }
        f.render_widget(
            Paragraph::new(Span::styled("(r)efresh / (esc)ape", italic_style())),
            chunks[6],
        );

        let Some(Some(report)) = &view.progress else {
            if matches!(view.progress, Some(None)) && view.status.is_none() {
                f.render_widget(
                    Paragraph::new(NO_DATA).alignment(Alignment::Center),
                    chunks[1],
                );
            }
            return;
        };

        let wpm_points = series(&report.wpm);
        let trend_points = trend_series(&report.trend);
        let (overall_tests, highest_wpm) = compute_chart_params(&wpm_points);
        let datasets = vec![
            Dataset::default()
                .name("wpm")
                .marker(Marker::Braille)
                .style(Style::default().fg(Color::Magenta))
                .graph_type(GraphType::Line)
                .data(&wpm_points),
            Dataset::default()
                .name("trend")
                .marker(Marker::Dot)
                .style(Style::default().fg(Color::Cyan))
                .graph_type(GraphType::Line)
                .data(&trend_points),
        ];
        let chart = Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .bounds([1.0, overall_tests])
                    .labels(edge_labels(&report.labels)),
            )
            .y_axis(
                Axis::default()
                    .title("wpm")
                    .bounds([0.0, highest_wpm])
                    .labels(vec![
                        Span::styled("0", bold_style()),
                        Span::styled(format_label(highest_wpm), bold_style()),
                    ]),
            );
        f.render_widget(chart, chunks[1]);

        if !report.accuracy.is_empty() {
            let accuracy_points = series(&report.accuracy);
            let accuracy_chart = Chart::new(vec![Dataset::default()
                .name("accuracy")
                .marker(Marker::Braille)
                .style(Style::default().fg(Color::Green))
                .graph_type(GraphType::Line)
                .data(&accuracy_points)])
            .x_axis(
                Axis::default()
                    .bounds([1.0, (accuracy_points.len() as f64).max(1.0)])
                    .labels(edge_labels(&report.accuracy_labels)),
            )
            .y_axis(
                Axis::default()
                    .title("acc %")
                    .bounds([0.0, 100.0])
                    .labels(vec![
                        Span::styled("0", bold_style()),
                        Span::styled("100", bold_style()),
                    ]),
            );
            f.render_widget(accuracy_chart, chunks[2]);
        }

        let accuracy = report
            .mean_accuracy
            .map(|a| format!("{}%", round_display(a)))
            .unwrap_or_else(|| "-".to_string());
        let trend = report
            .trend_change()
            .map(|change| format!("   trend {change:+.1} wpm"))
            .unwrap_or_default();
        f.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled(
                    format!(
                        "{} tests   avg {} wpm   best {}   {:.2} sd",
                        report.tests_taken(),
                        round_display(report.mean_wpm),
                        round_display(report.best_wpm),
                        report.wpm_std_dev,
                    ),
                    bold_style(),
                )),
                Line::from(format!(
                    "acc {accuracy}   {} total errors{trend}",
                    report.total_errors
                )),
            ])
            .alignment(Alignment::Center),
            chunks[3],
        );

        let errors = if report.top_errors.is_empty() {
            "no recorded errors".to_string()
        } else {
            let listed = report
                .top_errors
                .iter()
                .map(|(pattern, count)| format!("{pattern} ({count})"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("most common errors: {listed}")
        };
        f.render_widget(
            Paragraph::new(Span::styled(errors, italic_style()))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            chunks[4],
        );
    }
}

/// First and last label for a chart's X axis
fn edge_labels(labels: &[String]) -> Vec<Span<'static>> {
    match (labels.first(), labels.last()) {
        (Some(first), Some(last)) if labels.len() > 1 => vec![
            Span::styled(first.clone(), bold_style()),
            Span::styled(last.clone(), bold_style()),
        ],
        (Some(only), _) => vec![Span::styled(only.clone(), bold_style())],
        _ => Vec::new(),
    }
}

fn forecast_text(forecast: &SpeedForecast) -> String {
    match forecast {
        SpeedForecast::Forecast {
            current_wpm,
            predicted_wpm,
            improvement_pct,
        } => {
            let mut text = format!(
                "Current speed: {} wpm   Predicted: {} wpm",
                round_display(*current_wpm),
                round_display(*predicted_wpm)
            );
            if let Some(pct) = improvement_pct {
                text.push_str(&format!("   Potential improvement: {pct}%"));
            }
            text
        }
        SpeedForecast::NeedMoreTests => NEED_MORE_TESTS.to_string(),
        SpeedForecast::Unavailable => FORECAST_ERROR.to_string(),
    }
}

pub struct ChatScreen;

impl Screen for ChatScreen {
    fn render(&self, state: &UiState, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(SUGGESTED_QUESTIONS.len() as u16 + 2),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(f.area());

        let mut lines: Vec<Line> = Vec::new();
        for msg in &state.view.chat {
            let (who, style) = match msg.sender {
                Sender::User => ("you", bold_style().fg(Color::Cyan)),
                Sender::Bot => ("bot", bold_style().fg(Color::Magenta)),
            };
            lines.push(Line::from(Span::styled(format!("{who}:"), style)));
            if msg.pending {
                lines.push(Line::from(Span::styled(msg.text.clone(), italic_style())));
            } else {
                lines.extend(format_reply(&msg.text).into_iter().map(Line::from));
            }
        }
        // keep the newest messages in view
        let rows: u16 = lines
            .iter()
            .map(|l| wrapped_rows(l, chunks[0].width))
            .sum();
        let overflow = rows.saturating_sub(chunks[0].height);
        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((overflow, 0)),
            chunks[0],
        );

        let suggestions: Vec<Line> = SUGGESTED_QUESTIONS
            .iter()
            .enumerate()
            .map(|(i, q)| {
                if i == state.selected_question {
                    Line::from(Span::styled(
                        format!("> {q}"),
                        Style::default().add_modifier(Modifier::REVERSED),
                    ))
                } else {
                    Line::from(format!("  {q}"))
                }
            })
            .collect();
        f.render_widget(
            Paragraph::new(suggestions).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("suggested questions"),
            ),
            chunks[1],
        );
        f.render_widget(
            Paragraph::new(state.input.clone())
                .block(Block::default().borders(Borders::ALL).title("ask")),
            chunks[2],
        );
        f.render_widget(
            Paragraph::new(Span::styled(
                "(enter) send / (↑/↓) pick suggestion / (tab) ask it / (esc)ape",
                italic_style(),
            )),
            chunks[3],
        );
    }
}

/// Rows a line takes once wrapped to `width` columns
fn wrapped_rows(line: &Line, width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    let cols: usize = line.spans.iter().map(|s| s.content.width()).sum();
    cols.max(1).div_ceil(width as usize) as u16
}

/// Helper to construct the appropriate screen for the current mode
pub fn current_screen(mode: ModeKind) -> Box<dyn Screen> {
    match mode {
        ModeKind::Test => Box::new(TestScreen),
        ModeKind::Lesson => Box::new(LessonScreen),
        ModeKind::Game => Box::new(GameScreen),
        ModeKind::Progress => Box::new(ProgressScreen),
        ModeKind::Chat => Box::new(ChatScreen),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        AccuracyPoint, ErrorAnalysis, ErrorStatistics, PredictResponse, Prediction,
        ProgressResponse, TestAnalysis, WordError, WpmPoint,
    };
    use chrono::NaiveDate;
    use crate::chat::Transcript;
    use crate::game::GameResult;
    use crate::progress::ProgressReport;
    use crate::session::{SessionMode, SessionResult};
    use crate::view::{Presenter, ViewEvent};
    use ratatui::{backend::TestBackend, Terminal};

    fn render(state: &UiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| super::super::draw(state, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_screen_shows_results_and_analysis() {
        let mut state = UiState::new(ModeKind::Test);
        state.view.present(ViewEvent::ReferenceText("hello world".into()));
        state.input.push_str("hello world");
        state
            .view
            .present(ViewEvent::Prediction(Some(PredictResponse {
                predicted_wpm: 30.0,
                current_wpm: 25.0,
            })));
        state.view.present(ViewEvent::SessionFinished(SessionResult::new(
            SessionMode::Test,
            6.0,
            11,
            0,
            100.0,
        )));
        state.view.present(ViewEvent::Analysis(TestAnalysis {
            wpm: 22.0,
            accuracy: 100.0,
            error_analysis: None,
            suggestions: vec!["Focus on rhythm".into()],
            prediction: None,
        }));

        let out = render(&state);
        assert!(out.contains("22 wpm"));
        assert!(out.contains("100% acc"));
        assert!(out.contains("predicted 30 wpm"));
        assert!(out.contains("Focus on rhythm"));
    }

    fn analysis_with(error_analysis: Option<ErrorAnalysis>, suggestions: Vec<String>) -> UiState {
        let mut state = UiState::new(ModeKind::Test);
        state.view.present(ViewEvent::ReferenceText("the cat sat".into()));
        state.view.present(ViewEvent::Analysis(TestAnalysis {
            wpm: 30.0,
            accuracy: 90.0,
            error_analysis,
            suggestions,
            prediction: Some(Prediction {
                status: "success".into(),
                current_avg: 30.0,
                predicted: 33.7,
                improvement: Some(12.4),
                message: None,
            }),
        }));
        state
    }

    #[test]
    fn test_screen_lists_word_errors_and_improvement() {
        let word_errors = ["teh", "cta", "sta", "adn", "fo", "ot"]
            .iter()
            .enumerate()
            .map(|(i, typed)| WordError {
                original: format!("word{i}"),
                typed: typed.to_string(),
                position: i,
            })
            .collect();
        let state = analysis_with(
            Some(ErrorAnalysis {
                accuracy: 90.0,
                error_count: 6,
                word_errors,
                common_errors: Vec::new(),
            }),
            vec!["Slow down".into()],
        );

        let out = render(&state);
        assert!(out.contains("Typed \"teh\" instead of \"word0\""));
        assert!(out.contains("Typed \"fo\" instead of \"word4\""));
        assert!(!out.contains("\"ot\""));
        assert!(out.contains("next test: 34 wpm (average 30)"));
        assert!(out.contains("Potential improvement: 12%"));
        assert!(!out.contains(NO_SUGGESTIONS));
    }

    #[test]
    fn test_screen_without_suggestions_encourages_practice() {
        let state = analysis_with(None, Vec::new());
        let out = render(&state);
        assert!(out.contains(NO_SUGGESTIONS));
        assert!(!out.contains("Typed "));
    }

    #[test]
    fn failed_prediction_is_labelled() {
        let mut state = UiState::new(ModeKind::Test);
        state.view.present(ViewEvent::Prediction(None));
        assert!(render(&state).contains(PREDICTION_UNAVAILABLE));
    }

    #[test]
    fn game_screen_shows_clock_and_summary() {
        let mut state = UiState::new(ModeKind::Game);
        state.view.present(ViewEvent::GameClock(45));
        state.view.present(ViewEvent::GameScore(7));
        state.view.present(ViewEvent::GameWord(Some("keyboard".into())));
        let out = render(&state);
        assert!(out.contains("0:45"));
        assert!(out.contains("score 7"));
        assert!(out.contains("keyboard"));

        let summary = SessionResult::new(SessionMode::Game, 60.0, 5, 1, 90.0);
        state.view.present(ViewEvent::GameOver(GameResult {
            score: 9,
            words_typed: 5,
            correct_words: 5,
            summary,
        }));
        assert!(render(&state).contains("Game over! score 9"));
    }

    #[test]
    fn progress_screen_without_history_says_so() {
        let mut state = UiState::new(ModeKind::Progress);
        state.view.present(ViewEvent::Progress(None));
        assert!(render(&state).contains(NO_DATA));
    }

    #[test]
    fn progress_screen_draws_summary() {
        let resp = ProgressResponse {
            wpm_history: [30.0, 40.0, 50.0]
                .into_iter()
                .map(|wpm| WpmPoint {
                    timestamp: None,
                    wpm,
                })
                .collect(),
            ..Default::default()
        };
        let mut state = UiState::new(ModeKind::Progress);
        state
            .view
            .present(ViewEvent::Progress(ProgressReport::from_response(&resp)));

        let out = render(&state);
        assert!(out.contains("3 tests"));
        assert!(out.contains("avg 40 wpm"));
        assert!(out.contains("best 50"));
    }

    #[test]
    fn progress_screen_shows_dates_errors_and_trend() {
        let day = |d| {
            NaiveDate::from_ymd_opt(2024, 3, d)
                .and_then(|date| date.and_hms_opt(10, 0, 0))
        };
        let resp = ProgressResponse {
            wpm_history: [30.0, 40.0, 50.0, 60.0]
                .into_iter()
                .zip(1..)
                .map(|(wpm, d)| WpmPoint {
                    timestamp: day(d),
                    wpm,
                })
                .collect(),
            accuracy_history: [92.0, 96.0]
                .into_iter()
                .map(|accuracy| AccuracyPoint {
                    timestamp: None,
                    accuracy,
                })
                .collect(),
            error_statistics: ErrorStatistics {
                total_errors: 7,
                ..Default::default()
            },
        };
        let mut state = UiState::new(ModeKind::Progress);
        state
            .view
            .present(ViewEvent::Progress(ProgressReport::from_response(&resp)));

        let out = render(&state);
        assert!(out.contains("2024-03-01"));
        assert!(out.contains("2024-03-04"));
        assert!(out.contains("acc %"));
        assert!(out.contains("acc 94%"));
        assert!(out.contains("7 total errors"));
        assert!(out.contains("trend +10.0 wpm"));
    }

    #[test]
    fn progress_screen_shows_forecast() {
        let mut state = UiState::new(ModeKind::Progress);
        state.view.present(ViewEvent::Forecast(SpeedForecast::Forecast {
            current_wpm: 40.0,
            predicted_wpm: 46.0,
            improvement_pct: Some(15),
        }));
        let out = render(&state);
        assert!(out.contains("Current speed: 40 wpm"));
        assert!(out.contains("Predicted: 46 wpm"));
        assert!(out.contains("Potential improvement: 15%"));

        state.view.present(ViewEvent::Forecast(SpeedForecast::Forecast {
            current_wpm: 40.0,
            predicted_wpm: 38.0,
            improvement_pct: None,
        }));
        assert!(!render(&state).contains("Potential improvement"));

        state.view.present(ViewEvent::Forecast(SpeedForecast::NeedMoreTests));
        assert!(render(&state).contains(NEED_MORE_TESTS));

        state.view.present(ViewEvent::Forecast(SpeedForecast::Unavailable));
        assert!(render(&state).contains(FORECAST_ERROR));
    }

    #[test]
    fn chat_screen_lists_transcript_and_suggestions() {
        let mut transcript = Transcript::new();
        transcript.push_user("What is touch typing?");
        transcript.push_pending();
        let mut state = UiState::new(ModeKind::Chat);
        state
            .view
            .present(ViewEvent::Chat(transcript.messages().to_vec()));

        let out = render(&state);
        assert!(out.contains("typing assistant"));
        assert!(out.contains("Typing..."));
        assert!(out.contains("> How can I improve my typing speed?"));
    }

    #[test]
    fn wrapped_rows_counts_display_width() {
        assert_eq!(wrapped_rows(&Line::from(""), 10), 1);
        assert_eq!(wrapped_rows(&Line::from("abcdefghijk"), 10), 2);
        // full-width characters take two columns each
        assert_eq!(wrapped_rows(&Line::from("タイピング練習"), 10), 2);
        assert_eq!(wrapped_rows(&Line::from("abc"), 0), 0);
    }
}

pub mod charting;
pub mod screen;

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    Frame,
};

use crate::util::round_display;
use crate::view::ViewModel;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Which screen the app is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ModeKind {
    #[default]
    Test,
    Lesson,
    Game,
    Progress,
    Chat,
}

/// Everything the screens draw from
#[derive(Debug, Default)]
pub struct UiState {
    pub mode: ModeKind,
    pub view: ViewModel,
    pub input: String,
    pub selected_question: usize,
}

impl UiState {
    pub fn new(mode: ModeKind) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Apply a pending `ClearInput` from the controllers
    pub fn sync_input(&mut self) {
        if self.view.take_clear_input() {
            self.input.clear();
        }
    }
}

pub fn draw(state: &UiState, f: &mut Frame) {
    screen::current_screen(state.mode).render(state, f);
}

fn bold_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold_style() -> Style {
    bold_style().add_modifier(Modifier::DIM)
}

fn italic_style() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

/// Reference text coloured against what has been typed: green for matching
/// characters, red for wrong ones, the cursor underlined and the rest dim
fn prompt_line(reference: &str, typed: &str) -> Line<'static> {
    let green_bold_style = bold_style().fg(Color::Green);
    let red_bold_style = bold_style().fg(Color::Red);
    let underlined_dim_bold_style = dim_bold_style().add_modifier(Modifier::UNDERLINED);

    let typed: Vec<char> = typed.chars().collect();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = String::new();

    for (idx, expected) in reference.chars().enumerate() {
        match typed.get(idx) {
            Some(&c) if c == expected => {
                spans.push(Span::styled(expected.to_string(), green_bold_style))
            }
            Some(&c) => spans.push(Span::styled(
                match c {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                red_bold_style,
            )),
            None if idx == typed.len() => {
                spans.push(Span::styled(expected.to_string(), underlined_dim_bold_style))
            }
            None => rest.push(expected),
        }
    }
    let overflow: String = typed.iter().skip(reference.chars().count()).collect();
    if !overflow.is_empty() {
        spans.push(Span::styled(overflow, red_bold_style));
    }
    if !rest.is_empty() {
        spans.push(Span::styled(rest, dim_bold_style()));
    }

    Line::from(spans)
}

/// `42 wpm   97% acc   0:12` while a session runs
fn live_text(view: &ViewModel) -> Option<String> {
    let live = view.live?;
    Some(format!(
        "{} wpm   {}% acc   {}",
        round_display(live.wpm),
        round_display(live.accuracy_pct),
        crate::util::format_clock(live.elapsed_seconds as u64)
    ))
}

fn status_line(view: &ViewModel) -> Line<'static> {
    match &view.status {
        Some(status) => Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        )),
        None => Line::default(),
    }
}

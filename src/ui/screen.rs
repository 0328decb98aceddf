use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    Frame,
};

use crate::{app::App, app::Overlay, ui::render_prompt};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Timer screen - renders the main view using the App widget
pub struct TimerScreen;

impl Screen for TimerScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Reset confirmation layered over the timer
pub struct ConfirmResetScreen;

impl Screen for ConfirmResetScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        TimerScreen.render(app, f);
        render_prompt(
            "Reset",
            vec![
                Line::from("All time and laps will be lost."),
                Line::from("Press y to reset, any other key to cancel"),
            ],
            f,
        );
    }
}

/// Countdown duration editor layered over the timer
pub struct CountdownEditorScreen {
    input: String,
}

impl Screen for CountdownEditorScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        TimerScreen.render(app, f);
        let field = if self.input.is_empty() {
            Span::styled("H:M:S", Style::default().add_modifier(Modifier::DIM))
        } else {
            Span::styled(
                self.input.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )
        };
        render_prompt(
            "Countdown",
            vec![
                Line::from(vec![field, Span::raw("_")]),
                Line::from("enter to set · esc to cancel"),
            ],
            f,
        );
    }
}

/// Helper to construct the appropriate screen for the current overlay
pub fn current_screen(overlay: &Overlay) -> Box<dyn Screen> {
    match overlay {
        Overlay::None => Box::new(TimerScreen),
        Overlay::ConfirmReset => Box::new(ConfirmResetScreen),
        Overlay::EditCountdown(input) => Box::new(CountdownEditorScreen {
            input: input.clone(),
        }),
    }
}

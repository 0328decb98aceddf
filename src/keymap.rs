use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key press asks the app to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleStart,
    Reset,
    Lap,
    ToggleFullscreen,
    ToggleMode,
    ToggleSound,
    EditCountdown,
    ExportLaps,
    Quit,
}

/// Map a key in the main timer view
pub fn command_for(key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Command::Quit),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char(' ') | KeyCode::Enter => Some(Command::ToggleStart),
        KeyCode::Esc => Some(Command::Reset),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'r' => Some(Command::Reset),
            'l' => Some(Command::Lap),
            'f' => Some(Command::ToggleFullscreen),
            't' => Some(Command::ToggleMode),
            's' => Some(Command::ToggleSound),
            'c' => Some(Command::EditCountdown),
            'e' => Some(Command::ExportLaps),
            'q' => Some(Command::Quit),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn space_and_enter_toggle_start() {
        assert_eq!(command_for(key(KeyCode::Char(' '))), Some(Command::ToggleStart));
        assert_eq!(command_for(key(KeyCode::Enter)), Some(Command::ToggleStart));
    }

    #[test]
    fn reset_keys() {
        assert_eq!(command_for(key(KeyCode::Char('r'))), Some(Command::Reset));
        assert_eq!(command_for(key(KeyCode::Char('R'))), Some(Command::Reset));
        assert_eq!(command_for(key(KeyCode::Esc)), Some(Command::Reset));
    }

    #[test]
    fn letter_bindings() {
        assert_eq!(command_for(key(KeyCode::Char('l'))), Some(Command::Lap));
        assert_eq!(command_for(key(KeyCode::Char('f'))), Some(Command::ToggleFullscreen));
        assert_eq!(command_for(key(KeyCode::Char('t'))), Some(Command::ToggleMode));
        assert_eq!(command_for(key(KeyCode::Char('s'))), Some(Command::ToggleSound));
        assert_eq!(command_for(key(KeyCode::Char('c'))), Some(Command::EditCountdown));
        assert_eq!(command_for(key(KeyCode::Char('e'))), Some(Command::ExportLaps));
        assert_eq!(command_for(key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn ctrl_c_quits() {
        let ev = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(command_for(ev), Some(Command::Quit));
        assert_eq!(command_for(key(KeyCode::Char('q'))), Some(Command::Quit));
    }
}

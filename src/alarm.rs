use std::io::Write;
use std::time::Duration;

const BEEPS: u32 = 3;
const BEEP_SPACING: Duration = Duration::from_millis(400);

/// Reacts to a finished countdown. Must not block the caller.
pub trait Alarm {
    fn ring(&mut self);
}

/// Rings the terminal bell a few times on a detached thread
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl Alarm for TerminalBell {
    fn ring(&mut self) {
        std::thread::spawn(|| {
            for i in 0..BEEPS {
                if i > 0 {
                    std::thread::sleep(BEEP_SPACING);
                }
                let mut out = std::io::stdout();
                if out.write_all(b"\x07").and_then(|_| out.flush()).is_err() {
                    log::debug!("terminal bell unavailable");
                    break;
                }
            }
        });
    }
}

/// Counts rings; used headless and in tests
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAlarm {
    pub rings: u32,
}

impl Alarm for SilentAlarm {
    fn ring(&mut self) {
        self.rings += 1;
    }
}

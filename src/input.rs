use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Clone, Debug)]
pub(crate) struct InputEvent {
    pub(crate) key: KeyCode,
    pub(crate) mods: KeyModifiers,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HostAction {
    Quit,
    TogglePause,
    ForceReset,
    ToggleGrid,
    ToggleCrosshairs,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                out.push(InputEvent {
                    key: k.code,
                    mods: k.modifiers,
                });
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_action(ev: &InputEvent) -> Option<HostAction> {
    if matches!(ev.key, KeyCode::Char('c') | KeyCode::Char('C'))
        && ev.mods.contains(KeyModifiers::CONTROL)
    {
        return Some(HostAction::Quit);
    }
    match ev.key {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(HostAction::Quit),
        KeyCode::Char(' ') => Some(HostAction::TogglePause),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(HostAction::ForceReset),
        KeyCode::Char('g') | KeyCode::Char('G') => Some(HostAction::ToggleGrid),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(HostAction::ToggleCrosshairs),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, mods: KeyModifiers) -> InputEvent {
        InputEvent { key: code, mods }
    }

    #[test]
    fn keys_map_to_host_actions() {
        let none = KeyModifiers::NONE;
        assert_eq!(map_event_to_action(&key(KeyCode::Char('q'), none)), Some(HostAction::Quit));
        assert_eq!(map_event_to_action(&key(KeyCode::Esc, none)), Some(HostAction::Quit));
        assert_eq!(
            map_event_to_action(&key(KeyCode::Char(' '), none)),
            Some(HostAction::TogglePause)
        );
        assert_eq!(
            map_event_to_action(&key(KeyCode::Char('R'), KeyModifiers::SHIFT)),
            Some(HostAction::ForceReset)
        );
        assert_eq!(map_event_to_action(&key(KeyCode::Char('g'), none)), Some(HostAction::ToggleGrid));
        assert_eq!(
            map_event_to_action(&key(KeyCode::Char('c'), none)),
            Some(HostAction::ToggleCrosshairs)
        );
        assert_eq!(map_event_to_action(&key(KeyCode::Char('x'), none)), None);
    }

    #[test]
    fn ctrl_c_quits_instead_of_toggling() {
        assert_eq!(
            map_event_to_action(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(HostAction::Quit)
        );
    }
}

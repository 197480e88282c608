//! Hotkey name parsing

use global_hotkey::hotkey::{Code, HotKey};

/// Resolve a key name string to a validated, upper-cased key string
pub fn resolve_key(key_name: &str) -> Option<String> {
    let key_upper = key_name.trim().to_uppercase();
    if key_upper.is_empty() {
        return None;
    }

    if string_to_code(&key_upper).is_some() {
        return Some(key_upper);
    }

    None
}

/// Canonical name and unmodified global hotkey for a configured key name
pub fn hotkey_for(key: &str) -> Option<(String, HotKey)> {
    let name = resolve_key(key)?;
    let code = string_to_code(&name)?;
    Some((name, HotKey::new(None, code)))
}

/// Convert key string to global_hotkey Code
pub fn string_to_code(key: &str) -> Option<Code> {
    let key_upper = key.trim().to_uppercase();
    match key_upper.as_str() {
        "A" => Some(Code::KeyA),
        "B" => Some(Code::KeyB),
        "C" => Some(Code::KeyC),
        "D" => Some(Code::KeyD),
        "E" => Some(Code::KeyE),
        "F" => Some(Code::KeyF),
        "G" => Some(Code::KeyG),
        "H" => Some(Code::KeyH),
        "I" => Some(Code::KeyI),
        "J" => Some(Code::KeyJ),
        "K" => Some(Code::KeyK),
        "L" => Some(Code::KeyL),
        "M" => Some(Code::KeyM),
        "N" => Some(Code::KeyN),
        "O" => Some(Code::KeyO),
        "P" => Some(Code::KeyP),
        "Q" => Some(Code::KeyQ),
        "R" => Some(Code::KeyR),
        "S" => Some(Code::KeyS),
        "T" => Some(Code::KeyT),
        "U" => Some(Code::KeyU),
        "V" => Some(Code::KeyV),
        "W" => Some(Code::KeyW),
        "X" => Some(Code::KeyX),
        "Y" => Some(Code::KeyY),
        "Z" => Some(Code::KeyZ),
        "F1" => Some(Code::F1),
        "F2" => Some(Code::F2),
        "F3" => Some(Code::F3),
        "F4" => Some(Code::F4),
        "F5" => Some(Code::F5),
        "F6" => Some(Code::F6),
        "F7" => Some(Code::F7),
        "F8" => Some(Code::F8),
        "F9" => Some(Code::F9),
        "F10" => Some(Code::F10),
        "F11" => Some(Code::F11),
        "F12" => Some(Code::F12),
        "ESC" | "ESCAPE" => Some(Code::Escape),
        "PAUSE" => Some(Code::Pause),
        "HOME" => Some(Code::Home),
        "END" => Some(Code::End),
        "INSERT" => Some(Code::Insert),
        "DELETE" => Some(Code::Delete),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_key() {
        assert_eq!(resolve_key("F1"), Some("F1".to_string()));
        assert_eq!(resolve_key(" f12 "), Some("F12".to_string()));
        assert_eq!(resolve_key("ESC"), Some("ESC".to_string()));
        assert_eq!(resolve_key(""), None);
        assert_eq!(resolve_key("NOT_A_KEY"), None);
    }

    #[test]
    fn test_hotkeys_are_distinct() {
        let (_, start) = hotkey_for("F1").unwrap();
        let (_, stop) = hotkey_for("F2").unwrap();
        assert_ne!(start.id(), stop.id());
        assert_eq!(start.id(), hotkey_for("f1").unwrap().1.id());
    }

    #[test]
    fn test_hotkey_uses_canonical_name() {
        let (name, hotkey) = hotkey_for(" esc ").unwrap();
        assert_eq!(name, "ESC");
        assert_eq!(hotkey.id(), HotKey::new(None, Code::Escape).id());
        assert!(hotkey_for("").is_none());
        assert!(hotkey_for("CTRL+Q").is_none());
    }
}

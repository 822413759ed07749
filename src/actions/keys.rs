//! Common keys and key combinations, as WebDriver key code points.

pub const NULL: &str = "\u{E000}";
pub const TAB: &str = "\u{E004}";
pub const ENTER: &str = "\u{E007}";
pub const SHIFT: &str = "\u{E008}";
pub const CONTROL: &str = "\u{E009}";
pub const END: &str = "\u{E010}";
pub const HOME: &str = "\u{E011}";
pub const DELETE: &str = "\u{E017}";

/// Selects everything in a field and deletes it. `NULL` releases the
/// modifiers before the delete.
pub const CLEAR: &str = "\u{E009}\u{E010}\u{E008}\u{E011}\u{E000}\u{E017}";

/// Splits typed text into whether it starts over (contains `CLEAR`) and
/// the printable characters left once key code points are stripped.
pub fn printable(text: &str) -> (bool, String) {
    let clears = text.contains(CLEAR);
    let printable = text
        .replace(CLEAR, "")
        .chars()
        .filter(|c| !('\u{E000}'..='\u{F8FF}').contains(c))
        .collect();
    (clears, printable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_is_the_documented_chord() {
        assert_eq!(CLEAR, [CONTROL, END, SHIFT, HOME, NULL, DELETE].concat());
    }

    #[test]
    fn printable_strips_key_codes() {
        assert_eq!(printable("abc"), (false, "abc".to_string()));
        assert_eq!(
            printable(&format!("{}new{}", CLEAR, ENTER)),
            (true, "new".to_string())
        );
    }
}

// Delimiter/terminator detection over a character stream.
//
// A watcher is fed every character with its absolute byte offset in the
// stream and reports where a full delimiter match started. Cross-character
// memory (for multi-char delimiters) lives inside the watcher, so the scan
// loop never branches on delimiter length and matches that straddle two
// read buffers are found without looking back into the previous buffer.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub enum Watcher {
    /// Never matches (no delimiter configured).
    Empty,
    Single(char),
    Dual {
        first: char,
        second: char,
        prev: Option<(char, usize)>,
    },
    /// Three or more characters.
    Sequence {
        target: Vec<char>,
        recent: VecDeque<(char, usize)>,
    },
}

impl Watcher {
    pub fn new(pattern: &str) -> Self {
        let chars: Vec<char> = pattern.chars().collect();
        match chars.len() {
            0 => Watcher::Empty,
            1 => Watcher::Single(chars[0]),
            2 => Watcher::Dual {
                first: chars[0],
                second: chars[1],
                prev: None,
            },
            n => Watcher::Sequence {
                target: chars,
                recent: VecDeque::with_capacity(n),
            },
        }
    }

    /// Feed one character. Returns the offset where the delimiter starts when
    /// `current` completes it.
    #[inline]
    pub fn find(&mut self, current: char, index: usize) -> Option<usize> {
        match self {
            Watcher::Empty => None,
            Watcher::Single(target) => (current == *target).then_some(index),
            Watcher::Dual {
                first,
                second,
                prev,
            } => {
                let found = match *prev {
                    Some((p, at)) if p == *first && current == *second => Some(at),
                    _ => None,
                };
                *prev = Some((current, index));
                found
            }
            Watcher::Sequence { target, recent } => {
                if recent.len() == target.len() {
                    recent.pop_front();
                }
                recent.push_back((current, index));
                if recent.len() == target.len()
                    && recent.iter().zip(target.iter()).all(|((c, _), t)| c == t)
                {
                    recent.front().map(|&(_, at)| at)
                } else {
                    None
                }
            }
        }
    }

    /// Forget remembered characters. Called after any delimiter match so
    /// consumed characters never take part in a second match.
    #[inline]
    pub fn reset(&mut self) {
        match self {
            Watcher::Dual { prev, .. } => *prev = None,
            Watcher::Sequence { recent, .. } => recent.clear(),
            Watcher::Empty | Watcher::Single(_) => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Watcher::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(watcher: &mut Watcher, text: &str) -> Vec<usize> {
        text.char_indices()
            .filter_map(|(i, c)| watcher.find(c, i))
            .collect()
    }

    #[test]
    fn test_empty_never_matches() {
        let mut w = Watcher::new("");
        assert!(w.is_empty());
        assert!(feed(&mut w, "a,b\n").is_empty());
    }

    #[test]
    fn test_single() {
        let mut w = Watcher::new(",");
        assert_eq!(feed(&mut w, "a,b,,c"), vec![1, 3, 4]);
    }

    #[test]
    fn test_dual_reports_start_of_sequence() {
        let mut w = Watcher::new("\r\n");
        assert_eq!(feed(&mut w, "ab\r\ncd\r\n"), vec![2, 6]);
        // bare \r is not a match
        let mut w = Watcher::new("\r\n");
        assert!(feed(&mut w, "a\rb\n").is_empty());
    }

    #[test]
    fn test_dual_remembers_across_calls() {
        // Same watcher fed from two "buffers": the \r ends the first one.
        let mut w = Watcher::new("\r\n");
        assert_eq!(w.find('a', 0), None);
        assert_eq!(w.find('\r', 1), None);
        assert_eq!(w.find('\n', 2), Some(1));
    }

    #[test]
    fn test_dual_reset_prevents_overlap() {
        let mut w = Watcher::new("||");
        assert_eq!(w.find('|', 0), None);
        assert_eq!(w.find('|', 1), Some(0));
        w.reset();
        assert_eq!(w.find('|', 2), None);
    }

    #[test]
    fn test_sequence() {
        let mut w = Watcher::new("|||");
        assert_eq!(w.find('a', 0), None);
        assert_eq!(w.find('|', 1), None);
        assert_eq!(w.find('|', 2), None);
        assert_eq!(w.find('|', 3), Some(1));
        w.reset();
        assert_eq!(w.find('|', 4), None);
    }

    #[test]
    fn test_multibyte_chars_use_byte_offsets() {
        let mut w = Watcher::new("§¶");
        // '§' and '¶' are two bytes each in UTF-8
        assert_eq!(feed(&mut w, "a§¶b"), vec![1]);
    }
}

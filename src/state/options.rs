use indexmap::IndexMap;

use crate::state::question::normalize;

/// Visual state of one answer option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Neutral,
    Correct,
    Incorrect,
    Disabled,
}

/// Answer options of one question block with their marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionBoard {
    options: IndexMap<String, (String, OptionMark)>,
    locked: bool,
}

impl OptionBoard {
    /// Build a board from `letter -> text`; letters are normalized, blank options dropped.
    pub fn new(options: &IndexMap<String, String>) -> Self {
        Self {
            options: options
                .iter()
                .filter(|(_, text)| !text.trim().is_empty())
                .map(|(letter, text)| (normalize(letter), (text.clone(), OptionMark::Neutral)))
                .collect(),
            locked: false,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn contains(&self, letter: &str) -> bool {
        self.options.contains_key(&normalize(letter))
    }

    /// `(letter, text, mark)` in display order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, OptionMark)> {
        self.options
            .iter()
            .map(|(letter, (text, mark))| (letter.as_str(), text.as_str(), *mark))
    }

    pub fn mark(&self, letter: &str) -> Option<OptionMark> {
        self.options.get(&normalize(letter)).map(|(_, mark)| *mark)
    }

    /// Prevent further selection.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Lock the board and colour the operator's choice against `correct`.
    ///
    /// Returns whether the choice was correct.
    pub fn mark_answer(&mut self, selected: &str, correct: &str) -> bool {
        let selected = normalize(selected);
        let correct = normalize(correct);
        let is_correct = selected == correct;
        self.locked = true;

        for (letter, (_, mark)) in self.options.iter_mut() {
            *mark = if *letter == selected {
                if is_correct {
                    OptionMark::Correct
                } else {
                    OptionMark::Incorrect
                }
            } else if *letter == correct {
                OptionMark::Correct
            } else {
                OptionMark::Disabled
            };
        }

        is_correct
    }

    /// Lock the board, mark `correct` and disable the rest.
    pub fn reveal(&mut self, correct: &str) {
        let correct = normalize(correct);
        self.locked = true;
        for (letter, (_, mark)) in self.options.iter_mut() {
            *mark = if *letter == correct {
                OptionMark::Correct
            } else {
                OptionMark::Disabled
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> OptionBoard {
        OptionBoard::new(&IndexMap::from([
            ("A".to_string(), "one".to_string()),
            ("b".to_string(), "two".to_string()),
            ("C".to_string(), "three".to_string()),
        ]))
    }

    #[test]
    fn correct_choice_disables_the_rest() {
        let mut board = board();
        assert!(board.mark_answer("B", " b"));
        assert!(board.is_locked());
        assert_eq!(board.mark("B"), Some(OptionMark::Correct));
        assert_eq!(board.mark("A"), Some(OptionMark::Disabled));
        assert_eq!(board.mark("C"), Some(OptionMark::Disabled));
    }

    #[test]
    fn wrong_choice_reveals_correct_option() {
        let mut board = board();
        assert!(!board.mark_answer("a", "C"));
        assert_eq!(board.mark("A"), Some(OptionMark::Incorrect));
        assert_eq!(board.mark("B"), Some(OptionMark::Disabled));
        assert_eq!(board.mark("C"), Some(OptionMark::Correct));
    }

    #[test]
    fn reveal_marks_only_correct() {
        let mut board = board();
        board.reveal("c");
        let marks = board.entries().map(|(_, _, mark)| mark).collect::<Vec<_>>();
        assert_eq!(
            marks,
            vec![OptionMark::Disabled, OptionMark::Disabled, OptionMark::Correct]
        );
    }
}

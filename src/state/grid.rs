//! Question grid resolution: maps a part cell to the Nth question of that part.

use thiserror::Error;

use crate::{
    dao::models::QuestionEntity,
    state::question::{CellToken, Part, UsedCells},
};

/// Display status of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStatus {
    Available,
    Used,
    /// No question of the part backs this cell.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub token: CellToken,
    pub status: CellStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell {index} is outside the {cells}-cell grid")]
    OutOfRange { index: u16, cells: u16 },
    #[error("cell {0} has already been used")]
    AlreadyUsed(CellToken),
    #[error("part {part} has no questions")]
    NoQuestions { part: u8 },
    #[error("not enough questions in part {part}: cell {index} requested, {available} available")]
    NotEnoughQuestions {
        part: u8,
        index: u16,
        available: usize,
    },
}

/// Questions of `part`, in storage order.
pub fn questions_in_part(bank: &[QuestionEntity], part: Part) -> Vec<&QuestionEntity> {
    bank.iter().filter(|q| q.part == part.number()).collect()
}

/// Resolve `token` to its question without mutating anything.
pub fn resolve_cell<'a>(
    bank: &'a [QuestionEntity],
    used: &UsedCells,
    token: CellToken,
    cells: u16,
) -> Result<&'a QuestionEntity, GridError> {
    if token.index() > cells {
        return Err(GridError::OutOfRange {
            index: token.index(),
            cells,
        });
    }
    if used.contains(&token) {
        return Err(GridError::AlreadyUsed(token));
    }

    let part = token.part();
    let questions = questions_in_part(bank, part);
    if questions.is_empty() {
        return Err(GridError::NoQuestions {
            part: part.number(),
        });
    }

    questions
        .get(usize::from(token.index()) - 1)
        .copied()
        .ok_or(GridError::NotEnoughQuestions {
            part: part.number(),
            index: token.index(),
            available: questions.len(),
        })
}

/// Every cell of the `part` grid with its status.
pub fn grid_cells(bank: &[QuestionEntity], used: &UsedCells, part: Part, cells: u16) -> Vec<GridCell> {
    let available = questions_in_part(bank, part).len();
    (1..=cells)
        .filter_map(|index| CellToken::new(part, index).ok())
        .map(|token| {
            let status = if used.contains(&token) {
                CellStatus::Used
            } else if usize::from(token.index()) > available {
                CellStatus::Unavailable
            } else {
                CellStatus::Available
            };
            GridCell { token, status }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, part: u8) -> QuestionEntity {
        QuestionEntity {
            id: id.into(),
            part,
            question: format!("question {id}"),
            answer_options: None,
            correct_answer: None,
            answer: Some("answer".into()),
            time: None,
        }
    }

    fn bank() -> Vec<QuestionEntity> {
        vec![
            question("a", 1),
            question("x", 2),
            question("b", 1),
            question("c", 1),
        ]
    }

    #[test]
    fn resolves_nth_question_of_part() {
        let bank = bank();
        let used = UsedCells::default();
        let token = CellToken::new(Part::One, 2).unwrap();
        assert_eq!(resolve_cell(&bank, &used, token, 58).unwrap().id, "b");

        let token = CellToken::new(Part::Two, 1).unwrap();
        assert_eq!(resolve_cell(&bank, &used, token, 60).unwrap().id, "x");
    }

    #[test]
    fn rejects_cells_beyond_bank() {
        let bank = bank();
        let used = UsedCells::default();
        let token = CellToken::new(Part::Two, 2).unwrap();
        assert_eq!(
            resolve_cell(&bank, &used, token, 60),
            Err(GridError::NotEnoughQuestions {
                part: 2,
                index: 2,
                available: 1
            })
        );

        let empty: Vec<QuestionEntity> = Vec::new();
        assert_eq!(
            resolve_cell(&empty, &used, token, 60),
            Err(GridError::NoQuestions { part: 2 })
        );
    }

    #[test]
    fn rejects_used_and_out_of_range_cells() {
        let bank = bank();
        let mut used = UsedCells::default();
        let token = CellToken::new(Part::One, 1).unwrap();
        used.insert(token);
        assert_eq!(
            resolve_cell(&bank, &used, token, 58),
            Err(GridError::AlreadyUsed(token))
        );

        let far = CellToken::new(Part::One, 59).unwrap();
        assert!(matches!(
            resolve_cell(&bank, &used, far, 58),
            Err(GridError::OutOfRange { .. })
        ));
    }

    #[test]
    fn grid_reports_cell_status() {
        let bank = bank();
        let mut used = UsedCells::default();
        used.insert(CellToken::new(Part::One, 2).unwrap());

        let cells = grid_cells(&bank, &used, Part::One, 5);
        let statuses = cells.iter().map(|c| c.status).collect::<Vec<_>>();
        assert_eq!(
            statuses,
            vec![
                CellStatus::Available,
                CellStatus::Used,
                CellStatus::Available,
                CellStatus::Unavailable,
                CellStatus::Unavailable,
            ]
        );
    }
}

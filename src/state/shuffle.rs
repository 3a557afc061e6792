use rand::Rng;

use crate::dao::models::QuestionEntity;

/// In-place Fisher–Yates: for `i` from the last index down to 1, swap `i` with a uniform `j <= i`.
pub fn fisher_yates<T, R>(items: &mut [T], rng: &mut R)
where
    R: Rng + ?Sized,
{
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Shuffle each part independently and concatenate part 1, part 2, then
/// questions of any other part in their original order.
pub fn shuffle_by_part<R>(questions: Vec<QuestionEntity>, rng: &mut R) -> Vec<QuestionEntity>
where
    R: Rng + ?Sized,
{
    let mut part_one = Vec::new();
    let mut part_two = Vec::new();
    let mut others = Vec::new();
    for question in questions {
        match question.part {
            1 => part_one.push(question),
            2 => part_two.push(question),
            _ => others.push(question),
        }
    }

    fisher_yates(&mut part_one, rng);
    fisher_yates(&mut part_two, rng);

    part_one.into_iter().chain(part_two).chain(others).collect()
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn question(id: usize, part: u8) -> QuestionEntity {
        QuestionEntity {
            id: format!("q{id}"),
            part,
            question: format!("question {id}"),
            answer_options: None,
            correct_answer: None,
            answer: None,
            time: None,
        }
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut items = (0..100).collect::<Vec<_>>();
        fisher_yates(&mut items, &mut rng);

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..100).collect::<Vec<_>>());
        assert_ne!(items, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn tiny_inputs_are_untouched() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty: Vec<u8> = Vec::new();
        fisher_yates(&mut empty, &mut rng);
        let mut single = vec![42];
        fisher_yates(&mut single, &mut rng);
        assert_eq!(single, vec![42]);
    }

    #[test]
    fn parts_stay_grouped_and_others_keep_order() {
        let mut rng = StdRng::seed_from_u64(3);
        let questions = vec![
            question(1, 2),
            question(2, 3),
            question(3, 1),
            question(4, 2),
            question(5, 1),
            question(6, 0),
        ];

        let shuffled = shuffle_by_part(questions, &mut rng);
        let parts = shuffled.iter().map(|q| q.part).collect::<Vec<_>>();
        assert_eq!(parts, vec![1, 1, 2, 2, 3, 0]);
        assert_eq!(shuffled[4].id, "q2");
        assert_eq!(shuffled[5].id, "q6");

        let mut ids = shuffled.iter().map(|q| q.id.clone()).collect::<Vec<_>>();
        ids.sort();
        assert_eq!(ids, vec!["q1", "q2", "q3", "q4", "q5", "q6"]);
    }
}

use rand::Rng;

use crate::models::domain::question::OPTION_COUNT;
use crate::models::domain::Question;

/// Re-orders a question's options with an unbiased shuffle so the correct
/// answer's position carries no signal.
pub struct QuestionRandomizer;

impl QuestionRandomizer {
    pub fn randomize(question: &Question) -> Question {
        Self::randomize_with(question, &mut rand::rng())
    }

    /// Permutes the options and remaps the correct index through the index
    /// permutation. Remapping never searches by option text: duplicate
    /// option strings would make that ambiguous.
    pub fn randomize_with<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Question {
        let permutation = Self::shuffled_indices(rng);

        let options: Vec<String> = permutation
            .iter()
            .map(|&original| question.options[original].clone())
            .collect();

        let correct_index = permutation
            .iter()
            .position(|&original| original == question.correct_index)
            .expect("permutation contains every option index");

        Question::new(
            question.text.clone(),
            options,
            correct_index,
            question.explanation.clone(),
        )
    }

    /// Fisher–Yates over the option indices; each of the 24 orderings of
    /// four options is equally likely.
    fn shuffled_indices<R: Rng + ?Sized>(rng: &mut R) -> [usize; OPTION_COUNT] {
        let mut indices: [usize; OPTION_COUNT] = std::array::from_fn(|i| i);
        for i in (1..OPTION_COUNT).rev() {
            let j = rng.random_range(0..=i);
            indices.swap(i, j);
        }
        indices
    }
}

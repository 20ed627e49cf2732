use crate::corpus::CorpusIndex;
use crate::optimizer::population::Candidate;
use fastrand::Rng;

/// Draws a random window of lines around a center taken from `selection`.
///
/// The window stays inside the center's artifact. Lines without tokens are
/// left out, so the result may be shorter than the window or even empty.
pub fn generate_window(rng: &mut Rng, corpus: &CorpusIndex, selection: &[usize]) -> Candidate {
    if selection.is_empty() {
        return Candidate::default();
    }

    let center = corpus.line(selection[rng.usize(0..selection.len())]);
    let lines_before = rng.usize(0..=center.line_index);
    let lines_after = rng.usize(0..=(center.total_lines - center.line_index - 1));

    let start = center.global_index - lines_before;
    let end = center.global_index + lines_after;

    let lines = (start..=end)
        .filter(|&g| !corpus.line(g).tokens.is_empty())
        .collect();

    Candidate::from_sorted(lines)
}

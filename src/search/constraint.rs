//! Caller-supplied vetoes on candidate trials.

/// Decides whether a candidate trial may follow the trials chosen so far.
///
/// `history` holds the decoded tuples of the current attempt, starting with
/// the virtual predecessor; `candidate` is the decoded tuple being considered.
/// Tuples carry the alternating state first when the design alternates.
///
/// Closures of the right shape implement this trait:
///
/// ```
/// use counterbalance::search::TrialConstraint;
///
/// // Never repeat the first factor's level more than twice in a row
/// let no_triples = |history: &[Vec<u32>], candidate: &[u32]| {
///     history.len() < 2
///         || !history[history.len() - 2..]
///             .iter()
///             .all(|t| t[0] == candidate[0])
/// };
///
/// assert!(no_triples.allows(&[vec![0], vec![0]], &[1]));
/// assert!(!no_triples.allows(&[vec![0], vec![0]], &[0]));
/// ```
pub trait TrialConstraint: Send + Sync {
    /// Whether `candidate` may be appended after `history`.
    fn allows(&self, history: &[Vec<u32>], candidate: &[u32]) -> bool;
}

impl<F> TrialConstraint for F
where
    F: Fn(&[Vec<u32>], &[u32]) -> bool + Send + Sync,
{
    fn allows(&self, history: &[Vec<u32>], candidate: &[u32]) -> bool {
        self(history, candidate)
    }
}

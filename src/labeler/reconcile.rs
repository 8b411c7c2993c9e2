use std::collections::HashSet;

/// Computes the full set of labels that the PR should have after applying `add` and `remove`
/// to the `current` labels.
///
/// Removal is applied after addition, so a label that is both added and removed ends up removed.
/// The result keeps the current labels in their original order, followed by newly added labels.
pub fn reconcile<S: AsRef<str>>(current: &[S], add: &[S], remove: &[S]) -> Vec<String> {
    let removed: HashSet<&str> = remove.iter().map(|l| l.as_ref()).collect();
    let mut seen = HashSet::new();
    current
        .iter()
        .chain(add)
        .map(|l| l.as_ref())
        .filter(|label| !removed.contains(label) && seen.insert(*label))
        .map(|label| label.to_string())
        .collect()
}

/// Returns `true` if both lists contain the same labels, ignoring order and duplicates.
pub fn same_labels<S: AsRef<str>, T: AsRef<str>>(left: &[S], right: &[T]) -> bool {
    let left: HashSet<&str> = left.iter().map(|l| l.as_ref()).collect();
    let right: HashSet<&str> = right.iter().map(|l| l.as_ref()).collect();
    left == right
}

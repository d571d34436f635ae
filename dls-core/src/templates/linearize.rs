// C3 linearization of template inheritance
//
// A template's method resolution order lists the template first, then its
// ancestors, most specific first, each exactly once. The merge repeatedly
// takes the head of some input list that appears in no other list's tail;
// when no such head exists the inheritance graph is inconsistent and the
// merge fails.

/// Compute the linearization of `name` given the linearizations of its
/// parents (in declaration order) and the parent list itself.
///
/// # Errors
///
/// Returns the conflicting names when the merge cannot make progress.
pub fn c3_linearize(
    name: &str,
    parent_linearizations: &[Vec<String>],
    parents: &[String],
) -> Result<Vec<String>, Vec<String>> {
    let mut result = vec![name.to_string()];

    let mut sequences: Vec<Vec<String>> = parent_linearizations.to_vec();
    if !parents.is_empty() {
        sequences.push(parents.to_vec());
    }
    sequences.retain(|seq| !seq.is_empty());

    while !sequences.is_empty() {
        // a head is good when it appears in no other sequence's tail
        let mut candidate = None;
        for seq in &sequences {
            let head = &seq[0];
            let in_tail = sequences
                .iter()
                .any(|other| other[1..].iter().any(|item| item == head));
            if !in_tail {
                candidate = Some(head.clone());
                break;
            }
        }

        let Some(next) = candidate else {
            // every head is blocked: report the heads as the conflict set
            let mut heads: Vec<String> = sequences.iter().map(|seq| seq[0].clone()).collect();
            heads.dedup();
            return Err(heads);
        };

        result.push(next.clone());
        for seq in &mut sequences {
            seq.retain(|item| item != &next);
        }
        sequences.retain(|seq| !seq.is_empty());
    }

    Ok(result)
}

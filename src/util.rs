/// Split items into order-preserving batches of at most `size` elements.
/// Multi-item pulls are processed batch by batch so a failure partway
/// through clearly identifies what completed.
pub fn chunked<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    assert!(size > 0, "chunk size must be positive");
    let mut batches = Vec::with_capacity(items.len().div_ceil(size));
    let mut current = Vec::with_capacity(size.min(items.len()));
    for item in items {
        current.push(item);
        if current.len() == size {
            batches.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_preserve_order_and_sizes() {
        let items: Vec<u32> = (0..25).collect();
        let batches = chunked(items, 10);
        assert_eq!(
            batches.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![10, 10, 5]
        );
        let flattened: Vec<u32> = batches.into_iter().flatten().collect();
        assert_eq!(flattened, (0..25).collect::<Vec<u32>>());
    }

    #[test]
    fn empty_input_yields_no_batches() {
        assert!(chunked(Vec::<u32>::new(), 10).is_empty());
    }

    #[test]
    fn exact_multiple_has_no_trailing_partial_batch() {
        let batches = chunked((0..20).collect::<Vec<u32>>(), 10);
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 10));
    }
}

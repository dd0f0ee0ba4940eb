use tracing::warn;

use crate::database::StoreError;

/// Lists the page can render without. A failed load is logged and shown as empty.
pub fn or_empty<T>(result: Result<Vec<T>, StoreError>, table: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!("Failed to load {table}, using empty list: {e}");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_empty() {
        assert_eq!(or_empty(Ok(vec![1, 2]), "states"), vec![1, 2]);
        assert!(or_empty::<u8>(Err(StoreError::MissingId), "states").is_empty());
    }
}

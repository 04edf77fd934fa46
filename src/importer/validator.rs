// ==========================================
// Marking Maestro - Import validator
// ==========================================
// Batch-level checks after field mapping: identifiers must be unique
// within one file.
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;

pub struct ImportValidator;

impl ImportValidator {
    /// Reject the first repeated identifier
    ///
    /// # Arguments
    /// * `field` - column name used in the error
    /// * `keys` - (row_number, identifier) in file order
    pub fn check_unique<'a, I>(&self, field: &str, keys: I) -> ImportResult<()>
    where
        I: IntoIterator<Item = (usize, &'a str)>,
    {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (row, key) in keys {
            if seen.insert(key, row).is_some() {
                return Err(ImportError::DuplicateKey {
                    row,
                    field: field.to_string(),
                    value: key.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Identifiers referenced by `refs` that are absent from `known`
    ///
    /// Dangling references are tolerated by the allocator, so callers
    /// only log these.
    pub fn dangling_references<'a>(
        &self,
        known: &[&'a str],
        refs: impl IntoIterator<Item = &'a str>,
    ) -> Vec<&'a str> {
        let mut missing: Vec<&str> = refs
            .into_iter()
            .filter(|r| !known.contains(r))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_reports_second_row() {
        let err = ImportValidator
            .check_unique("Teacher ID", vec![(1, "T1"), (2, "T2"), (3, "T1")])
            .unwrap_err();

        match err {
            ImportError::DuplicateKey { row, value, .. } => {
                assert_eq!(row, 3);
                assert_eq!(value, "T1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unique_ok() {
        assert!(ImportValidator
            .check_unique("Class ID", vec![(1, "C1"), (2, "C2")])
            .is_ok());
    }

    #[test]
    fn test_dangling_references() {
        let missing = ImportValidator.dangling_references(&["T1", "T2"], vec!["T2", "T9", "T9"]);
        assert_eq!(missing, vec!["T9"]);
    }
}

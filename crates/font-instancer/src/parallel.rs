//! Parallel batch utilities.

use rayon::prelude::*;

use crate::report::Instance;

/// Summary of a batch of generated instances.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchResult {
    /// Instances where every requested property was produced
    pub complete: usize,
    /// Instances missing at least one property
    pub partial: usize,
}

impl BatchResult {
    pub fn from_instances(instances: &[Instance]) -> Self {
        let complete = instances.iter().filter(|instance| instance.is_complete()).count();
        Self { complete, partial: instances.len() - complete }
    }

    pub fn total(&self) -> usize {
        self.complete + self.partial
    }

    pub fn all_complete(&self) -> bool {
        self.partial == 0
    }
}

/// Run `op` over `items` on the rayon pool, keeping input order.
pub(crate) fn collect_parallel<T, R, F>(items: &[T], op: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    items.par_iter().map(op).collect()
}

#[cfg(test)]
mod tests {
    use fontmutator_variation::Location;

    use super::*;
    use crate::report::{DiagnosticKind, PropertyId};

    #[test]
    fn counts_partial_instances() {
        let complete = Instance::new("Regular", Location::new());
        let mut partial = Instance::new("Bold", Location::new());
        partial.report(
            PropertyId::Glyph("a".to_string()),
            DiagnosticKind::Model(fontmutator_variation::Error::EmptyModel),
        );

        let result = BatchResult::from_instances(&[complete, partial]);
        assert_eq!(result, BatchResult { complete: 1, partial: 1 });
        assert_eq!(result.total(), 2);
        assert!(!result.all_complete());
    }

    #[test]
    fn keeps_input_order() {
        let items: Vec<u32> = (0..100).collect();
        let squares = collect_parallel(&items, |n| n * n);
        assert_eq!(squares[7], 49);
        assert_eq!(squares.len(), 100);
    }
}

use serde::{Deserialize, Serialize};

/// Surrogate key generator for one physical table.
///
/// Yields strictly increasing integers starting at 1. A rebuilt table gets a
/// fresh manager, so numbering restarts.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdManager {
    pub current: Option<u64>,
}

impl IdManager {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Resume numbering after `value`, used when reloading a saved table.
    /// Refuses to move backwards.
    pub fn set_current(&mut self, value: u64) -> Result<(), String> {
        match self.current {
            Some(current) if value < current => {
                Err(format!("Cannot move id sequence back from {current} to {value}"))
            },
            _ => {
                self.current = Some(value);
                Ok(())
            },
        }
    }
}

impl Iterator for IdManager {
    type Item = u64;
    fn next(&mut self) -> Option<Self::Item> {
        let item = match self.current {
            Some(u64::MAX) => return None,
            Some(id) => id + 1,
            None => 1,
        };

        self.current = Some(item);
        Some(item)
    }
}

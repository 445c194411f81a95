use std::sync::Arc;

use parking_lot::RwLock;

/// Flips true only once the owning binary's broker handshake has succeeded.
/// Cheap to clone; every clone shares the same underlying flag.
#[derive(Clone, Default)]
pub struct Readiness(Arc<RwLock<bool>>);

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ready(&self, ready: bool) {
        *self.0.write() = ready;
    }

    pub fn is_ready(&self) -> bool {
        *self.0.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_not_ready() {
        assert!(!Readiness::new().is_ready());
    }

    #[test]
    fn reflects_latest_write_across_clones() {
        let r = Readiness::new();
        let r2 = r.clone();
        r.set_ready(true);
        assert!(r2.is_ready());
    }
}

/// Staleness of the two cached quantities of a relaxed clock.
///
/// The flags are independent: the category table goes stale when the rate
/// distribution changes, the scale factor goes stale once per sampler poll
/// while normalization is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtyFlags {
    pub table: bool,
    pub scale: bool,
}

impl DirtyFlags {
    /// Flags right after construction: the table is already built, the scale
    /// factor is computed on first use when normalizing.
    pub fn initial(normalize: bool) -> Self {
        Self {
            table: false,
            scale: normalize,
        }
    }

    /// Start of one proposal cycle.
    pub fn poll(&mut self, normalize: bool, distribution_changed: bool) {
        if distribution_changed {
            self.table = true;
        }
        if normalize {
            self.scale = true;
        }
    }

    pub fn mark_table(&mut self) {
        self.table = true;
    }

    pub fn table_rebuilt(&mut self) {
        self.table = false;
    }

    pub fn scale_recomputed(&mut self) {
        self.scale = false;
    }

    pub fn is_clean(&self) -> bool {
        !self.table && !self.scale
    }
}

/// Point-in-time view of the permit pool.
///
/// Facts only: `in_use` counts permits held by tasks that are sending right
/// now, not tasks still queued for a permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InflightSnapshot {
    pub max: usize,
    pub available: usize,
    pub in_use: usize,
}

impl InflightSnapshot {
    pub(crate) fn new(max: usize, available: usize) -> Self {
        Self {
            max,
            available,
            in_use: max.saturating_sub(available),
        }
    }
}

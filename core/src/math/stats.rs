pub struct StatsHelper;

impl StatsHelper {
    /// Arithmetic mean of integer samples, `None` when there are none.
    pub fn mean(samples: &[u32]) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        let sum: u64 = samples.iter().map(|&v| u64::from(v)).sum();
        Some(sum as f64 / samples.len() as f64)
    }
}

//! Stress test configuration.

/// Configuration for phase-synchronized stress tests.
#[derive(Debug, Clone, Copy)]
pub struct StressConfig {
    /// Number of participant threads to spawn
    thread_count: usize,
    /// Number of phases every thread runs through
    phases: usize,
}

impl StressConfig {
    /// Creates a new stress test configuration with default values.
    ///
    /// Defaults:
    /// - `thread_count`: 4
    /// - `phases`: 1000
    #[must_use]
    pub const fn new() -> Self {
        Self {
            thread_count: 4,
            phases: 1000,
        }
    }

    /// Sets the number of participant threads.
    #[must_use]
    pub const fn threads(mut self, count: usize) -> Self {
        self.thread_count = count;
        self
    }

    /// Sets the number of phases each thread runs.
    #[must_use]
    pub const fn phases(mut self, count: usize) -> Self {
        self.phases = count;
        self
    }

    /// Returns the thread count.
    #[must_use]
    pub const fn get_thread_count(&self) -> usize {
        self.thread_count
    }

    /// Returns the phase count.
    #[must_use]
    pub const fn get_phases(&self) -> usize {
        self.phases
    }
}

impl Default for StressConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StressConfig::default();
        assert_eq!(config.get_thread_count(), 4);
        assert_eq!(config.get_phases(), 1000);
    }

    #[test]
    fn test_builder() {
        let config = StressConfig::new().threads(8).phases(10);
        assert_eq!(config.get_thread_count(), 8);
        assert_eq!(config.get_phases(), 10);
    }
}

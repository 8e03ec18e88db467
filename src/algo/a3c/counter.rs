use parking_lot::Mutex;

/// Process-wide count of finished episodes, shared by every worker
///
/// Increments are serialized through a mutex so concurrent workers never lose an update.
/// Workers read it to decide whether another episode should be started.
#[derive(Debug, Default)]
pub struct EpisodeCounter {
    value: Mutex<usize>,
}

impl EpisodeCounter {
    pub fn new(initial: usize) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }

    /// Current number of finished episodes
    pub fn get(&self) -> usize {
        *self.value.lock()
    }

    /// Record one finished episode
    ///
    /// **Returns** the count after the increment
    pub fn increment(&self) -> usize {
        let mut value = self.value.lock();
        *value += 1;
        *value
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn increment_returns_new_value() {
        let counter = EpisodeCounter::default();
        assert_eq!(counter.get(), 0);
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn no_lost_updates() {
        let counter = EpisodeCounter::new(0);

        thread::scope(|s| {
            for _ in 0..2 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        counter.increment();
                    }
                });
            }
        });

        assert_eq!(counter.get(), 2000, "every increment is counted");
    }

    #[test]
    fn monotonic_under_contention() {
        let counter = EpisodeCounter::new(10);

        let observed = thread::scope(|s| {
            let handles = (0..4)
                .map(|_| s.spawn(|| (0..250).map(|_| counter.increment()).collect::<Vec<_>>()))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect::<Vec<_>>()
        });

        for values in &observed {
            assert!(values.windows(2).all(|w| w[0] < w[1]), "each worker sees increasing counts");
        }
        let mut all = observed.concat();
        all.sort_unstable();
        assert_eq!(all, (11..=1010).collect::<Vec<_>>(), "each value handed out exactly once");
        assert_eq!(counter.get(), 1010);
    }
}

use std::collections::BTreeMap;

/// Sent by a worker through the report channel each time it finishes an episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeReport {
    /// Index of the reporting worker
    pub worker: usize,
    /// Value of the global episode counter right after this episode was counted
    pub episode: usize,
    /// Total reward collected during the episode
    pub score: f32,
}

/// Episode scores aggregated from every worker's reports
///
/// Keeps both the global history, in the order reports arrived, and each worker's own history.
#[derive(Debug, Clone, Default)]
pub struct RewardLog {
    history: Vec<EpisodeReport>,
    per_worker: BTreeMap<usize, Vec<f32>>,
}

impl RewardLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, report: EpisodeReport) {
        self.per_worker
            .entry(report.worker)
            .or_default()
            .push(report.score);
        self.history.push(report);
    }

    /// All reports in arrival order
    pub fn history(&self) -> &[EpisodeReport] {
        &self.history
    }

    /// Scores of one worker's episodes in the order it played them
    pub fn worker(&self, worker: usize) -> &[f32] {
        self.per_worker
            .get(&worker)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterate over `(worker, scores)` pairs in worker order
    pub fn workers(&self) -> impl Iterator<Item = (usize, &[f32])> {
        self.per_worker.iter().map(|(w, s)| (*w, s.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Mean score over the last `n` episodes across all workers
    pub fn recent_mean(&self, n: usize) -> Option<f32> {
        let start = self.history.len().saturating_sub(n);
        let recent = &self.history[start..];
        (!recent.is_empty())
            .then(|| recent.iter().map(|r| r.score).sum::<f32>() / recent.len() as f32)
    }
}

//! Epoch-end callbacks driven by a monitored loss (lower is better).

/// Halves (or scales by `factor`) the learning rate after `patience` epochs without improvement.
#[derive(Debug, Clone)]
pub struct ReduceLrOnPlateau {
    pub factor: f64,
    pub patience: usize,
    pub min_lr: f64,
    pub min_delta: f64,
    best: f64,
    wait: usize,
}

impl ReduceLrOnPlateau {
    pub fn new(factor: f64, patience: usize, min_lr: f64) -> Self {
        Self { factor, patience, min_lr, min_delta: 1e-4, best: f64::INFINITY, wait: 0 }
    }

    /// Returns the new learning rate when a reduction happens
    pub fn on_epoch_end(&mut self, epoch: usize, monitored: f64, lr: f64) -> Option<f64> {
        if monitored < self.best - self.min_delta {
            self.best = monitored;
            self.wait = 0;
            return None;
        }
        self.wait += 1;
        if self.wait < self.patience || lr <= self.min_lr {
            return None;
        }
        let new_lr = (lr * self.factor).max(self.min_lr);
        self.wait = 0;
        tracing::info!(epoch = epoch + 1, lr = new_lr, "ReduceLROnPlateau reducing learning rate");
        Some(new_lr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarlyStoppingAction {
    /// Loss improved; snapshot the weights if restoring best weights
    Improved,
    Continue,
    Stop,
}

#[derive(Debug, Clone)]
pub struct EarlyStopping {
    pub patience: usize,
    pub min_delta: f64,
    best: f64,
    best_epoch: Option<usize>,
    wait: usize,
    stopped_epoch: Option<usize>,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self { patience, min_delta: 0.0, best: f64::INFINITY, best_epoch: None, wait: 0, stopped_epoch: None }
    }

    pub fn on_epoch_end(&mut self, epoch: usize, monitored: f64) -> EarlyStoppingAction {
        if monitored < self.best - self.min_delta {
            self.best = monitored;
            self.best_epoch = Some(epoch);
            self.wait = 0;
            return EarlyStoppingAction::Improved;
        }
        self.wait += 1;
        if self.wait >= self.patience {
            self.stopped_epoch = Some(epoch);
            tracing::info!(epoch = epoch + 1, "early stopping");
            return EarlyStoppingAction::Stop;
        }
        EarlyStoppingAction::Continue
    }

    pub fn best(&self) -> Option<(usize, f64)> {
        self.best_epoch.map(|e| (e, self.best))
    }

    pub fn stopped_epoch(&self) -> Option<usize> {
        self.stopped_epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lr_reduced_after_patience() {
        let mut cb = ReduceLrOnPlateau::new(0.5, 2, 1e-6);
        assert_eq!(cb.on_epoch_end(0, 1.0, 0.002), None);
        assert_eq!(cb.on_epoch_end(1, 1.0, 0.002), None);
        assert_eq!(cb.on_epoch_end(2, 1.0, 0.002), Some(0.001));
        // counter reset after reducing
        assert_eq!(cb.on_epoch_end(3, 1.0, 0.001), None);
        assert_eq!(cb.on_epoch_end(4, 1.0, 0.001), Some(0.0005));
    }

    #[test]
    fn tiny_improvement_counts_as_plateau() {
        let mut cb = ReduceLrOnPlateau::new(0.5, 1, 1e-6);
        cb.on_epoch_end(0, 1.0, 0.01);
        assert_eq!(cb.on_epoch_end(1, 0.99995, 0.01), Some(0.005));
    }

    #[test]
    fn lr_never_below_minimum() {
        let mut cb = ReduceLrOnPlateau::new(0.5, 1, 1e-6);
        cb.on_epoch_end(0, 1.0, 1.5e-6);
        assert_eq!(cb.on_epoch_end(1, 2.0, 1.5e-6), Some(1e-6));
        assert_eq!(cb.on_epoch_end(2, 2.0, 1e-6), None);
    }

    #[test]
    fn early_stopping_tracks_best_epoch() {
        let mut cb = EarlyStopping::new(3);
        assert_eq!(cb.on_epoch_end(0, 0.9), EarlyStoppingAction::Improved);
        assert_eq!(cb.on_epoch_end(1, 0.5), EarlyStoppingAction::Improved);
        assert_eq!(cb.on_epoch_end(2, 0.6), EarlyStoppingAction::Continue);
        assert_eq!(cb.on_epoch_end(3, 0.5), EarlyStoppingAction::Continue);
        assert_eq!(cb.on_epoch_end(4, 0.7), EarlyStoppingAction::Stop);
        assert_eq!(cb.best(), Some((1, 0.5)));
        assert_eq!(cb.stopped_epoch(), Some(4));
    }

    #[test]
    fn improvement_resets_patience() {
        let mut cb = EarlyStopping::new(2);
        cb.on_epoch_end(0, 1.0);
        assert_eq!(cb.on_epoch_end(1, 1.1), EarlyStoppingAction::Continue);
        assert_eq!(cb.on_epoch_end(2, 0.8), EarlyStoppingAction::Improved);
        assert_eq!(cb.on_epoch_end(3, 0.9), EarlyStoppingAction::Continue);
        assert_eq!(cb.on_epoch_end(4, 0.9), EarlyStoppingAction::Stop);
    }
}

use std::collections::VecDeque;

/// Bounded FIFO over the most recent admitted speed samples. The published
/// speed is the arithmetic mean of whatever the window currently holds.
#[derive(Debug)]
pub struct SpeedWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl SpeedWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Admits a sample, evicting the oldest once the window is full.
    pub fn push(&mut self, meters_per_sec: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(meters_per_sec);
    }

    /// Mean of the current contents, 0 while the window is empty.
    pub fn mean(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f32>() / self.samples.len() as f32
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_means_zero() {
        let window = SpeedWindow::new(10);
        assert!(window.is_empty());
        assert_eq!(window.mean(), 0.0);
    }

    #[test]
    fn holds_at_most_capacity_most_recent_samples() {
        let mut window = SpeedWindow::new(10);
        for n in 0..7 {
            window.push(n as f32);
        }
        assert_eq!(window.len(), 7);

        for n in 7..25 {
            window.push(n as f32);
        }
        assert_eq!(window.len(), 10);

        // Only the most recent ten remain: 15..=24, mean 19.5.
        assert_eq!(window.mean(), 19.5);
    }

    #[test]
    fn eleven_samples_keep_the_last_ten() {
        let mut window = SpeedWindow::new(10);
        for speed in 5..=15 {
            window.push(speed as f32);
        }
        assert_eq!(window.len(), 10);
        // Window is [6..=15], mean 10.5.
        assert_eq!(window.mean(), 10.5);
    }

    #[test]
    fn mean_tracks_contents() {
        let mut window = SpeedWindow::new(10);
        window.push(2.0);
        assert_eq!(window.mean(), 2.0);
        window.push(4.0);
        assert_eq!(window.mean(), 3.0);

        window.clear();
        assert_eq!(window.mean(), 0.0);
    }
}

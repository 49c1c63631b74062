use std::collections::VecDeque;

use glam::Vec3;

/// Bounded position history. Pushing past capacity drops the oldest sample.
#[derive(Debug, Clone)]
pub struct Trail {
    samples: VecDeque<Vec3>,
    max_len: usize,
}

impl Trail {
    pub fn new(max_len: usize) -> Self {
        let max_len = max_len.max(1);
        Self {
            samples: VecDeque::with_capacity(max_len),
            max_len,
        }
    }

    /// A trail seeded with its first sample.
    pub fn starting_at(max_len: usize, start: Vec3) -> Self {
        let mut trail = Self::new(max_len);
        trail.push(start);
        trail
    }

    pub fn push(&mut self, sample: Vec3) {
        if self.samples.len() == self.max_len {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Vec3> {
        self.samples.iter()
    }

    pub fn newest(&self) -> Option<Vec3> {
        self.samples.back().copied()
    }

    pub fn oldest(&self) -> Option<Vec3> {
        self.samples.front().copied()
    }
}

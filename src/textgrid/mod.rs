//! TextGrid annotation files
//!
//! Praat's time-aligned annotation format: a stack of tiers, each either a
//! sequence of labelled intervals tiling the time axis or a set of labelled
//! points. The pipeline reads and writes the long ("ooTextFile") text form
//! and edits grids in memory: boundary insertion, interval relabelling,
//! window extraction, and merging.

pub mod parse;
pub mod write;

use crate::error::{NormkitError, Result};
use std::path::Path;

const TIME_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct TextGrid {
    pub xmin: f64,
    pub xmax: f64,
    pub tiers: Vec<Tier>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tier {
    Interval(IntervalTier),
    Point(PointTier),
}

impl Tier {
    pub fn name(&self) -> &str {
        match self {
            Tier::Interval(t) => &t.name,
            Tier::Point(t) => &t.name,
        }
    }

    pub fn as_interval(&self) -> Option<&IntervalTier> {
        match self {
            Tier::Interval(t) => Some(t),
            Tier::Point(_) => None,
        }
    }

    pub fn as_interval_mut(&mut self) -> Option<&mut IntervalTier> {
        match self {
            Tier::Interval(t) => Some(t),
            Tier::Point(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalTier {
    pub name: String,
    pub intervals: Vec<Interval>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub xmin: f64,
    pub xmax: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointTier {
    pub name: String,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub number: f64,
    pub mark: String,
}

impl IntervalTier {
    /// A tier with one empty interval spanning the whole range.
    pub fn empty<S: Into<String>>(name: S, xmin: f64, xmax: f64) -> Self {
        IntervalTier {
            name: name.into(),
            intervals: vec![Interval {
                xmin,
                xmax,
                text: String::new(),
            }],
        }
    }

    /// Index of the interval containing `time`. The final interval is
    /// closed on the right.
    pub fn interval_at(&self, time: f64) -> Option<usize> {
        let n = self.intervals.len();
        for (i, iv) in self.intervals.iter().enumerate() {
            let closes_right = i + 1 == n;
            if iv.xmin - TIME_EPSILON <= time
                && (time < iv.xmax || (closes_right && time <= iv.xmax + TIME_EPSILON))
            {
                return Some(i);
            }
        }
        None
    }

    /// Split the interval containing `time` in two at that point.
    pub fn insert_boundary(&mut self, time: f64) -> Result<()> {
        let idx = self.interval_at(time).ok_or_else(|| {
            NormkitError::textgrid(format!("Boundary time {time:.4} outside tier '{}'", self.name))
        })?;
        let iv = &self.intervals[idx];
        if (time - iv.xmin).abs() < TIME_EPSILON || (time - iv.xmax).abs() < TIME_EPSILON {
            return Err(NormkitError::textgrid(format!(
                "Boundary already exists at {time:.4} on tier '{}'",
                self.name
            )));
        }

        let right = Interval {
            xmin: time,
            xmax: iv.xmax,
            text: iv.text.clone(),
        };
        self.intervals[idx].xmax = time;
        self.intervals.insert(idx + 1, right);
        Ok(())
    }
}

impl TextGrid {
    pub fn new(xmin: f64, xmax: f64) -> Self {
        TextGrid {
            xmin,
            xmax,
            tiers: Vec::new(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            NormkitError::textgrid(format!(
                "Cannot read {}: {e}",
                path.as_ref().display()
            ))
        })?;
        parse::parse(&content)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path.as_ref(), write::render(self)).map_err(|e| {
            NormkitError::textgrid(format!(
                "Cannot write {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Ok(())
    }

    /// Insert an empty interval tier at a 1-based position.
    pub fn insert_interval_tier<S: Into<String>>(&mut self, position: usize, name: S) {
        let tier = Tier::Interval(IntervalTier::empty(name, self.xmin, self.xmax));
        let idx = position.saturating_sub(1).min(self.tiers.len());
        self.tiers.insert(idx, tier);
    }

    /// Insert an empty point tier at a 1-based position.
    pub fn insert_point_tier<S: Into<String>>(&mut self, position: usize, name: S) {
        let tier = Tier::Point(PointTier {
            name: name.into(),
            points: Vec::new(),
        });
        let idx = position.saturating_sub(1).min(self.tiers.len());
        self.tiers.insert(idx, tier);
    }

    /// Interval tier at a 1-based index.
    pub fn interval_tier(&self, number: usize) -> Result<&IntervalTier> {
        self.tiers
            .get(number.wrapping_sub(1))
            .and_then(Tier::as_interval)
            .ok_or_else(|| NormkitError::textgrid(format!("No interval tier {number}")))
    }

    pub fn interval_tier_mut(&mut self, number: usize) -> Result<&mut IntervalTier> {
        self.tiers
            .get_mut(number.wrapping_sub(1))
            .and_then(Tier::as_interval_mut)
            .ok_or_else(|| NormkitError::textgrid(format!("No interval tier {number}")))
    }

    /// Label of the interval containing `time` on a 1-based tier.
    pub fn label_at(&self, tier: usize, time: f64) -> Result<&str> {
        let t = self.interval_tier(tier)?;
        let idx = t.interval_at(time).ok_or_else(|| {
            NormkitError::textgrid(format!("Time {time:.4} outside tier {tier}"))
        })?;
        Ok(&t.intervals[idx].text)
    }

    /// Cut out a time window as a new grid rebased to start at 0.
    ///
    /// Interval tiers are clipped to the window; point tiers keep the
    /// points falling inside it.
    pub fn extract_window(&self, start: f64, end: f64) -> Result<TextGrid> {
        if end <= start {
            return Err(NormkitError::textgrid(format!(
                "Extraction window is empty: {start:.3}..{end:.3}"
            )));
        }

        let mut out = TextGrid::new(0.0, end - start);
        for tier in &self.tiers {
            match tier {
                Tier::Interval(t) => {
                    let mut intervals: Vec<Interval> = t
                        .intervals
                        .iter()
                        .filter(|iv| iv.xmax > start + TIME_EPSILON && iv.xmin < end - TIME_EPSILON)
                        .map(|iv| Interval {
                            xmin: (iv.xmin.max(start) - start).max(0.0),
                            xmax: iv.xmax.min(end) - start,
                            text: iv.text.clone(),
                        })
                        .collect();
                    if intervals.is_empty() {
                        intervals.push(Interval {
                            xmin: 0.0,
                            xmax: end - start,
                            text: String::new(),
                        });
                    }
                    out.tiers.push(Tier::Interval(IntervalTier {
                        name: t.name.clone(),
                        intervals,
                    }));
                }
                Tier::Point(t) => {
                    let points = t
                        .points
                        .iter()
                        .filter(|p| p.number >= start && p.number <= end)
                        .map(|p| Point {
                            number: p.number - start,
                            mark: p.mark.clone(),
                        })
                        .collect();
                    out.tiers.push(Tier::Point(PointTier {
                        name: t.name.clone(),
                        points,
                    }));
                }
            }
        }
        Ok(out)
    }

    /// Stack the tiers of several grids over the same time range.
    pub fn merge(grids: &[&TextGrid]) -> Result<TextGrid> {
        let first = grids
            .first()
            .ok_or_else(|| NormkitError::textgrid("Nothing to merge"))?;
        let mut out = TextGrid::new(first.xmin, first.xmax);
        for grid in grids {
            if (grid.duration() - first.duration()).abs() > 0.01 {
                return Err(NormkitError::textgrid(format!(
                    "Cannot merge grids of different durations: {:.3} vs {:.3}",
                    grid.duration(),
                    first.duration()
                )));
            }
            out.tiers.extend(grid.tiers.iter().cloned());
        }
        Ok(out)
    }

    /// A single-tier grid with one labelled interval per concatenated piece,
    /// the recoverable counterpart of an audio concatenation.
    pub fn recovered<S: AsRef<str>>(tier_name: &str, pieces: &[(S, f64)]) -> TextGrid {
        let total: f64 = pieces.iter().map(|(_, d)| d).sum();
        let mut intervals = Vec::with_capacity(pieces.len());
        let mut cursor = 0.0;
        for (label, duration) in pieces {
            intervals.push(Interval {
                xmin: cursor,
                xmax: cursor + duration,
                text: label.as_ref().to_string(),
            });
            cursor += duration;
        }

        TextGrid {
            xmin: 0.0,
            xmax: total,
            tiers: vec![Tier::Interval(IntervalTier {
                name: tier_name.to_string(),
                intervals,
            })],
        }
    }
}

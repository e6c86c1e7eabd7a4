//! Rolling per-region observables and occupation statistics.
//!
//! Region 0 always covers the whole box. Regions added after it form a partition whose
//! occupation drives the microstate entropy and the multinomial probability series.

use crate::core::geometry::Rect;
use crate::core::particle::Particle;
use std::collections::VecDeque;

/// Time series sampled once per frame for one region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionSeries {
    pub time: VecDeque<f64>,
    pub count: VecDeque<f64>,
    pub energy: VecDeque<f64>,
    pub temperature: VecDeque<f64>,
    pub pressure: VecDeque<f64>,
    pub virial_pressure: VecDeque<f64>,
}

impl RegionSeries {
    fn clear(&mut self) {
        self.time.clear();
        self.count.clear();
        self.energy.clear();
        self.temperature.clear();
        self.pressure.clear();
        self.virial_pressure.clear();
    }

    fn pop_front(&mut self) {
        self.time.pop_front();
        self.count.pop_front();
        self.energy.pop_front();
        self.temperature.pop_front();
        self.pressure.pop_front();
        self.virial_pressure.pop_front();
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Instantaneous observables of the particles inside one region.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegionSample {
    pub count: usize,
    pub energy: f64,
    pub temperature: f64,
    pub pressure: f64,
    pub virial_pressure: f64,
}

impl RegionSample {
    pub fn collect(bounds: &Rect, particles: &[Particle]) -> Self {
        let mut count = 0usize;
        let mut energy = 0.0;
        let mut kinetic = 0.0;
        let mut pressure = 0.0;
        let mut virial = 0.0;
        for p in particles.iter().filter(|p| bounds.contains_point(&p.position)) {
            count += 1;
            energy += p.total_energy();
            kinetic += p.kinetic_energy;
            pressure += p.pressure;
            virial += p.virial;
        }
        let temperature = if count > 0 { kinetic / count as f64 } else { 0.0 };
        let area = bounds.area();
        let virial_pressure = if area > 0.0 {
            (0.5 * virial + count as f64 * temperature) / area
        } else {
            0.0
        };
        Self {
            count,
            energy,
            temperature,
            pressure,
            virial_pressure,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub bounds: Rect,
    pub series: RegionSeries,
}

impl Region {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            series: RegionSeries::default(),
        }
    }

    /// Most recent sample, if any.
    pub fn latest(&self) -> Option<RegionSample> {
        let s = &self.series;
        Some(RegionSample {
            count: *s.count.back()? as usize,
            energy: *s.energy.back()?,
            temperature: *s.temperature.back()?,
            pressure: *s.pressure.back()?,
            virial_pressure: *s.virial_pressure.back()?,
        })
    }

    fn push(&mut self, time: f64, sample: &RegionSample) {
        let s = &mut self.series;
        s.time.push_back(time);
        s.count.push_back(sample.count as f64);
        s.energy.push_back(sample.energy);
        s.temperature.push_back(sample.temperature);
        s.pressure.push_back(sample.pressure);
        s.virial_pressure.push_back(sample.virial_pressure);
    }

    fn trim(&mut self, oldest: f64) {
        while self.series.time.front().is_some_and(|&t| t < oldest) {
            self.series.pop_front();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measurements {
    regions: Vec<Region>,
    pub time: VecDeque<f64>,
    pub entropy: VecDeque<f64>,
    pub probability: VecDeque<f64>,
}

impl Measurements {
    pub fn new(whole_box: Rect) -> Self {
        Self {
            regions: vec![Region::new(whole_box)],
            ..Self::default()
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Replace the whole-box region, dropping every partition region.
    pub fn reset(&mut self, whole_box: Rect) {
        self.regions.clear();
        self.regions.push(Region::new(whole_box));
        self.time.clear();
        self.entropy.clear();
        self.probability.clear();
    }

    pub fn set_whole_box(&mut self, whole_box: Rect) {
        match self.regions.first_mut() {
            Some(region) => region.bounds = whole_box,
            None => self.regions.push(Region::new(whole_box)),
        }
    }

    /// Add a partition region; returns its index.
    pub fn add_region(&mut self, bounds: Rect) -> usize {
        self.regions.push(Region::new(bounds));
        self.regions.len() - 1
    }

    pub fn clear_series(&mut self) {
        for region in &mut self.regions {
            region.series.clear();
        }
        self.time.clear();
        self.entropy.clear();
        self.probability.clear();
    }

    /// Regions the occupation statistics run over.
    fn partition(&self) -> &[Region] {
        if self.regions.len() > 1 {
            &self.regions[1..]
        } else {
            &self.regions
        }
    }

    /// Sample every region at `time` and trim samples older than twice `window`.
    pub fn record(&mut self, time: f64, particles: &[Particle], window: f64) {
        let oldest = time - 2.0 * window;
        for region in &mut self.regions {
            let sample = RegionSample::collect(&region.bounds, particles);
            region.push(time, &sample);
            region.trim(oldest);
        }

        let partition = self.partition();
        let counts: Vec<usize> = partition
            .iter()
            .map(|r| r.series.count.back().map_or(0, |&c| c as usize))
            .collect();
        let areas: Vec<f64> = partition.iter().map(|r| r.bounds.area()).collect();
        let entropy = microstate_entropy(&counts);
        let probability = multinomial_probability(&counts, &areas);

        self.time.push_back(time);
        self.entropy.push_back(entropy);
        self.probability.push_back(probability);
        while self.time.front().is_some_and(|&t| t < oldest) {
            self.time.pop_front();
            self.entropy.pop_front();
            self.probability.pop_front();
        }
    }
}

/// Shannon entropy in bits of the occupation fractions `counts / Σcounts`.
pub fn microstate_entropy(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

/// `ln n!`
pub fn ln_factorial(n: usize) -> f64 {
    (2..=n).map(|k| (k as f64).ln()).sum()
}

/// Multinomial probability of observing `counts` when each particle lands in region `k`
/// with probability proportional to `areas[k]`.
pub fn multinomial_probability(counts: &[usize], areas: &[f64]) -> f64 {
    let total_area: f64 = areas.iter().sum();
    if total_area <= 0.0 || counts.len() != areas.len() {
        return 0.0;
    }
    let total: usize = counts.iter().sum();
    let mut log_p = ln_factorial(total);
    for (&c, &area) in counts.iter().zip(areas) {
        log_p -= ln_factorial(c);
        if c > 0 {
            if area <= 0.0 {
                return 0.0;
            }
            log_p += c as f64 * (area / total_area).ln();
        }
    }
    log_p.exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Vec2;
    use crate::error::Result;

    fn particles_at(xs: &[f64]) -> Result<Vec<Particle>> {
        xs.iter().map(|&x| Particle::at(Vec2::new(x, 0.0))).collect()
    }

    #[test]
    fn entropy_bounds_for_two_regions() {
        assert_eq!(microstate_entropy(&[0, 10]), 0.0);
        assert_eq!(microstate_entropy(&[10, 0]), 0.0);
        assert!((microstate_entropy(&[5, 5]) - 1.0).abs() < 1e-12);
        let skewed = microstate_entropy(&[3, 7]);
        assert!(skewed > 0.0 && skewed < 1.0);
        assert_eq!(microstate_entropy(&[]), 0.0);
    }

    #[test]
    fn multinomial_matches_binomial() {
        // 4 particles in two equal halves: P(2, 2) = 6/16.
        let p = multinomial_probability(&[2, 2], &[1.0, 1.0]);
        assert!((p - 0.375).abs() < 1e-12);
        let p = multinomial_probability(&[4, 0], &[1.0, 1.0]);
        assert!((p - 0.0625).abs() < 1e-12);
        assert_eq!(multinomial_probability(&[1], &[0.0]), 0.0);
    }

    #[test]
    fn region_sample_collects_observables() -> Result<()> {
        let mut ps = particles_at(&[-1.0, 1.0, 5.0])?;
        for p in &mut ps {
            p.kinetic_energy = 2.0;
            p.potential_energy = -0.5;
            p.virial = 1.0;
            p.pressure = 0.25;
        }
        let bounds = Rect::from_edges(-2.0, -2.0, 2.0, 2.0);
        let sample = RegionSample::collect(&bounds, &ps);
        assert_eq!(sample.count, 2);
        assert!((sample.energy - 3.0).abs() < 1e-12);
        assert!((sample.temperature - 2.0).abs() < 1e-12);
        assert!((sample.pressure - 0.5).abs() < 1e-12);
        // (Σvirial/2 + N T) / A = (1 + 4) / 16
        assert!((sample.virial_pressure - 5.0 / 16.0).abs() < 1e-12);

        let empty = RegionSample::collect(&Rect::from_edges(10.0, 10.0, 11.0, 11.0), &ps);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.temperature, 0.0);
        Ok(())
    }

    #[test]
    fn record_uses_the_partition_and_trims_old_samples() -> Result<()> {
        let whole = Rect::from_edges(-10.0, -10.0, 10.0, 10.0);
        let mut m = Measurements::new(whole);
        let (left, right) = whole.split_halves();
        m.add_region(left);
        m.add_region(right);
        let ps = particles_at(&[-5.0, -4.0, 3.0, 4.0])?;

        for k in 0..30 {
            m.record(k as f64, &ps, 5.0);
        }
        assert_eq!(m.regions().len(), 3);
        assert_eq!(m.regions()[0].latest().map(|s| s.count), Some(4));
        assert!((m.entropy.back().copied().unwrap_or_default() - 1.0).abs() < 1e-12);
        // Samples older than 2 * window are gone.
        let series = &m.regions()[1].series;
        assert_eq!(series.time.front().copied(), Some(19.0));
        assert_eq!(series.len(), 11);
        assert_eq!(m.time.len(), 11);
        Ok(())
    }

    #[test]
    fn whole_box_alone_has_zero_entropy() -> Result<()> {
        let mut m = Measurements::new(Rect::from_edges(-10.0, -10.0, 10.0, 10.0));
        m.record(0.0, &particles_at(&[0.0, 1.0])?, 1.0);
        assert_eq!(m.entropy.back().copied(), Some(0.0));
        assert_eq!(m.probability.back().copied(), Some(1.0));
        Ok(())
    }
}

//! Pair potentials and the symmetric type-pair interaction table.

use crate::error::{Error, Result};

/// Short-range pair potential between two particle types.
///
/// Both variants share the Lennard-Jones shape `ε((σ/r)^12 − 2(σ/r)^6)` whose minimum
/// sits at `r = σ`; they differ in range and energy offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    /// Purely repulsive core acting only inside `separation`, shifted to zero there.
    Repulsive { strength: f64, separation: f64 },
    /// Attractive well truncated at `cutoff_factor × separation`, shifted to be continuous.
    LennardJones { strength: f64, separation: f64 },
}

impl Default for Interaction {
    fn default() -> Self {
        Interaction::Repulsive {
            strength: 1.0,
            separation: 2.0,
        }
    }
}

/// Energy and virial contributed by one pair at a given separation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairTerms {
    pub energy: f64,
    pub virial: f64,
}

impl Interaction {
    #[inline]
    pub fn strength(&self) -> f64 {
        match *self {
            Interaction::Repulsive { strength, .. } | Interaction::LennardJones { strength, .. } => strength,
        }
    }

    #[inline]
    pub fn separation(&self) -> f64 {
        match *self {
            Interaction::Repulsive { separation, .. }
            | Interaction::LennardJones { separation, .. } => separation,
        }
    }

    /// Distance beyond which the pair contributes nothing.
    #[inline]
    pub fn range(&self, cutoff_factor: f64) -> f64 {
        match *self {
            Interaction::Repulsive { separation, .. } => separation,
            Interaction::LennardJones { separation, .. } => cutoff_factor * separation,
        }
    }

    fn validate(&self) -> Result<()> {
        let (strength, separation) = (self.strength(), self.separation());
        if !strength.is_finite() {
            return Err(Error::Configuration("interaction strength must be finite".into()));
        }
        if !separation.is_finite() || separation <= 0.0 {
            return Err(Error::Configuration(
                "interaction separation must be finite and > 0".into(),
            ));
        }
        Ok(())
    }

    /// Evaluate the pair at squared distance `r_sq`; `None` when out of range.
    ///
    /// The virial is `-r dU/dr`, so the force on the first particle along the
    /// separation vector `r` (pointing at the second) is `-virial / r^2 * r`.
    pub fn evaluate(&self, r_sq: f64, cutoff_factor: f64) -> Option<PairTerms> {
        let strength = self.strength();
        let sep_sq = self.separation() * self.separation();
        let mut energy = 0.0;
        match self {
            Interaction::Repulsive { .. } => {
                if r_sq > sep_sq {
                    return None;
                }
                energy += strength;
            }
            Interaction::LennardJones { .. } => {
                if r_sq > cutoff_factor * cutoff_factor * sep_sq {
                    return None;
                }
                let b2 = 1.0 / (cutoff_factor * cutoff_factor);
                let b6 = b2 * b2 * b2;
                energy -= strength * (b6 - 2.0) * b6;
            }
        }
        let a2 = sep_sq / r_sq;
        let a6 = a2 * a2 * a2;
        energy += strength * (a6 - 2.0) * a6;
        let virial = strength * 12.0 * (a6 - 1.0) * a6;
        Some(PairTerms { energy, virial })
    }
}

/// Symmetric index of the unordered type pair `{a, b}`.
#[inline]
pub fn symmetric_index(a: usize, b: usize) -> usize {
    let (x, y) = if a <= b { (a, b) } else { (b, a) };
    x + y * (y + 1) / 2
}

/// Interactions keyed by unordered type pair. Unset pairs resolve to the default
/// repulsive interaction.
#[derive(Debug, Clone, Default)]
pub struct InteractionTable {
    entries: Vec<Option<Interaction>>,
}

impl InteractionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `interaction` for the pair `{a, b}`.
    pub fn set(&mut self, a: usize, b: usize, interaction: Interaction) -> Result<()> {
        interaction.validate()?;
        let index = symmetric_index(a, b);
        if index >= self.entries.len() {
            self.entries.resize(index + 1, None);
        }
        self.entries[index] = Some(interaction);
        Ok(())
    }

    #[inline]
    pub fn get(&self, a: usize, b: usize) -> Interaction {
        self.entries
            .get(symmetric_index(a, b))
            .copied()
            .flatten()
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    /// Configured interactions (unset pairs excluded).
    pub fn iter(&self) -> impl Iterator<Item = &Interaction> {
        self.entries.iter().flatten()
    }

    /// Smallest and largest configured separation; the default interaction when empty.
    pub fn separation_bounds(&self) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = 0.0_f64;
        for sep in self.iter().map(Interaction::separation) {
            min = min.min(sep);
            max = max.max(sep);
        }
        if min.is_infinite() {
            let sep = Interaction::default().separation();
            return (sep, sep);
        }
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_index_is_symmetric_and_dense() {
        assert_eq!(symmetric_index(0, 0), 0);
        assert_eq!(symmetric_index(0, 1), 1);
        assert_eq!(symmetric_index(1, 1), 2);
        assert_eq!(symmetric_index(2, 0), symmetric_index(0, 2));
        assert_eq!(symmetric_index(0, 2), 3);
    }

    #[test]
    fn table_defaults_to_repulsive() -> Result<()> {
        let mut table = InteractionTable::new();
        assert_eq!(table.get(3, 5), Interaction::default());
        let lj = Interaction::LennardJones {
            strength: 2.0,
            separation: 1.5,
        };
        table.set(1, 0, lj)?;
        assert_eq!(table.get(0, 1), lj);
        assert_eq!(table.get(1, 1), Interaction::default());
        assert_eq!(table.separation_bounds(), (1.5, 1.5));
        Ok(())
    }

    #[test]
    fn malformed_interaction_rejected() {
        let mut table = InteractionTable::new();
        let err = table
            .set(
                0,
                0,
                Interaction::Repulsive {
                    strength: 1.0,
                    separation: 0.0,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn repulsive_vanishes_at_separation() {
        let rep = Interaction::default();
        let at_sep = rep.evaluate(4.0, 2.5).expect("in range");
        assert!(at_sep.energy.abs() < 1e-12);
        assert!(at_sep.virial.abs() < 1e-12);
        assert!(rep.evaluate(4.0001, 2.5).is_none());
        let inside = rep.evaluate(3.0, 2.5).expect("in range");
        assert!(inside.energy > 0.0 && inside.virial > 0.0);
    }

    #[test]
    fn lennard_jones_is_continuous_at_cutoff() {
        let lj = Interaction::LennardJones {
            strength: 1.0,
            separation: 2.0,
        };
        let rc = 2.5 * 2.0;
        let at_cut = lj.evaluate(rc * rc, 2.5).expect("in range");
        assert!(at_cut.energy.abs() < 1e-12);
        assert!(lj.evaluate(rc * rc * 1.0001, 2.5).is_none());
        // Attractive beyond the minimum, repulsive inside it.
        assert!(lj.evaluate(2.5 * 2.5, 2.5).unwrap().virial < 0.0);
        assert!(lj.evaluate(1.8 * 1.8, 2.5).unwrap().virial > 0.0);
    }
}

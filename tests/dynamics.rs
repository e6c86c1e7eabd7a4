use partsim::config::{Boundary, SimConfig};
use partsim::core::scenario::Crystal;
use partsim::core::{Interaction, Particle, Simulation, Vec2};
use partsim::error::{Error, Result};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn periodic(seed: u64) -> SimConfig {
    SimConfig {
        boundary: Boundary::Periodic,
        seed: Some(seed),
        ..SimConfig::default()
    }
}

fn place(sim: &mut Simulation, particle: Particle) -> Result<()> {
    if sim.add_particle(particle) {
        Ok(())
    } else {
        Err(Error::InvalidParam("particle does not fit".into()))
    }
}

/// A bound Lennard-Jones pair oscillates without drifting in energy.
#[test]
fn lennard_jones_pair_conserves_energy_and_momentum() -> Result<()> {
    init_logging();
    let mut sim = Simulation::new(periodic(1), |sim: &mut Simulation| -> Result<()> {
        sim.set_interaction(
            0,
            0,
            Interaction::LennardJones {
                strength: 1.0,
                separation: 2.0,
            },
        )?;
        place(sim, Particle::at(Vec2::new(-1.2, 0.0))?)?;
        place(sim, Particle::at(Vec2::new(1.2, 0.0))?)?;
        Ok(())
    })?;

    let e0 = sim.total_energy();
    assert!(e0 < 0.0, "the pair starts inside the well, got E = {e0}");

    let mut closest = f64::INFINITY;
    for k in 1..=200 {
        sim.advance_to(k as f64 * 0.1)?;
        let ps = sim.particles();
        closest = closest.min((ps[1].position - ps[0].position).norm());
        let drift = (sim.total_energy() - e0).abs();
        assert!(drift < 1e-2, "energy drifted by {drift} at t = {}", sim.time());
        assert!(sim.total_momentum().norm() < 1e-9);
    }
    assert!(closest < 2.2, "the pair never fell into the well (closest {closest})");
    Ok(())
}

/// Two repulsive discs meet head-on and come back out with their speeds intact.
#[test]
fn repulsive_head_on_bounce() -> Result<()> {
    init_logging();
    let config = SimConfig {
        seed: Some(2),
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config, |sim: &mut Simulation| -> Result<()> {
        place(sim, Particle::new(Vec2::new(-3.0, 0.0), Vec2::new(1.0, 0.0), 1.0, 1.0)?)?;
        place(sim, Particle::new(Vec2::new(3.0, 0.0), Vec2::new(-1.0, 0.0), 1.0, 1.0)?)?;
        Ok(())
    })?;
    assert_eq!(sim.walls().len(), 4);

    sim.advance_to(6.0)?;
    let ps = sim.particles();
    assert!((ps[0].velocity.x + 1.0).abs() < 1e-2, "left disc velocity {:?}", ps[0].velocity);
    assert!((ps[1].velocity.x - 1.0).abs() < 1e-2, "right disc velocity {:?}", ps[1].velocity);
    assert!(ps[0].velocity.y.abs() < 1e-12);
    assert!(ps[0].position.x < -3.0 && ps[1].position.x > 3.0);
    assert!((sim.kinetic_energy() - 1.0).abs() < 5e-3);
    Ok(())
}

#[test]
fn crystal_holds_together_with_zero_momentum() -> Result<()> {
    init_logging();
    let mut sim = Simulation::new(
        periodic(3),
        Crystal {
            count: 19,
            strength: 1.0,
        },
    )?;
    assert_eq!(sim.num_particles(), 19);
    let e0 = sim.total_energy();

    sim.advance_to(5.0)?;
    assert_eq!(sim.num_particles(), 19);
    assert!(sim.total_momentum().norm() < 1e-8);
    assert!((sim.total_energy() - e0).abs() < 1e-2);
    // Lattice sites sit at the well minimum; nothing gains enough energy to leave.
    let center = sim.bounds().center();
    assert!(sim.particles().iter().all(|p| (p.position - center).norm() < 8.0));
    Ok(())
}

#[test]
fn gravity_pulls_down_and_walls_hold() -> Result<()> {
    init_logging();
    let config = SimConfig {
        gravity: 1.0,
        seed: Some(4),
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config, |sim: &mut Simulation| -> Result<()> {
        place(sim, Particle::at(Vec2::new(0.0, 5.0))?)
    })?;
    sim.advance_to(1.0)?;
    let p = &sim.particles()[0];
    // Free fall: y = 5 - t^2 / 2.
    assert!((p.position.y - 4.5).abs() < 1e-6);
    assert!((p.velocity.y + 1.0).abs() < 1e-6);

    sim.advance_to(40.0)?;
    assert_eq!(sim.num_particles(), 1, "the floor should keep the particle in the box");
    assert!(!sim.reset_recommended());
    Ok(())
}

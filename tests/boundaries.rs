use partsim::config::{Boundary, SimConfig};
use partsim::core::{Particle, Simulation, Vec2};
use partsim::error::{Error, Result};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn periodic() -> SimConfig {
    SimConfig {
        boundary: Boundary::Periodic,
        seed: Some(21),
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

#[test]
fn periodic_box_has_no_walls_and_wraps_positions() -> Result<()> {
    init_logging();
    let mut sim = Simulation::new(periodic(), |sim: &mut Simulation| -> Result<()> {
        place(sim, Particle::new(Vec2::new(12.0, 0.0), Vec2::new(1.0, 0.0), 1.0, 1.0)?)
    })?;
    assert!(sim.walls().is_empty());

    sim.advance_to(1.0)?;
    let p = &sim.particles()[0];
    assert!((p.position.x + 12.0).abs() < 1e-9, "expected a wrap to -12, got {:?}", p.position);
    assert!(sim.bounds().contains_point(&p.position));
    assert_eq!(sim.num_particles(), 1);
    Ok(())
}

#[test]
fn pair_force_acts_across_the_seam() -> Result<()> {
    init_logging();
    let sim = Simulation::new(periodic(), |sim: &mut Simulation| -> Result<()> {
        place(sim, Particle::new(Vec2::new(12.0, 0.0), Vec2::zeros(), 0.4, 1.0)?)?;
        place(sim, Particle::new(Vec2::new(-12.0, 0.0), Vec2::zeros(), 0.4, 1.0)?)?;
        Ok(())
    })?;
    // The wrapped separation is 1, inside the repulsive core.
    let ps = sim.particles();
    assert!(ps[0].acceleration.x < 0.0);
    assert!(ps[1].acceleration.x > 0.0);
    assert!((ps[0].acceleration + ps[1].acceleration).norm() < 1e-9);
    assert!(ps[0].potential_energy > 0.0);
    Ok(())
}

#[test]
fn escaped_particle_is_removed_and_flags_a_reset() -> Result<()> {
    init_logging();
    let mut sim = Simulation::new(SimConfig::default(), |sim: &mut Simulation| -> Result<()> {
        place(sim, Particle::at(Vec2::new(-5.0, 0.0))?)?;
        place(sim, Particle::at(Vec2::new(5.0, 0.0))?)?;
        Ok(())
    })?;
    sim.particles_mut()[0].position = Vec2::new(30.0, 0.0);
    sim.step();
    assert_eq!(sim.num_particles(), 1);
    assert_eq!(sim.particles()[0].id, 1);
    assert!(sim.reset_recommended());

    sim.reset()?;
    assert!(!sim.reset_recommended());
    assert_eq!(sim.num_particles(), 2);
    assert_eq!(sim.time(), 0.0);
    Ok(())
}

#[test]
fn diverged_particle_is_removed_quietly_when_reminders_are_off() -> Result<()> {
    init_logging();
    let config = SimConfig {
        remind_on_escape: false,
        ..periodic()
    };
    let mut sim = Simulation::new(config, |sim: &mut Simulation| -> Result<()> {
        place(sim, Particle::at(Vec2::zeros())?)
    })?;
    sim.particles_mut()[0].velocity = Vec2::new(f64::NAN, 0.0);
    sim.step();
    assert_eq!(sim.num_particles(), 0);
    assert!(!sim.reset_recommended());
    Ok(())
}

#[test]
fn interior_wall_blocks_a_soft_particle() -> Result<()> {
    init_logging();
    let mut sim = Simulation::new(SimConfig::default(), |sim: &mut Simulation| -> Result<()> {
        place(sim, Particle::new(Vec2::new(-3.0, 0.0), Vec2::new(1.0, 0.0), 1.0, 1.0)?)
    })?;
    // Border walls were installed at reset; add a divider through the middle.
    sim.add_wall(partsim::core::Wall::new(Vec2::new(0.0, -12.5), Vec2::new(0.0, 12.5))?);
    sim.advance_to(6.0)?;
    let p = &sim.particles()[0];
    assert!(p.position.x < 0.0, "particle crossed the divider: {:?}", p.position);
    assert!(p.velocity.x < 0.0);
    assert!(sim.total_pressure() >= 0.0);
    Ok(())
}

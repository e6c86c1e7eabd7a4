use partsim::config::{Boundary, SimConfig};
use partsim::core::scenario::RandomGas;
use partsim::core::{EmptyScenario, Simulation};
use partsim::error::{Error, Result};
use std::fs;

#[test]
fn simulation_from_json_file() -> Result<()> {
    let path = std::env::temp_dir().join(format!("partsim-config-{}.json", std::process::id()));
    fs::write(
        &path,
        r#"{ "boundary": "periodic", "box_width": 40.0, "box_height": 20.0, "seed": 12 }"#,
    )?;
    let config = SimConfig::from_json_file(&path);
    fs::remove_file(&path)?;
    let config = config?;
    assert_eq!(config.boundary, Boundary::Periodic);
    assert_eq!(config.seed, Some(12));

    let sim = Simulation::new(
        config,
        RandomGas {
            count: 10,
            radius: 1.0,
            mass: 1.0,
        },
    )?;
    assert!((sim.bounds().width() - 40.0).abs() < 1e-12);
    assert!((sim.bounds().height() - 20.0).abs() < 1e-12);
    assert!(sim.walls().is_empty());
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let err = SimConfig::from_json_file("/nonexistent/partsim.json").unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn same_seed_same_gas() -> Result<()> {
    let config = SimConfig {
        seed: Some(99),
        max_initial_speed: 1.0,
        ..SimConfig::default()
    };
    let gas = RandomGas {
        count: 15,
        radius: 1.0,
        mass: 1.0,
    };
    let a = Simulation::new(config.clone(), gas)?;
    let mut b = Simulation::new(config, gas)?;
    let positions = |sim: &Simulation| sim.particles().iter().map(|p| p.position).collect::<Vec<_>>();
    assert_eq!(positions(&a), positions(&b));

    // Reset replays the same scenario from the same seed.
    b.advance_to(1.0)?;
    b.reset()?;
    assert_eq!(positions(&a), positions(&b));
    Ok(())
}

#[test]
fn live_config_changes_last_until_reset() -> Result<()> {
    let mut sim = Simulation::new(SimConfig::default(), EmptyScenario)?;
    sim.config_mut().gravity = 2.0;
    assert_eq!(sim.config().gravity, 2.0);
    sim.reset()?;
    assert_eq!(sim.config().gravity, 0.0);
    Ok(())
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let config = SimConfig {
        box_width: -1.0,
        ..SimConfig::default()
    };
    let err = Simulation::new(config, EmptyScenario).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

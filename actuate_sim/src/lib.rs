//! Simulated vehicle for host runs of the actuation engine.
//!
//! A `ScenarioSource` (input side) and a `SimBus` (transport side) share one
//! `Plant`: frames sent on the bus are latched into the plant, and the next
//! input steps the plant forward and reads the new vehicle state from it.

pub mod bus;
pub mod error;
pub mod plant;
pub mod scenario;

use std::cell::RefCell;
use std::rc::Rc;

pub use actuate_config::Scenario;
pub use bus::SimBus;
pub use error::SimError;
pub use plant::Plant;
pub use scenario::ScenarioSource;

use actuate_core::config::ControllerParams;

/// Plant handle shared between the source and the bus. Single-threaded.
pub type SharedPlant = Rc<RefCell<Plant>>;

/// Source and bus wired to a fresh plant for `scenario`.
pub fn rig(scenario: Scenario, params: &ControllerParams) -> (ScenarioSource, SimBus, SharedPlant) {
    let plant = Rc::new(RefCell::new(Plant::new(
        scenario::initial_speed(scenario),
        &params.long,
        &params.steer,
    )));
    tracing::debug!(?scenario, "simulated vehicle ready");
    (
        ScenarioSource::new(scenario, Rc::clone(&plant)),
        SimBus::new(Rc::clone(&plant)),
        plant,
    )
}

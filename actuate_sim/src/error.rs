use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulated bus is off after {frames} frames")]
    BusOff { frames: u64 },
    #[error("plant diverged at cycle {cycle}: {what}")]
    Diverged { cycle: u64, what: &'static str },
    #[error("plant state already borrowed")]
    Busy,
}

pub type Result<T> = std::result::Result<T, SimError>;

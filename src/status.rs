use num_derive::ToPrimitive;

/// Coarse signal of what the monitor is doing right now. Purely observational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ToPrimitive)]
pub enum Status {
    Ready = 0,
    Processing = 1,
    InFlight = 2,
    Error = 3,
}

pub trait StatusIndicator {
    fn show(&self, status: Status);
}

/// Status indicator that only logs transitions.
#[derive(Debug, Default)]
pub struct LogStatus;

impl StatusIndicator for LogStatus {
    fn show(&self, status: Status) {
        log::debug!("status: {:?}", status);
    }
}

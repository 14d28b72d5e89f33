use super::{required_f64, required_str};
use crate::{ConfigError, ConfigManager};

/// Relative slack so a `stop` that lands on a step boundary survives float rounding.
const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Longest sequence `frequency_sequence` will build.
pub const MAX_FREQUENCIES: usize = 1_000_000;

impl ConfigManager {
    /// Frequencies at which to run, from the `frequency` section.
    ///
    /// `type = "custom"` returns `frequencies` verbatim; any other type
    /// generates `start, start + step, ...` up to and including `stop`.
    pub fn frequencies(&self) -> Result<Vec<f64>, ConfigError> {
        if required_str(self, "frequency/type")? == "custom" {
            return self
                .get_nested("frequency/frequencies")?
                .as_f64_list()
                .ok_or_else(|| {
                    ConfigError::InvalidConfig("frequency/frequencies must be a number list".into())
                });
        }
        let start = required_f64(self, "frequency/start")?;
        let stop = required_f64(self, "frequency/stop")?;
        let step = required_f64(self, "frequency/step")?;
        frequency_sequence(start, stop, step)
    }
}

/// Arithmetic sequence from `start` with `floor((stop - start) / step) + 1` elements.
pub fn frequency_sequence(start: f64, stop: f64, step: f64) -> Result<Vec<f64>, ConfigError> {
    if !(start.is_finite() && stop.is_finite() && step.is_finite()) {
        return Err(ConfigError::InvalidConfig(format!(
            "frequency bounds must be finite (start={start}, stop={stop}, step={step})"
        )));
    }
    if step == 0.0 {
        return Err(ConfigError::InvalidConfig(
            "frequency step must be non-zero".to_string(),
        ));
    }
    let span = (stop - start) / step;
    if !span.is_finite() {
        return Err(ConfigError::InvalidConfig(format!(
            "frequency range from {start} to {stop} by {step} is not representable"
        )));
    }
    if span < 0.0 {
        return Err(ConfigError::InvalidConfig(format!(
            "frequency step {step} never reaches stop {stop} from start {start}"
        )));
    }
    let steps = (span + span.max(1.0) * BOUNDARY_TOLERANCE).floor();
    // Checked as a float so the cast below cannot saturate.
    if steps >= MAX_FREQUENCIES as f64 {
        return Err(ConfigError::InvalidConfig(format!(
            "frequency range from {start} to {stop} by {step} exceeds {MAX_FREQUENCIES} elements"
        )));
    }
    let count = steps as usize + 1;
    Ok((0..count).map(|idx| start + step * idx as f64).collect())
}

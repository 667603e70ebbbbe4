//! Bounded, steppable numeric state for stepper widgets.
//!
//! [`NumericValueModel`] holds one [`Decimal`] value inside a closed range. It
//! serves integer and fractional attributes alike: an integral model
//! truncates toward zero on every assignment.
//!
//! # Stepping
//!
//! A step that stays inside the range is taken as is. A step that leaves the
//! range is clamped to the exceeded bound, or, with wrapping enabled, folded
//! to the opposite bound plus one unit and held to the range. Stepping past
//! the maximum therefore lands on `minimum + 1`, and stepping below the
//! minimum lands on `maximum`.
//!
//! ```
//! use horizon_forms_core::{NumericConfig, NumericValueModel};
//! use rust_decimal::Decimal;
//!
//! let config = NumericConfig::new(Decimal::ZERO, Decimal::from(10)).with_wrapping(true);
//! let mut model = NumericValueModel::new(config, Decimal::from(9)).unwrap();
//!
//! model.increment(2);
//! assert_eq!(model.value(), Decimal::ONE);
//! model.decrement(5);
//! assert_eq!(model.value(), Decimal::from(10));
//! ```

use rust_decimal::Decimal;

use crate::error::{FormError, Result};

/// Configuration of a [`NumericValueModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericConfig {
    pub minimum: Decimal,
    pub maximum: Decimal,
    pub step: Decimal,
    pub integral: bool,
    pub wrapping: bool,
}

impl NumericConfig {
    /// Range `[minimum, maximum]`, step 1, fractional, no wrapping.
    pub fn new(minimum: Decimal, maximum: Decimal) -> Self {
        Self {
            minimum,
            maximum,
            step: Decimal::ONE,
            integral: false,
            wrapping: false,
        }
    }

    /// Set the step amount using builder pattern.
    pub fn with_step(mut self, step: Decimal) -> Self {
        self.step = step;
        self
    }

    /// Truncate values toward zero.
    pub fn with_integral(mut self, integral: bool) -> Self {
        self.integral = integral;
        self
    }

    /// Fold out-of-range steps to the opposite bound.
    pub fn with_wrapping(mut self, wrapping: bool) -> Self {
        self.wrapping = wrapping;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.minimum > self.maximum {
            return Err(FormError::numeric_config(format!(
                "minimum {} exceeds maximum {}",
                self.minimum, self.maximum
            )));
        }
        if self.step <= Decimal::ZERO {
            return Err(FormError::numeric_config(format!(
                "step must be positive, got {}",
                self.step
            )));
        }
        if self.wrapping && self.maximum.is_zero() {
            return Err(FormError::numeric_config(
                "wrapping requires a non-zero maximum",
            ));
        }
        Ok(())
    }
}

/// A numeric value held inside a closed range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericValueModel {
    value: Decimal,
    config: NumericConfig,
}

impl NumericValueModel {
    /// Create a model. An initial value outside the range becomes the minimum.
    ///
    /// Integral models narrow fractional bounds inward to whole numbers.
    pub fn new(config: NumericConfig, initial: Decimal) -> Result<Self> {
        config.validate()?;
        let mut config = config;
        if config.integral {
            config.minimum = config.minimum.ceil();
            config.maximum = config.maximum.floor();
            if config.minimum > config.maximum {
                return Err(FormError::numeric_config(
                    "range holds no whole number",
                ));
            }
        }

        let start = if initial < config.minimum || initial > config.maximum {
            config.minimum
        } else {
            initial
        };
        let mut model = Self {
            value: config.minimum,
            config,
        };
        model.assign(start);
        Ok(model)
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn minimum(&self) -> Decimal {
        self.config.minimum
    }

    pub fn maximum(&self) -> Decimal {
        self.config.maximum
    }

    pub fn step(&self) -> Decimal {
        self.config.step
    }

    pub fn is_integral(&self) -> bool {
        self.config.integral
    }

    pub fn is_wrapping(&self) -> bool {
        self.config.wrapping
    }

    pub fn config(&self) -> &NumericConfig {
        &self.config
    }

    /// Enable or disable wrapping.
    pub fn set_wrapping(&mut self, wrapping: bool) -> Result<()> {
        if wrapping && self.config.maximum.is_zero() {
            return Err(FormError::numeric_config(
                "wrapping requires a non-zero maximum",
            ));
        }
        self.config.wrapping = wrapping;
        Ok(())
    }

    /// Set the value from outside; out-of-range values clamp to the nearest bound.
    pub fn set_value(&mut self, value: Decimal) {
        self.assign(value);
    }

    /// Step up by `steps` increments.
    pub fn increment(&mut self, steps: u32) {
        let candidate = self
            .delta(steps)
            .and_then(|delta| self.value.checked_add(delta))
            .unwrap_or(Decimal::MAX);
        let next = if candidate <= self.config.maximum {
            candidate
        } else if self.config.wrapping {
            self.fold(candidate)
        } else {
            self.config.maximum
        };
        self.assign(next);
    }

    /// Step down by `steps` decrements.
    pub fn decrement(&mut self, steps: u32) {
        let candidate = self
            .delta(steps)
            .and_then(|delta| self.value.checked_sub(delta))
            .unwrap_or(Decimal::MIN);
        let next = if candidate >= self.config.minimum {
            candidate
        } else if self.config.wrapping {
            self.fold(candidate)
        } else {
            self.config.minimum
        };
        self.assign(next);
    }

    /// Steps by a signed amount.
    pub fn step_by(&mut self, steps: i32) {
        if steps >= 0 {
            self.increment(steps.unsigned_abs());
        } else {
            self.decrement(steps.unsigned_abs());
        }
    }

    fn delta(&self, steps: u32) -> Option<Decimal> {
        self.config.step.checked_mul(Decimal::from(steps))
    }

    /// Opposite bound plus one unit.
    fn fold(&self, candidate: Decimal) -> Decimal {
        let bound = if candidate < self.config.minimum {
            self.config.maximum
        } else {
            self.config.minimum
        };
        bound.checked_add(Decimal::ONE).unwrap_or(bound)
    }

    fn assign(&mut self, value: Decimal) {
        let value = if self.config.integral {
            value.trunc()
        } else {
            value
        };
        self.value = value.clamp(self.config.minimum, self.config.maximum);
    }
}

use crate::error::NodeError;
use std::f64::consts::E;
use std::str::FromStr;

/// Curve shape mapping progress `0..=1` onto `0..=1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RampType {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    Exponential,
    Smoothstep,
    Bounce,
}

impl RampType {
    pub const ALL: [Self; 7] = [
        Self::Linear,
        Self::EaseIn,
        Self::EaseOut,
        Self::EaseInOut,
        Self::Exponential,
        Self::Smoothstep,
        Self::Bounce,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseIn => "ease_in",
            Self::EaseOut => "ease_out",
            Self::EaseInOut => "ease_in_out",
            Self::Exponential => "exponential",
            Self::Smoothstep => "smoothstep",
            Self::Bounce => "bounce",
        }
    }

    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Linear => x,
            Self::EaseIn => x * x,
            Self::EaseOut => 1.0 - (1.0 - x) * (1.0 - x),
            Self::EaseInOut | Self::Smoothstep => x * x * (3.0 - 2.0 * x),
            Self::Exponential => (x.exp() - 1.0) / (E - 1.0),
            Self::Bounce => bounce(x),
        }
    }
}

/// Four parabolic segments, the classic ease-out bounce
fn bounce(x: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;

    if x < 1.0 / D1 {
        N1 * x * x
    } else if x < 2.0 / D1 {
        let x = x - 1.5 / D1;
        N1 * x * x + 0.75
    } else if x < 2.5 / D1 {
        let x = x - 2.25 / D1;
        N1 * x * x + 0.9375
    } else {
        let x = x - 2.625 / D1;
        N1 * x * x + 0.984_375
    }
}

impl FromStr for RampType {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|ramp| ramp.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|r| r.name()).collect();
                NodeError::InvalidParameter(format!(
                    "Unknown ramp type: {s}. Must be one of {}",
                    names.join(", ")
                ))
            })
    }
}

/// `FluxReduxFloatRamp`: a value that moves from `start` to `end` over the
/// first `steps_threshold` sampling steps, then holds at `end`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatRamp {
    pub start: f64,
    pub end: f64,
    pub steps_threshold: u32,
    pub ramp_type: RampType,
}

impl Default for FloatRamp {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 1.0,
            steps_threshold: 20,
            ramp_type: RampType::Linear,
        }
    }
}

impl FloatRamp {
    /// Value at zero-based sampling `step`
    #[must_use]
    pub fn value_at(&self, step: u32) -> f64 {
        let current = u64::from(step) + 1;
        if current > u64::from(self.steps_threshold) {
            return self.end;
        }

        #[allow(clippy::cast_precision_loss)]
        let progress = current as f64 / f64::from(self.steps_threshold);
        self.start + (self.end - self.start) * self.ramp_type.apply(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONOTONIC: [RampType; 6] = [
        RampType::Linear,
        RampType::EaseIn,
        RampType::EaseOut,
        RampType::EaseInOut,
        RampType::Exponential,
        RampType::Smoothstep,
    ];

    #[test]
    fn test_curves_hit_endpoints() {
        for ramp in RampType::ALL {
            assert!(ramp.apply(0.0).abs() < 1e-12, "{ramp:?} at 0");
            assert!((ramp.apply(1.0) - 1.0).abs() < 1e-12, "{ramp:?} at 1");
        }
    }

    #[test]
    fn test_monotonic_spot_check() {
        for ramp in MONOTONIC {
            let a = ramp.apply(0.25);
            let b = ramp.apply(0.5);
            let c = ramp.apply(0.75);
            assert!(a < b && b < c, "{ramp:?}");
        }
    }

    #[test]
    fn test_first_step_strictly_between() {
        for ramp_type in MONOTONIC {
            let ramp = FloatRamp {
                start: 2.0,
                end: 10.0,
                steps_threshold: 20,
                ramp_type,
            };
            let value = ramp.value_at(0);
            assert!(value > 2.0 && value < 10.0, "{ramp_type:?} gave {value}");
        }
    }

    #[test]
    fn test_past_threshold_is_end() {
        for ramp_type in RampType::ALL {
            let ramp = FloatRamp {
                start: -1.0,
                end: 0.3,
                steps_threshold: 8,
                ramp_type,
            };
            assert_eq!(ramp.value_at(8), 0.3);
            assert_eq!(ramp.value_at(500), 0.3);
        }
    }

    #[test]
    fn test_linear_progress() {
        let ramp = FloatRamp {
            start: 0.0,
            end: 1.0,
            steps_threshold: 4,
            ramp_type: RampType::Linear,
        };
        let values: Vec<f64> = (0..4).map(|step| ramp.value_at(step)).collect();
        assert_eq!(values, vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_zero_threshold_holds_end() {
        let ramp = FloatRamp {
            steps_threshold: 0,
            ..FloatRamp::default()
        };
        assert_eq!(ramp.value_at(0), 1.0);
    }

    #[test]
    fn test_bounce_segments() {
        assert!((bounce(0.5) - 0.765_625).abs() < 1e-9);
        assert!(bounce(0.3) < bounce(0.36));
    }

    #[test]
    fn test_parse() {
        assert_eq!("ease_in_out".parse::<RampType>().unwrap(), RampType::EaseInOut);
        assert_eq!("Ease-Out".parse::<RampType>().unwrap(), RampType::EaseOut);
        assert!("elastic".parse::<RampType>().is_err());
    }
}

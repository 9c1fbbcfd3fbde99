//! Activation curves that can be plotted next to formulas.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sigmoid inputs are clamped to this magnitude before `exp`.
const SIGMOID_CLAMP: f64 = 500.0;

const LEAKY_SLOPE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Linear,
    Relu,
    LeakyRelu,
    Sigmoid,
    Tanh,
    Swish,
    Gelu,
    Gcu,
}

impl Activation {
    pub const ALL: [Activation; 8] = [
        Activation::Linear,
        Activation::Relu,
        Activation::LeakyRelu,
        Activation::Sigmoid,
        Activation::Tanh,
        Activation::Swish,
        Activation::Gelu,
        Activation::Gcu,
    ];

    /// Applies the activation to `x`.
    ///
    /// # Examples
    ///
    /// ```
    /// use plotscope::domain::Activation;
    ///
    /// assert_eq!(Activation::Relu.apply(-3.0), 0.0);
    /// assert_eq!(Activation::Sigmoid.apply(0.0), 0.5);
    /// assert_eq!(Activation::Sigmoid.apply(-1e308), 0.0);
    /// ```
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Linear => x,
            Activation::Relu => x.max(0.0),
            Activation::LeakyRelu => {
                if x > 0.0 {
                    x
                } else {
                    LEAKY_SLOPE * x
                }
            }
            Activation::Sigmoid => {
                let clamped = x.clamp(-SIGMOID_CLAMP, SIGMOID_CLAMP);
                1.0 / (1.0 + (-clamped).exp())
            }
            Activation::Tanh => x.tanh(),
            Activation::Swish => x / (1.0 + (-x).exp()),
            Activation::Gelu => {
                let inner = (2.0 / PI).sqrt() * (x + 0.044715 * x.powi(3));
                0.5 * x * (1.0 + inner.tanh())
            }
            Activation::Gcu => x * x.cos(),
        }
    }

    /// The name used on the command line and in serialized data.
    pub fn name(self) -> &'static str {
        match self {
            Activation::Linear => "linear",
            Activation::Relu => "relu",
            Activation::LeakyRelu => "leaky_relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Swish => "swish",
            Activation::Gelu => "gelu",
            Activation::Gcu => "gcu",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Activation::Linear => "Linear",
            Activation::Relu => "ReLU",
            Activation::LeakyRelu => "Leaky ReLU",
            Activation::Sigmoid => "Sigmoid",
            Activation::Tanh => "Tanh",
            Activation::Swish => "Swish",
            Activation::Gelu => "GELU",
            Activation::Gcu => "GCU (x·cos(x))",
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Activation::ALL
            .into_iter()
            .find(|activation| activation.name() == wanted)
            .ok_or_else(|| format!("unknown activation '{s}'"))
    }
}

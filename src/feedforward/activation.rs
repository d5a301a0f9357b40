use std::fmt;

/// Activation function applied to the output of every layer except the raw input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivationFunction {
    /// Identity: pre-activation sums are passed through unchanged.
    None,
    /// Logistic sigmoid, see `Sigmoid`.
    Sigmoid,
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ActivationFunction::None => write!(f, "none"),
            ActivationFunction::Sigmoid => write!(f, "sigmoid"),
        }
    }
}

/// Scalar transform together with its derivative.
pub trait Activation: Send + Sync {
    fn calculate(&self, input: f64) -> f64;
    fn calculate_derivative(&self, input: f64) -> f64;
}

/// Sigmoid function.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sigmoid;

impl Activation for Sigmoid {
    /// Implements the formula:
    /// `1 / (1 + exp(-x))`.
    fn calculate(&self, input: f64) -> f64 {
        1.0 / (1.0 + (-input).exp())
    }

    /// Sigmoid derivative, expressed in terms of sigmoid itself.
    /// Implements the formula:
    /// `s * (1 - s)`, where `s = sigmoid(x)`.
    fn calculate_derivative(&self, input: f64) -> f64 {
        let s = self.calculate(input);
        s * (1.0 - s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_of_zero_is_half() {
        assert_eq!(Sigmoid.calculate(0.0), 0.5);
        assert_eq!(Sigmoid.calculate_derivative(0.0), 0.25);
    }

    #[test]
    fn sigmoid_known_values() {
        assert!((Sigmoid.calculate(1.0) - 0.7310585786300049).abs() < 1e-15);
        assert!((Sigmoid.calculate(-1.0) - 0.2689414213699951).abs() < 1e-15);
        assert_eq!(Sigmoid.calculate(1000.0), 1.0);
        assert_eq!(Sigmoid.calculate(-1000.0), 0.0);
    }

    #[test]
    fn derivative_matches_sigmoid_product() {
        for &x in &[-30.0, -4.5, -1.0, -0.25, 0.0, 0.3, 2.0, 7.75, 30.0] {
            let s = Sigmoid.calculate(x);
            assert_eq!(Sigmoid.calculate_derivative(x), s * (1.0 - s));
        }
    }

    #[test]
    fn derivative_is_symmetric_and_bounded() {
        for i in -50..=50 {
            let x = i as f64 * 0.2;
            let d = Sigmoid.calculate_derivative(x);
            assert!(d > 0.0 && d <= 0.25);
            assert!((d - Sigmoid.calculate_derivative(-x)).abs() < 1e-15);
        }
    }
}

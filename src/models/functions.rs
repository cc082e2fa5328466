//! Probability density functions and relational (piecewise-linear) curves.

use serde::Serialize;

use crate::store::{Entity, Id};

/// One `(x, y)` point of a relational function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A named piecewise-linear curve: ordered `(x, y)` points, insertion order
/// ascending in x for histogram-derived curves.
///
/// Identity is (name, point-sequence), never name alone: a same-named curve
/// with different points is re-keyed under a generated name by the importer
/// rather than silently merged.
#[derive(Debug, Clone, Serialize)]
pub struct RelationalFunction {
    pub name: String,
    pub points: Vec<Point>,
}

/// The closed set of probability-distribution shapes the legacy format can
/// express. Each variant owns exactly the parameters its kind needs; an
/// unknown tag in the XML is a hard parse failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PdfShape {
    Beta { alpha: f64, alpha2: f64, min: f64, max: f64 },
    BetaPert { min: f64, mode: f64, max: f64 },
    Binomial { n: f64, p: f64 },
    DiscreteUniform { min: f64, max: f64 },
    Exponential { mean: f64 },
    Gamma { alpha: f64, beta: f64 },
    Gaussian { mean: f64, std_dev: f64 },
    /// Binned data; the curve holds one point per bin plus a trailing
    /// zero-probability point at the last upper bound.
    Histogram { graph: Id<RelationalFunction> },
    Hypergeometric { n: f64, d: f64, m: f64 },
    InverseGaussian { mean: f64, shape: f64 },
    Logistic { location: f64, scale: f64 },
    LogLogistic { location: f64, scale: f64, shape: f64 },
    /// Stored as mean/std-dev, converted from the zeta/sigma form the XML
    /// uses.
    Lognormal { mean: f64, std_dev: f64 },
    NegativeBinomial { s: f64, p: f64 },
    Pareto { theta: f64, a: f64 },
    Pearson5 { alpha: f64, beta: f64 },
    Piecewise { graph: Id<RelationalFunction> },
    /// A fixed value.
    Point { value: f64 },
    Poisson { mean: f64 },
    Triangular { min: f64, mode: f64, max: f64 },
    Uniform { min: f64, max: f64 },
    Weibull { alpha: f64, beta: f64 },
}

/// A named probability distribution. The natural key is the shape (its full
/// parameter set); names accumulate when identical shapes are merged.
#[derive(Debug, Clone, Serialize)]
pub struct ProbabilityFunction {
    pub name: String,
    pub shape: PdfShape,
}

impl Entity for ProbabilityFunction {
    type Key = PdfShape;

    fn key(&self) -> PdfShape {
        self.shape.clone()
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

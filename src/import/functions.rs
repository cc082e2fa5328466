//! Parsers for probability density functions and relational charts.
//!
//! Both element forms come in an old unnamed style and a new wrapped style
//! carrying a `name` attribute; unnamed inputs draw names from a
//! monotonically increasing generator (`PDF1`, `PDF2`, ... / `Rel1`, ...).

use crate::error::{ParseError, Result};
use crate::models::{PdfShape, Point, ProbabilityFunction, RelationalFunction};
use crate::store::{Id, ScenarioStore};
use crate::xml::Element;

/// Generator for names of unnamed functions.
pub struct NameSequence {
    prefix: &'static str,
    next: u32,
}

impl NameSequence {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, next: 1 }
    }

    pub fn next_name(&mut self) -> String {
        let n = self.next;
        self.next += 1;
        format!("{}{}", self.prefix, n)
    }
}

/// Parse the probability density function enclosed in `element` and merge it
/// into the store under its resolved name.
///
/// `element` is the enclosing parameter element (e.g. `<latent-period>`);
/// its single child is either a named `<probability-density-function>`
/// wrapper or the distribution element itself.
pub fn read_pdf(
    store: &mut ScenarioStore,
    element: &Element,
    names: &mut NameSequence,
) -> Result<Id<ProbabilityFunction>> {
    let mut node = element.first_child().ok_or_else(|| ParseError::MissingValue {
        tag: "probability-density-function".to_string(),
        element: element.tag.clone(),
    })?;

    let name = if node.tag == "probability-density-function" {
        let name = node
            .attr("name")
            .map(str::to_string)
            .unwrap_or_else(|| names.next_name());
        node = node.first_child().ok_or_else(|| ParseError::MissingValue {
            tag: "probability-density-function".to_string(),
            element: element.tag.clone(),
        })?;
        name
    } else {
        names.next_name()
    };

    let shape = match node.tag.as_str() {
        "beta" => PdfShape::Beta {
            alpha: node.required_f64("alpha")?,
            alpha2: node.required_f64("beta")?,
            min: node.required_f64("location")?,
            max: node.required_f64("scale")?,
        },
        "beta-pert" => PdfShape::BetaPert {
            min: node.required_f64("min")?,
            mode: node.required_f64("mode")?,
            max: node.required_f64("max")?,
        },
        "binomial" => PdfShape::Binomial {
            n: node.required_f64("n")?,
            p: node.required_f64("p")?,
        },
        "discrete-uniform" => PdfShape::DiscreteUniform {
            min: node.required_f64("min")?,
            max: node.required_f64("max")?,
        },
        "exponential" => PdfShape::Exponential {
            mean: node.required_f64("mean")?,
        },
        "gamma" => PdfShape::Gamma {
            alpha: node.required_f64("alpha")?,
            beta: node.required_f64("beta")?,
        },
        "gaussian" => PdfShape::Gaussian {
            mean: node.required_f64("mean")?,
            std_dev: node.required_f64("stddev")?,
        },
        "histogram" => PdfShape::Histogram {
            graph: read_histogram(store, node, &name)?,
        },
        "hypergeometric" => PdfShape::Hypergeometric {
            n: node.required_f64("n")?,
            d: node.required_f64("d")?,
            m: node.required_f64("m")?,
        },
        "inverse-gaussian" => PdfShape::InverseGaussian {
            mean: node.required_f64("mu")?,
            shape: node.required_f64("lambda")?,
        },
        "logistic" => PdfShape::Logistic {
            location: node.required_f64("location")?,
            scale: node.required_f64("scale")?,
        },
        "loglogistic" => PdfShape::LogLogistic {
            location: node.required_f64("location")?,
            scale: node.required_f64("scale")?,
            shape: node.required_f64("shape")?,
        },
        "lognormal" => {
            // The XML carries zeta and sigma as in the GNU Scientific
            // Library docs; stored form is mean and standard deviation.
            let zeta = node.required_f64("zeta")?;
            let sigma = node.required_f64("sigma")?;
            let sigma_sq = sigma * sigma;
            let variance = (2.0 * zeta + sigma_sq).exp() * (sigma_sq.exp() - 1.0);
            PdfShape::Lognormal {
                mean: (zeta + sigma_sq / 2.0).exp(),
                std_dev: variance.sqrt(),
            }
        }
        "negative-binomial" => PdfShape::NegativeBinomial {
            s: node.required_f64("s")?,
            p: node.required_f64("p")?,
        },
        "pareto" => PdfShape::Pareto {
            theta: node.required_f64("theta")?,
            a: node.required_f64("a")?,
        },
        "pearson5" => PdfShape::Pearson5 {
            alpha: node.required_f64("alpha")?,
            beta: node.required_f64("beta")?,
        },
        "piecewise" => PdfShape::Piecewise {
            graph: read_piecewise(store, node, &name)?,
        },
        "point" => PdfShape::Point {
            value: node.f64_value()?,
        },
        "poisson" => PdfShape::Poisson {
            mean: node.required_f64("mean")?,
        },
        "triangular" => PdfShape::Triangular {
            min: node.required_f64("a")?,
            mode: node.required_f64("c")?,
            max: node.required_f64("b")?,
        },
        "uniform" => PdfShape::Uniform {
            min: node.required_f64("a")?,
            max: node.required_f64("b")?,
        },
        "weibull" => PdfShape::Weibull {
            alpha: node.required_f64("alpha")?,
            beta: node.required_f64("beta")?,
        },
        other => return Err(ParseError::UnknownPdfKind(other.to_string())),
    };

    let (id, _) = store.pdfs.merge_create(
        Some(&name),
        ProbabilityFunction {
            name: name.clone(),
            shape,
        },
    );
    Ok(id)
}

/// Build the relational curve backing a histogram PDF: one point per bin at
/// `(x0, p)` plus a trailing zero-probability point at the last upper bound.
/// Bins must be contiguous.
fn read_histogram(
    store: &mut ScenarioStore,
    node: &Element,
    name: &str,
) -> Result<Id<RelationalFunction>> {
    let x0s = collect_values(node, "x0")?;
    let x1s = collect_values(node, "x1")?;
    let ps = collect_values(node, "p")?;
    if x0s.is_empty() {
        return Err(ParseError::MissingValue {
            tag: "x0".to_string(),
            element: node.tag.clone(),
        });
    }
    // The upper x-bound of each bin must equal the lower x-bound of the next.
    let contiguous = x0s.len() == x1s.len()
        && ps.len() == x0s.len()
        && x0s[1..] == x1s[..x1s.len() - 1];
    if !contiguous {
        return Err(ParseError::CorruptHistogram(name.to_string()));
    }

    let mut points: Vec<Point> = x0s
        .iter()
        .zip(&ps)
        .map(|(&x, &y)| Point { x, y })
        .collect();
    points.push(Point {
        x: x1s[x1s.len() - 1],
        y: 0.0,
    });
    Ok(store.relational_functions.insert(RelationalFunction {
        name: format!("{name} histogram data"),
        points,
    }))
}

/// Build the relational curve backing a piecewise PDF. Two historical
/// sub-formats exist: the new style nests `<x>`/`<p>` inside each `<value>`,
/// the old style is a flat alternating `<value>, <p>` sequence. Presence of
/// any `<x>` descendant selects the new style.
fn read_piecewise(
    store: &mut ScenarioStore,
    node: &Element,
    name: &str,
) -> Result<Id<RelationalFunction>> {
    let mut points = Vec::new();
    if node.has_deep("x") {
        for value in node.children_named("value") {
            points.push(Point {
                x: value.required_f64("x")?,
                y: value.required_f64("p")?,
            });
        }
    } else {
        let mut pending_x: Option<f64> = None;
        for child in &node.children {
            let v = child.f64_value()?;
            match pending_x.take() {
                None => pending_x = Some(v),
                Some(x) => points.push(Point { x, y: v }),
            }
        }
        if pending_x.is_some() {
            return Err(ParseError::MissingValue {
                tag: "p".to_string(),
                element: node.tag.clone(),
            });
        }
    }
    Ok(store.relational_functions.insert(RelationalFunction {
        name: format!("{name} piecewise data"),
        points,
    }))
}

/// Parse the relational chart enclosed in `element`.
///
/// New-style named charts resolve or create by name; a name hit whose points
/// differ from the stored curve is re-keyed under the next generated name
/// rather than mutating the original. Old-style charts (a bare sequence of
/// `<value>` pairs) always create a fresh function under a generated name.
pub fn read_relational(
    store: &mut ScenarioStore,
    element: &Element,
    names: &mut NameSequence,
) -> Result<Id<RelationalFunction>> {
    let Some(first) = element.first_child() else {
        return Err(ParseError::MissingValue {
            tag: "relational-function".to_string(),
            element: element.tag.clone(),
        });
    };

    if first.tag != "relational-function" {
        // Old style: flat x,y,x,y... sequence of <value> elements.
        let values = collect_values(element, "value")?;
        if values.len() % 2 != 0 {
            return Err(ParseError::MissingValue {
                tag: "value".to_string(),
                element: element.tag.clone(),
            });
        }
        let points = values
            .chunks_exact(2)
            .map(|pair| Point {
                x: pair[0],
                y: pair[1],
            })
            .collect();
        return Ok(store.relational_functions.insert(RelationalFunction {
            name: names.next_name(),
            points,
        }));
    }

    let name = first
        .attr("name")
        .map(str::to_string)
        .unwrap_or_else(|| names.next_name());
    let mut points = Vec::new();
    for pair in first.children_named("value") {
        points.push(Point {
            x: pair.required_f64("x")?,
            y: pair.required_f64("y")?,
        });
    }

    match store.relational_functions.find(|f| f.name == name) {
        None => Ok(store
            .relational_functions
            .insert(RelationalFunction { name, points })),
        Some(id) => {
            // A chart of this name was already imported. Compare its points
            // in ascending-x order; any mismatch gets a fresh function under
            // a generated name, never an overwrite of the original.
            let mut existing = store.relational_functions.get(id).points.clone();
            existing.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
            if existing == points {
                Ok(id)
            } else {
                Ok(store.relational_functions.insert(RelationalFunction {
                    name: names.next_name(),
                    points,
                }))
            }
        }
    }
}

/// Numeric values of every `tag` descendant, in document order.
fn collect_values(node: &Element, tag: &str) -> Result<Vec<f64>> {
    node.deep_find_all(tag).map(Element::f64_value).collect()
}

//! Error handling for the NAADSM importer.

/// Errors raised while parsing or assembling one of the two scenario files.
///
/// Only two defects are ever recovered from, both inside the text recovery
/// reader: the missing `xdf` namespace declaration and an ambiguous text
/// encoding. Everything else aborts the import.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the underlying XML reader
    #[error("XML parse error: {0}")]
    Xml(String),

    /// A namespace prefix was used without a matching `xmlns:` declaration
    #[error("unbound namespace prefix '{0}'")]
    UnboundPrefix(String),

    /// None of the candidate text encodings could decode the file
    #[error("cannot decode file text as utf-16, utf-8 or us-ascii")]
    Encoding,

    /// A required sub-element was absent or empty
    #[error("missing required value <{tag}> in <{element}>")]
    MissingValue { tag: String, element: String },

    /// Element text that should have been numeric was not
    #[error("invalid number '{text}' in <{element}>")]
    InvalidNumber { text: String, element: String },

    /// Unrecognized probability density function tag
    #[error("probability density function <{0}> is not implemented")]
    UnknownPdfKind(String),

    /// Malformed attribute value (e.g. contact-type, direction)
    #[error("invalid {attribute} attribute '{value}' on <{element}>")]
    InvalidAttribute {
        attribute: &'static str,
        value: String,
        element: String,
    },

    /// A zone was referenced by name before any zone-model defined it
    #[error("unknown zone '{0}'")]
    UnknownZone(String),

    /// Histogram bins whose upper bound does not meet the next lower bound
    #[error("histogram bins are not contiguous in <{0}>")]
    CorruptHistogram(String),

    /// Production types targeted by ring vaccination but never covered by a
    /// vaccine-model element
    #[error("production types are vaccinated without vaccine effects defined: {0}")]
    VaccineEffectsMissing(String),

    /// The population file uses projected coordinates but no projection was
    /// supplied through the import options
    #[error("population file uses projected coordinates but no projection is available")]
    MissingProjection,
}

/// Top-level import failure, distinguishing which of the two files broke.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(
        "bad population file: {source}. \
         Please export a new population XML file from NAADSM 3.2.19"
    )]
    Population {
        #[source]
        source: ParseError,
    },

    #[error(
        "bad parameters file: {source}. \
         Please export a new parameters XML file from NAADSM 3.2.19"
    )]
    Parameters {
        #[source]
        source: ParseError,
    },
}

/// Result type for importer operations
pub type Result<T, E = ParseError> = std::result::Result<T, E>;

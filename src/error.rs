use thiserror::Error;

/// Top-level error type for the Runoff drainage engine.
#[derive(Debug, Error)]
pub enum RunoffError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Solve(#[from] SolveError),
}

/// Errors raised by degenerate or insufficient input geometry.
///
/// These invalidate the whole input and abort before any partial
/// output is produced.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("at least {needed} surface nodes are required, got {got}")]
    InsufficientNodes { needed: usize, got: usize },

    #[error("open edges found: {count} boundary node(s) without exactly 2 incident edges")]
    OpenEdges { count: usize },

    #[error("degenerate loop with {edges} edge(s); a closed loop needs at least 3")]
    DegenerateLoop { edges: usize },

    #[error("boundary edge set contains no closed loops")]
    NoLoops,

    #[error("loop trace exceeded {cap} steps without closing")]
    LoopTraceOverflow { cap: usize },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Errors raised by invalid engine parameters.
///
/// Rejected up front, before any computation starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{parameter} must be positive, got {value}")]
    NonPositive { parameter: &'static str, value: f64 },

    #[error(
        "adaptive threshold multipliers must satisfy min <= nominal <= max, \
         got {min}, {nominal}, {max}"
    )]
    MultiplierOrder { min: f64, nominal: f64, max: f64 },
}

/// Errors raised by the drainage solver.
///
/// Per-node failures (unreachable targets) are not errors; they are
/// recorded in the corresponding [`PathResult`](crate::solver::PathResult).
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("drain set is empty")]
    NoSinks,

    #[error("drain node is not part of the graph")]
    UnknownSink,
}

/// Convenience type alias for results using [`RunoffError`].
pub type Result<T> = std::result::Result<T, RunoffError>;

//! Runoff demo — slopes a rectangular roof with a central void toward
//! two drains and prints the per-node report.
//!
//! ```text
//! cargo run --example slope_report
//! ```

use runoff::elevation::SlopePolicy;
use runoff::engine::{EngineConfig, OutputMapping, SlopeEngine, SlopeOutput};
use runoff::face::RegionFace;
use runoff::graph::{GraphConfig, ThresholdPolicy};
use runoff::math::{Point2, Point3};
use runoff::sampler::NodeSource;
use runoff::Result;

fn main() -> Result<()> {
    // Default: WARN for everything, INFO for runoff.
    // Override with RUST_LOG env var (e.g. RUST_LOG=runoff=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("runoff=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // 40 x 20 ft roof with a 6 x 6 ft rooftop unit cut out of the middle.
    let outer = vec![
        Point2::new(0.0, 0.0),
        Point2::new(40.0, 0.0),
        Point2::new(40.0, 20.0),
        Point2::new(0.0, 20.0),
    ];
    let unit = vec![
        Point2::new(17.0, 7.0),
        Point2::new(23.0, 7.0),
        Point2::new(23.0, 13.0),
        Point2::new(17.0, 13.0),
    ];
    let face = RegionFace::new(outer, vec![unit]);

    // Vertex grid on a 10 ft pitch.
    let mut vertices = Vec::new();
    for i in 0..=4 {
        for j in 0..=2 {
            vertices.push(Point3::new(f64::from(i) * 10.0, f64::from(j) * 10.0, 0.0));
        }
    }
    let source = NodeSource::Vertices(vertices);
    let drains = [Point3::new(0.0, 0.0, 0.0), Point3::new(40.0, 20.0, 0.0)];

    let config = EngineConfig {
        graph: GraphConfig {
            threshold: ThresholdPolicy::Fixed(15.0),
            ..GraphConfig::default()
        },
        slope: SlopePolicy::from_percent(2.0)?,
        mapping: OutputMapping::Elevation,
    };

    let engine = SlopeEngine::new(face, config)?;
    let solution = engine.execute(&source, &drains)?;

    println!(
        "{} nodes, {} edges, threshold 15.0 ft",
        solution.graph.len(),
        solution.graph.edge_count()
    );
    for assignment in &solution.assignments {
        let p = assignment.point;
        match &assignment.output {
            Some(SlopeOutput::Offset(offset)) => {
                println!("({:5.1}, {:5.1})  raise by {offset:.3} ft", p.x, p.y);
            }
            Some(SlopeOutput::Polyline(segments)) => {
                println!("({:5.1}, {:5.1})  {} flow segment(s)", p.x, p.y, segments.len());
            }
            None if assignment.result.is_trivial() => {
                println!("({:5.1}, {:5.1})  drain", p.x, p.y);
            }
            None => {
                let reason = assignment.result.failure_reason.as_deref().unwrap_or("skipped");
                println!("({:5.1}, {:5.1})  {reason}", p.x, p.y);
            }
        }
    }
    let s = &solution.summary;
    println!(
        "processed {} / skipped {} / failed {}",
        s.processed, s.skipped, s.failed
    );
    Ok(())
}

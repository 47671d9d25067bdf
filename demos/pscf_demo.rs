//! Run a PSCF computation on the test fixtures and print its summary.
//!
//! ```text
//! cargo run --example pscf_demo
//! RUST_LOG=debug cargo run --example pscf_demo --features progress
//! ```
use camino::Utf8Path;
use pscf::render::{LayerKind, RenderContext};
use pscf::{ConcentrationRecord, Pscf, PscfError, PscfParams, TrajectoryAlignment};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), PscfError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let record =
        ConcentrationRecord::from_csv(Utf8Path::new("tests/data/concentration.csv"), "PM10")?;

    let params = PscfParams::builder()
        .station("PAR")
        .species("PM10")
        .receptor(48.5, 2.3)
        .folder("tests/data/trajectories")
        .prefix("traj_PAR_")
        .offset_hours(vec![0.0])
        .alignment(TrajectoryAlignment::ByStartDate)
        .percentile(50.0)
        .build()?;

    let pscf = Pscf::new(params, record);
    let result = pscf.run()?;

    println!(
        "{} endpoints, threshold {:.2}",
        result.endpoints.len(),
        result.threshold
    );
    if let Some(sectors) = &result.sectors {
        println!("{sectors}");
    }

    let ctx = RenderContext::from_params(pscf.params());
    let layer = ctx.layer(&result, LayerKind::Pscf);
    let (i, j) = layer.values.iamax_full();
    println!(
        "{} ({}): highest smoothed PSCF {:.3} at lon {:.2}, lat {:.2}",
        layer.window_title,
        layer.resolution.as_str(),
        layer.values[(i, j)],
        layer.lon_mesh[(i, j)],
        layer.lat_mesh[(i, j)]
    );

    Ok(())
}

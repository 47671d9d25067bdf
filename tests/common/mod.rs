use camino::Utf8Path;
use pscf::params::PscfParamsBuilder;
use pscf::{ConcentrationRecord, PscfParams, PscfResult};

pub const TRAJECTORY_FOLDER: &str = "tests/data/trajectories";
pub const CONCENTRATION_FILE: &str = "tests/data/concentration.csv";

pub fn fixture_record() -> ConcentrationRecord {
    ConcentrationRecord::from_csv(Utf8Path::new(CONCENTRATION_FILE), "PM10").unwrap()
}

/// Parameters of the Paris fixture, to be completed by each test.
pub fn fixture_params() -> PscfParamsBuilder {
    PscfParams::builder()
        .station("PAR")
        .species("PM10")
        .receptor(48.5, 2.3)
        .folder(TRAJECTORY_FOLDER)
        .prefix("traj_PAR_")
}

/// Compare every grid and field of two runs.
pub fn assert_results_identical(a: &PscfResult, b: &PscfResult) {
    assert_eq!(a.threshold.to_bits(), b.threshold.to_bits());
    assert_eq!(a.counts, b.counts);
    assert_eq!(a.endpoints, b.endpoints);
    assert_eq!(a.sectors, b.sectors);

    assert_eq!(a.fields.weight.is_some(), b.fields.weight.is_some());

    let mut pairs = vec![
        (&a.fields.pscf, &b.fields.pscf),
        (&a.fields.density, &b.fields.density),
    ];
    if let (Some(wa), Some(wb)) = (&a.fields.weight, &b.fields.weight) {
        pairs.push((wa, wb));
    }
    for (fa, fb) in pairs {
        assert_eq!(fa.shape(), fb.shape());
        for (x, y) in fa.iter().zip(fb.iter()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }
}

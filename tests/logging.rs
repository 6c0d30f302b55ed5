use log::{Level, LevelFilter, Log, Metadata, Record};
use ndarray::array;
use splineio::{save_npz, BSpline, Spline};
use std::sync::Mutex;
use tempfile::TempDir;

struct Capture(Mutex<Vec<String>>);

impl Log for Capture {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if record.target().starts_with("splineio") {
            self.0.lock().unwrap().push(record.args().to_string());
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture(Mutex::new(Vec::new()));

#[test]
fn archive_loads_report_the_spline_count() {
    log::set_logger(&CAPTURE).unwrap();
    log::set_max_level(LevelFilter::Debug);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("line.npz");
    let line = Spline::BSpline(BSpline {
        degrees: vec![1],
        knot_vectors: vec![vec![0., 0., 1., 1.]],
        control_points: array![[0., 0.], [1., 1.]],
    });
    save_npz(&path, &line).unwrap();
    splineio::load_splines(&path).unwrap();

    let messages = CAPTURE.0.lock().unwrap();
    let expected = format!("loaded 1 splines from {}", path.display());
    assert!(messages.contains(&expected), "{messages:?}");
}

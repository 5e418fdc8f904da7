// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::io::Write;

use clap::Parser;
use yolov4_rs::config::ExecutionProvider;
use yolov4_rs::{Args, Error, InputSource, PipelineConfig};

fn write_config(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn loads_json_with_defaults() {
    let file = write_config(r#"{ "source": "http://cam.local/stream", "min_probability": 0.6, "provider": "cuda" }"#);
    let config = PipelineConfig::load(file.path()).unwrap();

    assert_eq!(config.input_source(), InputSource::Mjpeg("http://cam.local/stream".into()));
    assert_eq!(config.min_probability, 0.6);
    assert_eq!(config.provider, ExecutionProvider::Cuda);
    assert_eq!(config.iou_threshold, 0.3);
    assert_eq!(config.snapshot_every, 60);
}

#[test]
fn cli_overrides_file() {
    let file = write_config(r#"{ "source": "camera:1", "iou_threshold": 0.4, "headless": false }"#);
    let path = file.path().to_string_lossy().into_owned();
    let args = Args::parse_from(["yolov4", "--config", &path, "--iou", "0.25", "--headless"]);

    let config = PipelineConfig::from_args(&args).unwrap();
    assert_eq!(config.input_source(), InputSource::Camera(1));
    assert_eq!(config.iou_threshold, 0.25);
    assert!(config.headless);
}

#[test]
fn rejects_invalid_file() {
    let file = write_config("{ not json");
    assert!(matches!(PipelineConfig::load(file.path()), Err(Error::Config(_))));

    let file = write_config(r#"{ "min_probability": 1.5 }"#);
    let path = file.path().to_string_lossy().into_owned();
    let args = Args::parse_from(["yolov4", "--config", &path]);
    assert!(matches!(PipelineConfig::from_args(&args), Err(Error::Config(_))));
}

#[test]
fn missing_file_is_io_error() {
    assert!(matches!(
        PipelineConfig::load("/no/such/config.json"),
        Err(Error::Io(_))
    ));
}

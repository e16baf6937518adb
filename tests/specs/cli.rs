//! `phorest init` followed by `phorest status`, driven as a real
//! subprocess the way an operator would run it (`assert_cmd`), plus a
//! `roi generate` error path that doesn't depend on numeric fit quality.

use assert_cmd::Command;
use std::io::Write;

fn write_config(root: &std::path::Path) -> std::path::PathBuf {
    let toml = format!(
        r#"
[Data_Analysis]
method = "max_intensity"
number_of_sub_rois = 0

[Paths]
remote_root_dir = "{root}/remote"
root_dir = "{root}"
data_dir = "{root}/data"
continuous_capture_dir = "{root}/data/capture"
results_dir = "{root}/results"
logs_dir = "{root}/logs"
backup_dir = "{root}/backup"
roi_manifest_filename = "roi_manifest.json"

[Services]
enable_camera = true
enable_thermocouple = false
enable_brightfield = false
enable_file_backup = true
enable_image_compression = true
enable_remote_sync = false
enable_service_health_check = true

[Timing]
collector_interval = 1
processor_interval = 1
communicator_interval = 5
compress_interval = 30
poll_interval = 1
collector_retry_delay = 2
file_backup_interval = 3600
sync_interval = 3600

[Retries]
collector_failure_limit = 5

[Buffer]
image_buffer_size = 500

[Communication]
method = "CSV_PLOT"

[Camera]
camera_type = "DUMMY"
camera_id = 0
camera_exposure = 0
camera_gain = 0
camera_brightness = 0
camera_contrast = 0
camera_transform = "NONE"

[Temperature]
thermocouple_sensors = {{}}

[Storage]
usb_uuid = "0000-0000"

[Assets]
roi_generation_image = "assets/reference.png"
label_template_dir = "assets/templates"
feature_locations_config = "assets/feature_locations.json"
roi_manifest_filename = "roi_manifest.json"
generated_files_dir = "assets/generated"
"#,
        root = root.display()
    );

    let configs_dir = root.join("configs");
    std::fs::create_dir_all(&configs_dir).unwrap();
    let path = configs_dir.join("Phorest_config.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(toml.as_bytes()).unwrap();
    path
}

#[test]
fn init_then_status_reports_every_service_as_unknown_before_any_run() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path());

    Command::cargo_bin("phorest")
        .unwrap()
        .arg("--config")
        .arg(&config_path)
        .arg("init")
        .assert()
        .success();

    assert!(dir.path().join("data").exists());
    assert!(dir.path().join("results").exists());
    assert!(dir.path().join("data/metadata_manifest.json").exists());

    let output = Command::cargo_bin("phorest")
        .unwrap()
        .arg("--config")
        .arg(&config_path)
        .arg("status")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("SERVICE"));
    assert!(text.contains("unknown"), "no service has run yet: {text}");
}

#[test]
fn roi_generate_rejects_a_chip_db_missing_the_requested_chip_type() {
    let dir = tempfile::tempdir().unwrap();

    let image_path = dir.path().join("reference.png");
    let img = image::GrayImage::from_pixel(32, 32, image::Luma([128]));
    img.save(&image_path).unwrap();

    let chip_db_path = dir.path().join("chip_db.json");
    std::fs::write(&chip_db_path, br#"{"chip_mappings":[]}"#).unwrap();

    let user_mapping_path = dir.path().join("user_mapping.json");
    std::fs::write(
        &user_mapping_path,
        br#"{"chip_type":"missing-chip","features":[]}"#,
    )
    .unwrap();

    let template_dir = dir.path().join("templates");
    std::fs::create_dir_all(&template_dir).unwrap();

    let out_path = dir.path().join("roi_manifest.json");

    Command::cargo_bin("phorest")
        .unwrap()
        .arg("roi")
        .arg("generate")
        .arg("--image")
        .arg(&image_path)
        .arg("--chip-db")
        .arg(&chip_db_path)
        .arg("--user-mapping")
        .arg(&user_mapping_path)
        .arg("--template-dir")
        .arg(&template_dir)
        .arg("--out")
        .arg(&out_path)
        .assert()
        .failure();

    assert!(!out_path.exists());
}

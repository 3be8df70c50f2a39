use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

fn run_metadata_only(out_root: &Path, extra: &[&str]) {
    let status = Command::new(env!("CARGO_BIN_EXE_animata"))
        .env_remove("ANIMATA_GAIN")
        .env("RUST_LOG", "warn")
        .arg("--metadata-only")
        .args(["--count", "3", "--out-root"])
        .arg(out_root)
        .args(extra)
        .status()
        .expect("failed to run animata --metadata-only");
    assert!(status.success());
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn metadata_only_is_repeatable() {
    let root = TempDir::new().unwrap();
    let out = root.path().join("out");

    run_metadata_only(&out, &[]);
    let first: Vec<_> = ["metadata/0001.json", "metadata/0003.json", "params/0002.json"]
        .iter()
        .map(|file| fs::read(out.join(file)).unwrap())
        .collect();

    run_metadata_only(&out, &[]);
    let second: Vec<_> = ["metadata/0001.json", "metadata/0003.json", "params/0002.json"]
        .iter()
        .map(|file| fs::read(out.join(file)).unwrap())
        .collect();

    assert_eq!(first, second);
    assert!(!out.join("metadata/0004.json").exists());
    assert!(!out.join("animations/0001.gif").exists());

    let record = read_json(&out.join("metadata/0001.json"));
    assert_eq!(record["name"], "Regent Animata 1");
    assert_eq!(record["animation_url"], "animations/0001.mp4");
    assert_eq!(record["image"], "images/0001.png");
    assert_eq!(record["attributes"][0]["trait_type"], "Hue 1");
    assert_eq!(record["attributes"][0]["value"], 1);

    let sidecar = read_json(&out.join("params/0001.json"));
    assert_eq!(sidecar["hue"], serde_json::json!([1, 4, 6, 6]));
    assert_eq!(sidecar["poster_frame"], 24);
}

#[test]
fn metadata_only_reads_existing_sidecars_and_cids() {
    let root = TempDir::new().unwrap();
    let out = root.path().join("out");

    run_metadata_only(&out, &[]);
    let sidecar_path = out.join("params/0002.json");
    let mut sidecar = read_json(&sidecar_path);
    sidecar["hue"] = serde_json::json!([0, 0, 0, 0]);
    fs::write(&sidecar_path, serde_json::to_string_pretty(&sidecar).unwrap()).unwrap();

    run_metadata_only(
        &out,
        &["--animations-cid", "bafyanim", "--images-cid", "bafyimg"],
    );

    let record = read_json(&out.join("metadata/0002.json"));
    assert_eq!(record["animation_url"], "ipfs://bafyanim/0002.mp4");
    assert_eq!(record["image"], "ipfs://bafyimg/0002.png");
    assert_eq!(record["properties"]["files"][1]["uri"], "ipfs://bafyanim/0002.webm");
    for slot in 0..4 {
        assert_eq!(record["attributes"][slot]["value"], 0);
    }
}

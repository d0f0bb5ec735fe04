mod test_support;

use serde_json::json;
use std::fs::File;
use std::io::Read;
use test_support::{admin, request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn export_then_import_restores_the_store() {
    let workspace = temp_dir("batchbook-snapshot-ipc");
    let bundle = workspace.join("out").join("institute.zip");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let export = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "backup.exportSnapshot",
        json!({ "viewer": admin(), "outPath": bundle.to_string_lossy() }),
    );
    assert_eq!(export["format"], "batchbook-snapshot-v1");
    assert_eq!(export["entryCount"], 2);

    let mut archive = zip::ZipArchive::new(File::open(&bundle).expect("open bundle"))
        .expect("zip archive");
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    let manifest: serde_json::Value = serde_json::from_str(&manifest).expect("manifest json");
    assert_eq!(manifest["counts"]["students"], 4);
    assert_eq!(manifest["datasetSha256"], export["sha256"]);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "viewer": admin(), "id": "s5", "name": "Kabir Singh", "batchIds": ["b2"] }),
    );
    let health = request_ok(&mut stdin, &mut reader, "3", "health", json!({}));
    assert_eq!(health["counts"]["students"], 5);

    let import = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "backup.importSnapshot",
        json!({ "viewer": admin(), "inPath": bundle.to_string_lossy() }),
    );
    assert_eq!(import["formatDetected"], "batchbook-snapshot-v1");
    let health = request_ok(&mut stdin, &mut reader, "5", "health", json!({}));
    assert_eq!(health["counts"]["students"], 4);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn import_rejects_missing_and_foreign_files() {
    let workspace = temp_dir("batchbook-snapshot-bad");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let missing = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "backup.importSnapshot",
        json!({ "viewer": admin(), "inPath": workspace.join("nope.zip").to_string_lossy() }),
    );
    assert_eq!(missing, "not_found");

    let plain = workspace.join("plain.zip");
    std::fs::write(&plain, b"not a zip").expect("write plain file");
    let foreign = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "backup.importSnapshot",
        json!({ "viewer": admin(), "inPath": plain.to_string_lossy() }),
    );
    assert_eq!(foreign, "import_failed");

    let health = request_ok(&mut stdin, &mut reader, "3", "health", json!({}));
    assert_eq!(health["counts"]["students"], 4);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

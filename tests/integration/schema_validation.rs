use jsonschema::validator_for;
use test_support::{cmd_bin, empty_env_file, init_fixture_repo};

fn compile_schema(name: &str) -> jsonschema::Validator {
  let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
  let path = manifest_dir.join("tests").join("schemas").join(name);
  let data = std::fs::read(&path).expect("schema file");
  let schema: serde_json::Value = serde_json::from_slice(&data).expect("valid schema JSON");
  validator_for(&schema).expect("compile schema")
}

#[test]
fn payload_conforms_to_schema() {
  let repo = init_fixture_repo();
  let td = tempfile::TempDir::new().unwrap();
  let payload_path = td.path().join("payload.json");

  let out = cmd_bin()
    .arg("--env-file")
    .arg(empty_env_file(td.path()))
    .args(["analyze", "--offline", "--dry-run", "--tz", "Europe/Berlin", "-r"])
    .arg(repo.path())
    .arg("-r")
    .arg(td.path().join("missing"))
    .args(["--start-date", "2025-08-01", "--end-date", "2025-08-31", "--payload-out"])
    .arg(&payload_path)
    .env("GITINSPECTOR_PATH", "/nonexistent/gitinspector")
    .output()
    .unwrap();
  // the missing repository makes the run fail, but the payload is still written
  assert!(!out.status.success());

  let v: serde_json::Value = serde_json::from_slice(&std::fs::read(&payload_path).unwrap()).unwrap();
  let compiled = compile_schema("payload.schema.json");
  if let Err(e) = compiled.validate(&v) {
    panic!("payload failed schema validation: {e}\n{v:#}");
  }
  assert_eq!(v["time_window"]["timezone"], "Europe/Berlin");
}

use std::io::Write;

use woorden_config::ConfigLoader;

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn loads_yaml_with_partial_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "config.yml",
        "data_dir: /var/lib/woorden\nsupabase:\n  request_timeout_secs: 5\nlog_level: debug\n",
    );

    let config = ConfigLoader::from_path(&path).load().unwrap();
    assert_eq!(
        config.data_dir.as_deref(),
        Some(std::path::Path::new("/var/lib/woorden"))
    );
    assert_eq!(config.supabase.request_timeout_secs, 5);
    assert_eq!(config.log_level, "debug");
}

#[test]
fn loads_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "config.toml",
        "log_level = \"warn\"\n\n[auth]\noauth_redirect_url = \"http://localhost:5173/collections\"\n",
    );

    let config = ConfigLoader::from_path(&path).load().unwrap();
    assert_eq!(config.log_level, "warn");
    assert_eq!(
        config.auth.oauth_redirect_url.as_deref(),
        Some("http://localhost:5173/collections")
    );
}

#[test]
fn rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "config.ini", "log_level=info\n");

    let err = ConfigLoader::from_path(&path).load().unwrap_err();
    assert!(err.to_string().contains("unsupported config extension"));
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigLoader::from_path(dir.path().join("absent.yml"))
        .load()
        .unwrap_err();
    assert!(err.to_string().starts_with("configuration error"));
}

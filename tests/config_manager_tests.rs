use restwire::config::manager::{apply_env_overrides, ConfigManager};
use restwire::config::{AuthConfig, ClientConfig};
use restwire::error::Error;
use restwire::fs::{FileSystem, OsFileSystem};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// Mock FileSystem implementation for testing
#[derive(Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    dirs: Arc<Mutex<Vec<PathBuf>>>,
    io_error_on_write: Arc<Mutex<bool>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_io_error_on_write(&self, value: bool) {
        *self.io_error_on_write.lock().unwrap() = value;
    }

    pub fn add_file(&self, path: &Path, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.as_bytes().to_vec());
    }

    pub fn get_file_content(&self, path: &Path) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|v| String::from_utf8_lossy(v).to_string())
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|v| String::from_utf8_lossy(v).to_string())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "File not found"))
    }

    fn write_all(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if *self.io_error_on_write.lock().unwrap() {
            return Err(io::Error::other("Mock I/O error on write"));
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.dirs.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
            || self.dirs.lock().unwrap().iter().any(|d| d == path)
    }
}

fn setup_manager() -> (ConfigManager<MockFileSystem>, MockFileSystem, PathBuf) {
    let fs = MockFileSystem::new();
    let config_dir = PathBuf::from("/home/user/.config/restwire");
    let manager = ConfigManager::with_fs(fs.clone(), config_dir.clone());
    (manager, fs, config_dir)
}

#[test]
fn test_missing_file_loads_defaults() {
    let (manager, _, _) = setup_manager();
    let config = manager.load_config().unwrap();
    assert_eq!(config, ClientConfig::default());
    assert_eq!(config.default_timeout_secs, 30);
}

#[test]
fn test_load_config_from_toml() {
    let (manager, fs, config_dir) = setup_manager();
    fs.add_file(
        &config_dir.join("config.toml"),
        r#"
base_url = "https://api.example.com/v1"
default_timeout_secs = 10

[headers]
X-Team = "platform"

[query]
api_version = "2"

[auth]
type = "basic"
username = "ada"
password_env = "API_PASSWORD"
"#,
    );

    let config = manager.load_config().unwrap();
    assert_eq!(config.base_url.as_deref(), Some("https://api.example.com/v1"));
    assert_eq!(config.default_timeout_secs, 10);
    assert_eq!(config.headers["X-Team"], "platform");
    assert_eq!(config.query["api_version"], "2");
    assert_eq!(
        config.auth,
        Some(AuthConfig::Basic {
            username: "ada".to_string(),
            password_env: "API_PASSWORD".to_string(),
        })
    );
}

#[test]
fn test_invalid_toml_is_a_config_error() {
    let (manager, fs, config_dir) = setup_manager();
    fs.add_file(&config_dir.join("config.toml"), "base_url = [unclosed");

    let err = manager.load_config().unwrap_err();
    assert!(matches!(err, Error::Config(ref msg) if msg.contains("config.toml")));
}

#[test]
fn test_save_config_writes_toml() {
    let (manager, fs, config_dir) = setup_manager();
    let mut config = ClientConfig {
        base_url: Some("https://api.example.com".to_string()),
        ..ClientConfig::default()
    };
    config.cookies.insert("session".to_string(), "abc".to_string());

    manager.save_config(&config).unwrap();

    let written = fs.get_file_content(&config_dir.join("config.toml")).unwrap();
    assert!(written.contains("base_url = \"https://api.example.com\""));
    assert!(written.contains("[cookies]"));
    assert!(!written.contains("[auth]"));
    assert_eq!(manager.load_config().unwrap(), config);
}

#[test]
fn test_save_config_io_error() {
    let (manager, fs, _) = setup_manager();
    fs.set_io_error_on_write(true);

    let err = manager.save_config(&ClientConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_round_trip_on_disk() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_dir = temp_dir.path().join("nested").join("restwire");
    let manager = ConfigManager::with_fs(OsFileSystem, config_dir.clone());

    let config = ClientConfig {
        base_url: Some("http://localhost:8080".to_string()),
        user_agent: Some("restwire-tests".to_string()),
        auth: Some(AuthConfig::Bearer {
            token_env: "API_TOKEN".to_string(),
        }),
        ..ClientConfig::default()
    };
    manager.save_config(&config).unwrap();

    assert!(config_dir.join("config.toml").exists());
    assert_eq!(manager.load_config().unwrap(), config);
}

#[test]
fn test_env_overrides() {
    let mut config = ClientConfig::default();

    std::env::set_var("RESTWIRE_BASE_URL", "https://override.test");
    std::env::set_var("RESTWIRE_TIMEOUT_SECS", " 5 ");
    apply_env_overrides(&mut config).unwrap();
    assert_eq!(config.base_url.as_deref(), Some("https://override.test"));
    assert_eq!(config.default_timeout_secs, 5);

    std::env::set_var("RESTWIRE_TIMEOUT_SECS", "soon");
    let err = apply_env_overrides(&mut config).unwrap_err();
    assert!(matches!(err, Error::Config(ref msg) if msg.contains("RESTWIRE_TIMEOUT_SECS")));

    std::env::remove_var("RESTWIRE_BASE_URL");
    std::env::remove_var("RESTWIRE_TIMEOUT_SECS");
}

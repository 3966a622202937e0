// Test harness for integration tests
// Starts the compiled binary against a generated config in a temp directory

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

/// Running server instance; killed on drop
pub struct ServerTestHarness {
    process: Option<Child>,
    workdir: TempDir,
    pub port: u16,
    pub base_url: String,
}

/// Ask the OS for a port that is free right now
pub fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("Failed to find a free port")
}

impl ServerTestHarness {
    /// Start with default settings
    pub fn start() -> Result<Self, String> {
        Self::start_with("")
    }

    /// Start with extra YAML appended under the generated `image:` section
    pub fn start_with(image_yaml: &str) -> Result<Self, String> {
        let workdir = TempDir::new().map_err(|e| format!("Failed to create temp dir: {}", e))?;
        let port = free_port();
        let image_dir = workdir.path().join("images");

        let config = format!(
            r#"
server:
  address: "127.0.0.1"
  port: {port}
  threads: 2
  max_body_size: 2097152
storage:
  image_dir: "{image_dir}"
image:
  max_width: 4096
{image_yaml}
logging:
  level: warn
  format: pretty
"#,
            port = port,
            image_dir = image_dir.display(),
            image_yaml = image_yaml,
        );
        let config_path = workdir.path().join("config.yaml");
        std::fs::write(&config_path, config)
            .map_err(|e| format!("Failed to write config: {}", e))?;

        let mut child = Command::new(env!("CARGO_BIN_EXE_imagepress"))
            .arg("--config")
            .arg(&config_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("Failed to start server: {}", e))?;

        let base_url = format!("http://127.0.0.1:{}", port);
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        for attempt in 1..=40 {
            if let Ok(Some(status)) = child.try_wait() {
                return Err(format!("Server exited immediately with status: {}", status));
            }
            if let Ok(response) = client.get(format!("{}/health", base_url)).send() {
                if response.status().is_success() {
                    log::info!("Server started on port {} after {} attempts", port, attempt);
                    return Ok(ServerTestHarness {
                        process: Some(child),
                        workdir,
                        port,
                        base_url,
                    });
                }
            }
            thread::sleep(Duration::from_millis(250));
        }

        let _ = child.kill();
        let _ = child.wait();
        Err(format!("Server did not respond on port {}", port))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn image_dir(&self) -> PathBuf {
        self.workdir.path().join("images")
    }

    /// Files currently in the image directory
    pub fn stored_files(&self) -> Vec<PathBuf> {
        list_files(&self.image_dir())
    }

    pub fn stop(&mut self) {
        if let Some(mut child) = self.process.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default()
}

impl Drop for ServerTestHarness {
    fn drop(&mut self) {
        self.stop();
    }
}

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use super::FetchError;

/// One outbound GET. `path` is relative to the transport's base URL.
pub struct Request<'a> {
    pub path: &'a str,
    pub headers: &'a [(String, String)],
    pub timeout: Duration,
}

pub trait Transport: Send + Sync {
    fn get(&self, request: &Request<'_>) -> Result<String, FetchError>;
}

const CURL_TIMEOUT_EXIT_CODE: i32 = 28;

/// Runs the system `curl` binary for each request.
pub struct CurlTransport {
    base_url: String,
}

impl CurlTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Headers are read from stdin (`--header @-`) so credentials never
    /// appear on the command line.
    fn build_command(&self, request: &Request<'_>) -> Command {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), request.path);

        let mut command = Command::new("curl");
        command
            .args(["--silent", "--show-error", "--location", "--max-time"])
            .arg(timeout_seconds(request.timeout).to_string())
            .args(["--header", "@-", "--write-out", "\n%{http_code}"])
            .arg(url)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

fn timeout_seconds(timeout: Duration) -> u64 {
    timeout.as_secs().max(1)
}

fn header_lines(headers: &[(String, String)]) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}\n"))
        .collect()
}

impl Transport for CurlTransport {
    fn get(&self, request: &Request<'_>) -> Result<String, FetchError> {
        let seconds = timeout_seconds(request.timeout);
        let transport_error = |message: String| FetchError::Transport {
            path: request.path.to_owned(),
            message,
        };

        let mut child = self
            .build_command(request)
            .spawn()
            .map_err(|error| transport_error(format!("failed to spawn curl: {error}")))?;

        if let Some(mut stdin) = child.stdin.take()
            && let Err(error) = stdin.write_all(header_lines(request.headers).as_bytes())
        {
            let _ = child.kill();
            let _ = child.wait();
            return Err(transport_error(format!("failed to pass headers to curl: {error}")));
        }

        let output = child
            .wait_with_output()
            .map_err(|error| transport_error(format!("failed to wait for curl: {error}")))?;

        if !output.status.success() {
            if output.status.code() == Some(CURL_TIMEOUT_EXIT_CODE) {
                return Err(FetchError::Timeout {
                    path: request.path.to_owned(),
                    seconds,
                });
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Transport {
                path: request.path.to_owned(),
                message: stderr.trim().to_owned(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| FetchError::Transport {
            path: request.path.to_owned(),
            message: "curl output was not valid UTF-8".to_owned(),
        })?;

        let Some((body, status)) = split_status(&stdout) else {
            return Err(FetchError::Transport {
                path: request.path.to_owned(),
                message: "curl output did not end with a status code".to_owned(),
            });
        };

        if (200..300).contains(&status) {
            Ok(body.to_owned())
        } else {
            Err(FetchError::Status {
                path: request.path.to_owned(),
                status,
            })
        }
    }
}

fn split_status(raw: &str) -> Option<(&str, u16)> {
    let (body, code) = raw.rsplit_once('\n')?;
    let status = code.trim().parse().ok()?;
    Some((body, status))
}

//! Orchestration of the external spack tool
//!
//! - `executor`: runs shell command lines and captures combined output
//! - `locator`: checks the tool is reachable from the invocation shell
//! - `spack`: builds the spack command lines
//! - `lock`: cross-process lock around environment creation
//! - `provisioner`: the idempotent, crash-detectable provisioning sequence

mod executor;
mod locator;
mod lock;
mod provisioner;
mod spack;

pub use executor::{OutputListener, ProcessExecutor, ShellExecutor};
pub use locator::{ShellLocator, ToolLocator};
pub use lock::EnvLock;
pub use provisioner::Provisioner;
pub use spack::Spack;

use tokio::io::{AsyncBufReadExt, BufReader};

/// Quote a word for POSIX `sh`, leaving plain words untouched.
pub(crate) fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:@+,%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Drain stdout+stderr from a child process, calling `on_line` for each line.
///
/// Returns the raw bytes of both streams, interleaved in arrival order, so
/// failures can be reported with the tool's output unaltered.
pub(crate) async fn collect_child_output(
    child: &mut tokio::process::Child,
    on_line: &(dyn Fn(&str) + Send + Sync),
) -> Vec<u8> {
    let mut combined = Vec::new();
    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return combined;
    };

    let mut stdout_reader = BufReader::new(stdout);
    let mut stderr_reader = BufReader::new(stderr);
    let mut stdout_line = Vec::new();
    let mut stderr_line = Vec::new();
    let mut stdout_done = false;
    let mut stderr_done = false;

    while !stdout_done || !stderr_done {
        tokio::select! {
            read = stdout_reader.read_until(b'\n', &mut stdout_line), if !stdout_done => {
                match read {
                    Ok(n) if n > 0 => {
                        on_line(String::from_utf8_lossy(&stdout_line).trim_end());
                        combined.append(&mut stdout_line);
                    }
                    _ => stdout_done = true,
                }
            }
            read = stderr_reader.read_until(b'\n', &mut stderr_line), if !stderr_done => {
                match read {
                    Ok(n) if n > 0 => {
                        on_line(String::from_utf8_lossy(&stderr_line).trim_end());
                        combined.append(&mut stderr_line);
                    }
                    _ => stderr_done = true,
                }
            }
        }
    }

    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_words_unquoted() {
        assert_eq!(shell_quote("spack"), "spack");
        assert_eq!(shell_quote("/cache/envs/098300fb"), "/cache/envs/098300fb");
    }

    #[test]
    fn special_words_quoted() {
        assert_eq!(shell_quote("my envs"), "'my envs'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("$(rm -rf /)"), "'$(rm -rf /)'");
    }
}

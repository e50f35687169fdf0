//! Command running
//!
//! Spawns a command through the platform shell and consumes its output
//! line-by-line until the child exits. stdout and stderr are piped into
//! one channel, so the combined output arrives in a single stream.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread::JoinHandle;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Run `cmd` through the shell with the given working directory.
///
/// Blocks until the child exits. Exit 0 yields the accumulated combined
/// output; any other exit yields `Error::Command` carrying the exit code
/// and whatever output arrived before it. No timeout is imposed here.
pub fn run(cmd: &str, cwd: &Path) -> Result<String> {
    info!("Running `{}` in {}", cmd, cwd.display());

    let (shell, shell_args) = get_shell();

    let mut child = Command::new(shell)
        .args(&shell_args)
        .arg(cmd)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let (tx, rx) = mpsc::channel::<String>();
    let mut readers: Vec<JoinHandle<()>> = Vec::new();

    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_reader(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_reader(stderr, tx.clone()));
    }
    drop(tx);

    // Drains until both pipes close, so nothing the child wrote is lost
    let mut output = String::new();
    for line in rx {
        debug!("> {}", line.trim_end());
        output.push_str(&line);
    }

    for reader in readers {
        let _ = reader.join();
    }

    let status = child.wait()?;

    if status.success() {
        Ok(output)
    } else {
        Err(Error::Command {
            cmd: cmd.to_string(),
            code: status.code(),
            output,
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: R, tx: mpsc::Sender<String>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                // Lossy so one bad byte never drops the rest of the stream;
                // the terminator stays part of the line
                Ok(_) => {
                    if tx.send(String::from_utf8_lossy(&buf).into_owned()).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

/// Shell command and flag for the current platform.
fn get_shell() -> (&'static str, Vec<&'static str>) {
    #[cfg(unix)]
    {
        ("/bin/sh", vec!["-c"])
    }

    #[cfg(windows)]
    {
        (
            "powershell.exe",
            vec!["-NoProfile", "-ExecutionPolicy", "Bypass", "-Command"],
        )
    }
}

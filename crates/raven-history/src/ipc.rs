use std::io::{Read, Write};
use std::os::unix::net::UnixStream;

use raven_history_core::{ConfigPaths, ControlCommand};

/// Send a command to the daemon via IPC and print its reply
pub fn send(command: ControlCommand) -> anyhow::Result<()> {
    let response = send_command(command.as_str())?;
    let response = response.trim();
    println!("{}", response);

    if let Some(message) = response.strip_prefix("error: ") {
        return Err(anyhow::anyhow!("{}", message));
    }
    Ok(())
}

fn send_command(cmd: &str) -> anyhow::Result<String> {
    let path = ConfigPaths::new().socket;

    if !path.exists() {
        return Err(anyhow::anyhow!(
            "Raven history daemon is not running (socket not found at {:?})",
            path
        ));
    }

    let mut stream = UnixStream::connect(&path)?;
    stream.write_all(cmd.as_bytes())?;
    stream.write_all(b"\n")?;
    stream.flush()?;

    let mut response = String::new();
    stream.read_to_string(&mut response)?;

    Ok(response)
}

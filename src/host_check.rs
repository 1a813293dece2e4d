use std::io::Write;
use std::process::Command;

use log::debug;

use crate::error::DemoError;

pub const PING_COUNT: &str = "4";

fn is_host_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'.' || b == b'-'
}

/// Accepts only non-empty names made of ASCII letters, digits, `.` and `-`,
/// not starting with `-` so the name cannot be read as an option.
pub fn validate_host(host: &str) -> Result<&str, DemoError> {
    if host.is_empty() || host.starts_with('-') || !host.bytes().all(is_host_byte) {
        return Err(DemoError::InvalidHost(host.to_string()));
    }
    Ok(host)
}

/// Builds `ping -c 4 -- <host>`. The host is passed as its own argument
/// after the end of options and never reaches a shell.
pub fn ping_command(host: &str) -> Result<Command, DemoError> {
    let host = validate_host(host)?;
    let mut command = Command::new("ping");
    command.args(["-c", PING_COUNT, "--", host]);
    Ok(command)
}

pub fn run_ping<W: Write>(host: &str, writer: &mut W) -> Result<(), DemoError> {
    let mut command = ping_command(host)?;
    debug!("running {:?}", command);

    let output = command.output()?;
    if output.status.success() {
        writer.write_all(&output.stdout)?;
    } else {
        write!(writer, "Error: ")?;
        writer.write_all(&output.stderr)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_names_and_addresses() {
        for host in ["google.com", "localhost", "127.0.0.1", "my-host.example.org"] {
            assert_eq!(validate_host(host).unwrap(), host);
        }
    }

    #[test]
    fn rejects_shell_metacharacters() {
        for host in [
            "",
            "google.com; rm -rf /",
            "a && b",
            "$(whoami)",
            "`id`",
            "host|cat",
            "host name",
            "host\n",
            "::1",
            "héllo.com",
        ] {
            assert!(
                matches!(validate_host(host), Err(DemoError::InvalidHost(_))),
                "accepted {:?}",
                host
            );
        }
    }

    #[test]
    fn command_keeps_host_as_single_argument() {
        let command = ping_command("example.com").unwrap();
        assert_eq!(command.get_program(), "ping");
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, ["-c", "4", "--", "example.com"]);
    }

    #[test]
    fn rejects_option_lookalikes() {
        for host in ["-f", "-c1000", "--flood", "-"] {
            assert!(
                matches!(validate_host(host), Err(DemoError::InvalidHost(_))),
                "accepted {:?}",
                host
            );
        }
        assert!(ping_command("-f").is_err());
        // Dashes inside a name are still fine.
        assert_eq!(validate_host("a-b.example").unwrap(), "a-b.example");
    }

    #[test]
    fn host_follows_end_of_options_marker() {
        let command = ping_command("localhost").unwrap();
        let args: Vec<_> = command.get_args().collect();
        let marker = args.iter().position(|a| *a == "--").unwrap();
        assert_eq!(args[marker + 1], "localhost");
        assert_eq!(marker + 2, args.len());
    }

    #[test]
    fn invalid_host_never_builds_a_command() {
        assert!(ping_command("x; reboot").is_err());
    }

    #[test]
    fn invalid_host_message() {
        let err = validate_host("a b").unwrap_err();
        assert_eq!(err.to_string(), "Invalid hostname: \"a b\"");
    }
}

//! Diagnostic console command parser.
//!
//! The reference firmware's `ParseCommand()` hook fires whenever a
//! complete line arrives on the debug console; its body isn't part of the
//! filtered source this crate is grounded on, so this is a minimal
//! diagnostic-only stand-in rather than a port. It never touches streaming
//! state — it exists purely so a `UserCommand` event doesn't disappear
//! silently.

use eventbus::ConsoleTx;

/// Handle one completed console line (trailing `\r`/`\n` stripped by the
/// caller's framing is not assumed; this strips it itself) and queue a
/// reply on `tx`. Has no effect on session state: every branch only reads
/// from its arguments and writes to `tx`.
pub fn handle_line(line: &[u8], tx: &mut ConsoleTx) {
    let trimmed = trim_eol(line);
    match trimmed {
        b"ver" => {
            let mut reply = [0u8; 16];
            let n = format_version(&mut reply);
            tx.queue(&reply[..n]);
        }
        b"help" => {
            tx.queue(b"commands: ver help\n");
        }
        b"" => {}
        _ => {
            tx.queue(b"?\n");
        }
    }
}

fn trim_eol(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && (line[end - 1] == b'\n' || line[end - 1] == b'\r') {
        end -= 1;
    }
    &line[..end]
}

fn format_version(out: &mut [u8; 16]) -> usize {
    let major = platform::config::FIRMWARE_VER_MAJOR;
    let minor = platform::config::FIRMWARE_VER_MINOR;
    let mut n = 0;
    n += write_u8(&mut out[n..], major);
    out[n] = b'.';
    n += 1;
    n += write_u8(&mut out[n..], minor);
    out[n] = b'\n';
    n += 1;
    n
}

fn write_u8(out: &mut [u8], value: u8) -> usize {
    if value >= 10 {
        let tens = value / 10;
        let ones = value % 10;
        out[0] = b'0' + tens;
        out[1] = b'0' + ones;
        2
    } else {
        out[0] = b'0' + value;
        1
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn drained(tx: &mut ConsoleTx) -> heapless::Vec<u8, 32> {
        let mut buf = [0u8; 32];
        let n = tx.drain_into(&mut buf);
        heapless::Vec::from_slice(&buf[..n]).unwrap()
    }

    #[test]
    fn ver_reports_the_firmware_version() {
        let mut tx = ConsoleTx::new();
        handle_line(b"ver\n", &mut tx);
        assert_eq!(drained(&mut tx).as_slice(), b"2.2\n");
    }

    #[test]
    fn unknown_command_gets_a_terse_error() {
        let mut tx = ConsoleTx::new();
        handle_line(b"bogus\r\n", &mut tx);
        assert_eq!(drained(&mut tx).as_slice(), b"?\n");
    }

    #[test]
    fn blank_line_produces_no_reply() {
        let mut tx = ConsoleTx::new();
        handle_line(b"\n", &mut tx);
        assert!(tx.is_empty());
    }

    #[test]
    fn help_lists_known_commands() {
        let mut tx = ConsoleTx::new();
        handle_line(b"help", &mut tx);
        assert_eq!(drained(&mut tx).as_slice(), b"commands: ver help\n");
    }
}

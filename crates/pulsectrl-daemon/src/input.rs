//! Command input: a blocking reader thread for stdin.
//!
//! Each line is parsed and, if valid, handed to the session thread. Malformed
//! lines are dropped without a reply.

use std::io::BufRead;
use std::thread::JoinHandle;

use pulsectrl_core::command;
use pulsectrl_pulse::CommandSender;
use tracing::{debug, trace, warn};

/// Forward every valid command line from `reader` to the session.
///
/// Stops at end of input, on a read error, or once the session is gone.
/// Returns the number of commands forwarded.
pub fn forward_commands<R: BufRead>(reader: R, commands: &CommandSender) -> usize {
    let mut forwarded = 0;

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to read command input");
                break;
            }
        };

        match command::try_parse(&line) {
            Ok(action) => {
                if commands.dispatch(action).is_err() {
                    debug!("Session gone, stopping command input");
                    break;
                }
                forwarded += 1;
            }
            Err(e) => trace!(error = %e, "Ignoring malformed command"),
        }
    }

    forwarded
}

/// Spawn the stdin reader thread.
///
/// # Panics
///
/// Panics if the thread cannot be spawned.
pub fn spawn_stdin_reader(commands: CommandSender) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            let count = forward_commands(std::io::stdin().lock(), &commands);
            debug!(count, "Command input closed");
        })
        .expect("Failed to spawn stdin reader thread")
}

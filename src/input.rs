use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::signal::Shutdown;
use crate::snake::Heading;

pub const QUIT_SYMBOL: char = 'q';

const MAX_READ_FAILURES: u32 = 5;
const READ_RETRY_DELAY: Duration = Duration::from_millis(20);

/// Source of control characters for the input task.
pub trait InputSource {
    /// Blocks until the next character arrives. `Ok(None)` means the source
    /// is closed for good.
    fn next_char(&mut self) -> anyhow::Result<Option<char>>;
}

/// Runs the input task on its own thread.
pub fn spawn<S>(mut source: S, heading: Heading, shutdown: Shutdown) -> io::Result<JoinHandle<()>>
where
    S: InputSource + Send + 'static,
{
    thread::Builder::new()
        .name("input".into())
        .spawn(move || handle_input(&mut source, &heading, &shutdown))
}

/// Reads characters until quit, a closed source, or a raised signal.
///
/// A failed read is retried after a short pause. After `MAX_READ_FAILURES`
/// failures in a row the input is considered dead and the session ends, as
/// it does when the source reports itself closed.
pub fn handle_input<S: InputSource + ?Sized>(source: &mut S, heading: &Heading, shutdown: &Shutdown) {
    let mut failures = 0;

    while !shutdown.is_raised() {
        let symbol = match source.next_char() {
            Ok(Some(symbol)) => symbol,
            Ok(None) => {
                info!("Input closed, ending session");
                shutdown.raise();
                return;
            }
            Err(e) => {
                failures += 1;
                if failures >= MAX_READ_FAILURES {
                    error!("Giving up on input after {} failed reads: {:#}", failures, e);
                    shutdown.raise();
                    return;
                }
                warn!("Failed to read input, retrying: {:#}", e);
                thread::sleep(READ_RETRY_DELAY);
                continue;
            }
        };
        failures = 0;

        if symbol == QUIT_SYMBOL {
            info!("Quit requested");
            shutdown.raise();
            return;
        }

        if heading.steer_symbol(symbol) {
            debug!("Heading changed to {:?}", heading.current());
        }
    }
}

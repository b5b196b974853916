use std::io;

use parse_display::Display;

/// Errors raised while building a [`Store`](crate::Store).
///
/// Nothing in the update pipeline itself fails; effects report failure as actions.
#[non_exhaustive]
#[derive(Display, Debug)]
pub enum Error {
    #[display("failed to start effect executor: {0}")]
    Executor(io::Error),
    #[display("`worker_threads` must be greater than zero")]
    ZeroWorkerThreads,
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Executor(e) => Some(e),
            Error::ZeroWorkerThreads => None,
        }
    }
}

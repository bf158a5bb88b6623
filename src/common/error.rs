use std::{collections::TryReserveError, fmt, io, path::PathBuf};

#[derive(Debug)]
pub enum Error {
    TooManyArguments(usize),
    RedirectWithoutTarget(&'static str),
    JobTable(TryReserveError),
    Io(Option<PathBuf>, io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TooManyArguments(max) => {
                write!(f, "arguments entered exceeds {max}")
            }
            Error::RedirectWithoutTarget(operator) => {
                write!(f, "missing file name after '{operator}'")
            }
            Error::JobTable(err) => {
                write!(f, "cannot track background jobs: {err}")
            }
            Error::Io(location, err) => {
                if let Some(path) = location {
                    write!(f, "{}: {err}", path.display())
                } else {
                    write!(f, "IO error: {err}")
                }
            }
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(None, err)
    }
}

impl From<TryReserveError> for Error {
    fn from(err: TryReserveError) -> Self {
        Error::JobTable(err)
    }
}

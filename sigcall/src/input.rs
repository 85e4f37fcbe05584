//! Standard input as seen by the argument parser.

use crate::value::{Stream, StreamKind};
use std::io::{self, IsTerminal, Read};

/// Label used for streams backed by piped standard input.
pub const STDIN_LABEL: &str = "<stdin>";

/// Whether input is being piped in, and access to it if so.
///
/// The piped source is shared: implicit text reads and stream parameters
/// consume the same reader, so it is read at most once.
#[derive(Clone, Debug)]
pub struct Input {
    piped: Option<Stream>,
}

impl Input {
    /// Interactive terminal: nothing is piped in.
    #[must_use]
    pub fn terminal() -> Self {
        Self { piped: None }
    }

    /// Treat `reader` as piped standard input.
    pub fn piped(reader: impl Read + 'static) -> Self {
        Self {
            piped: Some(Stream::from_reader(STDIN_LABEL, reader, StreamKind::Binary)),
        }
    }

    /// Inspect the process's real standard input.
    ///
    /// A terminal, or a character device such as `/dev/null`, counts as
    /// nothing piped. Pipes and redirected files are piped input.
    #[must_use]
    pub fn from_stdin() -> Self {
        let stdin = io::stdin();
        if stdin.is_terminal() || stdin_is_device() {
            tracing::trace!("standard input is not piped");
            Self::terminal()
        } else {
            Self::piped(stdin)
        }
    }

    #[must_use]
    pub fn is_piped(&self) -> bool {
        self.piped.is_some()
    }

    /// The piped input as a stream of the requested kind.
    #[must_use]
    pub fn stream(&self, kind: StreamKind) -> Option<Stream> {
        self.piped.as_ref().map(|stream| stream.view(kind))
    }

    /// Read all piped input as text with trailing whitespace stripped.
    ///
    /// # Errors
    ///
    /// Returns `Err` if reading fails or the input is not valid UTF-8.
    pub fn read_text(&self) -> io::Result<Option<String>> {
        let Some(stream) = self.stream(StreamKind::Text) else {
            return Ok(None);
        };
        let text = stream.read_to_string()?;
        Ok(Some(text.trim_end().to_string()))
    }
}

#[cfg(unix)]
fn stdin_is_device() -> bool {
    use std::os::unix::fs::FileTypeExt;
    std::fs::metadata("/dev/stdin").is_ok_and(|meta| meta.file_type().is_char_device())
}

#[cfg(not(unix))]
fn stdin_is_device() -> bool {
    false
}

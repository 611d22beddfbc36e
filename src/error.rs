use std::fmt;
use std::io;
use std::path::Path;

macro_rules! err {
    ($kind:ident, $msg:literal) => {
        $crate::error::HexError::new($crate::error::ErrorKind::$kind, $msg)
    };
    ($kind:ident, $fmtstr:literal, $($args:tt)*) => {
        $crate::error::HexError::new($crate::error::ErrorKind::$kind, &format!($fmtstr, $($args)*))
    };
}

macro_rules! fail {
    ($kind:ident, $msg:literal) => {
        return Err(err!($kind, $msg))
    };
    ($kind:ident, $fmtstr:literal, $($args:tt)*) => {
        return Err(err!($kind, $fmtstr, $($args)*))
    };
}

/// The three classes of failure a conversion can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind
{
    /// The input text or binary is malformed.
    Format,
    /// Reading or writing a file failed.
    Io,
    /// The renderer and the structural walker disagree, or a digest misbehaved.
    Internal,
}

impl ErrorKind
{
    fn label(&self) -> &'static str
    {
        match self
        {
            ErrorKind::Format => "format error",
            ErrorKind::Io => "i/o error",
            ErrorKind::Internal => "internal error",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct HexError
{
    kind: ErrorKind,
    msg: String,
    contexts: Vec<String>,
}

impl HexError
{
    pub(crate) fn new(kind: ErrorKind, msg: &str) -> Self
    {
        HexError {
            kind,
            msg: msg.to_string(),
            contexts: Vec::new(),
        }
    }

    pub(crate) fn with_context(base: HexError, context: String) -> Self
    {
        let mut contexts = base.contexts;
        contexts.push(context);
        HexError { kind: base.kind, msg: base.msg, contexts }
    }

    /// Wraps an `io::Error` with the path that failed.
    pub(crate) fn io(e: io::Error, path: &Path) -> Self
    {
        HexError::with_context(HexError::new(ErrorKind::Io, &e.to_string()), path.display().to_string())
    }

    pub fn kind(&self) -> ErrorKind
    {
        self.kind
    }

    pub fn is_internal(&self) -> bool
    {
        self.kind == ErrorKind::Internal
    }
}

impl fmt::Display for HexError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}: {}", self.kind.label(), self.msg)?;
        let mut connector = " for ";
        for context in &self.contexts
        {
            write!(f, "{}{}", connector, context)?;
            connector = " of ";
        }
        Ok(())
    }
}

impl std::error::Error for HexError {}

impl From<io::Error> for HexError
{
    fn from(e: io::Error) -> Self
    {
        HexError::new(ErrorKind::Io, &e.to_string())
    }
}

/// Adds a context string to the error of a failed result.
pub(crate) trait Context<T>
{
    fn context<C: fmt::Display>(self, context: C) -> Result<T, HexError>;
}

impl<T> Context<T> for Result<T, HexError>
{
    fn context<C: fmt::Display>(self, context: C) -> Result<T, HexError>
    {
        self.map_err(|e| HexError::with_context(e, context.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_chains_contexts() {
        let e = HexError::with_context(
            HexError::with_context(err!(Format, "bad token '{}'", "zz"), "line 3".to_string()),
            "Foo.cfh".to_string(),
        );
        assert_eq!(e.to_string(), "format error: bad token 'zz' for line 3 of Foo.cfh");
        assert_eq!(e.kind(), ErrorKind::Format);
    }

    #[test]
    fn io_errors_carry_path() {
        let e = HexError::io(io::Error::new(io::ErrorKind::NotFound, "missing"), Path::new("out/classes.dex"));
        assert_eq!(e.kind(), ErrorKind::Io);
        assert!(e.to_string().ends_with("for out/classes.dex"));
    }

    #[test]
    fn internal_errors_are_flagged() {
        let e: Result<(), HexError> = (|| { fail!(Internal, "mismatch at byte {}", 7) })();
        let e = e.unwrap_err();
        assert!(e.is_internal());
        assert_eq!(e.to_string(), "internal error: mismatch at byte 7");
    }
}

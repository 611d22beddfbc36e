use crate::error::HexError;

/// The kind of member a structural walker has just finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind
{
    Field,
    Method,
}

/// One notification from a structural walk, delivered in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent<'a>
{
    /// Change the indentation level by the given number of steps.
    ChangeIndent(i32),
    StartMember {
        offset: usize,
        name: String,
        descriptor: String,
    },
    EndMember {
        offset: usize,
        name: String,
        descriptor: String,
        member: MemberKind,
    },
    /// A run of bytes the walker consumed. `bytes` is the walker's own view of the span.
    Parsed {
        offset: usize,
        bytes: &'a [u8],
        description: String,
    },
}

impl<'a> ParseEvent<'a>
{
    pub fn parsed(offset: usize, bytes: &'a [u8], description: impl Into<String>) -> Self
    {
        ParseEvent::Parsed { offset, bytes, description: description.into() }
    }
}

/// Receives events from a walker. Returning an error stops the walk.
pub type EventSink<'s> = dyn for<'e> FnMut(ParseEvent<'e>) -> Result<(), HexError> + 's;

/// A walker bound to a byte array that reports the array's structure as events.
pub trait StructureParser
{
    /// Traverses the whole input once, calling `sink` for every event in file order.
    fn walk(&mut self, sink: &mut EventSink<'_>) -> Result<(), HexError>;
}

//! # cfhex
//!
//! Converts class and dex files to and from an annotated hex text form
//! (`.cfh` / `.dfh`) so that malformed bytecode fixtures can be written by hand.
//!
//! Dumping walks the binary with a structural walker and renders every span as a
//! comment plus a line of hex bytes. Reassembly concatenates the hex bytes back
//! together and, for dex files, recomputes the signature and checksum unless line 2
//! of the document asks for them to be left alone.
//!
//! ```no_run
//!  use cfhex::commands::reassemble_file;
//!  use std::path::Path;
//!
//!  let written = reassemble_file(Path::new("fixtures/BadLocals.cfh"), Path::new("out")).unwrap();
//!  println!("wrote {}", written.display());
//! ```
#[macro_use]
pub mod error;

pub mod assemble;
pub mod class;
pub mod commands;
pub mod dex;
pub mod dump;
pub mod events;
pub mod text;

pub use crate::assemble::{assemble, Assembled};
pub use crate::dump::{dump_class, dump_dex, dump_with, DumpContext};
pub use crate::error::{ErrorKind, HexError};
pub use crate::events::{MemberKind, ParseEvent, StructureParser};
pub use crate::text::{DocumentKind, IntegrityFlags};

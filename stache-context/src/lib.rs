#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod context;
mod error;
mod helper;
mod options;
pub mod params;
pub mod path;
mod record;
mod resolve;
mod value;

pub use context::ContextStack;
pub use error::{ParseError, ParseErrorKind, ResolveError};
pub use helper::Helper;
pub use options::{DEFAULT_MAX_DEPTH, ResolveOptions};
pub use path::{Arg, Path, Segment};
pub use record::{CallError, CallResult, Object, Record};
pub use value::{Frame, Mapping, Value};

//! Process exit codes, a subset of BSD sysexits.h

/// Bad command line or missing subcommand
pub const USAGE: i32 = 64;

/// Document list or persisted data could not be interpreted,
/// or a document id does not exist
pub const DATAERR: i32 = 65;

/// Reading documents or writing view state failed
pub const IOERR: i32 = 74;

/// Invalid or unreadable configuration
pub const CONFIG: i32 = 78;

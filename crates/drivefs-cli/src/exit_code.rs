//! Exit codes for the CLI.
//!
//! Each [`ErrorKind`](drivefs_core::ErrorKind) maps to one code so scripts
//! can branch on the failure class without parsing messages.

/// Successful execution
pub const SUCCESS: u8 = 0;

/// General/unspecified error
pub const GENERAL_ERROR: u8 = 1;

/// Command-line usage error (bad arguments, malformed path)
pub const USAGE_ERROR: u8 = 2;

/// Path or node not found
pub const NOT_FOUND: u8 = 3;

/// The graph does not have the shape the command needs (duplicate names,
/// several parents, non-empty folder, document without content)
pub const CONFLICT: u8 = 4;

/// The store reported a failure
pub const REMOTE_ERROR: u8 = 5;

/// Local I/O failed (snapshot file, content transfer)
pub const IO_ERROR: u8 = 6;

//! Global Configuration Constants
//!
//! Defaults and fixed parameters for pdf-encrypt. Runtime options (input
//! files, output folder, suffix, log level) come from the command line and
//! fall back to the values defined here.

/// Application name used in the banner and prompts.
pub const APP_NAME: &str = "pdf-encrypt";

/// Extension of the files offered by the interactive picker (compared
/// case-insensitively, without the leading dot).
pub const PDF_EXTENSION: &str = "pdf";

/// Suffix spliced between the file stem and its extension when the user does
/// not pass `--suffix` or `--no-suffix`.
pub const DEFAULT_SUFFIX: &str = "-encrypted";

/// Folder receiving the encrypted files when `--output-folder` is omitted.
pub const DEFAULT_OUTPUT_FOLDER: &str = ".";

// === Encryption Parameters ===
// The standard security handler with a 128-bit RC4 key is what most PDF
// readers accept out of the box. Owner and user passwords are identical and
// every permission is granted once the document is opened.

/// Key length in bits handed to the standard security handler.
pub const ENCRYPTION_KEY_LENGTH: usize = 128;

/// Lowest header version able to carry a 128-bit key.
pub const MIN_PDF_VERSION: &str = "1.4";

/// Length in bytes of each of the two `/ID` strings written to the trailer.
pub const FILE_ID_LENGTH: usize = 16;

/// How far up the page tree inherited page attributes are looked for.
///
/// Guards against `/Parent` cycles in malformed files.
pub const MAX_PAGE_TREE_DEPTH: usize = 64;

/// Page attributes a page may inherit from its ancestors in the page tree.
pub const INHERITABLE_PAGE_KEYS: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

// === Input Expansion ===

/// Characters that turn an input argument into a glob pattern.
pub const GLOB_META_CHARS: &[char] = &['*', '?', '[', '{'];

// === Interactive Discovery ===

/// Directories skipped when looking for PDF files in interactive mode.
pub const EXCLUDED_PATTERNS: &[&str] = &[
    "target",       // Rust build artifacts
    "vendor",       // vendored dependencies
    "node_modules", // Node.js dependencies
    ".git",         // Git repository metadata
    ".github",      // GitHub workflows and metadata
    ".config",      // User configuration files
    ".local",       // Local user data
    ".cache",       // Application cache files
    ".ssh",         // SSH keys and configuration
    ".gnupg",       // GPG keys and configuration
];

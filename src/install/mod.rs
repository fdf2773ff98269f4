//! Platform installer strategies
//!
//! - [`homebrew`]: macOS, `brew install` doubles as upgrade
//! - [`package`]: removal of distribution-packaged protobuf on Linux
//! - [`archive`]: Linux, official release zip unpacked into a prefix

pub mod archive;
pub mod homebrew;
pub mod package;

pub use archive::ArchiveInstaller;
pub use homebrew::Homebrew;
pub use package::remove_packaged;

//! Authorization decisions over groups, personal files and shares.
//!
//! Every decision returns `Ok(false)` for a plain denial. An `Err` means an
//! upstream lookup failed and the caller should treat it as a denial too.

mod files;
mod groups;
mod sharing;

pub use files::FileAccessControl;
pub use groups::GroupManager;
pub use sharing::SharingEngine;

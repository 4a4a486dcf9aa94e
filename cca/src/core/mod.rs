//! Pure, deterministic logic for the generation pipeline.
//!
//! Nothing in here touches the filesystem, the network, or `git`.

pub mod fence;
pub mod naming;
pub mod scaffold;
pub mod types;

pub mod manifest_store;
pub mod workspace_links;

pub use manifest_store::{ManifestStore, ManifestStoreError, DEFAULT_MANIFEST_FILE};
pub use workspace_links::{replace_with_symlink, LinkError};

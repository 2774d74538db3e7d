//! Default names and labels used by the bootstrap policy.

/// Directory next to the program whose contents override bundled assets.
pub const ASSET_DIR_NAME: &str = "assets";

/// Label of the layer serving the asset directory.
pub const LABEL_ASSET_DIR: &str = "asset dir";
/// Label of the layer serving the archive bundled with the program.
pub const LABEL_BUILTIN: &str = "builtin";
/// Label of layers serving the program's own directory or a sub-directory of it.
pub const LABEL_EXE_DIR: &str = ".exe dir";
/// Label of caller-supplied override directories.
pub const LABEL_OVERRIDE: &str = "override";

/// Mount path every bootstrap layer is bound at.
pub const ROOT_MOUNT: &str = ".";

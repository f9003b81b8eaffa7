//! Path utilities for azgrant files.
//!
//! Credentials live per-user under the home directory; the optional
//! project config sits in the working directory:
//!
//! ```text
//! ~/.azgrant
//!  └── credentials.yaml      named credential profiles
//! pwd
//!  └── azgrant.yaml          tenant defaults and extra resource aliases
//! ```

use std::path::PathBuf;

use dirs::home_dir;
use lazy_static::lazy_static;

lazy_static! {
    static ref PROFILE_CFG_DIR: PathBuf = PathBuf::from(".azgrant");
    static ref CREDENTIALS_CFG: PathBuf = PathBuf::from("credentials.yaml");
    static ref AZGRANT_CFG: PathBuf = PathBuf::from("azgrant.yaml");
}

/// Path for the per-user credentials file.
pub fn credentials_cfg_path() -> PathBuf {
    home_dir()
        .expect("getting home dir")
        .join(PROFILE_CFG_DIR.as_path())
        .join(CREDENTIALS_CFG.as_path())
}

/// Local path for the project config.
pub fn azgrant_cfg_path_local() -> PathBuf {
    AZGRANT_CFG.clone()
}

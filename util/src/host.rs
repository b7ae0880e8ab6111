//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "MOW_SW_ROOT";

/// Get the root directory of the mower software.
///
/// The root contains the `params` directory and is where the `sessions` directory will be
/// created.
pub fn get_mow_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

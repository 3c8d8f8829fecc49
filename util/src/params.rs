//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (FW_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parameter file {0:?}: {1}")]
    FileLoadError(PathBuf, std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// Relative paths are resolved against the "$FW_SW_ROOT/params" directory.
/// Absolute paths are used as given, in which case the root variable is not
/// required.
pub fn load<P, T>(param_file_path: T) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    T: AsRef<Path>
{
    let param_file_path = param_file_path.as_ref();

    let path = if param_file_path.is_absolute() {
        param_file_path.to_path_buf()
    }
    else {
        let mut path = crate::host::get_fw_sw_root()
            .map_err(|_| LoadError::SwRootNotSet)?;
        path.push("params");
        path.push(param_file_path);
        path
    };

    // Load the file into a string
    let params_str = match read_to_string(&path) {
        Ok(s) => s,
        Err(e) => return Err(LoadError::FileLoadError(path, e))
    };

    from_str(&params_str)
}

/// Parse parameters from a TOML string.
pub fn from_str<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Gains {
        k_p: f64,
        #[serde(default)]
        k_i: f64
    }

    #[test]
    fn test_from_str() {
        let gains: Gains = from_str("k_p = 2.5").unwrap();
        assert_eq!(gains, Gains { k_p: 2.5, k_i: 0.0 });

        match from_str::<Gains>("k_i = 1.0") {
            Err(LoadError::DeserialiseError(_)) => (),
            other => panic!("Expected a deserialise error, got {:?}", other)
        }
    }

    #[test]
    fn test_load_missing_absolute() {
        let path = std::env::temp_dir().join("fw_sw_params_does_not_exist.toml");

        match load::<Gains, _>(&path) {
            Err(LoadError::FileLoadError(p, _)) => assert_eq!(p, path),
            other => panic!("Expected a file load error, got {:?}", other)
        }
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use dt_core::Result;
use dt_emit::EmittedModules;

/// Persists emitted modules verbatim.
pub trait WriteModules {
    /// Write every module into `dir`, returning the paths written.
    fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}

impl WriteModules for EmittedModules {
    fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(2);
        for (file, text) in [
            (&self.primary_file, &self.primary),
            (&self.support_file, &self.support),
        ] {
            let path = dir.join(file);
            fs::write(&path, text)?;
            dt_core::debug!("wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

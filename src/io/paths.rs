use std::fs;
use std::io;
use std::path::PathBuf;

/// `data/` next to the running executable, created if absent.
pub fn default_data_dir() -> io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe
        .parent()
        .map(|p| p.join("data"))
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "executable has no parent"))?;
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Resolve an explicit directory or fall back to the default, making sure
/// it exists either way.
pub fn resolve_data_dir(explicit: Option<&str>) -> io::Result<PathBuf> {
    match explicit {
        Some(dir) => {
            let dir = PathBuf::from(dir);
            fs::create_dir_all(&dir)?;
            Ok(dir)
        }
        None => default_data_dir(),
    }
}

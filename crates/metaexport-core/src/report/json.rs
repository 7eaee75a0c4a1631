use crate::errors::RecorderError;
use crate::report::RunSummary;
use std::io::Write;
use std::path::Path;

/// Write the summary to `out`, replacing any existing file.
///
/// The body goes to a temp file in the destination directory first and is
/// renamed into place, so readers never observe a partial report. An existing
/// report keeps its permissions; a new one gets the usual `0666 & !umask`.
pub fn write_json(summary: &RunSummary<'_>, out: &Path, pretty: bool) -> Result<(), RecorderError> {
    let body = if pretty {
        serde_json::to_string_pretty(summary)?
    } else {
        serde_json::to_string(summary)?
    };

    let write_err = |source: std::io::Error| RecorderError::Write {
        path: out.to_path_buf(),
        source,
    };

    let dir = match out.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(dir).map_err(write_err)?;
    if let Ok(existing) = std::fs::metadata(out) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(write_err)?;
    }
    tmp.write_all(body.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(out).map_err(|e| write_err(e.error))?;
    Ok(())
}

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Error;

pub const DEFAULT_OFFICE_BINARY: &str = "libreoffice";

/// Directory a headless office run writes into for `output`.
pub fn output_dir(output: &Path) -> PathBuf {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// File the office suite produces: the input's stem with a `.pdf` extension, inside `outdir`.
pub fn expected_output(input: &Path, outdir: &Path) -> Result<PathBuf, Error> {
    let stem = input
        .file_stem()
        .ok_or_else(|| Error::InvalidDocx(format!("no file name in {}", input.display())))?;
    let mut name = OsString::from(stem);
    name.push(".pdf");
    Ok(outdir.join(name))
}

/// Converts `input` with a headless office suite and moves the result to `output`.
pub fn convert_docx_to_pdf(binary: &Path, input: &Path, output: &Path) -> Result<(), Error> {
    let outdir = output_dir(output);
    let generated = expected_output(input, &outdir)?;
    std::fs::create_dir_all(&outdir)?;

    log::debug!(
        "Running {} --headless --convert-to pdf --outdir {} {}",
        binary.display(),
        outdir.display(),
        input.display()
    );
    let result = Command::new(binary)
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(&outdir)
        .arg(input)
        .output()
        .map_err(|e| Error::Office(format!("could not run {}: {e}", binary.display())))?;

    if !result.status.success() {
        let stderr = one_line(&String::from_utf8_lossy(&result.stderr));
        let details = if stderr.is_empty() {
            format!("{} exited with {}", binary.display(), result.status)
        } else {
            stderr
        };
        return Err(Error::Office(details));
    }

    if !generated.exists() {
        log::debug!("{} did not produce {}", binary.display(), generated.display());
        return Err(Error::MissingOutput);
    }

    if std::path::absolute(&generated)? != std::path::absolute(output)? {
        log::debug!("Moving {} to {}", generated.display(), output.display());
        std::fs::rename(&generated, output)?;
    }

    log::info!("Converted {} to {}", input.display(), output.display());
    Ok(())
}

fn one_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_output_replaces_extension_in_outdir() {
        let path = expected_output(Path::new("/in/report.final.docx"), Path::new("out")).unwrap();
        assert_eq!(path, Path::new("out/report.final.pdf"));
    }

    #[test]
    fn bare_file_name_uses_current_dir() {
        assert_eq!(output_dir(Path::new("result.pdf")), Path::new("."));
        assert_eq!(output_dir(Path::new("a/b/result.pdf")), Path::new("a/b"));
    }

    #[test]
    fn stderr_is_collapsed_to_one_line() {
        assert_eq!(one_line("  Error: source file\n\n could not be loaded \n"), "Error: source file could not be loaded");
    }

    #[test]
    fn input_without_file_name_fails_before_running_office() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out").join("result.pdf");
        let err = convert_docx_to_pdf(Path::new("no-such-office-binary"), Path::new(".."), &output)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDocx(_)), "{err}");
        assert!(!output.parent().unwrap().exists());
    }
}

//! Convert XMI files into Standard MIDI Files.
//!
//! ```bash
//! xmi2midi out/ music/*.xmi
//! ```
//!
//! Each input is written to `<DST_DIR>/<input name>.mid`. Set `RUST_LOG=debug` to see the
//! tempo and instruments of every sequence.

use anyhow::{Context, Result};
use clap::Parser;
use globset::Glob;
use log::{error, info, warn};
use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

/// Whether wildcards in the arguments were already expanded by the shell.
const SHELL_GLOBBING: bool = !cfg!(windows);

/// Converts the specified XMI file(s) to MIDI format
#[derive(Parser)]
#[command(name = "xmi2midi")]
#[command(version)]
struct Cli {
    /// Directory where the .mid files are written, created if missing
    dst_dir: PathBuf,

    /// XMI files to convert
    #[arg(required = true)]
    inputs: Vec<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    converted: usize,
    failed: usize,
    skipped: usize,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(&cli.dst_dir, &cli.inputs, SHELL_GLOBBING) {
        Ok(summary) => {
            println!("Total converted tracks: {}", summary.converted);
            if summary.skipped > 0 {
                println!("Skipped unreadable files: {}", summary.skipped);
            }
            if summary.failed > 0 {
                println!("Failed files: {}", summary.failed);
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(dst_dir: &Path, args: &[String], shell_globbing: bool) -> Result<Summary> {
    fs::create_dir_all(dst_dir)
        .with_context(|| format!("cannot create directory {}", dst_dir.display()))?;

    let mut summary = Summary::default();
    let mut paths = Vec::new();
    let mut files = Vec::new();
    for path in expand_inputs(args, shell_globbing)? {
        info!("Processing {}...", path.display());
        match fs::read(&path) {
            Ok(data) => {
                paths.push(path);
                files.push(data);
            }
            Err(err) => {
                //Missing or unreadable inputs do not stop the batch
                warn!("cannot open file {}: {}", path.display(), err);
                summary.skipped += 1;
            }
        }
    }

    let results = xmi2mid::convert_all(&files);
    for ((path, data), result) in paths.iter().zip(&files).zip(results) {
        let outcome = if data.is_empty() {
            Err(anyhow::anyhow!("file {} is empty", path.display()))
        } else {
            result
                .with_context(|| format!("failed to convert file {}", path.display()))
                .and_then(|mid| save(dst_dir, path, &mid))
        };
        match outcome {
            Ok(dst) => {
                info!("Wrote {}", dst.display());
                summary.converted += 1;
            }
            Err(err) => {
                error!("{:#}", err);
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

/// Write a converted file into `dst_dir`, returning its path.
fn save(dst_dir: &Path, input: &Path, mid: &[u8]) -> Result<PathBuf> {
    let name = input
        .file_name()
        .with_context(|| format!("{} does not name a file", input.display()))?;
    let dst = dst_dir.join(name).with_extension("mid");
    fs::write(&dst, mid).with_context(|| format!("error writing to file {}", dst.display()))?;
    Ok(dst)
}

/// Expand wildcards in the file name part of each argument, unless the shell already did.
fn expand_inputs(args: &[String], shell_globbing: bool) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for arg in args {
        if shell_globbing || !arg.contains(&['*', '?'][..]) {
            inputs.push(PathBuf::from(arg));
            continue;
        }
        let matches = glob_files(Path::new(arg))?;
        if matches.is_empty() {
            warn!("no files match {}", arg);
        }
        inputs.extend(matches);
    }
    Ok(inputs)
}

fn glob_files(pattern: &Path) -> Result<Vec<PathBuf>> {
    let dir = match pattern.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let name = pattern
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("invalid file pattern {}", pattern.display()))?;
    let matcher = Glob::new(name)
        .with_context(|| format!("invalid file pattern {}", pattern.display()))?
        .compile_matcher();

    let mut matches = Vec::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("cannot list directory {}: {}", dir.display(), err);
            return Ok(matches);
        }
    };
    for entry in entries {
        let entry = entry.with_context(|| format!("cannot list directory {}", dir.display()))?;
        if entry.path().is_file() && matcher.is_match(entry.file_name()) {
            matches.push(entry.path());
        }
    }
    matches.sort();
    Ok(matches)
}

#[cfg(test)]
mod test {
    use super::*;

    /// A single-sequence XMI file holding a lone end of track marker.
    const XMI: &[u8] = b"FORM\0\0\0\x0eXDIRINFO\0\0\0\x02\x01\0\
                         CAT \0\0\0\x1bXMIDFORM\0\0\0\x0fXMIDEVNT\0\0\0\x03\xFF\x2F\0";

    const MID: &[u8] =
        b"MThd\0\0\0\x06\0\0\0\x01\0\x3CMTrk\0\0\0\x04\0\xFF\x2F\0";

    fn arg(path: &Path) -> String {
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn converts_into_dst_dir() {
        let src = tempfile::tempdir().unwrap();
        let dst = src.path().join("out").join("music");
        fs::write(src.path().join("intro.xmi"), XMI).unwrap();
        fs::write(src.path().join("battle.XMI"), XMI).unwrap();

        let args = [
            arg(&src.path().join("intro.xmi")),
            arg(&src.path().join("battle.XMI")),
        ];
        let summary = run(&dst, &args, true).unwrap();
        assert_eq!(
            summary,
            Summary {
                converted: 2,
                failed: 0,
                skipped: 0
            }
        );
        assert_eq!(fs::read(dst.join("intro.mid")).unwrap(), MID);
        assert_eq!(fs::read(dst.join("battle.mid")).unwrap(), MID);
    }

    #[test]
    fn bad_inputs_are_counted() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("good.xmi"), XMI).unwrap();
        fs::write(src.path().join("empty.xmi"), b"").unwrap();
        fs::write(src.path().join("garbage.xmi"), b"garbage").unwrap();

        let args = [
            arg(&src.path().join("missing.xmi")),
            arg(&src.path().join("empty.xmi")),
            arg(&src.path().join("garbage.xmi")),
            arg(&src.path().join("good.xmi")),
        ];
        let summary = run(src.path(), &args, true).unwrap();
        assert_eq!(
            summary,
            Summary {
                converted: 1,
                failed: 2,
                skipped: 1
            }
        );
        assert!(src.path().join("good.mid").is_file());
        assert!(!src.path().join("garbage.mid").exists());
        assert!(!src.path().join("empty.mid").exists());
    }

    #[test]
    fn wildcards_without_shell_globbing() {
        let src = tempfile::tempdir().unwrap();
        for name in ["b.xmi", "a.xmi", "c.txt"].iter() {
            fs::write(src.path().join(name), XMI).unwrap();
        }
        fs::create_dir(src.path().join("d.xmi")).unwrap();

        let pattern = arg(&src.path().join("*.xmi"));
        let expanded = expand_inputs(&[pattern.clone()], false).unwrap();
        assert_eq!(
            expanded,
            vec![src.path().join("a.xmi"), src.path().join("b.xmi")]
        );

        let single = arg(&src.path().join("?.txt"));
        assert_eq!(
            expand_inputs(&[single], false).unwrap(),
            vec![src.path().join("c.txt")]
        );

        assert_eq!(
            expand_inputs(&[arg(&src.path().join("*.mid"))], false).unwrap(),
            Vec::<PathBuf>::new()
        );

        //The shell already had its chance to expand the pattern
        assert_eq!(
            expand_inputs(&[pattern.clone()], true).unwrap(),
            vec![PathBuf::from(pattern)]
        );
    }

    #[test]
    fn cli_requires_an_input() {
        assert!(Cli::try_parse_from(&["xmi2midi", "out"]).is_err());
        let cli = Cli::try_parse_from(&["xmi2midi", "out", "a.xmi", "b.xmi"]).unwrap();
        assert_eq!(cli.dst_dir, PathBuf::from("out"));
        assert_eq!(cli.inputs, vec!["a.xmi".to_string(), "b.xmi".to_string()]);
    }
}

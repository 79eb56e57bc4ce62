//! Locating the operator's Clash configuration file.

use crate::error::{AppError, AppResult};
use crate::output;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Compose definitions live next to the input and are never candidates.
const COMPOSE_FILES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

fn is_candidate(name: &str) -> bool {
    (name.ends_with(".yaml") || name.ends_with(".yml")) && !COMPOSE_FILES.contains(&name)
}

/// YAML files directly inside `dir`, sorted by name.
pub fn candidate_files(dir: &Path) -> AppResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if is_candidate(&entry.file_name().to_string_lossy()) {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

/// Show a numbered menu on `out` and read a 1-based choice from `input`,
/// asking again until the answer is valid.
pub fn choose<R: BufRead, W: Write>(
    files: &[PathBuf],
    input: &mut R,
    out: &mut W,
) -> AppResult<PathBuf> {
    writeln!(out, "Several configuration files found:")?;
    for (i, file) in files.iter().enumerate() {
        writeln!(out, "  {}. {}", i + 1, display_name(file))?;
    }

    let mut line = String::new();
    loop {
        write!(out, "Select a file (1-{}): ", files.len())?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(AppError::Selection("end of input".to_string()));
        }

        match line.trim().parse::<usize>() {
            Ok(n) if (1..=files.len()).contains(&n) => return Ok(files[n - 1].clone()),
            _ => writeln!(
                out,
                "{}",
                output::format_status(
                    output::Status::Warning,
                    format!("Enter a number between 1 and {}", files.len())
                )
            )?,
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Pick the input file: `explicit` if given, otherwise the single
/// candidate in `dir`, otherwise ask on stdin.
pub fn select_config_file(dir: &Path, explicit: Option<&Path>) -> AppResult<PathBuf> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(AppError::ConfigNotFound(path.to_path_buf()));
        }
        return Ok(path.to_path_buf());
    }

    let files = candidate_files(dir)?;
    debug!("{} candidate configuration file(s) in {}", files.len(), dir.display());
    match files.len() {
        0 => Err(AppError::NoConfigFiles(dir.to_path_buf())),
        1 => Ok(files[0].clone()),
        _ => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            choose(&files, &mut input, &mut io::stdout())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_ID: AtomicU64 = AtomicU64::new(0);

    fn temp_dir() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::Relaxed);
        let dir = env::temp_dir().join(format!("clashdock-discovery-{}-{}", std::process::id(), id));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn compose_files_are_excluded_and_names_sorted() {
        let dir = temp_dir();
        for name in ["b.yml", "a.yaml", "docker-compose.yml", "compose.yaml", "notes.txt"] {
            fs::write(dir.join(name), "x").unwrap();
        }
        fs::create_dir_all(dir.join("dir.yaml")).unwrap();

        let files = candidate_files(&dir).unwrap();
        assert_eq!(files, vec![dir.join("a.yaml"), dir.join("b.yml")]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn no_candidates_is_an_input_error() {
        let dir = temp_dir();
        let err = select_config_file(&dir, None).unwrap_err();
        assert!(matches!(err, AppError::NoConfigFiles(_)));
        assert!(err.is_input());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn single_candidate_is_used() {
        let dir = temp_dir();
        fs::write(dir.join("sub.yaml"), "proxies: []").unwrap();
        assert_eq!(select_config_file(&dir, None).unwrap(), dir.join("sub.yaml"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = temp_dir();
        let err = select_config_file(&dir, Some(&dir.join("missing.yaml"))).unwrap_err();
        assert!(matches!(err, AppError::ConfigNotFound(_)));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn menu_reprompts_on_invalid_choice() {
        let files = vec![PathBuf::from("a.yaml"), PathBuf::from("b.yaml")];
        let mut input = Cursor::new("zero\n7\n2\n");
        let mut out = Vec::new();

        let chosen = choose(&files, &mut input, &mut out).unwrap();
        assert_eq!(chosen, PathBuf::from("b.yaml"));

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  1. a.yaml"));
        assert_eq!(text.matches("Enter a number between 1 and 2").count(), 2);
    }

    #[test]
    fn menu_end_of_input() {
        let files = vec![PathBuf::from("a.yaml"), PathBuf::from("b.yaml")];
        let mut input = Cursor::new("");
        let err = choose(&files, &mut input, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, AppError::Selection(_)));
    }
}

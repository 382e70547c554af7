use crate::error::*;
use crate::verdict::{Verdict, VerdictCode};
use log::{info, warn};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

/// All `*.in` files one level below `dir` (`test/`, `ourtest/`, ...), sorted.
pub fn find_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut inputs = vec![];
    let entries =
        fs::read_dir(dir).chain_err(|| format!("can not read directory {}", dir.display()))?;
    for entry in entries {
        let sub = entry?.path();
        if !sub.is_dir() {
            continue;
        }
        for f in fs::read_dir(&sub)? {
            let path = f?.path();
            if path.extension().map_or(false, |e| e == "in") && path.is_file() {
                inputs.push(path);
            }
        }
    }
    inputs.sort();
    Ok(inputs)
}

pub fn run_case(binary: &Path, input: &Path) -> Result<Verdict> {
    info!("test: {}", input.display());
    let stdin =
        File::open(input).chain_err(|| format!("failed to read input {}", input.display()))?;
    let answer = input.with_extension("out");
    let expect = if answer.exists() {
        Some(
            fs::read_to_string(&answer)
                .chain_err(|| format!("failed to read answer {}", answer.display()))?,
        )
    } else {
        None
    };

    let start = Instant::now();
    let out = Command::new(binary)
        .stdin(stdin)
        .stderr(Stdio::inherit())
        .output()
        .chain_err(|| format!("can not run {}", binary.display()))?;
    let elapsed = start.elapsed();
    if !out.status.success() {
        warn!("RE: {}", out.status);
    }

    let actual = String::from_utf8_lossy(&out.stdout);
    let v = Verdict::judge(
        input.display(),
        out.status.success(),
        &actual,
        expect.as_deref(),
        elapsed,
    );

    match v.code() {
        VerdictCode::WrongAnswer => {
            eprintln!("=== output ===");
            eprint!("{}", actual);
            eprintln!("=== expect ===");
            eprint!("{}", expect.as_deref().unwrap_or_default());
        }
        VerdictCode::NoAnswer => {
            eprintln!("=== output ===");
            eprint!("{}", actual);
        }
        VerdictCode::Accepted | VerdictCode::RuntimeError => (),
    }
    Ok(v)
}

/// Runs every case found under `dir`, printing a verdict line for each.
/// Returns the number of accepted cases and the total.
pub fn run_all(binary: &Path, dir: &Path, color: bool) -> Result<(usize, usize)> {
    use termcolor::{Buffer, BufferWriter, ColorChoice};

    let binary = std::path::absolute(binary)?;
    let inputs = find_inputs(dir)?;
    let w = BufferWriter::stdout(ColorChoice::Auto);
    let mut accepted = 0;

    for input in &inputs {
        let v = run_case(&binary, input)?;
        if v.is_accepted() {
            accepted += 1;
        }
        let mut buf = if color {
            w.buffer()
        } else {
            Buffer::no_color()
        };
        v.print(&mut buf).chain_err(|| "can not buffer verdict")?;
        w.print(&buf).chain_err(|| "can not output verdict")?;
    }
    Ok((accepted, inputs.len()))
}

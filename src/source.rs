use crate::config::Configuration;
use crate::error::*;
use crate::template::CommandTemplate;
use error_chain::bail;
use log::{debug, info};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const MAIN_SOURCE: &str = "main.cpp";

/// The source file of a problem: `<dir>/main.cpp`, or the file itself.
pub fn to_source<P: AsRef<Path>>(problem: P) -> Result<PathBuf> {
    let problem = problem.as_ref();
    let meta = std::fs::metadata(problem)
        .chain_err(|| format!("{} does not exist", problem.display()))?;
    if meta.is_dir() {
        Ok(problem.join(MAIN_SOURCE))
    } else {
        Ok(problem.to_path_buf())
    }
}

/// The directory holding a problem's source and test cases.
pub fn to_source_dir<P: AsRef<Path>>(problem: P) -> Result<PathBuf> {
    let src = to_source(problem)?;
    match src.parent() {
        Some(p) if !p.as_os_str().is_empty() => Ok(p.to_path_buf()),
        _ => Ok(PathBuf::from(".")),
    }
}

/// `a/main.cpp` -> `a/main`
pub fn binary_of(src: &Path) -> PathBuf {
    src.with_extension("")
}

/// `a/main.cpp` -> `a/main.out.cpp`
pub fn bundled_of(src: &Path) -> PathBuf {
    let stem = src.file_stem().unwrap_or_default().to_string_lossy();
    let name = match src.extension() {
        Some(ext) => format!("{}.out.{}", stem, ext.to_string_lossy()),
        None => format!("{}.out", stem),
    };
    src.with_file_name(name)
}

pub fn template_vars(src: &Path, output: &Path) -> HashMap<&'static str, String> {
    let cxx = std::env::var("CXX").unwrap_or_else(|_| String::from("g++"));
    let mut vars = HashMap::new();
    vars.insert("Source", src.display().to_string());
    vars.insert("Output", output.display().to_string());
    vars.insert("CXX", cxx);
    vars
}

pub fn run_command(cmd: &mut Command) -> Result<()> {
    debug!("run {:?}", cmd);
    let status = cmd
        .status()
        .chain_err(|| format!("can not run {:?}", cmd.get_program()))?;
    if !status.success() {
        bail!("{} failed: {}", cmd.get_program().to_string_lossy(), status);
    }
    Ok(())
}

fn command_of<S: AsRef<OsStr>>(args: &[S]) -> Option<Command> {
    let (program, rest) = args.split_first()?;
    let mut cmd = Command::new(program);
    cmd.args(rest);
    Some(cmd)
}

/// Compiles a problem, returning the path of the produced binary.
pub fn compile(config: &Configuration, problem: &str, opt: bool) -> Result<PathBuf> {
    let src = to_source(problem)?;
    let output = binary_of(&src);
    let (template, raw): (&CommandTemplate, &str) = if opt {
        (&config.compile_opt, config.compile_opt_str.as_str())
    } else {
        (&config.compile_debug, config.compile_debug_str.as_str())
    };
    debug!("{} = {:?}", template.name(), raw);

    let args = template.render_args(&template_vars(&src, &output))?;
    info!("compile: {}", src.display());
    debug!("compile command: {:?}", args);

    match command_of(&args) {
        Some(mut cmd) => {
            run_command(&mut cmd).chain_err(|| format!("failed to build {}", src.display()))?
        }
        None => info!("{} is empty, skip compiling", template.name()),
    }
    Ok(output)
}

/// Compiles a problem and runs it attached to the terminal.
pub fn run(config: &Configuration, problem: &str, opt: bool) -> Result<()> {
    let binary = compile(config, problem, opt)?;
    let binary = std::path::absolute(&binary)
        .chain_err(|| format!("failed to convert {} to an absolute path", binary.display()))?;
    info!("run: {}", binary.display());
    run_command(
        Command::new(&binary)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit()),
    )
}

/// Bundles a problem's source for submission.  Without a bundle command the
/// source is submitted as is.
pub fn bundle(config: &Configuration, problem: &str) -> Result<PathBuf> {
    let src = to_source(problem)?;
    if config.bundle_source.is_empty() {
        return Ok(src);
    }

    let out = bundled_of(&src);
    debug!("bundle_source = {:?}", config.bundle_source_str);
    let args = config
        .bundle_source
        .render_args(&template_vars(&src, &out))?;
    info!("bundle: {} -> {}", src.display(), out.display());
    debug!("bundle command: {:?}", args);

    run_command(Command::new("bash").arg("-c").arg(args.join(" ")))
        .chain_err(|| format!("failed to bundle {}", src.display()))?;
    Ok(out)
}

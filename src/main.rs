mod app;
mod config;
mod contest;
mod error;
mod init;
mod oj;
mod source;
mod template;
mod testcase;
mod verdict;

use config::ConfigResolver;
use error::*;
use log::{error, info, warn};
use std::path::Path;
use std::process::{exit, Command, Stdio};

fn build(resolver: &mut ConfigResolver, problem: &str, opt: bool) -> Result<()> {
    let config = resolver.resolve(problem)?;
    source::compile(&config, problem, opt)?;
    Ok(())
}

fn run_problem(resolver: &mut ConfigResolver, problem: &str, opt: bool) -> Result<()> {
    let config = resolver.resolve(problem)?;
    source::run(&config, problem, opt)
}

fn download(resolver: &mut ConfigResolver, problem: &str) -> Result<()> {
    let config = resolver.resolve(problem)?;
    let dir = source::to_source_dir(problem)?;
    oj::download(&config, &dir)
}

fn test(resolver: &mut ConfigResolver, problem: &str, opt: bool, color: bool) -> Result<()> {
    download(resolver, problem)?;

    let config = resolver.resolve(problem)?;
    let binary = source::compile(&config, problem, opt)?;
    let dir = source::to_source_dir(problem)?;
    let (accepted, total) = testcase::run_all(&binary, &dir, color)?;
    if total == 0 {
        warn!("no test cases in {}", dir.display());
    } else {
        info!("{}/{} accepted", accepted, total);
    }
    Ok(())
}

fn copy_to_clipboard(command: &str, file: &Path) -> Result<()> {
    let command = if command.is_empty() { "pbcopy" } else { command };
    let args: Vec<&str> = command.split_whitespace().collect();
    let (program, rest) = args
        .split_first()
        .chain_err(|| "clipboard command is blank")?;
    let input = std::fs::File::open(file)?;
    source::run_command(Command::new(program).args(rest).stdin(Stdio::from(input)))
}

fn submit(resolver: &mut ConfigResolver, problem: &str, clip: bool) -> Result<()> {
    let config = resolver.resolve(problem)?;
    let src = source::bundle(&config, problem)?;

    if clip {
        info!("copy to clipboard");
        if let Err(e) = copy_to_clipboard(&config.pbcopy, &src) {
            error!("failed to copy: {}", e);
        }
    }

    let dir = source::to_source_dir(problem)?;
    match oj::problem_url(&config, &dir)? {
        Some(url) => oj::submit(&url, &dir, &src),
        None => {
            info!("no judge URL, not submitting");
            Ok(())
        }
    }
}

fn print_url(resolver: &mut ConfigResolver, problem: &str) -> Result<()> {
    let config = resolver.resolve(problem)?;
    let dir = source::to_source_dir(problem)?;
    println!("{}", oj::problem_url(&config, &dir)?.unwrap_or_default());
    Ok(())
}

fn run(args: app::App) -> Result<()> {
    use app::Cmd;
    let mut resolver = ConfigResolver::new();

    match args.command {
        Cmd::Init { url, problems } => {
            let cwd = std::env::current_dir()?;
            let dir = init::init_contest(&mut resolver, &cwd, &url, &problems)?;
            info!("initialized {}", dir.display());
            Ok(())
        }
        Cmd::Build { problem, opt } => build(&mut resolver, &problem, opt),
        Cmd::Run { problem, opt } => run_problem(&mut resolver, &problem, opt),
        Cmd::Download { problems } => problems
            .iter()
            .try_for_each(|p| download(&mut resolver, p)),
        Cmd::Test { problem, opt } => test(&mut resolver, &problem, opt, !args.no_color),
        Cmd::Submit { problem, clip } => submit(&mut resolver, &problem, clip),
        Cmd::Url { problem } => print_url(&mut resolver, &problem),
    }
}

fn main() {
    use app::Parser;
    let args = app::App::parse();
    let v = usize::from(args.verbose).saturating_add(2);
    stderrlog::new()
        .module(module_path!())
        .verbosity(v)
        .init()
        .unwrap();

    info!("this is contest supporter, {}", app::VERSION);

    if let Err(e) = run(args) {
        error!("{}", e);
        for cause in e.iter().skip(1) {
            error!("caused by: {}", cause);
        }
        exit(1);
    }
}

// Glue around online-judge-tools: `oj-api` lists a contest's problems, `oj`
// downloads samples and submits.

use crate::config::Configuration;
use crate::contest::{self, Site};
use crate::error::*;
use crate::source::run_command;
use error_chain::bail;
use log::{debug, info};
use serde::Deserialize;
use std::path::Path;
use std::process::{Command, Stdio};

#[derive(Debug, Deserialize)]
struct GetContest {
    result: GetContestResult,
}

#[derive(Debug, Deserialize)]
struct GetContestResult {
    problems: Vec<Problem>,
}

#[derive(Debug, Deserialize)]
struct Problem {
    url: String,
}

/// Extracts the problem URLs, in judge order, from `oj-api get-contest`.
pub fn parse_problem_list(raw: &[u8]) -> Result<Vec<String>> {
    let resp: GetContest =
        serde_json::from_slice(raw).chain_err(|| "can not parse oj-api response")?;
    Ok(resp.result.problems.into_iter().map(|p| p.url).collect())
}

pub fn list_problems(contest_url: &str) -> Result<Vec<String>> {
    let out = Command::new("oj-api")
        .arg("get-contest")
        .arg(contest_url)
        .stderr(Stdio::inherit())
        .output()
        .chain_err(|| "can not run oj-api, is online-judge-api-client installed?")?;
    if !out.status.success() {
        bail!("oj-api get-contest {} failed: {}", contest_url, out.status);
    }
    debug!("oj-api response: {}", String::from_utf8_lossy(&out.stdout));
    parse_problem_list(&out.stdout)
}

/// The label a problem is matched by: its configured ID, or else the name
/// of its directory.
pub fn problem_label(config: &Configuration, problem_dir: &Path) -> String {
    if !config.problem_id.is_empty() {
        return config.problem_id.clone();
    }
    problem_dir
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The judge URL of a problem, or `None` if its contest is offline.
pub fn problem_url(config: &Configuration, problem_dir: &Path) -> Result<Option<String>> {
    let contest_url = &config.contest_url;
    if contest_url.is_empty() {
        info!("no contest_url for {}", problem_dir.display());
        return Ok(None);
    }

    match contest::classify_contest(contest_url)?.site {
        Site::Other => return Ok(None),
        Site::AtCoder | Site::Codeforces | Site::Codechef => (),
    }

    let label = problem_label(config, problem_dir);
    let urls = list_problems(contest_url)?;
    Ok(contest::match_problem_url(contest_url, &label, &urls)?)
}

/// Downloads sample cases into `<dir>/test` unless they are already there.
pub fn download(config: &Configuration, problem_dir: &Path) -> Result<()> {
    if problem_dir.join("test").exists() {
        info!("testcases are already fetched");
        return Ok(());
    }

    let url = match problem_url(config, problem_dir)? {
        Some(u) => u,
        None => {
            info!("unknown site, skip");
            return Ok(());
        }
    };

    info!("fetch testcases from {}", url);
    run_command(Command::new("oj").arg("d").arg(&url).current_dir(problem_dir))
        .chain_err(|| format!("failed to download testcases of {}", url))
}

pub fn submit(url: &str, problem_dir: &Path, file: &Path) -> Result<()> {
    let name = file.file_name().chain_err(|| "source has no file name")?;
    info!("submit {} to {}", file.display(), url);
    run_command(
        Command::new("oj")
            .arg("submit")
            .arg(url)
            .arg(name)
            .args(["--no-open", "-w", "0"])
            .current_dir(problem_dir),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFragment;

    #[test]
    fn parses_problem_list() {
        let raw = br#"{
            "status": "ok",
            "messages": [],
            "result": {
                "url": "https://atcoder.jp/contests/abc100",
                "name": "AtCoder Beginner Contest 100",
                "problems": [
                    {"url": "https://atcoder.jp/contests/abc100/tasks/abc100_a", "name": "Happy Birthday!"},
                    {"url": "https://atcoder.jp/contests/abc100/tasks/abc100_b", "name": "Ringo's Favorite Numbers"}
                ]
            }
        }"#;
        assert_eq!(
            parse_problem_list(raw).unwrap(),
            vec![
                "https://atcoder.jp/contests/abc100/tasks/abc100_a",
                "https://atcoder.jp/contests/abc100/tasks/abc100_b",
            ]
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_problem_list(b"Traceback (most recent call last):").is_err());
        assert!(parse_problem_list(br#"{"status": "error"}"#).is_err());
    }

    #[test]
    fn label_falls_back_to_dir_name() {
        let mut fragment = ConfigFragment::default();
        let config = Configuration::compile(fragment.clone()).unwrap();
        assert_eq!(problem_label(&config, Path::new("abc100/c")), "c");

        fragment.problem_id = Some(String::from("abc100_c"));
        let config = Configuration::compile(fragment).unwrap();
        assert_eq!(problem_label(&config, Path::new("abc100/c")), "abc100_c");
    }

    #[test]
    fn offline_problems_have_no_url() {
        let fragment = ConfigFragment {
            contest_url: Some(String::from("practice")),
            ..Default::default()
        };
        let config = Configuration::compile(fragment).unwrap();
        assert_eq!(problem_url(&config, Path::new("practice/a")).unwrap(), None);

        let config = Configuration::compile(ConfigFragment::default()).unwrap();
        assert_eq!(problem_url(&config, Path::new("a")).unwrap(), None);
    }

    #[test]
    fn bad_contest_url_is_reported() {
        let fragment = ConfigFragment {
            contest_url: Some(String::from("https://example.com/contest/1")),
            ..Default::default()
        };
        let config = Configuration::compile(fragment).unwrap();
        assert!(problem_url(&config, Path::new("a")).is_err());
    }
}

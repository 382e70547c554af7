use log::debug;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new("[/_]").unwrap());
static LETTERS: LazyLock<Regex> = LazyLock::new(|| Regex::new("^[a-z]+$").unwrap());

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ContestError {
    #[error("contest URL is empty")]
    EmptyUrl,
    #[error("can not parse contest URL {0}: {1}")]
    BadUrl(String, url::ParseError),
    #[error("invalid URL of {0}: {1}")]
    InvalidUrlForSite(Site, String),
    #[error("unknown contest URL: {0}")]
    UnknownUrl(String),
    #[error("failed to predict order: {0}")]
    UnpredictableOrder(String),
    #[error("cannot find URL contest({contest}), problem({problem})")]
    NoMatchingUrl { contest: String, problem: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    AtCoder,
    Codeforces,
    Codechef,
    Other,
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Site::AtCoder => "AtCoder",
            Site::Codeforces => "Codeforces",
            Site::Codechef => "Codechef",
            Site::Other => "other site",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContestInfo {
    pub site: Site,
    pub id: String,
    pub offline: bool,
}

/// Works out which judge a contest URL belongs to.  Anything without a
/// scheme is taken to be a local, offline contest named by the input.
pub fn classify_contest(contest_url: &str) -> Result<ContestInfo, ContestError> {
    if contest_url.is_empty() {
        return Err(ContestError::EmptyUrl);
    }

    let u = match Url::parse(contest_url) {
        Ok(u) => u,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            return Ok(ContestInfo {
                site: Site::Other,
                id: contest_url.to_string(),
                offline: true,
            })
        }
        Err(e) => return Err(ContestError::BadUrl(contest_url.to_string(), e)),
    };

    let path: Vec<&str> = u.path_segments().map(|s| s.collect()).unwrap_or_default();
    let segment = |i: usize| path.get(i).copied().filter(|s| !s.is_empty());
    let invalid = |site| ContestError::InvalidUrlForSite(site, contest_url.to_string());

    match u.host_str() {
        Some("atcoder.jp") => {
            if segment(0) != Some("contests") {
                return Err(invalid(Site::AtCoder));
            }
            let id = segment(1).ok_or_else(|| invalid(Site::AtCoder))?;
            Ok(ContestInfo {
                site: Site::AtCoder,
                id: id.to_string(),
                offline: false,
            })
        }
        Some("codeforces.com") => {
            if segment(0) != Some("contest") {
                return Err(invalid(Site::Codeforces));
            }
            let id = segment(1).ok_or_else(|| invalid(Site::Codeforces))?;
            Ok(ContestInfo {
                site: Site::Codeforces,
                id: format!("codeforces-{}", id),
                offline: false,
            })
        }
        Some("www.codechef.com") => {
            let id = segment(0).ok_or_else(|| invalid(Site::Codechef))?;
            Ok(ContestInfo {
                site: Site::Codechef,
                id: format!("codechef-{}", id),
                offline: false,
            })
        }
        _ => Err(ContestError::UnknownUrl(contest_url.to_string())),
    }
}

/// Predicts the zero-based position of a problem in its contest.
///
/// `"3"` is the third problem; otherwise the last `/`- or `_`-separated
/// token is read as a bijective base-26 numeral (`a`, ..., `z`, `aa`, ...).
pub fn predict_order(label: &str) -> Result<usize, ContestError> {
    let unpredictable = || ContestError::UnpredictableOrder(label.to_string());

    if let Ok(n) = label.parse::<usize>() {
        return n.checked_sub(1).ok_or_else(unpredictable);
    }

    let token = SEPARATOR.split(label).last().unwrap_or("").to_lowercase();
    if !LETTERS.is_match(&token) {
        return Err(unpredictable());
    }

    let mut value: usize = 0;
    for c in token.bytes() {
        let digit = usize::from(c - b'a' + 1);
        value = value
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(unpredictable)?;
    }
    Ok(value - 1)
}

fn last_segment(u: &str) -> &str {
    u.trim_end_matches('/').rsplit('/').next().unwrap_or(u)
}

/// Picks the URL of `problem` out of the judge's problem list.
///
/// Returns `Ok(None)` for offline contests, which have nothing to match
/// against.  A case-insensitive match on the last path segment wins over
/// order prediction; ties go to the first candidate in list order.
pub fn match_problem_url<S: AsRef<str>>(
    contest_url: &str,
    problem: &str,
    candidates: &[S],
) -> Result<Option<String>, ContestError> {
    let contest = classify_contest(contest_url)?;
    if contest.site == Site::Other {
        return Ok(None);
    }

    let wanted = problem.to_lowercase();
    if let Some(u) = candidates
        .iter()
        .map(|u| u.as_ref())
        .find(|u| last_segment(u).to_lowercase() == wanted)
    {
        return Ok(Some(u.to_string()));
    }

    match predict_order(problem) {
        Ok(ord) => {
            let hit = candidates
                .iter()
                .map(|u| u.as_ref())
                .find(|u| predict_order(last_segment(u)).ok() == Some(ord));
            if let Some(u) = hit {
                return Ok(Some(u.to_string()));
            }
        }
        Err(e) => debug!("{}", e),
    }

    Err(ContestError::NoMatchingUrl {
        contest: contest_url.to_string(),
        problem: problem.to_string(),
    })
}

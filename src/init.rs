use crate::config::{ConfigFragment, ConfigResolver, FRAGMENT_FILE};
use crate::contest;
use crate::error::*;
use error_chain::bail;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_file() {
        bail!("{} is not a regular file", src.display());
    }
    fs::copy(src, dst)
        .chain_err(|| format!("failed to copy {} to {}", src.display(), dst.display()))?;
    Ok(())
}

/// Copies a file, or a whole directory tree, to `dst`.
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_dir() {
        return copy_file(src, dst);
    }
    for entry in walkdir::WalkDir::new(src) {
        let entry = entry.chain_err(|| format!("can not walk {}", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .chain_err(|| format!("{} escapes {}", entry.path().display(), src.display()))?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .chain_err(|| format!("can not create {}", target.display()))?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn init_problem(dir: &Path, contest_url: &str, id: &str, template_src: &Path) -> Result<()> {
    let pdir = dir.join(id);
    fs::create_dir(&pdir).chain_err(|| format!("can not create {}", pdir.display()))?;
    info!("init problem: {}", id);

    copy_file(template_src, &pdir.join("main.cpp"))?;
    fs::create_dir(pdir.join("ourtest"))?;

    let fragment = ConfigFragment {
        problem_id: Some(id.to_string()),
        contest_url: Some(contest_url.to_string()),
        ..Default::default()
    };
    let text = toml::to_string(&fragment).chain_err(|| "can not encode problem config")?;
    fs::write(pdir.join(FRAGMENT_FILE), text)?;
    Ok(())
}

/// Creates `<base>/<contest id>` with the contest template files and one
/// directory per problem.  Returns the contest directory.
pub fn init_contest(
    resolver: &mut ConfigResolver,
    base: &Path,
    contest_url: &str,
    problems: &[String],
) -> Result<PathBuf> {
    let config = resolver.resolve(base)?;

    let template_src = match &config.template_src {
        Some(p) => p.clone(),
        None => bail!("template_src is not set"),
    };

    let info = contest::classify_contest(contest_url)?;
    info!("contest info: ID({}) offline({})", info.id, info.offline);

    let dir = base.join(&info.id);
    fs::create_dir(&dir).chain_err(|| format!("failed to create dir {}", dir.display()))?;

    debug!("copy contest template {:?}", config.contest_template);
    for path in &config.contest_template {
        let name = path
            .file_name()
            .chain_err(|| format!("bad contest template {}", path.display()))?;
        copy_tree(path, &dir.join(name))?;
    }

    for id in problems {
        init_problem(&dir, contest_url, id, &template_src)?;
    }
    Ok(dir)
}

// Command templates such as `{{.CXX}} -O2 -o {{.Output}} {{.Source}}`.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static ACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\.([A-Za-z_][A-Za-z0-9_]*)\s*$").unwrap());

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TemplateError {
    #[error("template {name}: unclosed action at byte {pos}")]
    Unclosed { name: String, pos: usize },
    #[error("template {name}: unsupported action {{{{{action}}}}}")]
    BadAction { name: String, action: String },
    #[error("template {name}: no value for .{var}")]
    Unbound { name: String, var: String },
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Var(String),
}

/// A parsed command template.  Parsing happens once, rendering is a plain
/// walk over the segments.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandTemplate {
    name: String,
    segments: Vec<Segment>,
}

impl CommandTemplate {
    pub fn compile<S: ToString>(name: S, src: &str) -> Result<Self, TemplateError> {
        let name = name.to_string();
        let mut segments = vec![];
        let mut rest = src;
        let mut offset = 0;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Text(rest[..open].to_string()));
            }
            let body = &rest[open + 2..];
            let close = match body.find("}}") {
                Some(c) => c,
                None => {
                    return Err(TemplateError::Unclosed {
                        name,
                        pos: offset + open,
                    })
                }
            };
            let action = &body[..close];
            match ACTION.captures(action) {
                Some(caps) => segments.push(Segment::Var(caps[1].to_string())),
                None => {
                    return Err(TemplateError::BadAction {
                        name,
                        action: action.to_string(),
                    })
                }
            }
            let consumed = open + 2 + close + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self { name, segments })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if rendering can only ever produce blank output.
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| match s {
            Segment::Text(t) => t.trim().is_empty(),
            Segment::Var(_) => false,
        })
    }

    pub fn render(&self, vars: &HashMap<&str, String>) -> Result<String, TemplateError> {
        let mut out = String::new();
        for s in &self.segments {
            match s {
                Segment::Text(t) => out.push_str(t),
                Segment::Var(v) => match vars.get(v.as_str()) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(TemplateError::Unbound {
                            name: self.name.clone(),
                            var: v.clone(),
                        })
                    }
                },
            }
        }
        Ok(out)
    }

    /// Renders and splits on whitespace.  An empty vector means "skip".
    pub fn render_args(&self, vars: &HashMap<&str, String>) -> Result<Vec<String>, TemplateError> {
        Ok(self
            .render(vars)?
            .split_whitespace()
            .map(String::from)
            .collect())
    }
}

//! Command-line arguments.

use std::path::PathBuf;

use anyhow::{Result, bail};

pub const USAGE: &str = "usage: cft <target-url> [--rules FILE] [--config FILE] [--unblock HOST]";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Args {
    pub target: String,
    pub rules: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub unblock: Option<String>,
}

impl Args {
    /// Parse arguments, not including the program name.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut args = args.into_iter();
        let mut target = None;
        let mut parsed = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--rules" => parsed.rules = Some(value(&mut args, &arg)?.into()),
                "--config" => parsed.config = Some(value(&mut args, &arg)?.into()),
                "--unblock" => parsed.unblock = Some(value(&mut args, &arg)?),
                flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
                _ if target.is_some() => bail!("unexpected argument {arg}\n{USAGE}"),
                _ => target = Some(arg),
            }
        }
        let Some(target) = target else {
            bail!("missing target URL\n{USAGE}");
        };
        parsed.target = target;
        Ok(parsed)
    }
}

fn value<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<String> {
    match args.next() {
        Some(v) => Ok(v),
        None => bail!("{flag} needs a value\n{USAGE}"),
    }
}

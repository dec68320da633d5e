use anyhow::{Context, Result, bail};
use std::env;
use std::fs;
use std::path::PathBuf;

use lens_config::LensConfig;
use lens_dom::{HtmlOptions, Size, document_from_file};

mod session;
use session::{Session, parse_session};

fn main() -> Result<()> {
    let _ = env_logger::try_init();

    let mut args = env::args().skip(1).collect::<Vec<_>>();
    if args.len() < 2 {
        eprintln!(
            "Usage: lens <page.html> <session.txt> [--config <lens.toml>] [--viewport <width>x<height>]"
        );
        bail!("missing <page.html> or <session.txt>");
    }
    let page = PathBuf::from(args.remove(0));
    let script = PathBuf::from(args.remove(0));

    let mut config_path: Option<PathBuf> = None;
    let mut viewport: Option<Size> = None;
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                let Some(path) = args.get(i + 1) else {
                    bail!("--config expects a path");
                };
                config_path = Some(PathBuf::from(path));
                i += 2;
            }
            "--viewport" => {
                let Some(value) = args.get(i + 1) else {
                    bail!("--viewport expects <width>x<height>");
                };
                viewport = Some(parse_viewport(value)?);
                i += 2;
            }
            other => bail!("unexpected argument {other:?}"),
        }
    }

    let mut config = match &config_path {
        Some(path) => LensConfig::load_from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => LensConfig::load_or_default(),
    };
    config.merge_with_env();

    let document = document_from_file(
        &page,
        HtmlOptions {
            viewport,
            ..Default::default()
        },
    )
    .with_context(|| format!("failed to read {}", page.display()))?;
    let source = fs::read_to_string(&script)
        .with_context(|| format!("failed to read {}", script.display()))?;
    let steps = parse_session(&source)?;
    log::info!("replaying {} steps from {}", steps.len(), script.display());

    let mut session = Session::new(document, &config);
    let report = session.run(&steps);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn parse_viewport(value: &str) -> Result<Size> {
    let Some((width, height)) = value.split_once(['x', 'X']) else {
        bail!("viewport must look like 1280x720, got {value:?}");
    };
    Ok(Size {
        width: width.trim().parse().context("viewport width")?,
        height: height.trim().parse().context("viewport height")?,
    })
}

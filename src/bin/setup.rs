use std::env;

use anyhow::{Context, Result};
use cuentame::config::{
    config_file_path, ensure_workspace_structure, load_or_default, save,
};
use cuentame::store::DirectoryStore;

fn main() -> Result<()> {
    let paths = ensure_workspace_structure()?;
    let args = CliArgs::parse()?;
    let config_path = config_file_path()?;
    let mut config = load_or_default()?;
    let mut changed = false;

    if let Some(model) = args.model {
        changed |= config.classifier.model != model;
        config.classifier.model = model;
    }
    if let Some(secs) = args.timeout_secs {
        changed |= config.classifier.request_timeout_secs != secs;
        config.classifier.request_timeout_secs = secs;
    }
    if args.no_seed {
        changed |= config.storage.seed_demo_accounts;
        config.storage.seed_demo_accounts = false;
    }

    if changed {
        save(&config)?;
        println!("Classifier settings recorded at {}", config_path.display());
    }

    let store = DirectoryStore::open(&paths, &config.storage)?;
    let profiles = store.list_profiles()?;
    println!(
        "Workspace ready at {} ({} profile(s) on record).",
        paths.root.display(),
        profiles.len()
    );
    for profile in profiles {
        println!("  {:<12} {:?}", profile.access_code, profile.role);
    }
    println!(
        "Set the {} environment variable before starting intake sessions.",
        config.classifier.api_key_env
    );
    Ok(())
}

struct CliArgs {
    model: Option<String>,
    timeout_secs: Option<u64>,
    no_seed: bool,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut model = None;
        let mut timeout_secs = None;
        let mut no_seed = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--model" => {
                    let value = args.next().context("Expected a model id after --model")?;
                    model = Some(value);
                }
                "--timeout" => {
                    let value = args
                        .next()
                        .context("Expected seconds after --timeout")?
                        .parse()
                        .context("Timeout must be a whole number of seconds")?;
                    timeout_secs = Some(value);
                }
                "--no-seed" => no_seed = true,
                other => anyhow::bail!("Unknown argument: {other}"),
            }
        }
        Ok(Self {
            model,
            timeout_secs,
            no_seed,
        })
    }
}

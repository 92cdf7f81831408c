//! `orderqa check-names`: vet file names before they go into the input directory.

use std::path::PathBuf;

use orderqa_recon::naming;

use crate::exit_codes::EXIT_NAME_CHECK;
use crate::run::load_config;
use crate::CliError;

pub fn cmd_check_names(files: Vec<String>, config: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let taxonomy = config.name_taxonomy()?;

    let mut rejected = 0usize;
    for file in &files {
        let name = naming::file_name(file);
        let problem = naming::check_extension(name, &config.input.extension)
            .or_else(|| taxonomy.check(name));
        match problem {
            None => println!("ok    {name}"),
            Some(message) => {
                rejected += 1;
                println!("bad   {message}");
            }
        }
    }

    if rejected > 0 {
        return Err(CliError::new(
            EXIT_NAME_CHECK,
            format!("{rejected} of {} file name(s) rejected", files.len()),
        )
        .with_hint(format!("expected names matching {}", taxonomy.as_str())));
    }
    Ok(())
}

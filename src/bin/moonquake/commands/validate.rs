//! `moonquake validate` command

use anyhow::{bail, Result};

use moonquake::ops::{validate, ValidateError, ValidateOptions};

use crate::cli::ValidateArgs;

pub fn execute(args: ValidateArgs) -> Result<()> {
    let options = ValidateOptions {
        directory: args.directory,
        disable_includes: args.include_disable,
        dump_ast: args.dump_ast,
    };

    match validate(&args.input, &options) {
        Ok(outcome) => {
            if let Some(dump) = outcome.ast_dump {
                println!("{dump}");
            }
            println!(
                "'{}' is valid (with includes {}).",
                outcome.filepath.display(),
                if args.include_disable {
                    "disabled"
                } else {
                    "enabled"
                }
            );
            Ok(())
        }
        Err(ValidateError::Syntax(report)) => {
            eprintln!("{:?}", miette::Report::new(*report));
            bail!("this description file is not valid");
        }
        Err(ValidateError::Exec(error)) => {
            eprintln!("error: {error}");
            bail!("this description file is not valid");
        }
        Err(ValidateError::Other(error)) => Err(error),
    }
}

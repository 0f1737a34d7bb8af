use clap_complete::{generate_to, shells::Bash, shells::Zsh};
use std::env;
use std::io::Error;

include!("src/cli.rs");

fn main() -> Result<(), Error> {
    println!("cargo:rerun-if-changed=src/cli.rs");
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let mut app = make_cli_app();
    generate_to(Bash, &mut app, "bamshard", &outdir)?;
    generate_to(Zsh, &mut app, "bamshard", &outdir)?;
    Ok(())
}

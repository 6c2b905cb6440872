// tests/cli.rs

use std::path::PathBuf;

use clap::Parser;

use modloader::cli::CliArgs;
use modloader::config::default_manifest_path;

#[test]
fn manifest_defaults_to_modules_toml() {
    let args = CliArgs::try_parse_from(["modloader"]).unwrap();

    assert_eq!(args.manifest, default_manifest_path());
    assert_eq!(args.manifest, PathBuf::from("Modules.toml"));
    assert!(!args.dry_run);
}

#[test]
fn manifest_flag_overrides_default() {
    let args =
        CliArgs::try_parse_from(["modloader", "--manifest", "boot/Other.toml", "--dry-run"]).unwrap();

    assert_eq!(args.manifest, PathBuf::from("boot/Other.toml"));
    assert!(args.dry_run);
}

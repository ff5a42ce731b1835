use clap::Parser;
use sciforge_hooks::cli::{PostGenArgs, PreGenArgs};
use std::ffi::OsString;
use std::path::PathBuf;

fn make_args(binary: &str, args: &[&str]) -> Vec<OsString> {
    let mut res = vec![OsString::from(binary)];
    res.extend(args.iter().map(OsString::from));
    res
}

#[test]
fn test_no_args() {
    let parsed = PreGenArgs::try_parse_from(make_args("pre_gen_project", &[])).unwrap();
    assert!(!parsed.verbose);
    assert!(parsed.context.is_none());

    let parsed = PostGenArgs::try_parse_from(make_args("post_gen_project", &[])).unwrap();
    assert!(!parsed.verbose);
    assert!(parsed.context.is_none());
    assert!(parsed.project_dir.is_none());
}

#[test]
fn test_all_flags() {
    let args = make_args(
        "post_gen_project",
        &["--verbose", "--context", "answers.json", "--project-dir", "./ocean_sim"],
    );
    let parsed = PostGenArgs::try_parse_from(args).unwrap();

    assert!(parsed.verbose);
    assert_eq!(parsed.context, Some(PathBuf::from("answers.json")));
    assert_eq!(parsed.project_dir, Some(PathBuf::from("./ocean_sim")));
}

#[test]
fn test_short_flags() {
    let parsed =
        PreGenArgs::try_parse_from(make_args("pre_gen_project", &["-v", "-c", "answers.yml"]))
            .unwrap();

    assert!(parsed.verbose);
    assert_eq!(parsed.context, Some(PathBuf::from("answers.yml")));
}

#[test]
fn test_pre_gen_has_no_project_dir() {
    let args = make_args("pre_gen_project", &["--project-dir", "./out"]);
    assert!(PreGenArgs::try_parse_from(args).is_err());
}

#[test]
fn test_unexpected_positional() {
    let args = make_args("post_gen_project", &["extra"]);
    assert!(PostGenArgs::try_parse_from(args).is_err());
}

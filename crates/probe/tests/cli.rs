use std::path::Path;
use std::process::{Command, Output};

use {clap as _, icubind_loader as _, tracing as _, tracing_subscriber as _};

fn probe_in(cwd: &Path, args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_icu-probe"))
		.args(args)
		.current_dir(cwd)
		.env_remove("ICUBIND_CONFIG")
		.env_remove("ICUBIND_ICU4C_DIR")
		.output()
		.expect("must run icu-probe")
}

fn probe(args: &[&str]) -> Output {
	probe_in(Path::new(env!("CARGO_MANIFEST_DIR")), args)
}

#[test]
fn missing_arguments_exit_1() {
	assert_eq!(probe(&[]).status.code(), Some(1));
	assert_eq!(probe(&["58"]).status.code(), Some(1));
}

#[test]
fn unparsable_version_exits_2() {
	assert_eq!(probe(&["abc", "5"]).status.code(), Some(2));
}

#[test]
fn inverted_range_exits_2() {
	let output = probe(&["70", "60"]);
	assert_eq!(output.status.code(), Some(2));
	assert!(output.stdout.is_empty());
}

#[test]
fn unsatisfiable_range_exits_3() {
	let dir = tempfile::tempdir().expect("must create tempdir");
	let output = probe(&["100", "200", "0", dir.path().to_str().unwrap()]);
	assert_eq!(output.status.code(), Some(3));
	assert!(output.stdout.is_empty());
}

#[test]
fn resolution_does_not_depend_on_working_directory() {
	let (min, max) = ("44", "80");
	let home = probe(&[min, max]);
	if home.status.code() == Some(3) {
		eprintln!("no ICU4C installed, skipping");
		return;
	}
	assert_eq!(home.status.code(), Some(0), "{}", String::from_utf8_lossy(&home.stderr));

	let version = String::from_utf8(home.stdout.clone()).unwrap();
	let major: u32 = version.trim().split('.').next().unwrap().parse().unwrap();
	assert!((44..=80).contains(&major), "{version}");

	let elsewhere = tempfile::tempdir().expect("must create tempdir");
	let empty_preferred = elsewhere.path().join("preferred");
	std::fs::create_dir(&empty_preferred).unwrap();
	let moved = probe_in(elsewhere.path(), &[min, max, "0", empty_preferred.to_str().unwrap()]);
	assert_eq!(moved.status.code(), Some(0), "{}", String::from_utf8_lossy(&moved.stderr));
	assert_eq!(moved.stdout, home.stdout);

	let exact = major.to_string();
	let pinned = probe_in(elsewhere.path(), &[min, max, &exact]);
	assert_eq!(pinned.status.code(), Some(0));
	assert_eq!(String::from_utf8(pinned.stdout).unwrap().trim().split('.').next(), Some(exact.as_str()));
}

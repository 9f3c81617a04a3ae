//! Positional launch tokens and repository argument handling.

use clap::Parser;
use selfup_cli::cli::Cli;
use selfup_updater::{CycleOptions, UpdateChannel};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("selfup").chain(args.iter().copied())).unwrap()
}

fn options(args: &[&str]) -> CycleOptions {
    parse(args).cycle_options()
}

#[test]
fn no_tokens_means_stable_with_prompt() {
    assert_eq!(options(&[]), CycleOptions::default());
    assert_eq!(options(&[]).channel, UpdateChannel::Stable);
    assert!(!options(&[]).skip_confirmation);
}

#[test]
fn channel_tokens_select_prerelease() {
    assert_eq!(options(&["a"]).channel, UpdateChannel::Alpha);
    assert_eq!(options(&["b"]).channel, UpdateChannel::Beta);
    assert_eq!(options(&["rc"]).channel, UpdateChannel::ReleaseCandidate);
}

#[test]
fn last_channel_token_wins() {
    let parsed = options(&["a", "rc", "b"]);
    assert_eq!(parsed.channel, UpdateChannel::Beta);
    assert!(!parsed.skip_confirmation);
}

#[test]
fn skip_token_skips_confirmation() {
    let parsed = options(&["b", "skip"]);
    assert_eq!(parsed.channel, UpdateChannel::Beta);
    assert!(parsed.skip_confirmation);
}

#[test]
fn later_unknown_token_clears_skip() {
    assert!(!options(&["skip", "now"]).skip_confirmation);
    assert!(options(&["now", "skip"]).skip_confirmation);
    // Channel tokens do not touch the skip flag.
    assert!(options(&["skip", "rc"]).skip_confirmation);
}

#[test]
fn repository_is_split_into_owner_and_name() {
    let cli = parse(&["--repository", "acme/widget"]);
    assert_eq!(cli.repository_parts().unwrap(), ("acme", "widget"));

    let default = parse(&[]);
    assert_eq!(default.repository_parts().unwrap(), ("selfup", "my_app"));
    assert_eq!(default.app_name, "my_app");
}

#[test]
fn malformed_repository_is_rejected() {
    for repository in ["widget", "/widget", "acme/", "acme/widget/extra"] {
        let cli = parse(&["--repository", repository]);
        let err = cli.repository_parts().unwrap_err();
        assert!(err.to_string().contains("expected OWNER/REPO"), "{err}");
    }
}

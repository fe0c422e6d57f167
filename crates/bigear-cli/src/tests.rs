use super::*;

fn search(term: &str, count: u32, popular: bool) -> SearchArgs {
    SearchArgs {
        term: term.to_string(),
        count,
        popular,
    }
}

#[test]
fn parses_ingest_with_defaults() {
    let cli = Cli::try_parse_from(["bigear", "ingest", "--term", "technology"])
        .expect("expected valid cli args");

    match cli.command {
        Commands::Ingest { search: s, dry_run } => {
            assert_eq!(s, search("technology", 50, false));
            assert!(!dry_run);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn key_is_an_alias_for_term() {
    let cli = Cli::try_parse_from([
        "bigear", "ingest", "--key", "rust", "--count", "100", "--popular", "--dry-run",
    ])
    .unwrap();

    match cli.command {
        Commands::Ingest { search: s, dry_run } => {
            assert_eq!(s, search("rust", 100, true));
            assert!(dry_run);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn ingest_requires_a_term() {
    assert!(Cli::try_parse_from(["bigear", "ingest"]).is_err());
}

#[test]
fn schedule_defaults_to_hourly() {
    let cli = Cli::try_parse_from(["bigear", "schedule", "--term", "news"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Schedule { ref cron, .. } if cron == "0 0 * * * *"
    ));
}

#[test]
fn list_accepts_descending_sort() {
    let cli = Cli::try_parse_from(["bigear", "list", "--sort", "-followers", "--owner", "ann"])
        .unwrap();
    assert!(matches!(
        cli.command,
        Commands::List {
            page: 0,
            limit: 20,
            ref sort,
            owner: Some(ref o),
        } if sort == "-followers" && o == "ann"
    ));
}

#[test]
fn delete_parses_a_uuid() {
    let id = "6f1c2d3e-4b5a-4c6d-8e7f-9a0b1c2d3e4f";
    let cli = Cli::try_parse_from(["bigear", "delete", id]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Delete { public_id } if public_id.to_string() == id
    ));
    assert!(Cli::try_parse_from(["bigear", "delete", "not-a-uuid"]).is_err());
}

#[test]
fn parses_reclean_and_migrate() {
    let cli = Cli::try_parse_from(["bigear", "reclean", "--dry-run"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Reclean {
            dry_run: true,
            batch_size: 200
        }
    ));

    let cli = Cli::try_parse_from(["bigear", "migrate"]).unwrap();
    assert!(matches!(cli.command, Commands::Migrate));
}

#[test]
fn run_counts_keep_abandoned_separate() {
    let summary = bigear_ingest::PassSummary {
        fetched: 10,
        persisted: 4,
        labelled: 2,
        duplicates: 3,
        filtered: 1,
        failed: 1,
        abandoned: 1,
    };

    let counts = ingest::counts_from_summary(&summary);
    assert_eq!(counts.fetched, 10);
    assert_eq!(counts.persisted, 4);
    assert_eq!(counts.duplicates, 3);
    assert_eq!(counts.filtered, 1);
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.abandoned, 1);
}

#[test]
fn reclean_strips_leftover_punctuation() {
    let strict = bigear_ingest::Normalizer::new(bigear_ingest::NormalizerConfig {
        strict_punctuation: true,
        ..bigear_ingest::NormalizerConfig::default()
    });

    assert_eq!(
        maintain::reclean_text(&strict, "hello, world!").as_deref(),
        Some("hello world")
    );
    assert_eq!(maintain::reclean_text(&strict, "already clean"), None);
}

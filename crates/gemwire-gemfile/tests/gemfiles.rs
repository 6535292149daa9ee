//! End-to-end Gemfile evaluation against on-disk files.

use std::fs;
use std::path::Path;

use gemwire_gemfile::{parse, Environment, GemValue, GemfileError};

fn write_gemfile(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn simple_gemfile() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gemfile(
        dir.path(),
        "Gemfile",
        r#"
source "https://rubygems.org"

gem "rake"
gem "json", ">= 2.0", "< 3"
"#,
    );

    let env = Environment::new("2.5.0");
    let gemfile = parse(&path, &env).unwrap();

    assert_eq!(gemfile.source.as_deref(), Some("https://rubygems.org"));
    assert_eq!(gemfile.gems.len(), 2);
    assert_eq!(gemfile.gems[0].name, "rake");
    assert!(gemfile.gems[0].requirements.is_empty());
    assert_eq!(gemfile.gems[1].name, "json");
    assert_eq!(gemfile.gems[1].requirements, vec![">= 2.0", "< 3"]);
    assert!(gemfile.active_gems().count() == 2);
}

#[test]
fn group_keyword_filters_gems() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gemfile(dir.path(), "Gemfile", "gem \"rspec\", group: :test\n");

    let env = Environment::new("2.5.0");
    let gemfile = parse(&path, &env).unwrap();
    assert!(gemfile.gem("rspec").unwrap().ignore);

    let env = Environment::new("2.5.0").with_group("test");
    let gemfile = parse(&path, &env).unwrap();
    assert!(!gemfile.gem("rspec").unwrap().ignore);
}

#[test]
fn hashrocket_spelling_is_equivalent() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gemfile(dir.path(), "Gemfile", "gem \"rspec\", :group => :test\n");

    let env = Environment::new("2.5.0").with_group("test");
    let gemfile = parse(&path, &env).unwrap();
    let gem = gemfile.gem("rspec").unwrap();
    assert!(!gem.ignore);
    assert_eq!(gem.ivar("group"), Some(&GemValue::Symbol("test".into())));
}

#[test]
fn group_blocks_thread_the_execute_flag() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gemfile(
        dir.path(),
        "Gemfile",
        r#"
gem "always"
group :test do
  gem "rspec"
  group :nested do
    gem "deep"
  end
end
"#,
    );

    let env = Environment::new("2.5.0");
    let gemfile = parse(&path, &env).unwrap();
    assert!(!gemfile.gem("always").unwrap().ignore);
    assert!(gemfile.gem("rspec").unwrap().ignore);
    assert!(gemfile.gem("deep").unwrap().ignore);

    let env = Environment::new("2.5.0").with_group("test").with_group("nested");
    let gemfile = parse(&path, &env).unwrap();
    assert!(!gemfile.gem("rspec").unwrap().ignore);
    assert!(!gemfile.gem("deep").unwrap().ignore);
}

#[test]
fn disabled_group_beats_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gemfile(
        dir.path(),
        "Gemfile",
        "group :test do\n  gem \"rspec\"\nend\n",
    );

    let env = Environment::new("2.5.0")
        .with_group("test")
        .without_group("test");
    let gemfile = parse(&path, &env).unwrap();
    assert!(gemfile.gem("rspec").unwrap().ignore);
}

#[test]
fn platform_blocks_use_active_platforms() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gemfile(
        dir.path(),
        "Gemfile",
        r#"
platforms :jruby do
  gem "jdbc"
end
platforms :mri do
  gem "sqlite3"
end
"#,
    );

    let env = Environment::new("2.5.0");
    let gemfile = parse(&path, &env).unwrap();
    assert!(gemfile.gem("jdbc").unwrap().ignore);
    assert!(!gemfile.gem("sqlite3").unwrap().ignore);
}

#[test]
fn bare_group_list_has_no_effect() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gemfile(
        dir.path(),
        "Gemfile",
        "group :test, :development\ngem \"rake\"\n",
    );

    let env = Environment::new("2.5.0");
    let gemfile = parse(&path, &env).unwrap();
    assert!(!gemfile.gem("rake").unwrap().ignore);
}

#[test]
fn gemspec_and_ruby_statements() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gemfile(
        dir.path(),
        "Gemfile",
        "ruby RUBY_VERSION\ngemspec\ngem \"rake\"\n",
    );

    let env = Environment::new("3.1.2");
    let gemfile = parse(&path, &env).unwrap();
    assert_eq!(gemfile.gemspecs.len(), 1);
    assert_eq!(gemfile.gemspecs[0].dir, dir.path());
    assert_eq!(gemfile.gems.len(), 1);
}

#[test]
fn percent_w_literal() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gemfile(
        dir.path(),
        "Gemfile",
        "gem \"multi\", platforms: %w[ruby mri]\n",
    );

    let env = Environment::new("2.5.0");
    let gemfile = parse(&path, &env).unwrap();
    let gem = gemfile.gem("multi").unwrap();
    assert_eq!(
        gem.ivar("platforms"),
        Some(&GemValue::Array(vec![
            GemValue::Str("ruby".into()),
            GemValue::Str("mri".into()),
        ]))
    );
    assert!(!gem.ignore);
}

#[test]
fn percent_w_with_custom_delimiter() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gemfile(dir.path(), "Gemfile", "gem \"g\", groups: %w|a b|\n");

    let env = Environment::new("2.5.0");
    let gemfile = parse(&path, &env).unwrap();
    assert_eq!(
        gemfile.gem("g").unwrap().ivar("groups"),
        Some(&GemValue::Array(vec![
            GemValue::Str("a".into()),
            GemValue::Str("b".into()),
        ]))
    );
}

#[test]
fn array_literal_spanning_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gemfile(
        dir.path(),
        "Gemfile",
        "gem \"g\", groups: [\n  :test,\n  :development\n]\n",
    );

    let env = Environment::new("2.5.0").with_group("development");
    let gemfile = parse(&path, &env).unwrap();
    let gem = gemfile.gem("g").unwrap();
    assert_eq!(
        gem.ivar("groups"),
        Some(&GemValue::Array(vec![
            GemValue::Symbol("test".into()),
            GemValue::Symbol("development".into()),
        ]))
    );
    assert!(!gem.ignore);
}

#[test]
fn eval_gemfile_resolves_relative_paths() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    write_gemfile(dir.path(), "sub/extra.gemfile", "gem \"extra\"\n");
    let path = write_gemfile(
        dir.path(),
        "Gemfile",
        "gem \"main\"\neval_gemfile \"sub/extra.gemfile\"\n",
    );

    let env = Environment::new("2.5.0");
    let gemfile = parse(&path, &env).unwrap();
    assert!(gemfile.gem("main").is_some());
    assert!(gemfile.gem("extra").is_some());
}

#[test]
fn eval_gemfile_inside_skipped_group_has_no_effect() {
    let dir = tempfile::tempdir().unwrap();
    write_gemfile(dir.path(), "extra.gemfile", "gem \"extra\"\n");
    let path = write_gemfile(
        dir.path(),
        "Gemfile",
        "group :skipped do\n  eval_gemfile \"extra.gemfile\"\nend\n",
    );

    let env = Environment::new("2.5.0");
    let gemfile = parse(&path, &env).unwrap();
    assert!(gemfile.gem("extra").unwrap().ignore);
}

#[test]
fn unknown_statement_is_a_syntax_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gemfile(dir.path(), "Gemfile", "gem \"a\"\nfrobnicate \"b\"\n");

    let env = Environment::new("2.5.0");
    match parse(&path, &env) {
        Err(GemfileError::Syntax { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn assignments_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gemfile(dir.path(), "Gemfile", "deps = { a: 1 }\ngem \"a\"\n");

    let env = Environment::new("2.5.0");
    assert!(parse(&path, &env).is_err());
}

#[test]
fn if_blocks_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gemfile(
        dir.path(),
        "Gemfile",
        "if RUBY_VERSION > \"2.0\"\n  gem \"a\"\nend\n",
    );

    let env = Environment::new("2.5.0");
    assert!(matches!(
        parse(&path, &env),
        Err(GemfileError::Syntax { line: 1, .. })
    ));
}

#[test]
fn unterminated_do_block_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gemfile(dir.path(), "Gemfile", "group :test do\n  gem \"a\"\n");

    let env = Environment::new("2.5.0");
    assert!(parse(&path, &env).is_err());
}

#[test]
fn missing_file_reports_io_error() {
    let env = Environment::new("2.5.0");
    assert!(matches!(
        parse("/nonexistent/Gemfile", &env),
        Err(GemfileError::Io { .. })
    ));
}

#[test]
fn parsed_model_serializes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gemfile(
        dir.path(),
        "Gemfile",
        "source \"https://rubygems.org\"\ngem \"rake\", \">= 12\"\n",
    );

    let env = Environment::new("2.5.0");
    let gemfile = parse(&path, &env).unwrap();
    let json = serde_json::to_value(&gemfile).unwrap();
    assert_eq!(json["source"], "https://rubygems.org");
    assert_eq!(json["gems"][0]["name"], "rake");
    assert_eq!(json["gems"][0]["requirements"][0], ">= 12");
    assert_eq!(json["gems"][0]["ignore"], false);
}

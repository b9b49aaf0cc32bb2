//! End-to-end rewriting of realistic templates through the public API.

use std::fs;
use structured_data::batch::rewrite_tree;
use structured_data::catalog::TypeCatalog;
use structured_data::config::{CONFIG_FILE, load_config};
use structured_data::engine::{DisplayKind, MarkupEngine};
use structured_data::rewrite::Rewriter;
use structured_data::vocabulary::Semantic;
use tempfile::TempDir;

const TEMPLATE: &str = r#"<article data-sd="Article">
  <h1 data-sd="headline">Rust in Production</h1>
  <p>By <span data-sd="author Person.name">Jane Doe</span></p>
  <time data-sd="datePublished" datetime="2024-05-01">May 1</time>
  <div data-sd="articleBody"><p>Body</p></div>
  <span data-sd="Person"><span data-sd='name'>Jane</span></span>
  <a data-sd=url href="/">home</a>
  <b data-sd="nope">x</b>
</article>
"#;

const MICRODATA: &str = r#"<article itemscope itemtype='https://schema.org/Article'>
  <h1 itemprop='headline'>Rust in Production</h1>
  <p>By <span itemprop='author'>Jane Doe</span></p>
  <time itemprop='datePublished' datetime="2024-05-01">May 1</time>
  <div itemprop='articleBody'><p>Body</p></div>
  <span itemscope itemtype='https://schema.org/Person'><span itemprop='name'>Jane</span></span>
  <a itemprop='url' href="/">home</a>
  <b >x</b>
</article>
"#;

const RDFA: &str = r#"<article vocab='https://schema.org' typeof='Article'>
  <h1 property='headline'>Rust in Production</h1>
  <p>By <span property='author'>Jane Doe</span></p>
  <time property='datePublished' datetime="2024-05-01">May 1</time>
  <div property='articleBody'><p>Body</p></div>
  <span vocab='https://schema.org' typeof='Person'><span property='name'>Jane</span></span>
  <a property='url' href="/">home</a>
  <b >x</b>
</article>
"#;

#[test]
fn article_template_to_microdata() {
    let mut rewriter = Rewriter::new("microdata").unwrap();
    assert_eq!(rewriter.rewrite(TEMPLATE), MICRODATA);
}

#[test]
fn article_template_to_rdfa() {
    let mut rewriter = Rewriter::new("RDFa").unwrap();
    assert_eq!(rewriter.rewrite(TEMPLATE), RDFA);
}

#[test]
fn article_template_edit_list() {
    let mut rewriter = Rewriter::new("microdata").unwrap();
    let outcome = rewriter.rewrite_document(TEMPLATE);
    assert_eq!(outcome.edits.len(), 9);
    assert_eq!(outcome.unresolved(), 1);
    for edit in &outcome.edits {
        assert!(TEMPLATE[edit.range.clone()].starts_with("data-sd="));
    }
}

#[test]
fn rewriting_is_idempotent() {
    let mut rewriter = Rewriter::new("microdata").unwrap();
    let once = rewriter.rewrite(TEMPLATE);
    let twice = rewriter.rewrite(&once);
    assert_eq!(once, twice);
}

#[test]
fn custom_catalog_from_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("types.json");
    fs::write(
        &path,
        r#"{
            "Thing": { "properties": { "name": ["Text"] } },
            "Event": { "extends": "Thing", "properties": { "startDate": ["DateTime"] } }
        }"#,
    )
    .unwrap();
    let catalog = TypeCatalog::load(&path).unwrap();

    let mut rewriter = Rewriter::with_catalog("microdata", &catalog).unwrap();
    assert_eq!(
        rewriter.rewrite("<div data-sd='Event'><time data-sd='startDate'></time></div>"),
        "<div itemscope itemtype='https://schema.org/Event'><time itemprop='startDate'></time></div>"
    );
    // Types outside the custom table resolve to its root.
    assert_eq!(
        rewriter.rewrite("<div data-sd='Article'>"),
        "<div itemscope itemtype='https://schema.org/Thing'>"
    );

    let mut engine = MarkupEngine::with_catalog(Semantic::Microdata, &catalog);
    engine
        .set_type("Event")
        .property("startDate")
        .content_with_machine("May 1", "2024-05-01");
    assert_eq!(
        engine.display(DisplayKind::Auto, false),
        "<meta itemprop='startDate' content='2024-05-01'/>May 1"
    );
}

#[test]
fn configured_site_rewrite() {
    let tmp = TempDir::new().unwrap();
    let site = tmp.path().join("site");
    let out = tmp.path().join("out");
    fs::create_dir_all(site.join("pages")).unwrap();
    fs::write(
        tmp.path().join(CONFIG_FILE),
        r#"
semantic = "rdfa"
suffixes = ["sd", "x"]
extensions = ["tpl"]
"#,
    )
    .unwrap();
    fs::write(
        site.join("pages/event.tpl"),
        "<div data-x='Event' data-sd='name'>Launch</div>",
    )
    .unwrap();
    fs::write(site.join("index.html"), "<p data-sd='name'></p>").unwrap();

    let config = load_config(tmp.path()).unwrap();
    let report = rewrite_tree(&site, Some(&out), &config, TypeCatalog::schema_org()).unwrap();

    assert_eq!(report.files.len(), 1);
    assert_eq!(report.total_markers(), 2);
    // `sd` comes first in the suffix list, so `name` resolves against Thing
    // before `x` switches the type to Event.
    assert_eq!(
        fs::read_to_string(out.join("pages/event.tpl")).unwrap(),
        "<div vocab='https://schema.org' typeof='Event' property='name'>Launch</div>"
    );
    assert!(!out.join("index.html").exists());
}

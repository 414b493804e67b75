use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::Utc;
use colored::Colorize;
use plume_client::{ClientConfig, Feed, Session, StoredPost, TcpTransport};
use plume_crypto::{Identity, Keypair};
use plume_server::{NodeConfig, PlumeNode};
use serde_json::json;

use crate::cli::*;
use crate::render::{describe, post_detail, post_line, FeedView, PostView};

/// Settings shared by every client-side command.
pub struct Globals {
    pub format: OutputFormat,
    pub node: String,
    pub key: PathBuf,
    pub timeout: Duration,
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let globals = Globals {
        format: cli.format,
        node: cli.node,
        key: cli.key,
        timeout: Duration::from_millis(cli.timeout_ms),
    };
    match cli.command {
        Command::Keygen(args) => cmd_keygen(&globals, args),
        Command::Post(args) => cmd_post(&globals, args).await,
        Command::Feed(args) => cmd_feed(&globals, args).await,
        Command::Show(args) => cmd_show(&globals, args).await,
        Command::Serve(args) => cmd_serve(args).await,
    }
}

fn open_feed(globals: &Globals, identity: Arc<dyn Identity>) -> Feed {
    let transport = Arc::new(TcpTransport::new(globals.node.clone()));
    let config = ClientConfig::default().with_request_timeout(globals.timeout);
    Feed::new(Session::new(identity, transport), config)
}

/// Reads only need a session, not a real author.
fn reader(globals: &Globals) -> Feed {
    open_feed(globals, Arc::new(Keypair::generate()))
}

fn load_key(path: &Path) -> anyhow::Result<Keypair> {
    Keypair::read_from_file(path).with_context(|| {
        format!(
            "could not read key from {} (run `plume keygen` first)",
            path.display()
        )
    })
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_keygen(globals: &Globals, args: KeygenArgs) -> anyhow::Result<()> {
    let path = args.out.unwrap_or_else(|| globals.key.clone());
    let keypair = Keypair::generate();
    keypair
        .write_to_file(&path)
        .with_context(|| format!("could not write key to {}", path.display()))?;
    let author = keypair.public_identity();

    match globals.format {
        OutputFormat::Json => print_json(&json!({
            "path": path.display().to_string(),
            "author": author.to_hex(),
        })),
        OutputFormat::Text => {
            println!("{} Generated key {}", "✓".green().bold(), path.display());
            println!("  Author: {}", author.to_hex().cyan());
            Ok(())
        }
    }
}

async fn cmd_post(globals: &Globals, args: PostArgs) -> anyhow::Result<()> {
    let keypair = load_key(&globals.key)?;
    let mut feed = open_feed(globals, Arc::new(keypair));

    let tx = match feed.submit(&args.topic, &args.content).await {
        Ok(tx) => tx,
        Err(err) => {
            match globals.format {
                OutputFormat::Json => print_json(&json!({
                    "error": describe(&err),
                    "class": err.class(),
                    "code": err.rejection().map(|c| c.as_u32()),
                }))?,
                OutputFormat::Text => {
                    eprintln!("{} {}", "✗".red().bold(), describe(&err));
                    eprintln!("  topic:   {}", args.topic);
                    eprintln!("  content: {}", args.content);
                }
            }
            return Err(err).context("post was not published");
        }
    };

    let refresh_error = feed.last_error().map(describe);
    match globals.format {
        OutputFormat::Json => print_json(&json!({
            "tx": tx.to_hex(),
            "author": feed.session().author().to_hex(),
            "posts": feed.posts().len(),
            "stale": feed.is_stale(),
            "refresh_error": refresh_error,
        })),
        OutputFormat::Text => {
            println!("{} Posted {}", "✓".green().bold(), tx.to_hex().yellow());
            match refresh_error {
                Some(err) => println!("  {} feed not refreshed: {}", "stale".yellow(), err),
                None => println!("  Feed now has {} posts", feed.posts().len()),
            }
            Ok(())
        }
    }
}

async fn cmd_feed(globals: &Globals, args: FeedArgs) -> anyhow::Result<()> {
    let mut feed = reader(globals);
    let result = feed.fetch_all().await.map(|_| ());

    let posts: Vec<&StoredPost> = feed
        .posts()
        .iter()
        .filter(|p| args.topic.as_deref().map_or(true, |t| p.record.topic == t))
        .take(args.limit.unwrap_or(usize::MAX))
        .collect();

    match globals.format {
        OutputFormat::Json => print_json(&FeedView {
            posts: posts.iter().map(|p| PostView::from(*p)).collect(),
            stale: feed.is_stale(),
            skipped: feed.skipped(),
            error: feed.last_error().map(describe),
        })?,
        OutputFormat::Text => {
            if feed.is_stale() {
                println!("{} showing last known posts", "stale".yellow().bold());
            }
            if posts.is_empty() {
                println!("No posts.");
            }
            let now = Utc::now();
            for post in &posts {
                println!("{}", post_line(post, now));
            }
            if feed.skipped() > 0 {
                println!("{}", format!("({} unreadable accounts skipped)", feed.skipped()).dimmed());
            }
        }
    }
    result.context("could not load the feed")
}

async fn cmd_show(globals: &Globals, args: ShowArgs) -> anyhow::Result<()> {
    let mut feed = reader(globals);
    let posts = feed.fetch_all().await.context("could not load the feed")?;

    let prefix = args.key.to_lowercase();
    let matches: Vec<&StoredPost> = posts
        .iter()
        .filter(|p| p.key.to_hex().starts_with(&prefix))
        .collect();
    let post = match matches.as_slice() {
        [] => bail!("no post with key {}", args.key),
        [post] => *post,
        _ => bail!("key prefix {} matches {} posts", args.key, matches.len()),
    };

    match globals.format {
        OutputFormat::Json => print_json(&PostView::from(post)),
        OutputFormat::Text => {
            println!("{}", post_detail(post));
            Ok(())
        }
    }
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::from_file(path)
            .with_context(|| format!("could not load {}", path.display()))?,
        None => NodeConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address {bind}"))?;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = Some(dir);
    }

    let storage = match &config.data_dir {
        Some(dir) => dir.display().to_string(),
        None => "memory".into(),
    };
    let node = PlumeNode::open(config)?.bind().await?;
    println!(
        "{} Plume node on {} (storage: {})",
        "✓".green().bold(),
        node.local_addr()?.to_string().bold(),
        storage
    );
    node.serve_until(async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use super::*;

    async fn start_node() -> SocketAddr {
        let config = NodeConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..NodeConfig::default()
        };
        let node = PlumeNode::open(config).unwrap().bind().await.unwrap();
        let addr = node.local_addr().unwrap();
        tokio::spawn(node.serve());
        addr
    }

    fn globals(node: SocketAddr, key: PathBuf) -> Globals {
        Globals {
            format: OutputFormat::Text,
            node: node.to_string(),
            key,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn keygen_post_feed_show() {
        let addr = start_node().await;
        let dir = tempfile::tempdir().unwrap();
        let g = globals(addr, dir.path().join("id.key"));

        cmd_keygen(&g, KeygenArgs { out: None }).unwrap();
        assert!(cmd_keygen(&g, KeygenArgs { out: None }).is_err(), "keygen must not overwrite");

        cmd_post(&g, PostArgs { topic: "solana".into(), content: "gm".into() })
            .await
            .unwrap();
        cmd_feed(&g, FeedArgs { limit: None, topic: None }).await.unwrap();

        let mut feed = reader(&g);
        let key = feed.fetch_all().await.unwrap()[0].key.to_hex();
        cmd_show(&g, ShowArgs { key: key[..8].to_uppercase() }).await.unwrap();
        assert!(cmd_show(&g, ShowArgs { key: "zz".into() }).await.is_err());
    }

    #[tokio::test]
    async fn rejected_post_is_an_error() {
        let addr = start_node().await;
        let dir = tempfile::tempdir().unwrap();
        let g = globals(addr, dir.path().join("id.key"));
        cmd_keygen(&g, KeygenArgs { out: None }).unwrap();

        let result = cmd_post(&g, PostArgs { topic: "t".into(), content: "a".repeat(281) }).await;
        assert!(result.is_err());
        assert!(reader(&g).fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn post_without_key_fails() {
        let addr = start_node().await;
        let dir = tempfile::tempdir().unwrap();
        let g = globals(addr, dir.path().join("missing.key"));
        let result = cmd_post(&g, PostArgs { topic: "t".into(), content: "c".into() }).await;
        assert!(result.is_err());
    }
}

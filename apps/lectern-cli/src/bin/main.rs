use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use lectern_core::config::Settings;
use lectern_core::traits::Embedder;
use lectern_extract::extract::list_ingestable_files;
use lectern_index::VectorIndex;
use lectern_model::{chat_from_config, embedder_from_config};
use lectern_pipeline::{IngestionPipeline, RetrievalFallback, RetrievalPipeline};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

struct AppContext {
    settings: Settings,
    embedder: Arc<dyn Embedder>,
    index: Arc<Mutex<VectorIndex>>,
}

fn build_context() -> anyhow::Result<AppContext> {
    let settings = Settings::load()?;
    let embedder: Arc<dyn Embedder> = Arc::from(embedder_from_config(&settings)?);
    let index = Arc::new(Mutex::new(VectorIndex::open(
        &settings.index_path(),
        &settings.index.collection,
    )?));
    Ok(AppContext {
        settings,
        embedder,
        index,
    })
}

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {prog} <ingest|search|ask|delete|stats> [args...]");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let (cmd, args) = parse_args();
    let ctx = build_context().map_err(|e| {
        eprintln!("Error loading configuration: {e}");
        e
    })?;
    match cmd.as_str() {
        "ingest" => cmd_ingest(&ctx, &args).await,
        "search" => cmd_search(&ctx, &args).await,
        "ask" => cmd_ask(&ctx, &args).await,
        "delete" => cmd_delete(&ctx, &args).await,
        "stats" => cmd_stats(&ctx, &args).await,
        other => {
            eprintln!("Unknown command '{other}'. Commands: ingest, search, ask, delete, stats");
            std::process::exit(1);
        }
    }
}

async fn cmd_ingest(ctx: &AppContext, args: &[String]) -> anyhow::Result<()> {
    let target = args.first().map(PathBuf::from).unwrap_or_else(|| {
        eprintln!("Usage: lectern ingest <file-or-directory>");
        std::process::exit(1);
    });
    let pipeline = IngestionPipeline::new(
        ctx.embedder.clone(),
        ctx.index.clone(),
        &ctx.settings.ingest,
    );

    let files = if target.is_dir() {
        list_ingestable_files(&target, &ctx.settings.ingest.extensions)
    } else {
        vec![target.clone()]
    };
    if files.is_empty() {
        println!("No ingestable files under {}", target.display());
        return Ok(());
    }

    println!(
        "Ingesting {} file(s) into '{}'",
        files.len(),
        ctx.settings.index.collection
    );
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    let mut indexed = 0usize;
    let mut failed = Vec::new();
    for file in &files {
        pb.set_message(
            file.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        match pipeline.ingest_file(file).await {
            Ok(report) => indexed += report.chunk_count(),
            Err(err) => failed.push((file.clone(), err)),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "✅ Ingested {} chunk(s) from {} file(s)",
        indexed,
        files.len() - failed.len()
    );
    if !failed.is_empty() {
        println!("⚠️  {} file(s) failed:", failed.len());
        for (file, err) in &failed {
            println!("  {}: {}", file.display(), err);
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_search(ctx: &AppContext, args: &[String]) -> anyhow::Result<()> {
    if args.is_empty() {
        eprintln!("Usage: lectern search \"<query>\" [--top-k N]");
        std::process::exit(1);
    }
    let query = &args[0];
    let mut top_k = ctx.settings.retrieval.top_k;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--top-k" | "-k" => {
                if let Some(n) = args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) {
                    top_k = n;
                    i += 1;
                } else {
                    eprintln!("Error: --top-k requires a number");
                    std::process::exit(1);
                }
            }
            _ => {}
        }
        i += 1;
    }

    let retrieval = RetrievalPipeline::new(
        ctx.embedder.clone(),
        Arc::from(chat_from_config(&ctx.settings)?),
        ctx.index.clone(),
        &ctx.settings.retrieval,
        RetrievalFallback::Fail,
    );
    let hits = retrieval.retrieve(query, Some(top_k)).await?;
    if hits.is_empty() {
        println!("No results for \"{query}\"");
        return Ok(());
    }
    println!("🔍 Found {} result(s) for: \"{query}\"", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        println!("\n  {}. distance={:.4}  id={}", i + 1, hit.distance, hit.id);
        println!("     📝 {}", preview(&hit.content, 160));
    }
    Ok(())
}

async fn cmd_ask(ctx: &AppContext, args: &[String]) -> anyhow::Result<()> {
    if args.is_empty() {
        eprintln!("Usage: lectern ask \"<question>\" [--bare-on-error]");
        std::process::exit(1);
    }
    let question = &args[0];
    let fallback = if args[1..].iter().any(|a| a == "--bare-on-error") {
        RetrievalFallback::BareQuestion
    } else {
        RetrievalFallback::Fail
    };

    let retrieval = RetrievalPipeline::new(
        ctx.embedder.clone(),
        Arc::from(chat_from_config(&ctx.settings)?),
        ctx.index.clone(),
        &ctx.settings.retrieval,
        fallback,
    );
    let answer = retrieval.answer(question, &[]).await?;

    if let Some(err) = &answer.retrieval_error {
        println!("⚠️  Retrieval failed ({err}); the answer has no document context.");
    } else if !answer.hits.is_empty() {
        println!("📚 Context from {} chunk(s):", answer.hits.len());
        for hit in &answer.hits {
            println!("  - {} (distance {:.4})", hit.id, hit.distance);
        }
    }
    println!("\n{}", answer.text);
    Ok(())
}

async fn cmd_delete(ctx: &AppContext, args: &[String]) -> anyhow::Result<()> {
    if args.is_empty() {
        eprintln!("Usage: lectern delete <source-name> | --id <chunk-id>");
        std::process::exit(1);
    }
    let (removed, target) = if args[0] == "--id" {
        let id = args.get(1).unwrap_or_else(|| {
            eprintln!("Error: --id requires a chunk id");
            std::process::exit(1)
        });
        (ctx.index.lock().await.delete(id)?, id)
    } else {
        (ctx.index.lock().await.delete_by_source(&args[0])?, &args[0])
    };
    if removed == 0 {
        println!("Nothing indexed under '{target}'");
    } else {
        println!("🗑️  Removed {removed} chunk(s) of '{target}'");
    }
    Ok(())
}

async fn cmd_stats(ctx: &AppContext, args: &[String]) -> anyhow::Result<()> {
    let stats = ctx.index.lock().await.stats()?;
    if args.iter().any(|a| a == "--json") {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!("📊 Collection '{}'", stats.collection);
    println!("  chunks:     {}", stats.chunk_count);
    println!("  sources:    {}", stats.source_count);
    match stats.dimensions {
        Some(dim) => println!("  dimensions: {dim}"),
        None => println!("  dimensions: not established yet"),
    }
    println!("  database:   {}", ctx.settings.index_path().display());
    Ok(())
}

/// One-line preview for terminal output, truncated on a char boundary.
fn preview(text: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for (i, ch) in text.chars().enumerate() {
        if i >= max_chars {
            out.push('…');
            break;
        }
        out.push(if ch == '\n' { ' ' } else { ch });
    }
    out
}

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use deckqa_core::config::{expand_path, Config};
use deckqa_core::matrix::MatrixTable;
use deckqa_core::types::Chunk;
use deckqa_index::CorpusIndex;
use deckqa_retrieval::{QueryService, Summarizer};
use tracing_subscriber::EnvFilter;

/// Demo summarizer: renders the retrieval output as plain text. The real
/// deployment plugs a text-generation backend in here instead.
struct PlainTextSummarizer;

impl Summarizer for PlainTextSummarizer {
    fn summarize(
        &self,
        query: &str,
        chunks: &[Chunk],
        matrix: Option<&MatrixTable>,
    ) -> anyhow::Result<String> {
        let mut out = format!("Q: {query}\n");
        if let Some(table) = matrix {
            for feature in &table.features {
                for tier in &table.tiers {
                    let verdict = match table.is_available(feature, *tier) {
                        Some(true) => "included",
                        Some(false) => "not included",
                        None => "no information",
                    };
                    out.push_str(&format!("  {feature}: {} -> {verdict}\n", tier.name()));
                }
            }
        }
        for chunk in chunks {
            out.push_str(&format!("  [slide {}] {}\n", chunk.slide_number, chunk.title));
        }
        Ok(out)
    }
}

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <query|corpus-info> [args...]", prog);
        eprintln!("  {} query \"<question>\" [--corpus <path>] [--bypass-cache]", prog);
        eprintln!("  {} corpus-info [--corpus <path>]", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn corpus_path(args: &[String], config: &Config) -> PathBuf {
    if let Some(pos) = args.iter().position(|a| a == "--corpus") {
        if let Some(path) = args.get(pos + 1) {
            return expand_path(path);
        }
        eprintln!("--corpus needs a path argument");
        std::process::exit(1);
    }
    let configured: String = config
        .get("data.corpus_path")
        .unwrap_or_else(|_| "test_data/corpus.json".to_string());
    expand_path(configured)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let (cmd, args) = parse_args();

    match cmd.as_str() {
        "query" => {
            let mut query_text = None;
            let mut i = 0;
            while i < args.len() {
                match args[i].as_str() {
                    // value handled by corpus_path
                    "--corpus" => i += 1,
                    a if a.starts_with("--") => {}
                    a => {
                        if query_text.is_none() {
                            query_text = Some(a.to_string());
                        }
                    }
                }
                i += 1;
            }
            let query_text = query_text.unwrap_or_else(|| {
                eprintln!("Usage: deckqa query \"<question>\"");
                std::process::exit(1)
            });
            let bypass = args.iter().any(|a| a == "--bypass-cache");

            let retrieval = config.retrieval();
            retrieval.validate()?;

            let path = corpus_path(&args, &config);
            println!("Loading corpus from {}", path.display());
            let index = Arc::new(CorpusIndex::from_json_file(&path)?);
            let service = QueryService::new(index, None, retrieval, config.cache());

            let answer = service.answer_query(&query_text, bypass).await?;
            if answer.summary_input.is_empty() {
                println!("No relevant content found for: \"{}\"", query_text);
                return Ok(());
            }

            println!(
                "\n🔍 {} result(s) for \"{}\" (cached: {}, {:.1?})",
                answer.summary_input.len(),
                query_text,
                answer.cached,
                answer.elapsed
            );
            for (i, chunk) in answer.summary_input.iter().enumerate() {
                println!(
                    "\n  {}. [slide {}] {}\n     📝 {}",
                    i + 1,
                    chunk.slide_number,
                    chunk.title,
                    chunk.preview(200)
                );
            }
            if let Some(table) = &answer.matrix {
                println!("\n📊 License matrix ({} feature rows):", table.features.len());
                for feature in &table.features {
                    for tier in &table.tiers {
                        let mark = match table.is_available(feature, *tier) {
                            Some(true) => "✓",
                            Some(false) => "✗",
                            None => "?",
                        };
                        println!("  {} {} — {}", mark, tier.name(), feature);
                    }
                }
                for warning in &table.warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            let summary =
                PlainTextSummarizer.summarize(&query_text, &answer.summary_input, answer.matrix.as_ref())?;
            println!("\n--- summary input ---\n{}", summary);
        }
        "corpus-info" => {
            let path = corpus_path(&args, &config);
            let index = CorpusIndex::from_json_file(&path)?;
            println!("Corpus: {}", path.display());
            println!("  chunks:     {}", index.len());
            println!("  embeddings: {}/{}", index.embedding_count(), index.len());
            for chunk in index.chunks() {
                println!("  [slide {}] {} ({})", chunk.slide_number, chunk.id, chunk.title);
            }
        }
        _ => {
            eprintln!("Unknown command: {}", cmd);
            std::process::exit(1);
        }
    }
    Ok(())
}

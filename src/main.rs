use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use clap::Parser;

mod cli;
mod config;
mod context;
mod corpus;
mod employee;
mod intent;
mod leave;
mod router;
mod semantic;
#[cfg(test)]
mod tests;
mod web;

use config::Config;
use context::EmployeeContext;
use router::QueryRouter;
use semantic::{DocumentIndex, EmbeddingProvider, OpenAiEmbeddings};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();
    let config = Config::load();

    match args.command {
        cli::Command::Daemon {} => {
            let ctx = load_context(&config.context_path)?;
            let provider = OpenAiEmbeddings::new(&config.embedding)?;
            let index = load_index(&config.corpus_path, provider.model_id())?;

            let router = QueryRouter::new(Arc::new(provider), config.search.clone());
            web::start_daemon(web::SharedState::new(router, ctx, index, config));
            Ok(())
        }

        cli::Command::Ask {
            question,
            context,
            corpus,
        } => {
            let context_path = context.unwrap_or_else(|| config.context_path.clone());
            let corpus_path = corpus.unwrap_or_else(|| config.corpus_path.clone());

            let ctx = load_context(&context_path)?;
            let provider = OpenAiEmbeddings::new(&config.embedding)?;
            let index = load_index(&corpus_path, provider.model_id())?;
            let router = QueryRouter::new(Arc::new(provider), config.search.clone());

            let decision = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .unwrap()
                .block_on(async { router.route(&question, &ctx, &index).await });

            println!("{}", serde_json::to_string_pretty(&decision).unwrap());
            Ok(())
        }

        cli::Command::EmbedCorpus { input, output } => {
            let provider = OpenAiEmbeddings::new(&config.embedding)?;
            let docs = corpus::load_corpus(Path::new(&input))
                .with_context(|| format!("cannot read corpus from {input}"))?;

            let index = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .unwrap()
                .block_on(async { DocumentIndex::build(docs, &provider).await })?;

            corpus::save_prebuilt(&index, Path::new(&output))?;
            println!(
                "{} passages vectorized with {} into {output}",
                index.len(),
                index.model_id()
            );
            Ok(())
        }
    }
}

fn load_context(path: &str) -> anyhow::Result<EmployeeContext> {
    if path.is_empty() {
        bail!("no employee context file configured; set context_path in config.yaml or pass --context");
    }
    EmployeeContext::from_file(Path::new(path))
        .with_context(|| format!("cannot load employee context from {path}"))
}

fn load_index(path: &str, model_id: &str) -> anyhow::Result<DocumentIndex> {
    if path.is_empty() {
        bail!("no corpus file configured; set corpus_path in config.yaml, or run embed-corpus first");
    }
    let index = corpus::load_prebuilt(Path::new(path), model_id)
        .with_context(|| format!("cannot load corpus from {path}"))?;
    log::info!("loaded {} passages from {path}", index.len());
    Ok(index)
}

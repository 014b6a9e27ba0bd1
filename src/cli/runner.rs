//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::cli::sample::{catalog_page, catalog_stream, sample_registry, SampleItem};
use crate::cli::server;
use crate::config::{AppConfig, WriterConfig};
use crate::error::{Error, Result};
use crate::http::fetch_paged;
use crate::paged::{PagedEnumerable, PagedStream};
use crate::read::{read_paged_json, PagedReader, ReaderSource};
use crate::types::JsonValue;
use crate::write::{write_paged, ByteSink, WriterSink};
use anyhow::Context;
use futures::StreamExt;
use std::path::Path;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
    config: AppConfig,
}

impl Runner {
    /// Create a runner, loading the configuration file when one was given
    pub fn new(cli: Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::shared_default().clone(),
        };
        Ok(Self { cli, config })
    }

    /// Loaded configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupt.cancel();
            }
        });

        match &self.cli.command {
            Commands::Serve { port, host } => self.serve(*port, host.as_deref()).await,
            Commands::Generate {
                count,
                page_size,
                page,
                trailing,
                output,
            } => {
                self.generate(*count, *page_size, *page, *trailing, output.as_deref(), &cancel)
                    .await
            }
            Commands::Read { source } => self.read(source, &cancel).await,
        }
    }

    async fn serve(&self, port: Option<u16>, host: Option<&str>) -> Result<()> {
        let mut config = self.config.clone();
        if let Some(port) = port {
            config.server.port = port;
        }
        if let Some(host) = host {
            config.server.host = host.to_string();
        }
        server::serve(config).await
    }

    async fn generate(
        &self,
        count: u64,
        page_size: u32,
        page: u32,
        trailing: bool,
        output: Option<&Path>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if page == 0 {
            return Err(Error::invalid_config("page", "page is 1-based"));
        }
        let mut writer = self.config.writer.clone();
        let paged: PagedStream<SampleItem> = if trailing {
            writer = writer.trailing();
            catalog_stream(count, page_size, self.config.server.stream_strategy)
        } else {
            let offset = u64::from(page - 1) * u64::from(page_size);
            catalog_page(count, page_size, offset)
        };

        match output {
            Some(path) => {
                let file = tokio::fs::File::create(path)
                    .await
                    .with_context(|| format!("Failed to create output file {}", path.display()))?;
                let mut sink = WriterSink::new(file);
                self.write(&paged, &mut sink, &writer, cancel).await?;
                info!("Wrote {}", path.display());
            }
            None => {
                let mut sink = WriterSink::new(tokio::io::stdout());
                self.write(&paged, &mut sink, &writer, cancel).await?;
                println!();
            }
        }
        Ok(())
    }

    async fn write<S: ByteSink>(
        &self,
        paged: &PagedStream<SampleItem>,
        sink: &mut S,
        writer: &WriterConfig,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let start = Instant::now();
        let encoder = sample_registry().encoder::<SampleItem>();
        let stats = write_paged(paged, sink, encoder.as_ref(), writer, cancel).await?;
        info!(
            "Generated {} items ({} bytes, {} flushes) in {:?}",
            stats.items,
            stats.bytes,
            stats.flushes,
            start.elapsed()
        );
        Ok(())
    }

    async fn read(&self, source: &str, cancel: &CancellationToken) -> Result<()> {
        let reader_config = &self.config.reader;
        let paged: PagedReader<JsonValue> =
            if source.starts_with("http://") || source.starts_with("https://") {
                fetch_paged(&reqwest::Client::new(), source, reader_config).await?
            } else if source == "-" {
                read_paged_json(
                    ReaderSource::new(tokio::io::stdin(), reader_config.read_buffer_size),
                    reader_config,
                )
            } else {
                let path = Path::new(source);
                if !path.exists() {
                    return Err(Error::FileNotFound {
                        path: source.to_string(),
                    });
                }
                let file = tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("Failed to open {source}"))?;
                read_paged_json(
                    ReaderSource::new(file, reader_config.read_buffer_size),
                    reader_config,
                )
            };

        let mut items = paged.items(cancel.clone());
        let mut count = 0u64;
        while let Some(item) = items.next().await {
            println!("{}", serde_json::to_string(&item?)?);
            count += 1;
        }

        let pagination = paged.resolve_pagination(cancel).await?;
        println!("{}", serde_json::json!({ "pagination": pagination }));
        info!("Read {} items", count);
        Ok(())
    }
}

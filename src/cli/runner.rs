//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat, PageArgs};
use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::pagination::Paginator;
use serde::Serialize;
use std::io::Write;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let client = Client::with_config(self.client_config()?)?;
        let mut out = std::io::stdout();

        match &self.cli.command {
            Commands::User { id } => {
                let user = client.get_user(id.as_deref()).await?;
                self.emit(&mut out, &user)
            }
            Commands::Space { id } => {
                let space = client.get_space(id).await?;
                self.emit(&mut out, &space)
            }
            Commands::Spaces { pages } => {
                self.emit_pages(&mut out, client.get_spaces()?, *pages)
                    .await
            }
            Commands::Orgs { pages } => {
                self.emit_pages(&mut out, client.get_organizations()?, *pages)
                    .await
            }
            Commands::OrgSpaces {
                organization_id,
                pages,
            } => {
                let paginator = client.get_organization_spaces(organization_id)?;
                self.emit_pages(&mut out, paginator, *pages).await
            }
        }
    }

    /// Merge defaults, config file, environment and flags
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        }
        .with_env();

        if let Some(token) = &self.cli.token {
            config = config.token(token);
        }
        if let Some(url) = &self.cli.base_url {
            config = config.base_url(url);
        }
        Ok(config)
    }

    async fn emit_pages<R: Serialize>(
        &self,
        out: &mut impl Write,
        paginator: Paginator<R>,
        args: PageArgs,
    ) -> Result<()> {
        let mut paginator = paginator.limit(args.limit);
        let mut fetched = 0;

        while !args.max_pages.is_some_and(|max| fetched >= max) {
            let Some(page) = paginator.next_page().await? else {
                break;
            };
            fetched += 1;
            info!(page = fetched, items = page.len(), "Fetched page");
            for item in page.items() {
                self.emit(out, item)?;
            }
        }
        Ok(())
    }

    fn emit<T: Serialize>(&self, out: &mut impl Write, value: &T) -> Result<()> {
        let text = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value),
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
        }
        .map_err(|e| Error::Other(format!("failed to serialize output: {e}")))?;
        writeln!(out, "{text}")?;
        Ok(())
    }
}

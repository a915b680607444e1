//! Subcommand handlers

use crate::app::App;
use crate::cli::{Cli, Command, ReplArgs};
use crate::{render, repl};
use anyhow::{Context, bail};
use tracing::warn;

pub async fn run(cli: &Cli) -> anyhow::Result<()> {
    let default_repl = Command::Repl(ReplArgs {
        period: None,
        narrative: false,
    });
    let command = cli.command.as_ref().unwrap_or(&default_repl);

    match command {
        Command::Price(args) => {
            let app = App::from_cli(cli, false)?;
            let quote = app.pipeline.quote(&args.company).await?;
            println!("{}", render::quote(&quote));
        }
        Command::Indicators(args) => {
            let app = App::from_cli(cli, false)?;
            let period = args.period.unwrap_or(app.pipeline.config().default_period);
            let (symbol, snapshot) = app.pipeline.indicators(&args.company, period).await?;
            println!("{}", render::indicators(&symbol, &snapshot));
        }
        Command::News(args) => {
            let app = App::from_cli(cli, false)?;
            let headlines = app.pipeline.news(&args.company).await?;
            let sentiment = app.pipeline.score_headlines(&headlines).await;
            println!("{}", render::news(&headlines, &sentiment));
        }
        Command::Analyze(args) => {
            let app = App::from_cli(cli, args.narrative)?;
            let period = args.period.unwrap_or(app.pipeline.config().default_period);
            let report = app.pipeline.analyze(&args.company, period).await?;
            if args.json {
                let json = serde_json::to_string_pretty(&report)
                    .context("Failed to serialize report")?;
                println!("{json}");
            } else {
                println!("{}", render::report(&report));
            }
        }
        Command::Forecast(args) => {
            let app = App::from_cli(cli, false)?;
            let Some(forecaster) = &app.forecaster else {
                bail!("Forecasts need a language model; set ANTHROPIC_API_KEY");
            };
            let period = args.period.unwrap_or(app.pipeline.config().default_period);

            let quote = app.pipeline.quote(&args.company).await?;
            let (_, snapshot) = app.pipeline.indicators(&args.company, period).await?;
            let headlines = app.pipeline.news(&args.company).await.unwrap_or_else(|e| {
                warn!(error = %e, "News unavailable, forecasting without headlines");
                Vec::new()
            });

            let forecast = forecaster
                .forecast(&args.company, &quote, &snapshot, &headlines, args.horizon)
                .await?;
            println!("{}", render::forecast(&args.company, &quote.symbol, &forecast));
        }
        Command::Repl(args) => {
            let app = App::from_cli(cli, args.narrative)?;
            let period = args.period.unwrap_or(app.pipeline.config().default_period);
            repl::run(&app.pipeline, period).await?;
        }
    }

    Ok(())
}

mod config;
mod render;

use std::{io::Write, sync::Arc, time::Duration};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use entity::Stage;
use platform_api::CrmClient;
use platform_obs::{ObsConfig, init_tracing};
use products_crm::{
    BoardSettings, Card, DropOutcome, MeetingForm, Modal, ModalState, PipelineBoard,
    PipelineError, QuotationDraft, modal::ARCHIVE_PROMPT,
};
use tokio::signal;
use tracing::info;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "crm-pipeline", version, about = "Leads and deals pipeline board")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Sync connected leads and print the board once
    Board,
    /// Keep the board open and reprint it after every poll
    Watch {
        /// Seconds between polls (overrides CRM_POLL_INTERVAL_SECS)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },
    /// Drop a card on another stage
    Move {
        id: String,
        stage: Stage,
        /// Qualified amount; prompted for when omitted
        #[arg(long)]
        amount: Option<String>,
    },
    /// Archive a deal into the recycle bin
    Archive {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Inspect and manage archived deals
    Bin {
        #[command(subcommand)]
        action: BinCmd,
    },
    /// Schedule a meeting for a Lead card
    Meet {
        id: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// HH:MM
        #[arg(long)]
        start: String,
        /// HH:MM
        #[arg(long)]
        end: String,
        /// Defaults to "Client name: <client>"
        #[arg(long)]
        note: Option<String>,
    },
    /// Send a quotation for a Contacted card
    Quote {
        id: String,
        #[arg(long)]
        number: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Line item as "description=amount"; repeatable
        #[arg(long = "item", value_name = "DESC=AMOUNT")]
        items: Vec<String>,
        #[arg(long)]
        requirement: Option<String>,
    },
    /// Turn connected contact-form leads into Lead deals
    SyncLeads,
}

#[derive(Subcommand, Debug)]
enum BinCmd {
    /// List archived deals
    List,
    /// Move an archived deal back to Qualified
    Restore { id: String },
    /// Delete an archived deal for good
    Purge { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    init_tracing(ObsConfig::from_env("crm-pipeline"))?;

    let client = CrmClient::new(config.api.clone()).context("failed to build HTTP client")?;
    let mut board = PipelineBoard::new(Arc::new(client), config.board_settings());

    match cli.cmd {
        Cmd::Board => {
            board.open().await.map_err(for_user)?;
            print!("{}", render::board(&board.store().view().await));
        }
        Cmd::Watch { interval } => {
            if let Some(secs) = interval {
                board = PipelineBoard::new(
                    board.store().backend().clone(),
                    BoardSettings {
                        poll_interval: Duration::from_secs(secs),
                    },
                );
            }
            watch(&mut board).await?;
        }
        Cmd::Move { id, stage, amount } => {
            load(&board).await?;
            let engine = board.transitions();
            match engine.apply_drop(&id, stage).await.map_err(for_user)? {
                DropOutcome::Moved { to } => println!("Moved {id} to {to}."),
                DropOutcome::AwaitingAmount(mut modal) => {
                    let input = match amount {
                        Some(amount) => Some(amount),
                        None => {
                            let prompt = modal.prompt().unwrap_or_default().to_string();
                            ask(&prompt, &modal_input(&modal)).await?
                        }
                    };
                    match input {
                        Some(text) => {
                            modal.set_input(text);
                        }
                        None => modal.cancel(),
                    }
                    let amount = engine.qualify(&id, &mut modal).await.map_err(for_user)?;
                    println!("Qualified {id} for {amount}.");
                }
            }
        }
        Cmd::Archive { id, yes } => {
            load(&board).await?;
            let mut confirm = Modal::confirmation(ARCHIVE_PROMPT);
            if yes || confirmed(ARCHIVE_PROMPT).await? {
                confirm.confirm();
            } else {
                confirm.cancel();
            }
            board.archive(&id, &mut confirm).await.map_err(for_user)?;
            println!("Deal archived and moved to the recycle bin.");
        }
        Cmd::Bin { action } => {
            let bin = board.recycle_bin();
            match action {
                BinCmd::List => {
                    let archived = bin.list_archived().await.map_err(for_user)?;
                    print!("{}", render::recycle_bin(&archived));
                }
                BinCmd::Restore { id } => {
                    bin.restore(&id).await.map_err(for_user)?;
                    println!("Deal restored to 'Qualified' stage.");
                }
                BinCmd::Purge { id } => {
                    bin.delete_permanently(&id).await.map_err(for_user)?;
                    println!("Archived deal {id} deleted permanently.");
                }
            }
        }
        Cmd::Meet {
            id,
            date,
            start,
            end,
            note,
        } => {
            load(&board).await?;
            let card = find_card(&board, &id).await?;
            let prefilled = MeetingForm::for_card(&card);
            let form = MeetingForm {
                date,
                start_time: start,
                end_time: end,
                note: note.unwrap_or(prefilled.note),
            };
            board
                .transitions()
                .schedule_meeting(&id, &form)
                .await
                .map_err(for_user)?;
            println!("Meeting scheduled successfully!");
        }
        Cmd::Quote {
            id,
            number,
            date,
            items,
            requirement,
        } => {
            load(&board).await?;
            let card = find_card(&board, &id).await?;
            let mut draft = QuotationDraft {
                quotation_no: number,
                date,
                ..QuotationDraft::for_card(&card)
            };
            draft.details.company_requirement = requirement;
            for item in &items {
                let (description, amount) = item
                    .split_once('=')
                    .ok_or_else(|| anyhow!("item `{item}` must look like \"description=amount\""))?;
                draft = draft.with_item(description, amount);
            }
            board
                .transitions()
                .send_quotation(&id, &draft)
                .await
                .map_err(for_user)?;
            println!("Quotation saved successfully!");
        }
        Cmd::SyncLeads => {
            let report = board.sync_connected_leads().await.map_err(for_user)?;
            println!(
                "{} deal(s) created, {} already on the board, {} failed.",
                report.created, report.skipped, report.failures
            );
        }
    }

    Ok(())
}

async fn load(board: &PipelineBoard) -> anyhow::Result<()> {
    board.store().load().await.map_err(for_user)?;
    Ok(())
}

async fn find_card(board: &PipelineBoard, id: &str) -> anyhow::Result<Card> {
    board
        .store()
        .card(id)
        .await
        .ok_or_else(|| for_user(PipelineError::CardNotFound(id.to_string())))
}

async fn watch(board: &mut PipelineBoard) -> anyhow::Result<()> {
    let mut changes = board.store().subscribe();
    board.activate().await.map_err(for_user)?;
    info!("watching the pipeline; press Ctrl+C to stop");

    loop {
        tokio::select! {
            result = signal::ctrl_c() => {
                result.context("failed to install Ctrl+C handler")?;
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = board.store().view().await;
                print!("\x1b[2J\x1b[H{}", render::board(&view));
                std::io::stdout().flush().ok();
            }
        }
    }

    board.deactivate().await;
    info!("shutdown signal received");
    Ok(())
}

/// Keep the backend error as the source; show the alert text first.
fn for_user(err: PipelineError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

fn modal_input<T>(modal: &Modal<T>) -> String {
    match modal.state() {
        ModalState::CollectingInput { input, .. } => input.clone(),
        _ => String::new(),
    }
}

/// Ask on stdin; `None` when stdin is closed.
async fn ask(question: &str, default: &str) -> anyhow::Result<Option<String>> {
    let question = if default.is_empty() {
        format!("{question} ")
    } else {
        format!("{question} [{default}] ")
    };
    let default = default.to_string();
    tokio::task::spawn_blocking(move || -> anyhow::Result<Option<String>> {
        let mut stdout = std::io::stdout();
        stdout.write_all(question.as_bytes())?;
        stdout.flush()?;
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let answer = line.trim();
        Ok(Some(if answer.is_empty() { default } else { answer.to_string() }))
    })
    .await
    .context("prompt task failed")?
}

async fn confirmed(question: &str) -> anyhow::Result<bool> {
    let answer = ask(&format!("{question} (y/N)"), "").await?;
    Ok(matches!(
        answer.as_deref().map(str::to_ascii_lowercase).as_deref(),
        Some("y" | "yes")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("crm-pipeline").chain(args.iter().copied()))
    }

    #[test]
    fn watch_interval_must_be_positive() {
        assert!(parse(&["watch", "--interval", "0"]).is_err());
        assert!(parse(&["watch", "--interval", "soon"]).is_err());
        let cli = parse(&["watch", "--interval", "30"]).unwrap();
        assert!(matches!(cli.cmd, Cmd::Watch { interval: Some(30) }));
        assert!(matches!(parse(&["watch"]).unwrap().cmd, Cmd::Watch { interval: None }));
    }

    #[test]
    fn move_parses_the_target_stage() {
        let cli = parse(&["move", "q1", "qualified", "--amount", "500"]).unwrap();
        let Cmd::Move { id, stage, amount } = cli.cmd else {
            panic!("expected move");
        };
        assert_eq!(id, "q1");
        assert_eq!(stage, Stage::Qualified);
        assert_eq!(amount.as_deref(), Some("500"));
    }
}

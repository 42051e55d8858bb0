use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use listing_wizard::config::WizardConfig;
use listing_wizard::enrichment::HttpEnrichment;
use listing_wizard::marketplace::HttpMarketplace;
use listing_wizard::persist::{FileSnapshotStore, HttpConversationLog};
use listing_wizard::wizard::{
    AnswerValue, ConversationController, EntityKind, WidgetKind, WizardDeps, WizardEvent,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let kind = match std::env::args().nth(1).as_deref() {
        Some("company") => EntityKind::Company,
        Some("job") => EntityKind::Job,
        Some("gig") | None => EntityKind::Gig,
        Some(other) => {
            eprintln!("Error: unknown flow '{other}' (expected company, job, or gig)");
            std::process::exit(1);
        }
    };

    let mut config = WizardConfig::default();
    if let Ok(base) = std::env::var("WIZARD_API_BASE") {
        config.api_base_url = base;
    }
    if let Ok(token) = std::env::var("WIZARD_API_TOKEN") {
        config.api_token = Some(secrecy::SecretString::from(token));
    }
    if let Ok(dir) = std::env::var("WIZARD_SNAPSHOT_DIR") {
        config.snapshot_dir = std::path::PathBuf::from(dir);
    }
    if let Ok(ms) = std::env::var("WIZARD_TYPING_DELAY_MS") {
        config.typing_delay = Duration::from_millis(ms.parse().unwrap_or(12));
    }
    let user_id = std::env::var("WIZARD_USER").unwrap_or_else(|_| "local".to_string());

    eprintln!("📝 Listing Wizard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Flow: {kind}");
    eprintln!("   Backend: {}", config.api_base_url);
    eprintln!("   Snapshots: {}", config.snapshot_dir.display());
    eprintln!("   Type answers and press Enter. skip to skip, /reset to start over,");
    eprintln!("   /retry after a failed submission, /quit to exit.\n");

    let deps = WizardDeps {
        enrichment: Arc::new(HttpEnrichment::new(&config)),
        marketplace: Arc::new(HttpMarketplace::new(&config)),
        log: Arc::new(HttpConversationLog::new(&config)),
        snapshots: Arc::new(FileSnapshotStore::new(config.snapshot_dir.clone())),
    };
    let (controller, mut events) = ConversationController::new(&config, deps, &user_id, kind);
    let controller = Arc::new(controller);

    // Event consumer: renders the typing stream and widget menus.
    tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(event) = events.recv().await {
            match event {
                WizardEvent::RevealChunk { text } => {
                    let _ = stdout.write_all(text.as_bytes()).await;
                    let _ = stdout.flush().await;
                }
                WizardEvent::MessageCommitted { .. } => {
                    let _ = stdout.write_all(b"\n").await;
                    let _ = stdout.flush().await;
                }
                WizardEvent::WidgetRequested { widget, .. } => {
                    render_widget(&mut stdout, &widget).await;
                }
                WizardEvent::ValidationMessage { .. } => {}
                WizardEvent::FlowCompleted { outcome } => {
                    let _ = stdout.write_all(b"\n").await;
                    if let Some(id) = &outcome.company_id {
                        let _ = stdout
                            .write_all(format!("   Company: {id}\n").as_bytes())
                            .await;
                    }
                    if let Some(id) = &outcome.job_id {
                        let _ = stdout.write_all(format!("   Job: {id}\n").as_bytes()).await;
                    }
                    if let Some(id) = &outcome.gig_id {
                        let _ = stdout.write_all(format!("   Gig: {id}\n").as_bytes()).await;
                    }
                    let _ = stdout.flush().await;
                }
                WizardEvent::SubmissionFailed { .. } => {
                    let _ = stdout
                        .write_all(b"\n   (Your answers were kept. /retry to try again.)\n")
                        .await;
                    let _ = stdout.flush().await;
                }
            }
        }
    });

    if controller.restore().await {
        eprintln!("   Resumed a previous session.\n");
    } else {
        controller.start().await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match line.trim() {
            "/quit" => break,
            "/reset" => {
                controller.reset().await;
                controller.start().await;
            }
            "/retry" => controller.retry_submission().await,
            input => {
                // `loc <lat> <lon>` stands in for the location-share widget.
                if let Some(coords) = parse_location_command(input) {
                    if let Some(field) = controller.current_field().await {
                        let (lat, lon) = coords;
                        controller
                            .submit_widget_event(field, AnswerValue::Coordinate { lat, lon })
                            .await;
                        continue;
                    }
                }
                // A bare number picks from the currently offered menu.
                if let Some(choice) = pick_option(input, controller.pending_widget().await) {
                    if let Some(field) = controller.current_field().await {
                        controller
                            .submit_widget_event(field, AnswerValue::Choice(choice))
                            .await;
                        continue;
                    }
                }
                controller.submit_answer(input).await;
            }
        }
    }

    Ok(())
}

async fn render_widget(stdout: &mut tokio::io::Stdout, widget: &WidgetKind) {
    let options = match widget {
        WidgetKind::SingleSelect { options }
        | WidgetKind::MultiSelect { options }
        | WidgetKind::StateSelect { options }
        | WidgetKind::PincodeChoice { options } => options,
        WidgetKind::CoordinateCapture => {
            let _ = stdout
                .write_all(b"   (loc <lat> <lon> to share a location)\n")
                .await;
            let _ = stdout.flush().await;
            return;
        }
        _ => return,
    };
    for (i, option) in options.iter().enumerate() {
        let _ = stdout
            .write_all(format!("   {}. {option}\n", i + 1).as_bytes())
            .await;
    }
    let _ = stdout.flush().await;
}

fn parse_location_command(input: &str) -> Option<(f64, f64)> {
    let rest = input.strip_prefix("loc ")?;
    let mut parts = rest.split_whitespace();
    let lat = parts.next()?.parse().ok()?;
    let lon = parts.next()?.parse().ok()?;
    Some((lat, lon))
}

fn pick_option(input: &str, widget: Option<WidgetKind>) -> Option<String> {
    let index: usize = input.parse().ok()?;
    let options = match widget? {
        WidgetKind::SingleSelect { options }
        | WidgetKind::MultiSelect { options }
        | WidgetKind::StateSelect { options }
        | WidgetKind::PincodeChoice { options } => options,
        _ => return None,
    };
    options.get(index.checked_sub(1)?).cloned()
}

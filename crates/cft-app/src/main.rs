//! Content Farm Terminator command-line driver.
//!
//! Runs one navigation through the interceptor. A blocked target lands on
//! the warning page, which is printed. With `--unblock HOST` the rule is
//! then removed and the page reconciles against the new rule state.

mod cli;

use std::time::Instant;

use anyhow::{Context, Result};

use cft_background::{BackgroundHub, HostRuleSet, InterceptDecision, NavigationInterceptor};
use cft_interstitial::{InterstitialController, QueuedPort, SessionHistory};
use cft_types::config::CftConfig;
use cft_types::ids::TabId;
use cft_types::message::{self, Ack, BackgroundMessage, PageMessage};

const TAB: TabId = TabId(1);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse(std::env::args().skip(1))?;

    let config = match &args.config {
        Some(path) => CftConfig::load(path)?,
        None => CftConfig::default(),
    };

    let rules = match &args.rules {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading rules from {}", path.display()))?;
            let (rules, stats) = HostRuleSet::parse(&text);
            log::info!(
                "Loaded {} rule(s) from {} ({} skipped)",
                stats.loaded,
                path.display(),
                stats.skipped
            );
            rules
        },
        None => HostRuleSet::new(),
    };

    let mut hub = BackgroundHub::new(rules, NavigationInterceptor::new(&config)?);

    let location = match hub.intercept(TAB, &args.target)? {
        InterceptDecision::Allow => {
            println!("allowed: {}", args.target);
            return Ok(());
        },
        InterceptDecision::Redirect(location) => location,
    };

    let mut history = SessionHistory::new(TAB);
    history.navigate(&location);
    let mut page = InterstitialController::initialize(&location, &config, history, QueuedPort::new())?;
    println!("{}", page.view().page_html());

    let Some(host) = &args.unblock else {
        return Ok(());
    };
    hub.remove_rule(host);

    // One reconciliation round: notification down, check up, answer down.
    // Every message crosses in its JSON wire form.
    hub.deliver(TAB, |msg| deliver_to_page(&mut page, &msg));
    page.poll(Instant::now());
    for msg in page.port_mut().drain() {
        hub.handle(TAB, to_background(&msg)?)?;
    }
    hub.deliver(TAB, |msg| deliver_to_page(&mut page, &msg));

    if page.is_live() {
        println!("still blocked: {}", page.intent());
    } else {
        let now_at = page.browsing().current_url().unwrap_or_default();
        println!("released: {now_at}");
    }
    Ok(())
}

type Page = InterstitialController<SessionHistory, QueuedPort>;

fn to_background(msg: &PageMessage) -> cft_types::Result<PageMessage> {
    let wire = message::encode(msg)?;
    log::debug!("page -> background: {wire}");
    message::decode(&wire)
}

fn deliver_to_page(page: &mut Page, msg: &BackgroundMessage) -> Ack {
    let decoded = message::encode(msg).and_then(|wire| {
        log::debug!("background -> page: {wire}");
        message::decode::<BackgroundMessage>(&wire)
    });
    match decoded {
        Ok(msg) => page.dispatch(msg),
        Err(e) => {
            log::error!("dropping {}: {e}", msg.command_name());
            Ack::Ignored
        },
    }
}

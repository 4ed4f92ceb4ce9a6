//! End-to-end reconciliation scenarios: a warning page and the privileged
//! context wired together through their queues.

use std::time::{Duration, Instant};

use cft_interstitial::{
    InterstitialController, QueuedPort, ReplyOutcome, SessionHistory, WarningLocation,
    isolated_view_url,
};
use cft_types::config::CftConfig;
use cft_types::ids::TabId;
use cft_types::message::{Ack, BackgroundMessage};

use crate::hub::{AckStats, BackgroundHub};
use crate::interceptor::{InterceptDecision, NavigationInterceptor};
use crate::oracle::HostRuleSet;

const ORIGIN: &str = "https://news.test/front";
const TARGET: &str = "https://www.farm.test/article?id=9";
const TAB: TabId = TabId(7);

type Page = InterstitialController<SessionHistory, QueuedPort>;

struct World {
    config: CftConfig,
    hub: BackgroundHub<HostRuleSet>,
    page: Page,
}

impl World {
    /// Open `TAB` on `ORIGIN` (unless `fresh`), then follow a link to
    /// `TARGET` and land on the warning page.
    fn new(fresh: bool) -> Self {
        let config = CftConfig::default();
        let mut rules = HostRuleSet::new();
        rules.add_rule("farm.test").unwrap();
        let interceptor = NavigationInterceptor::new(&config).unwrap();
        let mut hub = BackgroundHub::new(rules, interceptor);

        let mut history = SessionHistory::new(TAB);
        if !fresh {
            history.navigate(ORIGIN);
        }
        let InterceptDecision::Redirect(location) = hub.intercept(TAB, TARGET).unwrap() else {
            panic!("{TARGET} should be intercepted");
        };
        history.navigate(&location);
        let page = InterstitialController::initialize(&location, &config, history, QueuedPort::new())
            .unwrap();
        Self { config, hub, page }
    }

    /// Carry page requests to the hub.
    fn send_up(&mut self) {
        for msg in self.page.port_mut().drain() {
            self.hub.handle(TAB, msg).unwrap();
        }
    }

    /// Carry hub messages to the page.
    fn send_down(&mut self) -> usize {
        let page = &mut self.page;
        self.hub.deliver(TAB, |msg| page.dispatch(msg))
    }

    /// One full event-loop turn.
    fn turn(&mut self) {
        self.send_down();
        self.page.poll(Instant::now());
        self.send_up();
        self.send_down();
    }

    fn current(&self) -> Option<&str> {
        self.page.browsing().current_url()
    }
}

#[test]
fn unblocking_releases_page_to_target() {
    let mut world = World::new(false);
    assert_eq!(world.page.view().host, "www.farm.test");

    assert_eq!(world.hub.update_filter(|r| r.remove_rule("farm.test")), 1);
    world.turn();

    assert!(!world.page.is_live());
    assert_eq!(world.current(), Some(TARGET));
    // The warning entry was replaced, so back leads to the origin.
    assert_eq!(world.page.browsing().entries(), vec![ORIGIN, TARGET]);
}

#[test]
fn still_blocked_keeps_warning() {
    let mut world = World::new(false);
    let warning = world.current().unwrap().to_string();

    // Something unrelated changed.
    world.hub.update_filter(|r| r.add_rule("other.test").unwrap());
    world.turn();

    assert!(world.page.is_live());
    assert_eq!(world.current(), Some(warning.as_str()));
    assert_eq!(world.page.outstanding_query(), None);
}

#[test]
fn burst_of_notifications_sends_one_check() {
    let mut world = World::new(false);
    for _ in 0..5 {
        world.hub.notify_filter_changed();
    }
    assert_eq!(world.send_down(), 5);
    world.page.poll(Instant::now());
    assert_eq!(world.page.port_mut().pending(), 1);
    assert_eq!(
        world.hub.ack_stats(TAB),
        Some(AckStats {
            awaiting: 0,
            received: 5,
            ignored: 0,
        })
    );
}

#[test]
fn fresh_tab_back_closes_tab() {
    let mut world = World::new(true);
    assert!(world.hub.is_open(TAB));

    world.page.go_back_or_close().unwrap();
    world.send_up();

    assert!(!world.page.is_live());
    assert!(!world.hub.is_open(TAB));
    assert!(!world.hub.close_tab(TAB));
}

#[test]
fn back_with_history_returns_to_origin() {
    let mut world = World::new(false);
    world.page.go_back_or_close().unwrap();
    world.send_up();

    assert_eq!(world.current(), Some(ORIGIN));
    assert!(world.hub.is_open(TAB));
}

#[test]
fn stale_unblocked_reply_cannot_override_newer_block() {
    let mut world = World::new(false);

    // Check A runs while the site is briefly unblocked; its answer is held.
    world.hub.update_filter(|r| r.remove_rule("farm.test"));
    let a = world.page.reconsider().unwrap();
    world.send_up();
    let held = world.hub.drain(TAB);

    // The site is blocked again before A's answer arrives; check B follows.
    world.hub.update_filter(|r| r.add_rule("farm.test").unwrap());
    world.hub.drain(TAB);
    let b = world.page.reconsider().unwrap();
    world.send_up();
    let fresh = world.hub.drain(TAB);

    assert!(held.contains(&BackgroundMessage::UrlBlockedReply {
        id: a,
        blocked: false,
    }));
    assert!(fresh.contains(&BackgroundMessage::UrlBlockedReply {
        id: b,
        blocked: true,
    }));

    assert_eq!(world.page.on_oracle_reply(a, false).unwrap(), ReplyOutcome::Discarded);
    assert_eq!(world.page.on_oracle_reply(b, true).unwrap(), ReplyOutcome::StillBlocked);
    assert!(world.page.is_live());
    assert_ne!(world.current(), Some(TARGET));
}

#[test]
fn change_notification_overtaking_stale_reply_keeps_warning() {
    let mut world = World::new(false);
    let warning = world.current().unwrap().to_string();

    // Check A is answered "not blocked", but its reply is held up.
    world.hub.update_filter(|r| r.remove_rule("farm.test"));
    world.hub.drain(TAB);
    let a = world.page.reconsider().unwrap();
    world.send_up();
    let held = world.hub.drain(TAB);
    assert_eq!(held, vec![BackgroundMessage::UrlBlockedReply { id: a, blocked: false }]);

    // The site is blocked again and that notification lands first.
    world.hub.update_filter(|r| r.add_rule("farm.test").unwrap());
    world.send_down();
    for msg in held {
        world.page.dispatch(msg);
    }
    assert!(world.page.is_live());
    assert_eq!(world.current(), Some(warning.as_str()));

    // The follow-up check sees the current rules.
    world.turn();
    assert!(world.page.is_live());
    assert_eq!(world.current(), Some(warning.as_str()));
}

#[test]
fn retired_page_ignores_notifications() {
    let mut world = World::new(false);
    world.hub.update_filter(|r| r.remove_rule("farm.test"));
    world.turn();
    assert!(!world.page.is_live());

    world.hub.notify_filter_changed();
    world.send_down();
    world.page.poll(Instant::now());

    assert_eq!(world.page.port_mut().pending(), 0);
    let stats = world.hub.ack_stats(TAB).unwrap();
    assert_eq!(stats.ignored, 1);
    assert_eq!(stats.awaiting, 0);
}

#[test]
fn unanswered_check_fails_closed() {
    let mut world = World::new(false);
    world.hub.update_filter(|r| r.remove_rule("farm.test"));
    world.send_down();
    world.page.poll(Instant::now());
    let id = world.page.outstanding_query().unwrap();

    // The privileged context never answers in time.
    let late = Instant::now() + world.config.oracle_timeout() + Duration::from_millis(1);
    world.page.poll(late);
    assert_eq!(world.page.outstanding_query(), None);
    assert!(world.page.is_live());

    // The answer straggles in afterwards and is ignored.
    assert_eq!(world.page.on_oracle_reply(id, false).unwrap(), ReplyOutcome::Discarded);
    assert_ne!(world.current(), Some(TARGET));
}

#[test]
fn isolated_view_is_not_intercepted() {
    let mut world = World::new(false);
    world.page.proceed_to_isolated_view().unwrap();
    let isolated = world.current().unwrap().to_string();
    assert_eq!(
        isolated,
        isolated_view_url(&world.config.isolated_view, world.page.intent()).unwrap()
    );
    assert_eq!(world.hub.intercept(TAB, &isolated).unwrap(), InterceptDecision::Allow);
    assert_eq!(world.page.dispatch(BackgroundMessage::UpdateContent), Ack::Ignored);
}

#[test]
fn warning_location_round_trips_through_interceptor() {
    let world = World::new(false);
    let location = WarningLocation::parse(world.current().unwrap()).unwrap();
    assert_eq!(location.intent.as_str(), TARGET);
    assert_eq!(location.mode, world.config.display_mode);
}

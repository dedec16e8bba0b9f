use std::collections::BTreeSet;
use std::time::Instant;

use tickerdesk::chat::{Block, Mount, Role, WIDGET_MARKER};
use tickerdesk::config::DeskConfig;
use tickerdesk::desk::Desk;
use tickerdesk::embed::TerminalChartEmbedder;
use tickerdesk::host::Desktop;
use tickerdesk::window::Ticker;

fn t(s: &str) -> Ticker {
    Ticker::parse(s).unwrap()
}

fn desk() -> Desk<Desktop, TerminalChartEmbedder> {
    Desk::new(
        Desktop::new(),
        TerminalChartEmbedder::new(),
        &DeskConfig::default(),
    )
}

#[test]
fn answer_without_marker_mounts_nothing() {
    let mut d = desk();
    d.transcript_mut().push_user("how is the market?");
    let filled = d.push_answer("Quiet day, indices flat.", Some(t("SPY")));
    assert!(filled.is_empty());
    assert_eq!(d.transcript().placeholder_count(), 0);
    assert_eq!(d.embedder().live_count(), 0);
}

#[test]
fn every_marker_gets_its_own_chart() {
    let mut d = desk();
    let answer = format!("one {WIDGET_MARKER} two {WIDGET_MARKER} three {WIDGET_MARKER}");
    let filled = d.push_answer(&answer, Some(t("NVDA")));
    assert_eq!(filled.len(), 3);
    let unique: BTreeSet<_> = filled.iter().collect();
    assert_eq!(unique.len(), 3);
    for container in &filled {
        assert!(d.embedder().is_live(container));
    }

    let message = &d.transcript().messages()[0];
    assert_eq!(message.role, Role::Assistant);
    for placeholder in message.placeholders() {
        let Mount::Mounted(embed) = &placeholder.mount else {
            panic!("placeholder left empty");
        };
        assert_eq!(embed.options.symbol, t("NVDA"));
    }
    let text_blocks = message
        .blocks
        .iter()
        .filter(|b| matches!(b, Block::Markdown(_)))
        .count();
    assert_eq!(text_blocks, 3);
}

#[test]
fn answer_without_ticker_leaves_placeholders_inert() {
    let mut d = desk();
    let filled = d.push_answer(WIDGET_MARKER, None);
    assert!(filled.is_empty());
    assert_eq!(d.transcript().placeholder_count(), 1);
    assert_eq!(d.inject_chat_widget().unwrap(), None);
}

#[test]
fn chat_charts_do_not_touch_ticker_windows() {
    let mut d = desk();
    d.add_favorite(t("AAPL"));
    d.tick(Instant::now());
    d.push_answer(&format!("see {WIDGET_MARKER}"), Some(t("AAPL")));

    assert_eq!(d.registry().len(), 1);
    assert!(d.queue().is_empty());
    assert_eq!(d.embedder().live_count(), 2);

    d.remove_favorite(&t("AAPL"));
    assert_eq!(d.embedder().live_count(), 1);

    d.shutdown();
    assert_eq!(d.embedder().live_count(), 0);
}

#[test]
fn later_answers_do_not_remount_earlier_charts() {
    let mut d = desk();
    let first = d.push_answer(WIDGET_MARKER, Some(t("AAPL")));
    let second = d.push_answer(WIDGET_MARKER, Some(t("MSFT")));
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_ne!(first, second);
    let Mount::Mounted(embed) = &d.transcript().messages()[0].placeholders().next().unwrap().mount
    else {
        panic!("first chart missing");
    };
    assert_eq!(embed.generation, 1);
    assert_eq!(embed.options.symbol, t("AAPL"));
}

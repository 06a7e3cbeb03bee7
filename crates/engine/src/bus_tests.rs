// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use orc_core::{FakeClock, SessionEventKind};
use tokio_stream::StreamExt;

fn bus(buffer: usize) -> EventBus<FakeClock> {
    EventBus::new(
        FakeClock::new(1000),
        EventBusConfig {
            subscriber_buffer: buffer,
        },
    )
}

#[tokio::test]
async fn subscriber_receives_events_in_publish_order() {
    let bus = bus(8);
    let session = SessionId::new("test-session");
    let mut stream = bus.subscribe(&session);
    bus.publish(&session, SessionEvent::raw("one", 1));
    bus.publish(&session, SessionEvent::raw("two", 2));
    let first = stream.next().await.unwrap();
    let second = stream.next().await.unwrap();
    assert_eq!(first.text.as_deref(), Some("one"));
    assert_eq!(second.text.as_deref(), Some("two"));
}

#[tokio::test]
async fn two_subscribers_see_the_same_order() {
    let bus = bus(8);
    let session = SessionId::new("test-session");
    let mut a = bus.subscribe(&session);
    let mut b = bus.subscribe(&session);
    bus.publish(&session, SessionEvent::raw("x", 1));
    bus.publish(&session, SessionEvent::raw("y", 2));
    assert_eq!(a.next().await.unwrap().text.as_deref(), Some("x"));
    assert_eq!(a.next().await.unwrap().text.as_deref(), Some("y"));
    assert_eq!(b.next().await.unwrap().text.as_deref(), Some("x"));
    assert_eq!(b.next().await.unwrap().text.as_deref(), Some("y"));
}

#[tokio::test]
async fn overflow_evicts_only_the_slow_subscriber() {
    let bus = Arc::new(bus(2));
    let session = SessionId::new("test-session");
    let mut slow = bus.subscribe(&session);
    let mut fast = bus.subscribe(&session);

    let drain_task = tokio::spawn(async move {
        let mut count = 0;
        while fast.next().await.is_some() {
            count += 1;
            if count >= 5 {
                break;
            }
        }
        count
    });

    for i in 0..5 {
        bus.publish(&session, SessionEvent::raw(format!("e{i}"), i as u64));
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }

    let fast_count = drain_task.await.unwrap();
    assert_eq!(fast_count, 5, "fast subscriber should never be evicted");

    let mut slow_events = Vec::new();
    while let Some(event) = slow.next().await {
        slow_events.push(event);
    }
    let last = slow_events.last().unwrap();
    assert_eq!(last.subtype.as_deref(), Some("slow_consumer"));
    assert_eq!(bus.subscriber_count(&session), 0);
}

#[tokio::test]
async fn close_emits_terminal_then_ends_stream() {
    let bus = bus(8);
    let session = SessionId::new("test-session");
    let mut stream = bus.subscribe(&session);
    bus.close(&session);
    let terminal = stream.next().await.unwrap();
    assert_eq!(terminal.kind, SessionEventKind::Result);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn subscribing_after_close_yields_a_closed_stream() {
    let bus = bus(8);
    let session = SessionId::new("test-session");
    bus.close(&session);
    let mut stream = bus.subscribe(&session);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn publish_after_close_is_a_silent_no_op() {
    let bus = bus(8);
    let session = SessionId::new("test-session");
    bus.close(&session);
    bus.publish(&session, SessionEvent::raw("ignored", 1));
    let mut stream = bus.subscribe(&session);
    assert!(stream.next().await.is_none());
}

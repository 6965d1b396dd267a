use super::*;
use crate::state::test_helpers::{
    assert_no_event, dummy_stroke, recv_event, register_client, seed_history, stroke_with_id, test_app_state,
};
use uuid::Uuid;

async fn history_ids(state: &AppState) -> Vec<StrokeId> {
    let canvas = state.canvas.read().await;
    canvas.history.snapshot().iter().map(|s| s.id).collect()
}

// =============================================================================
// APPEND
// =============================================================================

#[tokio::test]
async fn append_broadcasts_to_all_including_author() {
    let state = test_app_state();
    let author = Uuid::new_v4();
    let peer = Uuid::new_v4();
    let mut author_rx = register_client(&state, author).await;
    let mut peer_rx = register_client(&state, peer).await;

    let stroke = dummy_stroke();
    let outcome = append_stroke(&state, author, stroke.clone()).await;
    assert_eq!(outcome, AppendOutcome::Appended);

    for rx in [&mut author_rx, &mut peer_rx] {
        let ServerEvent::StrokeAdd { stroke: got } = recv_event(rx).await else {
            panic!("expected stroke:add");
        };
        assert_eq!(got.id, stroke.id);
        // The server stamps the true author.
        assert_eq!(got.author, author);
    }

    assert_eq!(history_ids(&state).await, vec![stroke.id]);
}

#[tokio::test]
async fn duplicate_append_is_ignored_and_not_rebroadcast() {
    let state = test_app_state();
    let author = Uuid::new_v4();
    let mut rx = register_client(&state, author).await;

    let stroke = dummy_stroke();
    append_stroke(&state, author, stroke.clone()).await;
    recv_event(&mut rx).await;

    let outcome = append_stroke(&state, author, stroke_with_id(stroke.id)).await;
    assert_eq!(outcome, AppendOutcome::Duplicate);
    assert_no_event(&mut rx).await;
    assert_eq!(history_ids(&state).await.len(), 1);
}

#[tokio::test]
async fn invalid_stroke_is_ignored() {
    let state = test_app_state();
    let author = Uuid::new_v4();
    let mut rx = register_client(&state, author).await;

    let mut stroke = dummy_stroke();
    stroke.width = 0.0;
    assert_eq!(append_stroke(&state, author, stroke).await, AppendOutcome::Invalid);

    let mut pointless = dummy_stroke();
    pointless.points.clear();
    assert_eq!(append_stroke(&state, author, pointless).await, AppendOutcome::Invalid);

    assert_no_event(&mut rx).await;
    assert!(history_ids(&state).await.is_empty());
}

#[tokio::test]
async fn append_normalizes_the_stroke_color() {
    let state = test_app_state();
    let author = Uuid::new_v4();
    let mut rx = register_client(&state, author).await;

    let mut stroke = dummy_stroke();
    stroke.color = "#ABC".into();
    append_stroke(&state, author, stroke).await;

    let ServerEvent::StrokeAdd { stroke: got } = recv_event(&mut rx).await else {
        panic!("expected stroke:add");
    };
    assert_eq!(got.color, "#aabbcc");
}

#[tokio::test]
async fn multibyte_color_falls_back_to_the_default_pen() {
    let state = test_app_state();
    let author = Uuid::new_v4();
    let peer = Uuid::new_v4();
    let mut author_rx = register_client(&state, author).await;
    let mut peer_rx = register_client(&state, peer).await;

    // "€" is a three-byte char; the color must fall back, not blow up the
    // connection mid-parse.
    let mut stroke = dummy_stroke();
    stroke.color = "#€".into();
    assert_eq!(append_stroke(&state, author, stroke).await, AppendOutcome::Appended);

    let ServerEvent::StrokeAdd { stroke: got } = recv_event(&mut author_rx).await else {
        panic!("expected stroke:add");
    };
    assert_eq!(got.color, "#000000");

    recv_event(&mut peer_rx).await;
    assert!(stream_start(&state, author, Uuid::new_v4(), "#abc€", 2.0, Point::new(0.0, 0.0)).await);
    let ServerEvent::StrokeStart { color, .. } = recv_event(&mut peer_rx).await else {
        panic!("expected stroke:start");
    };
    assert_eq!(color, "#000000");
}

#[tokio::test]
async fn sequential_appends_keep_arrival_order_for_every_client() {
    let state = test_app_state();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut rx_a = register_client(&state, a).await;
    let mut rx_b = register_client(&state, b).await;

    let s1 = dummy_stroke();
    let s2 = dummy_stroke();
    append_stroke(&state, a, s1.clone()).await;
    append_stroke(&state, b, s2.clone()).await;

    assert_eq!(history_ids(&state).await, vec![s1.id, s2.id]);

    for rx in [&mut rx_a, &mut rx_b] {
        let ServerEvent::StrokeAdd { stroke: first } = recv_event(rx).await else {
            panic!("expected stroke:add");
        };
        let ServerEvent::StrokeAdd { stroke: second } = recv_event(rx).await else {
            panic!("expected stroke:add");
        };
        assert_eq!(first.id, s1.id);
        assert_eq!(second.id, s2.id);
    }
}

#[tokio::test]
async fn concurrent_appends_show_one_consistent_order() {
    let state = test_app_state();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut rx_a = register_client(&state, a).await;
    let mut rx_b = register_client(&state, b).await;

    let s1 = dummy_stroke();
    let s2 = dummy_stroke();
    tokio::join!(append_stroke(&state, a, s1.clone()), append_stroke(&state, b, s2.clone()));

    let order = history_ids(&state).await;
    assert_eq!(order.len(), 2);

    // Whatever order the lock decided, every client observed exactly it.
    for rx in [&mut rx_a, &mut rx_b] {
        let ServerEvent::StrokeAdd { stroke: first } = recv_event(rx).await else {
            panic!("expected stroke:add");
        };
        let ServerEvent::StrokeAdd { stroke: second } = recv_event(rx).await else {
            panic!("expected stroke:add");
        };
        assert_eq!(vec![first.id, second.id], order);
    }
}

// =============================================================================
// UNDO / REDO / CLEAR
// =============================================================================

#[tokio::test]
async fn undo_broadcasts_the_shrunk_snapshot() {
    let state = test_app_state();
    let client = Uuid::new_v4();
    let s1 = dummy_stroke();
    let s2 = dummy_stroke();
    seed_history(&state, vec![s1.clone(), s2.clone()]).await;
    let mut rx = register_client(&state, client).await;

    assert_eq!(undo(&state, client).await, StepOutcome::Stepped);

    let ServerEvent::CanvasReset { strokes } = recv_event(&mut rx).await else {
        panic!("expected canvas:reset");
    };
    assert_eq!(strokes.len(), 1);
    assert_eq!(strokes[0].id, s1.id);
}

#[tokio::test]
async fn undo_on_empty_history_broadcasts_nothing() {
    let state = test_app_state();
    let client = Uuid::new_v4();
    let mut rx = register_client(&state, client).await;

    assert_eq!(undo(&state, client).await, StepOutcome::Noop);
    assert_no_event(&mut rx).await;
    assert!(history_ids(&state).await.is_empty());
}

#[tokio::test]
async fn redo_restores_the_undone_stroke_for_everyone() {
    let state = test_app_state();
    let client = Uuid::new_v4();
    let s1 = dummy_stroke();
    seed_history(&state, vec![s1.clone()]).await;
    undo(&state, client).await;

    let mut rx = register_client(&state, client).await;
    assert_eq!(redo(&state, client).await, StepOutcome::Stepped);

    let ServerEvent::CanvasReset { strokes } = recv_event(&mut rx).await else {
        panic!("expected canvas:reset");
    };
    assert_eq!(strokes.len(), 1);
    assert_eq!(strokes[0].id, s1.id);
}

#[tokio::test]
async fn redo_with_empty_buffer_broadcasts_nothing() {
    let state = test_app_state();
    let client = Uuid::new_v4();
    seed_history(&state, vec![dummy_stroke()]).await;
    let mut rx = register_client(&state, client).await;

    assert_eq!(redo(&state, client).await, StepOutcome::Noop);
    assert_no_event(&mut rx).await;
}

#[tokio::test]
async fn append_after_undo_discards_the_redo_buffer() {
    let state = test_app_state();
    let client = Uuid::new_v4();
    let s1 = dummy_stroke();
    let s2 = dummy_stroke();
    let s3 = dummy_stroke();
    seed_history(&state, vec![s1.clone(), s2.clone()]).await;

    undo(&state, client).await;
    append_stroke(&state, client, s3.clone()).await;

    assert_eq!(history_ids(&state).await, vec![s1.id, s3.id]);
    assert_eq!(redo(&state, client).await, StepOutcome::Noop);
}

#[tokio::test]
async fn clear_wipes_everything_and_broadcasts_its_own_event() {
    let state = test_app_state();
    let client = Uuid::new_v4();
    seed_history(&state, vec![dummy_stroke(), dummy_stroke()]).await;
    undo(&state, client).await;
    let mut rx = register_client(&state, client).await;

    clear(&state, client).await;

    assert_eq!(recv_event(&mut rx).await, ServerEvent::CanvasClear);

    let canvas = state.canvas.read().await;
    assert!(canvas.history.is_empty());
    assert_eq!(canvas.history.redo_len(), 0);
}

// =============================================================================
// STREAMING
// =============================================================================

#[tokio::test]
async fn stream_start_relays_to_peers_only() {
    let state = test_app_state();
    let author = Uuid::new_v4();
    let peer = Uuid::new_v4();
    let mut author_rx = register_client(&state, author).await;
    let mut peer_rx = register_client(&state, peer).await;

    let stroke_id = Uuid::new_v4();
    assert!(stream_start(&state, author, stroke_id, "#123456", 2.0, Point::new(1.0, 1.0)).await);

    let ServerEvent::StrokeStart { author_id, stroke_id: got, .. } = recv_event(&mut peer_rx).await else {
        panic!("expected stroke:start");
    };
    assert_eq!(author_id, author);
    assert_eq!(got, stroke_id);
    assert_no_event(&mut author_rx).await;
}

#[tokio::test]
async fn stream_without_end_never_touches_history() {
    let state = test_app_state();
    let author = Uuid::new_v4();
    register_client(&state, author).await;

    let stroke_id = Uuid::new_v4();
    stream_start(&state, author, stroke_id, "#123456", 2.0, Point::new(0.0, 0.0)).await;
    for i in 0..10 {
        stream_point(&state, author, stroke_id, Point::new(f64::from(i), 0.0)).await;
    }

    assert!(history_ids(&state).await.is_empty());
    let canvas = state.canvas.read().await;
    assert_eq!(canvas.relay.open_count(), 1);
}

#[tokio::test]
async fn stream_point_for_unknown_stroke_changes_nothing() {
    let state = test_app_state();
    let author = Uuid::new_v4();
    let peer = Uuid::new_v4();
    register_client(&state, author).await;
    let mut peer_rx = register_client(&state, peer).await;

    let relayed = stream_point(&state, author, Uuid::new_v4(), Point::new(5.0, 5.0)).await;

    assert!(!relayed);
    assert_no_event(&mut peer_rx).await;
    let canvas = state.canvas.read().await;
    assert_eq!(canvas.relay.open_count(), 0);
    assert!(canvas.history.is_empty());
}

#[tokio::test]
async fn stream_end_finalizes_into_history() {
    let state = test_app_state();
    let author = Uuid::new_v4();
    let peer = Uuid::new_v4();
    let mut author_rx = register_client(&state, author).await;
    let mut peer_rx = register_client(&state, peer).await;

    let stroke_id = Uuid::new_v4();
    stream_start(&state, author, stroke_id, "#123456", 2.0, Point::new(0.0, 0.0)).await;
    stream_point(&state, author, stroke_id, Point::new(1.0, 0.0)).await;
    let outcome = stream_end(&state, author, stroke_id, Some(Point::new(2.0, 0.0))).await;
    assert_eq!(outcome, Some(AppendOutcome::Appended));

    // Peers see the relayed lifecycle, then the authoritative stroke.
    let ServerEvent::StrokeStart { .. } = recv_event(&mut peer_rx).await else {
        panic!("expected stroke:start");
    };
    let ServerEvent::StrokePoint { .. } = recv_event(&mut peer_rx).await else {
        panic!("expected stroke:point");
    };
    let ServerEvent::StrokeEnd { .. } = recv_event(&mut peer_rx).await else {
        panic!("expected stroke:end");
    };
    let ServerEvent::StrokeAdd { stroke } = recv_event(&mut peer_rx).await else {
        panic!("expected stroke:add");
    };
    assert_eq!(stroke.id, stroke_id);
    assert_eq!(stroke.author, author);
    assert_eq!(stroke.points.len(), 3);

    // The author skips the relays and receives only the final stroke.
    let ServerEvent::StrokeAdd { stroke: echoed } = recv_event(&mut author_rx).await else {
        panic!("expected stroke:add");
    };
    assert_eq!(echoed.id, stroke_id);

    assert_eq!(history_ids(&state).await, vec![stroke_id]);
    let canvas = state.canvas.read().await;
    assert_eq!(canvas.relay.open_count(), 0);
}

#[tokio::test]
async fn stream_end_for_unknown_stroke_is_dropped() {
    let state = test_app_state();
    let author = Uuid::new_v4();
    let peer = Uuid::new_v4();
    register_client(&state, author).await;
    let mut peer_rx = register_client(&state, peer).await;

    let outcome = stream_end(&state, author, Uuid::new_v4(), None).await;

    assert_eq!(outcome, None);
    assert_no_event(&mut peer_rx).await;
    assert!(history_ids(&state).await.is_empty());
}

#[tokio::test]
async fn stream_start_with_bad_width_is_ignored() {
    let state = test_app_state();
    let author = Uuid::new_v4();
    let peer = Uuid::new_v4();
    register_client(&state, author).await;
    let mut peer_rx = register_client(&state, peer).await;

    assert!(!stream_start(&state, author, Uuid::new_v4(), "#123456", 0.0, Point::new(0.0, 0.0)).await);
    assert!(!stream_start(&state, author, Uuid::new_v4(), "#123456", 2.0, Point::new(f64::NAN, 0.0)).await);

    assert_no_event(&mut peer_rx).await;
    let canvas = state.canvas.read().await;
    assert_eq!(canvas.relay.open_count(), 0);
}

#[tokio::test]
async fn streamed_duplicate_of_an_existing_stroke_is_refused() {
    let state = test_app_state();
    let author = Uuid::new_v4();
    register_client(&state, author).await;

    let stroke = dummy_stroke();
    append_stroke(&state, author, stroke.clone()).await;

    // Streaming a new stroke under the same id relays fine but cannot append.
    stream_start(&state, author, stroke.id, "#123456", 2.0, Point::new(0.0, 0.0)).await;
    let outcome = stream_end(&state, author, stroke.id, None).await;

    assert_eq!(outcome, Some(AppendOutcome::Duplicate));
    assert_eq!(history_ids(&state).await, vec![stroke.id]);
}
